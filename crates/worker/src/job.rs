//! The per-shot job: load, analyse, render, persist.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hoops_core::landmarks::{JointMap, LandmarkSeries};
use hoops_core::shot_status::ShotStatus;
use hoops_core::types::ShotId;
use hoops_pipeline::{KeyframeSet, ShotAnalyzer};

use crate::error::WorkerError;
use crate::pose::PoseSource;
use crate::render::{Replay, ReplayRenderer};
use crate::store::{ShotOutcome, ShotResult, ShotStore};

/// Collaborators shared by every job.
pub struct JobContext {
    pub store: Arc<dyn ShotStore>,
    pub poses: Arc<dyn PoseSource>,
    /// `None` disables replay rendering.
    pub renderer: Option<Arc<dyn ReplayRenderer>>,
    pub analyzer: Arc<ShotAnalyzer>,
    pub sample_fps: f64,
}

/// Run one shot through the pipeline and persist its outcome.
///
/// Analysis and pose failures are part of the shot's outcome: the shot is
/// marked `failed` with the reason and `Ok` is returned. Infrastructure
/// errors also mark the shot `failed` when possible, then propagate.
pub async fn process_shot(ctx: &JobContext, shot_id: ShotId) -> Result<ShotOutcome, WorkerError> {
    let record = ctx
        .store
        .get(shot_id)
        .await?
        .ok_or(WorkerError::ShotNotFound(shot_id))?;

    ctx.store.transition(shot_id, ShotStatus::Processing).await?;
    tracing::info!(shot_id = %shot_id, video = %record.video_path.display(), "Processing shot");

    let outcome = match analyze_shot(ctx, shot_id, record.video_path).await {
        Ok(result) => ShotOutcome::from(result),
        Err(e) if e.is_shot_failure() => {
            tracing::warn!(shot_id = %shot_id, code = e.code(), error = %e, "Shot analysis failed");
            ShotOutcome::failure(e.code(), e.to_string())
        }
        Err(e) => {
            tracing::error!(shot_id = %shot_id, error = %e, "Shot job errored");
            let failure = ShotOutcome::failure(e.code(), "An internal error occurred");
            if let Err(store_err) = ctx.store.save_outcome(shot_id, &failure).await {
                tracing::error!(
                    shot_id = %shot_id,
                    error = %store_err,
                    "Failed to mark shot as failed",
                );
            }
            return Err(e);
        }
    };

    ctx.store.save_outcome(shot_id, &outcome).await?;
    tracing::info!(shot_id = %shot_id, status = %outcome.status(), "Shot finished");
    Ok(outcome)
}

async fn analyze_shot(
    ctx: &JobContext,
    shot_id: ShotId,
    video_path: PathBuf,
) -> Result<ShotResult, WorkerError> {
    let series = ctx.poses.extract(&video_path, ctx.sample_fps).await?;

    let analyzer = Arc::clone(&ctx.analyzer);
    let (analysis, series) = tokio::task::spawn_blocking(move || {
        let analysis = analyzer.analyze(&series);
        (analysis, series)
    })
    .await?;
    let analysis = analysis?;

    tracing::info!(
        shot_id = %shot_id,
        overall_score = analysis.report.overall_score,
        side = %analysis.report.side,
        release = analysis.keyframes.release,
        "Shot analysed",
    );

    let replays = match &ctx.renderer {
        Some(renderer) => {
            let targets = render_targets(&series, &analysis.keyframes);
            let renderer = Arc::clone(renderer);
            tokio::task::spawn_blocking(move || {
                render_replays(renderer.as_ref(), shot_id, &video_path, targets)
            })
            .await?
        }
        None => Vec::new(),
    };

    Ok(ShotResult {
        report: analysis.report,
        keyframes: analysis.keyframes,
        replays,
    })
}

/// `(name, source frame, landmarks)` for each keyframe.
fn render_targets(
    series: &LandmarkSeries,
    keyframes: &KeyframeSet,
) -> Vec<(&'static str, u64, Option<JointMap>)> {
    let Some(sources) = keyframes.source_frames(series) else {
        return Vec::new();
    };
    sources
        .into_iter()
        .zip(keyframes.named())
        .map(|((name, source_frame), (_, idx))| {
            let landmarks = series.get(idx).and_then(|f| f.landmarks.clone());
            (name, source_frame, landmarks)
        })
        .collect()
}

/// Render every target independently; failures are logged and skipped.
pub fn render_replays(
    renderer: &dyn ReplayRenderer,
    shot_id: ShotId,
    video_path: &Path,
    targets: Vec<(&'static str, u64, Option<JointMap>)>,
) -> Vec<Replay> {
    targets
        .into_iter()
        .filter_map(|(name, source_frame, landmarks)| {
            match renderer.render(shot_id, name, video_path, source_frame, landmarks.as_ref()) {
                Ok(replay) => Some(replay),
                Err(e) => {
                    tracing::warn!(
                        shot_id = %shot_id,
                        name,
                        source_frame,
                        error = %e,
                        "Replay rendering failed",
                    );
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use hoops_core::landmarks::{Joint, Landmark, LandmarkFrame};

    use super::*;
    use crate::render::RenderError;

    /// Fails for the `release` keyframe, succeeds otherwise.
    struct FlakyRenderer {
        calls: Mutex<Vec<String>>,
    }

    impl ReplayRenderer for FlakyRenderer {
        fn render(
            &self,
            _shot_id: ShotId,
            name: &str,
            _video_path: &Path,
            source_frame: u64,
            _landmarks: Option<&JointMap>,
        ) -> Result<Replay, RenderError> {
            self.calls.lock().unwrap().push(name.to_string());
            if name == "release" {
                return Err(RenderError::NoLandmarks(source_frame));
            }
            Ok(Replay {
                name: name.to_string(),
                url: format!("/media/{name}.png"),
                frame_idx: source_frame,
            })
        }
    }

    #[test]
    fn render_failure_skips_only_that_replay() {
        let renderer = FlakyRenderer {
            calls: Mutex::new(Vec::new()),
        };
        let mut lm = JointMap::new();
        lm.insert(Joint::RightWrist, Landmark::new(0.5, 0.5, 0.9));
        let targets = vec![
            ("set", 3, Some(lm.clone())),
            ("release", 6, Some(lm.clone())),
            ("follow", 9, Some(lm)),
        ];

        let replays = render_replays(&renderer, ShotId::new_v4(), Path::new("v.mp4"), targets);

        let names: Vec<&str> = replays.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["set", "follow"]);
        assert_eq!(renderer.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn render_targets_use_undecimated_frame_numbers() {
        let frames = (0..8u64)
            .map(|i| {
                if i == 5 {
                    return LandmarkFrame::invalid(i as f64 * 0.1, i * 3);
                }
                let mut lm = JointMap::new();
                lm.insert(Joint::RightWrist, Landmark::new(0.5, 0.5, 0.9));
                LandmarkFrame::valid(i as f64 * 0.1, i * 3, lm)
            })
            .collect();
        let series = LandmarkSeries::new(frames).unwrap();
        let keyframes = KeyframeSet::new(1, 3, 5, series.len()).unwrap();

        let targets = render_targets(&series, &keyframes);

        let summary: Vec<(&str, u64, bool)> = targets
            .iter()
            .map(|(name, frame, lm)| (*name, *frame, lm.is_some()))
            .collect();
        assert_eq!(
            summary,
            vec![("set", 3, true), ("release", 9, true), ("follow", 15, false)]
        );
    }
}
