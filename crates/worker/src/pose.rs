//! Pose-estimation collaborator.
//!
//! The worker never runs a pose model itself; it consumes landmark tracks
//! produced upstream. [`JsonPoseSource`] reads them from a sidecar file
//! next to the video.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use hoops_core::landmarks::{JointMap, LandmarkSeries};

use crate::error::WorkerError;

/// Sidecar suffix appended to the video path.
pub const LANDMARKS_SUFFIX: &str = ".landmarks.json";

#[async_trait]
pub trait PoseSource: Send + Sync {
    /// Produce the landmark series of `video_path` sampled at `sample_fps`.
    async fn extract(&self, video_path: &Path, sample_fps: f64)
        -> Result<LandmarkSeries, WorkerError>;
}

/// Per-source-frame landmark track as written by the pose extractor.
///
/// `frames[i]` is `null` when no pose was found in source frame `i`.
#[derive(Debug, Deserialize)]
pub struct LandmarkTrack {
    /// Container frame rate; missing or non-positive falls back to 30.
    #[serde(default)]
    pub fps: f64,
    pub frames: Vec<Option<JointMap>>,
}

/// Reads `<video>.landmarks.json` and decimates it to the sample rate.
#[derive(Debug, Clone, Default)]
pub struct JsonPoseSource;

impl JsonPoseSource {
    pub fn track_path(video_path: &Path) -> PathBuf {
        let mut name = video_path.as_os_str().to_owned();
        name.push(LANDMARKS_SUFFIX);
        PathBuf::from(name)
    }
}

#[async_trait]
impl PoseSource for JsonPoseSource {
    async fn extract(
        &self,
        video_path: &Path,
        sample_fps: f64,
    ) -> Result<LandmarkSeries, WorkerError> {
        let path = Self::track_path(video_path);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| WorkerError::Pose(format!("cannot read {}: {e}", path.display())))?;

        let track: LandmarkTrack = serde_json::from_slice(&bytes)
            .map_err(|e| WorkerError::Pose(format!("malformed {}: {e}", path.display())))?;
        let source_frames = track.frames.len();

        let series = LandmarkSeries::from_track(track.fps, sample_fps, track.frames)
            .map_err(|e| WorkerError::Pose(e.to_string()))?;

        tracing::debug!(
            video = %video_path.display(),
            source_frames,
            sampled_frames = series.len(),
            valid_frames = series.valid_count(),
            "Landmark track loaded",
        );
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const TRACK: &str = r#"{
        "fps": 30.0,
        "frames": [
            {"right_wrist": {"x": 0.5, "y": 0.4, "v": 0.9}},
            null,
            null,
            {"right_wrist": {"x": 0.5, "y": 0.3, "v": 0.8}},
            null,
            null,
            null
        ]
    }"#;

    #[test]
    fn track_path_appends_suffix() {
        assert_eq!(
            JsonPoseSource::track_path(Path::new("/tmp/shot.mp4")),
            PathBuf::from("/tmp/shot.mp4.landmarks.json")
        );
    }

    #[tokio::test]
    async fn decimates_to_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("shot.mp4");
        std::fs::write(JsonPoseSource::track_path(&video), TRACK).unwrap();

        let series = JsonPoseSource.extract(&video, 10.0).await.unwrap();

        // step = 3: source frames 0, 3, 6.
        assert_eq!(series.len(), 3);
        let sources: Vec<u64> = series.frames().iter().map(|f| f.source_frame).collect();
        assert_eq!(sources, vec![0, 3, 6]);
        assert!((series.frames()[1].timestamp - 0.1).abs() < 1e-12);
        assert_eq!(series.valid_count(), 2);
        assert!(!series.frames()[2].is_valid());
    }

    #[tokio::test]
    async fn missing_track_is_a_pose_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = JsonPoseSource
            .extract(&dir.path().join("nope.mp4"), 10.0)
            .await;
        assert_matches!(result, Err(WorkerError::Pose(_)));
    }

    #[tokio::test]
    async fn malformed_track_is_a_pose_error() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("bad.mp4");
        std::fs::write(JsonPoseSource::track_path(&video), "{\"frames\": 7}").unwrap();
        assert_matches!(
            JsonPoseSource.extract(&video, 10.0).await,
            Err(WorkerError::Pose(msg)) if msg.contains("malformed")
        );
    }

    #[tokio::test]
    async fn missing_fps_falls_back_to_thirty() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("nofps.mp4");
        let frames = vec!["null"; 9].join(",");
        std::fs::write(
            JsonPoseSource::track_path(&video),
            format!("{{\"frames\": [{frames}]}}"),
        )
        .unwrap();

        let series = JsonPoseSource.extract(&video, 10.0).await.unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.valid_count(), 0);
    }
}
