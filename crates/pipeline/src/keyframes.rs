//! Keyframe detection: locates the set, release and follow-through frames.
//!
//! The default detector is a heuristic on the wrist's vertical velocity.
//! It is a best-effort signal; anything implementing [`KeyframeDetector`]
//! can replace it without changing the [`KeyframeSet`] contract.

use serde::{Deserialize, Serialize};

use hoops_core::calibration::AnalysisConfig;
use hoops_core::landmarks::LandmarkSeries;
use hoops_core::side::ArmJoints;

use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// KeyframeSet
// ---------------------------------------------------------------------------

/// Series positions of the three shot phases.
///
/// Always satisfies `set <= release <= follow < series.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyframeSet {
    pub set: usize,
    pub release: usize,
    pub follow: usize,
}

/// Replay names, in phase order.
pub const KEYFRAME_NAMES: [&str; 3] = ["set", "release", "follow"];

impl KeyframeSet {
    /// Build a keyframe set for a series of `len` frames, checking ordering
    /// and bounds instead of trusting the detector.
    pub fn new(set: usize, release: usize, follow: usize, len: usize) -> Result<Self, AnalysisError> {
        if !(set <= release && release <= follow) {
            return Err(AnalysisError::KeyframeDetectionFailed(format!(
                "keyframes out of order: set={set} release={release} follow={follow}"
            )));
        }
        if follow >= len {
            return Err(AnalysisError::KeyframeDetectionFailed(format!(
                "follow frame {follow} outside series of {len} frames"
            )));
        }
        Ok(Self {
            set,
            release,
            follow,
        })
    }

    /// `(name, series position)` pairs in phase order.
    pub fn named(&self) -> [(&'static str, usize); 3] {
        [
            (KEYFRAME_NAMES[0], self.set),
            (KEYFRAME_NAMES[1], self.release),
            (KEYFRAME_NAMES[2], self.follow),
        ]
    }

    /// Map each keyframe to its frame number in the undecimated video.
    pub fn source_frames(&self, series: &LandmarkSeries) -> Option<[(&'static str, u64); 3]> {
        let source = |idx: usize| series.get(idx).map(|f| f.source_frame);
        Some([
            (KEYFRAME_NAMES[0], source(self.set)?),
            (KEYFRAME_NAMES[1], source(self.release)?),
            (KEYFRAME_NAMES[2], source(self.follow)?),
        ])
    }
}

// ---------------------------------------------------------------------------
// KeyframeDetector
// ---------------------------------------------------------------------------

/// Strategy for locating keyframes in a gated series.
pub trait KeyframeDetector: Send + Sync {
    fn detect(&self, series: &LandmarkSeries, arm: &ArmJoints) -> Result<KeyframeSet, AnalysisError>;
}

/// Release at the wrist's fastest upward motion, set at its highest point
/// up to release, follow-through a fixed number of samples later.
///
/// The global fastest-rising sample is taken as release no matter where it
/// falls in the clip; there is no lower bound on its position.
#[derive(Debug, Clone)]
pub struct DerivativeKeyframeDetector {
    pub min_motion_frames: usize,
    pub follow_offset_frames: usize,
    pub timestamp_epsilon: f64,
}

impl DerivativeKeyframeDetector {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            min_motion_frames: config.min_motion_frames,
            follow_offset_frames: config.follow_offset_frames,
            timestamp_epsilon: config.timestamp_epsilon,
        }
    }
}

impl Default for DerivativeKeyframeDetector {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl KeyframeDetector for DerivativeKeyframeDetector {
    fn detect(&self, series: &LandmarkSeries, arm: &ArmJoints) -> Result<KeyframeSet, AnalysisError> {
        // (series position, timestamp, wrist y) for valid frames that report the wrist.
        let samples: Vec<(usize, f64, f64)> = series
            .valid_frames()
            .filter_map(|(idx, frame, lm)| lm.get(&arm.wrist).map(|w| (idx, frame.timestamp, w.y)))
            .collect();

        if samples.len() < self.min_motion_frames {
            return Err(AnalysisError::InsufficientMotionData {
                valid_frames: samples.len(),
                required: self.min_motion_frames,
            });
        }

        let ys: Vec<f64> = samples.iter().map(|s| s.2).collect();
        let ts: Vec<f64> = samples.iter().map(|s| s.1).collect();
        if ys.iter().any(|y| !y.is_finite()) {
            return Err(AnalysisError::KeyframeDetectionFailed(
                "wrist trajectory contains non-finite coordinates".to_string(),
            ));
        }

        let dy = gradient(&ys, &ts, self.timestamp_epsilon);
        let rel_k = argmin(&dy).ok_or_else(|| {
            AnalysisError::KeyframeDetectionFailed("wrist velocity is undefined".to_string())
        })?;
        let set_k = argmin(&ys[..=rel_k]).ok_or_else(|| {
            AnalysisError::KeyframeDetectionFailed("no wrist height before release".to_string())
        })?;

        let release = samples[rel_k].0;
        let set = samples[set_k].0;
        let last = series.len().saturating_sub(1);
        let follow = release.saturating_add(self.follow_offset_frames).min(last);

        tracing::debug!(
            motion_samples = samples.len(),
            set,
            release,
            follow,
            release_velocity = dy[rel_k],
            "Keyframes detected",
        );

        KeyframeSet::new(set, release, follow, series.len())
    }
}

// ---------------------------------------------------------------------------
// Numerics
// ---------------------------------------------------------------------------

/// Discrete derivative `dy/dt` at every sample.
///
/// Interior samples use the second-order centered difference for uneven
/// spacing; the endpoints use one-sided differences. `eps` is added to
/// every timestamp delta so repeated timestamps stay finite. Fewer than two
/// samples yields all zeros.
pub fn gradient(ys: &[f64], ts: &[f64], eps: f64) -> Vec<f64> {
    let n = ys.len().min(ts.len());
    if n < 2 {
        return vec![0.0; n];
    }

    let mut out = Vec::with_capacity(n);
    out.push((ys[1] - ys[0]) / (ts[1] - ts[0] + eps));

    for i in 1..n - 1 {
        let hs = ts[i] - ts[i - 1] + eps;
        let hd = ts[i + 1] - ts[i] + eps;
        let num = hs * hs * ys[i + 1] + (hd * hd - hs * hs) * ys[i] - hd * hd * ys[i - 1];
        out.push(num / (hs * hd * (hd + hs)));
    }

    out.push((ys[n - 1] - ys[n - 2]) / (ts[n - 1] - ts[n - 2] + eps));
    out
}

/// Index of the smallest value, first occurrence on ties. `NaN`s never win.
pub fn argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
