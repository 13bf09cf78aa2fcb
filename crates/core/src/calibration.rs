//! Calibration constants and the overridable analysis configuration.
//!
//! The thresholds below are calibration values tuned against normalized
//! landmark coordinates, not invariants of the geometry. Every one of them
//! can be overridden through [`AnalysisConfig`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Quality gate / keyframe constants
// ---------------------------------------------------------------------------

/// Minimum fraction of sampled frames that must carry a valid pose.
pub const DEFAULT_MIN_VALID_RATIO: f64 = 0.5;

/// Minimum number of valid frames for a stable derivative estimate.
pub const DEFAULT_MIN_MOTION_FRAMES: usize = 10;

/// Follow-through frame is this many samples after release.
pub const DEFAULT_FOLLOW_OFFSET_FRAMES: usize = 3;

/// Upper bound accepted for a follow-through offset override.
pub const MAX_FOLLOW_OFFSET_FRAMES: usize = 300;

/// Added to timestamp deltas so duplicate timestamps never divide by zero.
pub const DEFAULT_TIMESTAMP_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Scoring constants
// ---------------------------------------------------------------------------

/// Elbow angle at release scoring full marks, in degrees.
pub const DEFAULT_ELBOW_MIN_DEG: f64 = 70.0;
pub const DEFAULT_ELBOW_MAX_DEG: f64 = 110.0;
/// Degrees past the nearer band edge over which the elbow sub-score decays to 0.
pub const DEFAULT_ELBOW_DECAY_DEG: f64 = 40.0;

/// Wrist-above-shoulder height that earns the full release sub-score.
pub const DEFAULT_RELEASE_HEIGHT_TARGET: f64 = 0.06;

/// Trunk lean tolerated without penalty, in degrees.
pub const DEFAULT_TRUNK_MAX_DEG: f64 = 25.0;
/// Degrees past the limit over which the trunk sub-score decays to 0.
pub const DEFAULT_TRUNK_DECAY_DEG: f64 = 25.0;

/// Maximum number of alerts kept after ranking.
pub const DEFAULT_MAX_ALERTS: usize = 5;

// ---------------------------------------------------------------------------
// ScoreWeights
// ---------------------------------------------------------------------------

/// Points each metric contributes at a perfect sub-score. Must sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub elbow: f64,
    pub release_height: f64,
    pub trunk: f64,
    pub follow_through: f64,
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.elbow + self.release_height + self.trunk + self.follow_through
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            elbow: 30.0,
            release_height: 25.0,
            trunk: 25.0,
            follow_through: 20.0,
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisConfig
// ---------------------------------------------------------------------------

/// Every policy value the pipeline consults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub min_valid_ratio: f64,
    pub min_motion_frames: usize,
    pub follow_offset_frames: usize,
    pub timestamp_epsilon: f64,
    pub elbow_min_deg: f64,
    pub elbow_max_deg: f64,
    pub elbow_decay_deg: f64,
    pub release_height_target: f64,
    pub trunk_max_deg: f64,
    pub trunk_decay_deg: f64,
    pub weights: ScoreWeights,
    pub max_alerts: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_valid_ratio: DEFAULT_MIN_VALID_RATIO,
            min_motion_frames: DEFAULT_MIN_MOTION_FRAMES,
            follow_offset_frames: DEFAULT_FOLLOW_OFFSET_FRAMES,
            timestamp_epsilon: DEFAULT_TIMESTAMP_EPSILON,
            elbow_min_deg: DEFAULT_ELBOW_MIN_DEG,
            elbow_max_deg: DEFAULT_ELBOW_MAX_DEG,
            elbow_decay_deg: DEFAULT_ELBOW_DECAY_DEG,
            release_height_target: DEFAULT_RELEASE_HEIGHT_TARGET,
            trunk_max_deg: DEFAULT_TRUNK_MAX_DEG,
            trunk_decay_deg: DEFAULT_TRUNK_DECAY_DEG,
            weights: ScoreWeights::default(),
            max_alerts: DEFAULT_MAX_ALERTS,
        }
    }
}

impl AnalysisConfig {
    /// Reject overrides that would break the scoring arithmetic or the
    /// keyframe contract.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_unit_range(self.min_valid_ratio, "min_valid_ratio")?;

        // Centered differences need at least two samples.
        if self.min_motion_frames < 2 {
            return Err(CoreError::Validation(format!(
                "min_motion_frames must be >= 2, got {}",
                self.min_motion_frames
            )));
        }
        if self.follow_offset_frames > MAX_FOLLOW_OFFSET_FRAMES {
            return Err(CoreError::Validation(format!(
                "follow_offset_frames must be <= {MAX_FOLLOW_OFFSET_FRAMES}, got {}",
                self.follow_offset_frames
            )));
        }
        validate_positive(self.timestamp_epsilon, "timestamp_epsilon")?;

        if !(0.0..=180.0).contains(&self.elbow_min_deg)
            || !(0.0..=180.0).contains(&self.elbow_max_deg)
        {
            return Err(CoreError::Validation(format!(
                "elbow band must lie within [0, 180], got [{}, {}]",
                self.elbow_min_deg, self.elbow_max_deg
            )));
        }
        if self.elbow_min_deg > self.elbow_max_deg {
            return Err(CoreError::Validation(format!(
                "elbow_min_deg ({}) must be <= elbow_max_deg ({})",
                self.elbow_min_deg, self.elbow_max_deg
            )));
        }
        validate_positive(self.elbow_decay_deg, "elbow_decay_deg")?;
        validate_positive(self.release_height_target, "release_height_target")?;
        validate_positive(self.trunk_decay_deg, "trunk_decay_deg")?;
        if !(0.0..=180.0).contains(&self.trunk_max_deg) {
            return Err(CoreError::Validation(format!(
                "trunk_max_deg must be between 0 and 180, got {}",
                self.trunk_max_deg
            )));
        }

        let w = &self.weights;
        for (name, value) in [
            ("weights.elbow", w.elbow),
            ("weights.release_height", w.release_height),
            ("weights.trunk", w.trunk),
            ("weights.follow_through", w.follow_through),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::Validation(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if (w.total() - 100.0).abs() > 1e-9 {
            return Err(CoreError::Validation(format!(
                "score weights must sum to 100, got {}",
                w.total()
            )));
        }

        if self.max_alerts == 0 {
            return Err(CoreError::Validation(
                "max_alerts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Validate that a value falls within `[0.0, 1.0]`.
pub fn validate_unit_range(value: f64, name: &str) -> Result<(), CoreError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CoreError::Validation(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

fn validate_positive(value: f64, name: &str) -> Result<(), CoreError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(CoreError::Validation(format!(
            "{name} must be > 0, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
