//! The immutable artifact of a successful analysis run.
//!
//! Field names are the persisted contract; renaming any of them breaks
//! stored results.

use serde::{Deserialize, Serialize};

use hoops_core::side::ShootingSide;

use crate::metrics::MetricSet;
use crate::scoring::Alert;

/// How much of the clip the pose engine could use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    /// Fraction of sampled frames with a valid pose.
    #[serde(rename = "pose_ok_ratio")]
    pub valid_ratio: f64,
    /// Number of sampled frames in the series.
    pub frames_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotReport {
    /// Weighted form score in `[0, 100]`.
    pub overall_score: u8,
    pub side: ShootingSide,
    pub metrics: MetricSet,
    /// At most five, highest severity first.
    pub alerts: Vec<Alert>,
    pub quality: QualitySummary,
}
