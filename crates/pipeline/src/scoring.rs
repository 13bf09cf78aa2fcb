//! Score and alert mapping.
//!
//! Each metric maps to a sub-score in `[0, 1]`; a fixed linear weighting
//! turns the sub-scores into an integer score out of 100. Alerts are
//! collected in evaluation order, stably ranked by severity and capped.

use serde::{Deserialize, Serialize};

use hoops_core::calibration::AnalysisConfig;

use crate::metrics::MetricSet;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Display rank; lower sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// AlertCode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCode {
    ElbowClosed,
    ElbowOpen,
    LowRelease,
    TrunkForward,
    NoExtension,
}

impl AlertCode {
    pub fn severity(self) -> Severity {
        match self {
            Self::LowRelease => Severity::High,
            Self::ElbowClosed | Self::ElbowOpen | Self::TrunkForward => Severity::Medium,
            Self::NoExtension => Severity::Low,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::ElbowClosed => "Elbow too closed at release",
            Self::ElbowOpen => "Elbow too open at release",
            Self::LowRelease => "Low release (wrist below shoulder)",
            Self::TrunkForward => "Leaning too far forward",
            Self::NoExtension => "Incomplete extension on the follow-through",
        }
    }
}

/// One actionable form correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub code: AlertCode,
    pub severity: Severity,
    pub message: String,
}

impl From<AlertCode> for Alert {
    fn from(code: AlertCode) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: code.message().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sub-scores
// ---------------------------------------------------------------------------

/// Full marks inside `[min, max]`, decaying linearly to 0 over `decay`
/// degrees past the nearer bound.
pub fn elbow_subscore(angle: f64, config: &AnalysisConfig) -> f64 {
    let (lo, hi) = (config.elbow_min_deg, config.elbow_max_deg);
    if (lo..=hi).contains(&angle) {
        return 1.0;
    }
    let dist = (angle - lo).abs().min((angle - hi).abs());
    (1.0 - dist / config.elbow_decay_deg).max(0.0)
}

/// 0 at or below shoulder height, reaching 1 at the target height.
pub fn release_subscore(height: f64, config: &AnalysisConfig) -> f64 {
    if height.is_nan() || height <= 0.0 {
        0.0
    } else {
        (height / config.release_height_target).min(1.0)
    }
}

/// Full marks up to the lean limit, decaying linearly to 0 over the next
/// `decay` degrees.
pub fn trunk_subscore(angle: f64, config: &AnalysisConfig) -> f64 {
    if angle <= config.trunk_max_deg {
        1.0
    } else {
        (1.0 - (angle - config.trunk_max_deg) / config.trunk_decay_deg).max(0.0)
    }
}

/// Per-metric sub-scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubScores {
    pub elbow: f64,
    pub release_height: f64,
    pub trunk: f64,
    pub follow_through: f64,
}

pub fn sub_scores(metrics: &MetricSet, config: &AnalysisConfig) -> SubScores {
    SubScores {
        elbow: elbow_subscore(metrics.elbow_angle_release, config),
        release_height: release_subscore(metrics.release_height, config),
        trunk: trunk_subscore(metrics.trunk_angle, config),
        follow_through: metrics.followthrough_score.clamp(0.0, 1.0),
    }
}

// ---------------------------------------------------------------------------
// Score + alerts
// ---------------------------------------------------------------------------

/// Map metrics to an integer score in `[0, 100]` and the ranked alerts.
pub fn score_and_alerts(metrics: &MetricSet, config: &AnalysisConfig) -> (u8, Vec<Alert>) {
    let subs = sub_scores(metrics, config);
    let w = &config.weights;

    let raw = w.elbow * subs.elbow
        + w.release_height * subs.release_height
        + w.trunk * subs.trunk
        + w.follow_through * subs.follow_through;
    let score = raw.round().clamp(0.0, 100.0) as u8;

    let mut alerts: Vec<Alert> = collect_alert_codes(metrics, config)
        .into_iter()
        .map(Alert::from)
        .collect();
    alerts.sort_by_key(|a| a.severity.rank());
    alerts.truncate(config.max_alerts);

    (score, alerts)
}

/// Triggered alert codes in evaluation order, before ranking.
fn collect_alert_codes(metrics: &MetricSet, config: &AnalysisConfig) -> Vec<AlertCode> {
    let mut codes = Vec::new();

    if metrics.elbow_angle_release < config.elbow_min_deg {
        codes.push(AlertCode::ElbowClosed);
    } else if metrics.elbow_angle_release > config.elbow_max_deg {
        codes.push(AlertCode::ElbowOpen);
    }
    if metrics.release_height <= 0.0 {
        codes.push(AlertCode::LowRelease);
    }
    if metrics.trunk_angle > config.trunk_max_deg {
        codes.push(AlertCode::TrunkForward);
    }
    if metrics.followthrough_score < 1.0 {
        codes.push(AlertCode::NoExtension);
    }

    codes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
