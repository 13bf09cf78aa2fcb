//! Pipeline orchestrator.
//!
//! Runs quality gate → side selection → keyframes → metrics → scoring in
//! order and returns the first failure unchanged. Holds no mutable state,
//! so one analyzer can serve any number of threads.

use hoops_core::calibration::AnalysisConfig;
use hoops_core::landmarks::LandmarkSeries;

use crate::error::AnalysisError;
use crate::keyframes::{DerivativeKeyframeDetector, KeyframeDetector, KeyframeSet};
use crate::metrics::compute_metrics;
use crate::quality::check_quality;
use crate::report::ShotReport;
use crate::scoring::score_and_alerts;
use crate::side_selector::choose_shooting_side;

/// Report plus the keyframes it was measured at.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotAnalysis {
    pub report: ShotReport,
    pub keyframes: KeyframeSet,
}

pub struct ShotAnalyzer {
    config: AnalysisConfig,
    detector: Box<dyn KeyframeDetector>,
}

impl ShotAnalyzer {
    /// Validate `config` and build an analyzer using the derivative
    /// keyframe heuristic.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let detector = Box::new(DerivativeKeyframeDetector::from_config(&config));
        Ok(Self { config, detector })
    }

    /// Swap in a different keyframe detector.
    pub fn with_detector(mut self, detector: impl KeyframeDetector + 'static) -> Self {
        self.detector = Box::new(detector);
        self
    }

    pub fn analyze(&self, series: &LandmarkSeries) -> Result<ShotAnalysis, AnalysisError> {
        let quality = check_quality(series, self.config.min_valid_ratio)?;

        let side = choose_shooting_side(series);
        let arm = side.arm();

        // Detectors are pluggable; their output is rechecked against the series.
        let detected = self.detector.detect(series, &arm)?;
        let keyframes =
            KeyframeSet::new(detected.set, detected.release, detected.follow, series.len())?;
        let metrics = compute_metrics(series, &arm, &keyframes)?;
        let (overall_score, alerts) = score_and_alerts(&metrics, &self.config);

        tracing::debug!(
            overall_score,
            side = %side,
            alert_count = alerts.len(),
            "Shot analysed",
        );

        Ok(ShotAnalysis {
            report: ShotReport {
                overall_score,
                side,
                metrics,
                alerts,
                quality,
            },
            keyframes,
        })
    }
}

impl Default for ShotAnalyzer {
    fn default() -> Self {
        Self {
            config: AnalysisConfig::default(),
            detector: Box::new(DerivativeKeyframeDetector::default()),
        }
    }
}
