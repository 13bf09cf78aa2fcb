//! Shot-analysis pipeline.
//!
//! Turns a noisy landmark series into a shooting side, three keyframes,
//! a handful of geometric metrics and finally a score with ranked alerts.
//! Every stage is a pure, synchronous function; [`analyzer::ShotAnalyzer`]
//! sequences them and stops at the first failure.

pub mod analyzer;
pub mod error;
pub mod keyframes;
pub mod metrics;
pub mod quality;
pub mod report;
pub mod scoring;
pub mod side_selector;

pub use analyzer::{ShotAnalysis, ShotAnalyzer};
pub use error::AnalysisError;
pub use keyframes::{DerivativeKeyframeDetector, KeyframeDetector, KeyframeSet};
pub use metrics::MetricSet;
pub use report::{QualitySummary, ShotReport};
pub use scoring::{Alert, AlertCode, Severity};
