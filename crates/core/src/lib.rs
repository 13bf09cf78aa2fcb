//! Domain vocabulary for shot analysis.
//!
//! Holds the landmark data model, the shooting-side lookup table, the shot
//! status lifecycle, plane geometry helpers and the calibration constants
//! shared by the pipeline and the worker. Has no internal dependencies.

pub mod calibration;
pub mod error;
pub mod geometry;
pub mod landmarks;
pub mod shot_status;
pub mod side;
pub mod types;
