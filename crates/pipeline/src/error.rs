use hoops_core::error::CoreError;
use hoops_core::landmarks::Joint;

/// Terminal outcomes of a failed analysis run.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Pose quality insufficient: valid frame ratio {ratio:.2}")]
    PoseQualityInsufficient { ratio: f64 },

    #[error("Insufficient motion data: {valid_frames} valid frames, need at least {required}")]
    InsufficientMotionData { valid_frames: usize, required: usize },

    #[error("Keyframe detection failed: {0}")]
    KeyframeDetectionFailed(String),

    #[error("Missing landmark {joint} at frame {frame}")]
    MissingLandmark { frame: usize, joint: Joint },

    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(#[from] CoreError),
}

impl AnalysisError {
    /// Short machine-readable reason persisted with a failed shot.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PoseQualityInsufficient { .. } => "pose_quality_insufficient",
            Self::InsufficientMotionData { .. } => "insufficient_motion_data",
            Self::KeyframeDetectionFailed(_) => "keyframe_detection_failed",
            Self::MissingLandmark { .. } => "missing_landmark",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}
