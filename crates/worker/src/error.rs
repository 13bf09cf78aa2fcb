use hoops_core::error::CoreError;
use hoops_core::shot_status::ShotStatus;
use hoops_core::types::ShotId;
use hoops_pipeline::AnalysisError;

/// Failure of a worker-side operation.
///
/// [`WorkerError::Analysis`] and [`WorkerError::Pose`] describe the shot
/// itself and end up persisted as a failed outcome. Everything else is an
/// infrastructure problem.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Shot store error: {0}")]
    Store(String),

    #[error("Pose extraction failed: {0}")]
    Pose(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Shot {0} not found")]
    ShotNotFound(ShotId),

    #[error("Invalid status transition for shot {shot_id}: {from} -> {to}")]
    InvalidTransition {
        shot_id: ShotId,
        from: ShotStatus,
        to: ShotStatus,
    },

    #[error(transparent)]
    Config(#[from] CoreError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Job queue error: {0}")]
    Queue(String),
}

impl WorkerError {
    /// Machine-readable reason stored with a failed shot.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Analysis(e) => e.code(),
            Self::Pose(_) => "pose_extraction_failed",
            _ => "internal_error",
        }
    }

    /// `true` for failures caused by the shot's own data rather than by the
    /// worker's infrastructure.
    pub fn is_shot_failure(&self) -> bool {
        matches!(self, Self::Analysis(_) | Self::Pose(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_errors_keep_their_code() {
        let err = WorkerError::from(AnalysisError::PoseQualityInsufficient { ratio: 0.3 });
        assert_eq!(err.code(), "pose_quality_insufficient");
        assert!(err.is_shot_failure());
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        let err = WorkerError::Store("disk full".into());
        assert_eq!(err.code(), "internal_error");
        assert!(!err.is_shot_failure());
    }

    #[test]
    fn transition_message_names_both_states() {
        let err = WorkerError::InvalidTransition {
            shot_id: ShotId::nil(),
            from: ShotStatus::Done,
            to: ShotStatus::Processing,
        };
        assert!(err.to_string().contains("done -> processing"));
    }
}
