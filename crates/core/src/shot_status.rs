//! Shot lifecycle status and transition rules.
//!
//! A shot moves `queued → processing → {done | failed}`. A failed shot may
//! be re-queued explicitly; a done shot is final.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const SHOT_STATUS_QUEUED: &str = "queued";
pub const SHOT_STATUS_PROCESSING: &str = "processing";
pub const SHOT_STATUS_DONE: &str = "done";
pub const SHOT_STATUS_FAILED: &str = "failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotStatus {
    Queued,
    Processing,
    Done,
    Failed,
}

impl ShotStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => SHOT_STATUS_QUEUED,
            Self::Processing => SHOT_STATUS_PROCESSING,
            Self::Done => SHOT_STATUS_DONE,
            Self::Failed => SHOT_STATUS_FAILED,
        }
    }

    pub fn can_transition_to(self, next: ShotStatus) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Processing)
                | (Self::Processing, Self::Done)
                | (Self::Processing, Self::Failed)
                | (Self::Failed, Self::Queued)
        )
    }
}

impl std::fmt::Display for ShotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a status change, naming both ends in the error.
pub fn validate_transition(from: ShotStatus, to: ShotStatus) -> Result<(), CoreError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid shot status transition: {from} -> {to}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_allowed() {
        assert!(validate_transition(ShotStatus::Queued, ShotStatus::Processing).is_ok());
        assert!(validate_transition(ShotStatus::Processing, ShotStatus::Done).is_ok());
        assert!(validate_transition(ShotStatus::Processing, ShotStatus::Failed).is_ok());
    }

    #[test]
    fn failed_shot_can_be_requeued() {
        assert!(ShotStatus::Failed.can_transition_to(ShotStatus::Queued));
    }

    #[test]
    fn done_is_final() {
        for next in [
            ShotStatus::Queued,
            ShotStatus::Processing,
            ShotStatus::Done,
            ShotStatus::Failed,
        ] {
            assert!(!ShotStatus::Done.can_transition_to(next));
        }
    }

    #[test]
    fn skipping_processing_is_rejected() {
        let result = validate_transition(ShotStatus::Queued, ShotStatus::Done);
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn serialized_form_matches_as_str() {
        for status in [
            ShotStatus::Queued,
            ShotStatus::Processing,
            ShotStatus::Done,
            ShotStatus::Failed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
