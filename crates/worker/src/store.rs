//! Shot persistence.
//!
//! [`ShotStore`] is the seam the job runner writes status changes and
//! outcomes through. [`InMemoryShotStore`] backs the binary and the tests.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use hoops_core::shot_status::{validate_transition, ShotStatus};
use hoops_core::types::{ShotId, Timestamp};
use hoops_pipeline::{KeyframeSet, ShotReport};

use crate::error::WorkerError;
use crate::render::Replay;

// ---------------------------------------------------------------------------
// Records and outcomes
// ---------------------------------------------------------------------------

/// One uploaded shot as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    pub id: ShotId,
    pub status: ShotStatus,
    pub video_path: PathBuf,
    /// Serialized [`ShotOutcome`], set once the shot reaches a terminal status.
    pub result: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Everything stored for a successfully analysed shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotResult {
    #[serde(flatten)]
    pub report: ShotReport,
    pub keyframes: KeyframeSet,
    pub replays: Vec<Replay>,
}

/// Reason stored with a failed shot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotFailure {
    /// Machine-readable code, e.g. `pose_quality_insufficient`.
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ShotOutcome {
    Success(Box<ShotResult>),
    Failure(ShotFailure),
}

impl ShotOutcome {
    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure(ShotFailure {
            error: code.into(),
            message: message.into(),
        })
    }

    /// Terminal status this outcome moves the shot to.
    pub fn status(&self) -> ShotStatus {
        match self {
            Self::Success(_) => ShotStatus::Done,
            Self::Failure(_) => ShotStatus::Failed,
        }
    }
}

impl From<ShotResult> for ShotOutcome {
    fn from(result: ShotResult) -> Self {
        Self::Success(Box::new(result))
    }
}

// ---------------------------------------------------------------------------
// ShotStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ShotStore: Send + Sync {
    /// Register a new shot in `queued` status.
    async fn create(&self, video_path: PathBuf) -> Result<ShotRecord, WorkerError>;

    async fn get(&self, id: ShotId) -> Result<Option<ShotRecord>, WorkerError>;

    /// Move a shot to `to`, rejecting transitions the lifecycle forbids.
    async fn transition(&self, id: ShotId, to: ShotStatus) -> Result<ShotRecord, WorkerError>;

    /// Persist the outcome and move the shot to the matching terminal status.
    async fn save_outcome(
        &self,
        id: ShotId,
        outcome: &ShotOutcome,
    ) -> Result<ShotRecord, WorkerError>;
}

/// Process-local store keyed by shot id.
#[derive(Default)]
pub struct InMemoryShotStore {
    shots: RwLock<HashMap<ShotId, ShotRecord>>,
}

impl InMemoryShotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records, oldest first.
    pub async fn list(&self) -> Vec<ShotRecord> {
        let mut records: Vec<ShotRecord> = self.shots.read().await.values().cloned().collect();
        records.sort_by_key(|r| r.created_at);
        records
    }
}

fn apply_transition(record: &mut ShotRecord, to: ShotStatus) -> Result<(), WorkerError> {
    validate_transition(record.status, to).map_err(|_| WorkerError::InvalidTransition {
        shot_id: record.id,
        from: record.status,
        to,
    })?;
    record.status = to;
    record.updated_at = Utc::now();
    Ok(())
}

#[async_trait]
impl ShotStore for InMemoryShotStore {
    async fn create(&self, video_path: PathBuf) -> Result<ShotRecord, WorkerError> {
        let now = Utc::now();
        let record = ShotRecord {
            id: ShotId::new_v4(),
            status: ShotStatus::Queued,
            video_path,
            result: None,
            created_at: now,
            updated_at: now,
        };
        self.shots.write().await.insert(record.id, record.clone());
        tracing::debug!(shot_id = %record.id, "Shot created");
        Ok(record)
    }

    async fn get(&self, id: ShotId) -> Result<Option<ShotRecord>, WorkerError> {
        Ok(self.shots.read().await.get(&id).cloned())
    }

    async fn transition(&self, id: ShotId, to: ShotStatus) -> Result<ShotRecord, WorkerError> {
        let mut shots = self.shots.write().await;
        let record = shots.get_mut(&id).ok_or(WorkerError::ShotNotFound(id))?;
        apply_transition(record, to)?;
        if to == ShotStatus::Queued {
            record.result = None;
        }
        Ok(record.clone())
    }

    async fn save_outcome(
        &self,
        id: ShotId,
        outcome: &ShotOutcome,
    ) -> Result<ShotRecord, WorkerError> {
        let value = serde_json::to_value(outcome)
            .map_err(|e| WorkerError::Store(format!("cannot serialize outcome: {e}")))?;

        let mut shots = self.shots.write().await;
        let record = shots.get_mut(&id).ok_or(WorkerError::ShotNotFound(id))?;
        apply_transition(record, outcome.status())?;
        record.result = Some(value);
        Ok(record.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
