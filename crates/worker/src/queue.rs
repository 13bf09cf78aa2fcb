//! In-process job queue.
//!
//! [`JobQueue`] hands jobs to the dispatcher over an unbounded `mpsc`
//! channel and tracks which shots are queued or running, so a shot is
//! never analysed twice at the same time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use hoops_core::types::{JobId, ShotId};

use crate::error::WorkerError;

/// One requested analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub shot_id: ShotId,
}

/// Shots currently queued or running.
#[derive(Debug, Clone, Default)]
pub struct ActiveShots {
    inner: Arc<Mutex<HashSet<ShotId>>>,
}

impl ActiveShots {
    /// Returns `false` when the shot was already active.
    fn claim(&self, shot_id: ShotId) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(shot_id)
    }

    /// Called by the dispatcher once a job is finished or abandoned.
    pub fn release(&self, shot_id: ShotId) {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&shot_id);
    }

    pub fn contains(&self, shot_id: ShotId) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&shot_id)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receiving half handed to the dispatcher.
pub struct JobReceiver {
    pub(crate) jobs: mpsc::UnboundedReceiver<Job>,
    pub(crate) active: ActiveShots,
}

/// Producer side. Cheap to clone; the dispatcher stops once every clone
/// is dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<Job>,
    active: ActiveShots,
}

impl JobQueue {
    pub fn new() -> (Self, JobReceiver) {
        let (sender, jobs) = mpsc::unbounded_channel();
        let active = ActiveShots::default();
        (
            Self {
                sender,
                active: active.clone(),
            },
            JobReceiver { jobs, active },
        )
    }

    /// Queue a shot for analysis, refusing one that is already queued or
    /// running.
    pub fn enqueue(&self, shot_id: ShotId) -> Result<JobId, WorkerError> {
        if !self.active.claim(shot_id) {
            return Err(WorkerError::Queue(format!(
                "shot {shot_id} is already queued or running"
            )));
        }

        let job = Job {
            id: JobId::new_v4(),
            shot_id,
        };
        if self.sender.send(job).is_err() {
            self.active.release(shot_id);
            return Err(WorkerError::Queue("dispatcher has stopped".to_string()));
        }

        tracing::debug!(job_id = %job.id, shot_id = %shot_id, "Job enqueued");
        Ok(job.id)
    }

    pub fn active(&self) -> &ActiveShots {
        &self.active
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn duplicate_shot_is_refused() {
        let (queue, _rx) = JobQueue::new();
        let shot = ShotId::new_v4();

        queue.enqueue(shot).unwrap();
        assert_matches!(queue.enqueue(shot), Err(WorkerError::Queue(_)));
        assert_eq!(queue.active().len(), 1);
    }

    #[test]
    fn released_shot_can_be_queued_again() {
        let (queue, _rx) = JobQueue::new();
        let shot = ShotId::new_v4();

        let first = queue.enqueue(shot).unwrap();
        queue.active().release(shot);
        let second = queue.enqueue(shot).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn closed_channel_releases_claim() {
        let (queue, rx) = JobQueue::new();
        drop(rx);
        let shot = ShotId::new_v4();

        assert_matches!(queue.enqueue(shot), Err(WorkerError::Queue(_)));
        assert!(!queue.active().contains(shot));
    }

    #[tokio::test]
    async fn jobs_arrive_in_order() {
        let (queue, mut rx) = JobQueue::new();
        let a = ShotId::new_v4();
        let b = ShotId::new_v4();
        queue.enqueue(a).unwrap();
        queue.enqueue(b).unwrap();

        assert_eq!(rx.jobs.recv().await.map(|j| j.shot_id), Some(a));
        assert_eq!(rx.jobs.recv().await.map(|j| j.shot_id), Some(b));
    }
}
