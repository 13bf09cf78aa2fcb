//! Background job dispatcher.
//!
//! Drains the [`JobQueue`](crate::queue::JobQueue) and runs
//! [`process_shot`] for each job, at most `max_concurrent` at a time.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::job::{process_shot, JobContext};
use crate::queue::{ActiveShots, Job, JobReceiver};

pub struct Dispatcher {
    ctx: Arc<JobContext>,
    jobs: mpsc::UnboundedReceiver<Job>,
    active: ActiveShots,
    limit: Arc<Semaphore>,
    max_concurrent: usize,
}

impl Dispatcher {
    pub fn new(ctx: Arc<JobContext>, receiver: JobReceiver, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            ctx,
            jobs: receiver.jobs,
            active: receiver.active,
            limit: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    /// Run until the cancellation token fires or every queue handle is
    /// dropped and the queue drained. Jobs already running are always
    /// awaited; jobs still waiting for a slot are abandoned on cancel.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut tasks = JoinSet::new();
        tracing::info!(max_concurrent = self.max_concurrent, "Job dispatcher started");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Job dispatcher shutting down");
                    break;
                }
                job = self.jobs.recv() => match job {
                    Some(job) => {
                        tasks.spawn(run_job(
                            Arc::clone(&self.ctx),
                            job,
                            Arc::clone(&self.limit),
                            self.active.clone(),
                            cancel.clone(),
                        ));
                    }
                    None => {
                        tracing::debug!("Job queue closed");
                        break;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_join(joined);
                }
            }
        }

        // Anything still in the channel never started.
        self.jobs.close();
        while let Ok(job) = self.jobs.try_recv() {
            tracing::info!(job_id = %job.id, shot_id = %job.shot_id, "Job abandoned before start");
            self.active.release(job.shot_id);
        }

        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        tracing::info!("Job dispatcher stopped");
    }
}

async fn run_job(
    ctx: Arc<JobContext>,
    job: Job,
    limit: Arc<Semaphore>,
    active: ActiveShots,
    cancel: CancellationToken,
) {
    let permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        permit = limit.acquire_owned() => permit.ok(),
    };
    let Some(_permit) = permit else {
        tracing::info!(job_id = %job.id, shot_id = %job.shot_id, "Job abandoned before start");
        active.release(job.shot_id);
        return;
    };

    tracing::info!(job_id = %job.id, shot_id = %job.shot_id, "Job started");
    match process_shot(&ctx, job.shot_id).await {
        Ok(outcome) => {
            tracing::info!(
                job_id = %job.id,
                shot_id = %job.shot_id,
                status = %outcome.status(),
                "Job completed",
            );
        }
        Err(e) => {
            tracing::error!(
                job_id = %job.id,
                shot_id = %job.shot_id,
                error = %e,
                "Job failed",
            );
        }
    }
    active.release(job.shot_id);
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Job task panicked");
    }
}
