//! `hoops-worker` -- analyse basketball shot videos.
//!
//! Creates one shot per video path given on the command line, runs them
//! through the dispatcher and prints every persisted shot record as JSON.
//! Each video needs its landmark track at `<video>.landmarks.json`; replays
//! additionally read frames from `<video>.frames/`.
//!
//! # Environment variables
//!
//! See [`WorkerConfig::from_env`]. `RUST_LOG` controls log filtering.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hoops_pipeline::ShotAnalyzer;
use hoops_worker::config::WorkerConfig;
use hoops_worker::dispatcher::Dispatcher;
use hoops_worker::error::WorkerError;
use hoops_worker::job::JobContext;
use hoops_worker::pose::JsonPoseSource;
use hoops_worker::queue::JobQueue;
use hoops_worker::render::{ImageDirFrameSource, ReplayRenderer, SkeletonRenderer};
use hoops_worker::store::{InMemoryShotStore, ShotStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hoops_worker=info,hoops_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let videos: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if videos.is_empty() {
        eprintln!("usage: hoops-worker <video>...");
        std::process::exit(2);
    }

    if let Err(e) = run(videos).await {
        tracing::error!(error = %e, "Worker failed");
        std::process::exit(1);
    }
}

async fn run(videos: Vec<PathBuf>) -> Result<(), WorkerError> {
    let config = WorkerConfig::from_env()?;
    tracing::info!(
        media_dir = %config.media_dir.display(),
        sample_fps = config.sample_fps,
        max_concurrent_jobs = config.max_concurrent_jobs,
        render_replays = config.render_replays,
        shots = videos.len(),
        "Starting hoops-worker",
    );

    let store = Arc::new(InMemoryShotStore::new());
    let renderer = config.render_replays.then(|| {
        Arc::new(SkeletonRenderer::new(ImageDirFrameSource, config.media_dir.clone()))
            as Arc<dyn ReplayRenderer>
    });
    let ctx = Arc::new(JobContext {
        store: store.clone(),
        poses: Arc::new(JsonPoseSource),
        renderer,
        analyzer: Arc::new(ShotAnalyzer::new(config.analysis.clone())?),
        sample_fps: config.sample_fps,
    });

    let (queue, receiver) = JobQueue::new();
    for video in videos {
        let record = store.create(video).await?;
        queue.enqueue(record.id)?;
    }
    // Dropping the last handle lets the dispatcher stop once drained.
    drop(queue);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing running jobs");
            on_signal.cancel();
        }
    });

    Dispatcher::new(ctx, receiver, config.max_concurrent_jobs)
        .run(cancel)
        .await;

    for record in store.list().await {
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| WorkerError::Store(format!("cannot serialize shot record: {e}")))?;
        println!("{json}");
    }
    Ok(())
}
