//! Shot-analysis worker.
//!
//! Wires the pipeline to its collaborators: landmark tracks in, shot
//! records and replays out, with a bounded dispatcher in between.
//! Re-exports internal modules for integration testing.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod pose;
pub mod queue;
pub mod render;
pub mod store;
