/// Shots are keyed by a random UUID assigned at upload time.
pub type ShotId = uuid::Uuid;

/// Identifier handed back by the job queue for one analysis invocation.
pub type JobId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
