use std::path::PathBuf;
use std::str::FromStr;

use hoops_core::calibration::AnalysisConfig;
use hoops_core::error::CoreError;
use hoops_core::landmarks::DEFAULT_SAMPLE_FPS;

/// Default root for rendered replays.
const DEFAULT_MEDIA_DIR: &str = "./data";

/// Default number of shots analysed at the same time.
const DEFAULT_MAX_CONCURRENT_JOBS: usize = 2;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root directory replays are written under (`<media>/shots/<id>/replays`).
    pub media_dir: PathBuf,
    /// Rate the pose track is decimated to before analysis.
    pub sample_fps: f64,
    pub max_concurrent_jobs: usize,
    pub render_replays: bool,
    pub analysis: AnalysisConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default  |
    /// |-------------------------|----------|
    /// | `MEDIA_DIR`             | `./data` |
    /// | `SAMPLE_FPS`            | `10`     |
    /// | `MAX_CONCURRENT_JOBS`   | `2`      |
    /// | `RENDER_REPLAYS`        | `true`   |
    /// | `MIN_VALID_RATIO`       | `0.5`    |
    /// | `FOLLOW_OFFSET_FRAMES`  | `3`      |
    /// | `RELEASE_HEIGHT_TARGET` | `0.06`   |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through
    /// `get`.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let media_dir = get("MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_DIR));

        let sample_fps = parse_or(&get, "SAMPLE_FPS", DEFAULT_SAMPLE_FPS)?;
        let max_concurrent_jobs = parse_or(&get, "MAX_CONCURRENT_JOBS", DEFAULT_MAX_CONCURRENT_JOBS)?;
        let render_replays = parse_or(&get, "RENDER_REPLAYS", true)?;

        let defaults = AnalysisConfig::default();
        let analysis = AnalysisConfig {
            min_valid_ratio: parse_or(&get, "MIN_VALID_RATIO", defaults.min_valid_ratio)?,
            follow_offset_frames: parse_or(&get, "FOLLOW_OFFSET_FRAMES", defaults.follow_offset_frames)?,
            release_height_target: parse_or(
                &get,
                "RELEASE_HEIGHT_TARGET",
                defaults.release_height_target,
            )?,
            ..defaults
        };

        let config = Self {
            media_dir,
            sample_fps,
            max_concurrent_jobs,
            render_replays,
            analysis,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.sample_fps.is_finite() && self.sample_fps > 0.0) {
            return Err(CoreError::Validation(format!(
                "SAMPLE_FPS must be > 0, got {}",
                self.sample_fps
            )));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(CoreError::Validation(
                "MAX_CONCURRENT_JOBS must be at least 1".to_string(),
            ));
        }
        self.analysis.validate()
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            media_dir: PathBuf::from(DEFAULT_MEDIA_DIR),
            sample_fps: DEFAULT_SAMPLE_FPS,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            render_replays: true,
            analysis: AnalysisConfig::default(),
        }
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            CoreError::Validation(format!("{key} has an invalid value: '{raw}'"))
        }),
    }
}
