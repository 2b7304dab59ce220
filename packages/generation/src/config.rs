//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Tunable settings for the generation pipeline.
///
/// Defaults mirror a single-operator deployment: one style guide file,
/// two crawled sample directories, and a flat output directory next to
/// the process working directory.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path to the writing style guide
    pub style_guide_path: PathBuf,

    /// Directories holding previously written sample posts
    pub sample_dirs: Vec<PathBuf>,

    /// Directory generated articles are written to
    pub output_dir: PathBuf,

    /// How many sample posts go into each prompt
    pub sample_count: usize,

    /// Longest sample body kept before truncation (in characters)
    pub sample_max_chars: usize,

    /// Most keywords accepted in one batch
    pub max_keywords: usize,

    /// Pause after the service throttles a keyword
    pub rate_limit_cooldown: Duration,

    /// Quiet window before a batch consumer synthesizes a heartbeat
    pub batch_poll_timeout: Duration,

    /// Quiet window before a single-article consumer synthesizes a heartbeat
    pub single_poll_timeout: Duration,

    /// Fixed seed for fallback sample selection; `None` draws from entropy
    pub sample_seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            style_guide_path: PathBuf::from("style_guide.txt"),
            sample_dirs: vec![
                PathBuf::from("posts_sobutab7"),
                PathBuf::from("posts_gmm0301"),
            ],
            output_dir: PathBuf::from("output"),
            sample_count: 3,
            sample_max_chars: 4000,
            max_keywords: 50,
            rate_limit_cooldown: Duration::from_secs(30),
            batch_poll_timeout: Duration::from_secs(180),
            single_poll_timeout: Duration::from_secs(30),
            sample_seed: None,
        }
    }
}

impl PipelineConfig {
    /// Set the style guide path.
    pub fn with_style_guide(mut self, path: impl Into<PathBuf>) -> Self {
        self.style_guide_path = path.into();
        self
    }

    /// Replace the sample directories.
    pub fn with_sample_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.sample_dirs = dirs;
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    /// Set how many sample posts go into each prompt.
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Set the batch size limit.
    pub fn with_max_keywords(mut self, max: usize) -> Self {
        self.max_keywords = max;
        self
    }

    /// Set the pause taken after a rate-limited keyword.
    pub fn with_rate_limit_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit_cooldown = cooldown;
        self
    }

    /// Set both consumer poll windows.
    pub fn with_poll_timeouts(mut self, batch: Duration, single: Duration) -> Self {
        self.batch_poll_timeout = batch;
        self.single_poll_timeout = single;
        self
    }

    /// Pin the fallback sample selection to a fixed seed.
    pub fn with_sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = Some(seed);
        self
    }
}
