use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub throttle: ThrottleConfig,

    #[serde(default)]
    pub fuzzy: FuzzyConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    /// Book-collection root; flag and environment variables take priority.
    #[serde(default)]
    pub library: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,

    /// Days before a cached negative result is retried. `None` keeps
    /// negatives forever.
    #[serde(default = "default_negative_ttl_days")]
    pub negative_ttl_days: Option<i64>,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.cache/bookhound/asin-cache.json").into_owned())
}

fn default_negative_ttl_days() -> Option<i64> {
    Some(30)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            negative_ttl_days: default_negative_ttl_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThrottleConfig {
    /// Minimum delay between consecutive calls to the same source.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_min_delay_ms() -> u64 {
    1500
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_multiplier() -> f64 {
    2.0
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FuzzyConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_fuzzy_threshold")]
    pub threshold: f64,
}

fn default_fuzzy_threshold() -> f64 {
    0.8
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: default_fuzzy_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Parallel lookup workers.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// File extensions treated as e-books.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_jobs() -> usize {
    2
}

fn default_extensions() -> Vec<String> {
    ["epub", "mobi", "azw3", "azw", "pdf"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            extensions: default_extensions(),
        }
    }
}
