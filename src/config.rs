//! Runtime configuration from the command line and environment

use std::path::PathBuf;
use std::time::Duration;

use tracing::level_filters::LevelFilter;

use crate::constants::{DATA_DIR, DEFAULT_DATA_FILE, DEFAULT_TIMEOUT_SECS, LOG_FILE};

pub const ENV_FILE: &str = "REQTREE_FILE";
pub const ENV_LOG: &str = "REQTREE_LOG";
pub const ENV_LOG_LEVEL: &str = "REQTREE_LOG_LEVEL";
pub const ENV_LOG_REQUEST: &str = "REQTREE_LOG_REQUEST";
pub const ENV_TIMEOUT: &str = "REQTREE_TIMEOUT_SECS";

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// JSON document holding saved requests, config and contexts
    pub data_file: PathBuf,
    /// File log, when enabled
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
    /// Also log response bodies
    pub log_response_bodies: bool,
    pub timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data_file: default_data_file(),
            log_file: None,
            log_level: LevelFilter::INFO,
            log_response_bodies: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Build from process arguments (first positional = data file) and environment
    pub fn from_env() -> Self {
        Self::from_lookup(std::env::args().nth(1), |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(file_arg: Option<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let on = |key: &str| lookup(key).is_some_and(|v| v.eq_ignore_ascii_case("on"));

        let data_file = file_arg
            .filter(|f| !f.is_empty())
            .or_else(|| lookup(ENV_FILE).filter(|f| !f.is_empty()))
            .map(PathBuf::from)
            .unwrap_or_else(default_data_file);

        let log_level = lookup(ENV_LOG_LEVEL)
            .and_then(|level| level.parse::<LevelFilter>().ok())
            .unwrap_or(LevelFilter::INFO);

        let timeout = lookup(ENV_TIMEOUT)
            .and_then(|secs| secs.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        AppConfig {
            data_file,
            log_file: on(ENV_LOG).then(|| PathBuf::from(LOG_FILE)),
            log_level,
            log_response_bodies: on(ENV_LOG_REQUEST),
            timeout,
        }
    }
}

fn default_data_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR)
        .join(DEFAULT_DATA_FILE)
}
