//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Application name
pub const APP_NAME: &str = "reqtree";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Data file name used when neither an argument nor `REQTREE_FILE` is given
pub const DEFAULT_DATA_FILE: &str = "reqtree.json";

/// Directory under the home directory holding the default data file
pub const DATA_DIR: &str = ".reqtree";

/// File log name, written to the working directory
pub const LOG_FILE: &str = "reqtree.log";

/// Content type of a fresh request
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Environment that always exists
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Project bucket for requests saved without a project name
pub const UNGROUPED_PROJECT: &str = ".";

/// Request timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Methods offered by the method picker, in cycling order
pub const METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Theme background, usable in tree patterns as `{backColor}`
pub const BACK_COLOR_NAME: &str = "#2B2B2B";

/// Pattern suggested in the settings view
pub const EXAMPLE_TREE_PATTERN: &str = "{color}{m}[white:] {a}|{u}";

/// Content types offered by the content type picker
pub const CONTENT_TYPES: &[&str] = &[
    "application/json",
    "application/x-www-form-urlencoded",
    "application/xml",
    "application/javascript",
    "application/graphql",
    "application/ld+json",
    "multipart/form-data",
    "text/plain",
    "text/html",
    "text/xml",
    "text/csv",
];
