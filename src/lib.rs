//! # reqtree
//!
//! A keyboard-driven terminal HTTP client. Requests are composed, executed and
//! saved into one JSON document, and shown as a tree grouped by project.
//!
//! ## Features
//! - `{name}` placeholders in URLs and header values, resolved from the
//!   request's own placeholder headers, then from the selected context
//! - Named contexts (`default`, `dev`, `prod`...) of template variables
//! - Saved requests keyed by (method, url), with project and alias
//! - Configurable tree labels (`{color}{m} {a}|{u}`...)
//! - JSON syntax highlighting of responses
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (state machine, store mutations, change events)
//! - Network Layer (Tokio runtime)

pub mod app;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod events;
pub mod messages;
pub mod models;
pub mod network;
pub mod storage;
pub mod template;
pub mod tree;
pub mod ui;

// Re-export commonly used types
pub use app::{AppActor, AppState};
pub use context::{Context, ContextVariable};
pub use error::{StoreError, StoreResult};
pub use events::EventBus;
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{Config, Method, Request, RequestKey, ResolvedRequest, Url};
pub use network::NetworkActor;
pub use storage::{Document, ProjectGroups, Storage};
pub use tree::{RequestTree, TreeNode};
