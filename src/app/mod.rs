//! App layer - owns the draft request, the loaded document and all view state.
//!
//! The App actor turns UI events into store mutations and network commands,
//! and pushes a fresh render state after each one.

pub mod actor;
pub mod commands;
pub mod state;

pub use actor::AppActor;
pub use state::AppState;
