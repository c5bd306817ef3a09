//! Network layer - executes resolved requests on the Tokio runtime

pub mod actor;
pub mod client;

pub use actor::NetworkActor;
