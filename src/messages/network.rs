//! Network messages - communication between App and Network layers

use crate::models::{Exchange, LogLevel, ResolvedRequest};

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Execute a fully resolved request
    Execute { id: u64, request: ResolvedRequest },
    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// The server answered (any status)
    Completed { id: u64, exchange: Exchange },
    /// Transport failure: bad method or URL, connection refused, timeout...
    Failed {
        id: u64,
        message: String,
        time_ms: u64,
    },
    /// Progress message for the log panel
    Log {
        id: u64,
        level: LogLevel,
        message: String,
    },
}

impl NetworkResponse {
    pub fn id(&self) -> u64 {
        match self {
            NetworkResponse::Completed { id, .. } => *id,
            NetworkResponse::Failed { id, .. } => *id,
            NetworkResponse::Log { id, .. } => *id,
        }
    }

    /// No more messages expected for this id
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NetworkResponse::Completed { .. } | NetworkResponse::Failed { .. }
        )
    }
}
