//! Error types for the sleep hook
//!
//! This module defines all error types used throughout the crate.
//!
//! Only [`Error::AgentInvocation`] can surface from
//! [`PowerEventHandler::handle`](crate::PowerEventHandler::handle). Power
//! states or phases the hook does not recognize are no-ops, never errors.

use crate::traits::DnsAction;
use thiserror::Error;

/// Result type alias for hook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the sleep hook
#[derive(Error, Debug)]
pub enum Error {
    /// The DNS-update agent could not be started or reported failure
    #[error("DNS agent invocation failed ({action}): {message}")]
    AgentInvocation {
        /// Action that was being performed
        action: DnsAction,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an agent invocation error
    pub fn agent_invocation(action: DnsAction, message: impl Into<String>) -> Self {
        Self::AgentInvocation {
            action,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error came from the DNS-update agent
    pub fn is_agent_failure(&self) -> bool {
        matches!(self, Self::AgentInvocation { .. })
    }
}
