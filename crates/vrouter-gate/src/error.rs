//! Error types for control-plane record fetching.

use thiserror::Error;

/// Result type alias for gate operations.
pub type GateResult<T> = Result<T, GateError>;

/// Errors that can occur while fetching control-plane records.
///
/// Consumers treat all of these as "record absent": a failed fetch skips
/// the affected branch of a traversal instead of aborting it.
#[derive(Debug, Error)]
pub enum GateError {
    /// The request to the control plane failed (transport, non-zero exit).
    #[error("gate request failed: {operation}: {message}")]
    Request {
        /// The operation that failed (e.g. "vnet show").
        operation: String,
        /// Error message.
        message: String,
    },

    /// The control plane answered with a document we could not decode.
    #[error("failed to decode {operation} document: {source}")]
    Decode {
        /// The operation whose response was malformed.
        operation: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// No record exists under the requested identifier.
    #[error("no such record: {kind} {id}")]
    NotFound {
        /// The record kind ("vrouter", "vnet", "service", "vm").
        kind: String,
        /// The requested identifier (empty for singleton records).
        id: String,
    },
}

impl GateError {
    /// Creates a request error.
    pub fn request(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(operation: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            operation: operation.into(),
            source,
        }
    }

    /// Creates a not-found error.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }
}
