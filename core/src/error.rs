//! Error types for the GeoServer client.
//!
//! # Design
//! Existence checks never produce an error for a status code; they answer
//! `false`. Every other operation reports an unexpected status through
//! `UnexpectedStatus`, which names the operation and entity but deliberately
//! omits the response body. The body is emitted as a log event instead.

use thiserror::Error;

/// Errors returned by `GeoserverClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed: connection refused, DNS failure, reset,
    /// or the transport's timeout elapsed.
    #[error("could not communicate with GeoServer: {0}")]
    Transport(String),

    /// The server answered with a status the operation does not accept.
    /// `operation` reads like "create workspace 'roads'".
    #[error("unable to {operation} (HTTP {status})")]
    UnexpectedStatus { operation: String, status: u16 },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A single-entity response body could not be decoded.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A path identifier was empty, which would address a collection
    /// instead of an entity.
    #[error("{0} must not be empty")]
    EmptyIdentifier(&'static str),
}

impl ApiError {
    pub(crate) fn unexpected_status(operation: impl Into<String>, status: u16) -> Self {
        ApiError::UnexpectedStatus {
            operation: operation.into(),
            status,
        }
    }
}
