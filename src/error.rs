//! Error types for hwc-service.

use thiserror::Error;

use crate::protocol::Status;

/// Failure while reading a primitive or the identity token from a parcel.
///
/// Distinct from a successfully decoded zero value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The buffer ended before the field was complete.
    #[error("not enough data: need {needed} bytes, {remaining} remaining")]
    NotEnoughData { needed: usize, remaining: usize },

    /// A UTF-16 string field had an invalid length.
    #[error("malformed string16 (length {0})")]
    BadString(i32),
}

/// Main error type for all hwc-service operations.
#[derive(Debug, Error)]
pub enum HwcError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (configuration only).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The transaction itself failed; the reply body was not read.
    #[error("transport error: {0}")]
    Transport(Status),

    /// The request's identity token did not match the service descriptor.
    #[error("interface token mismatch: expected {expected:?}, got {found:?}")]
    TokenMismatch {
        expected: String,
        found: Option<String>,
    },

    /// A fixed-schema field could not be decoded.
    #[error("protocol decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Opcode absent from the table or not handled by the service.
    #[error("unknown operation: {0}")]
    UnknownOperation(u32),

    /// Frame-level protocol violation (bad header, oversized payload).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Backpressure timeout - write buffer full.
    #[error("Backpressure timeout")]
    BackpressureTimeout,
}

impl HwcError {
    /// Transport status this error is reported as.
    pub fn status(&self) -> Status {
        match self {
            HwcError::Transport(status) => *status,
            HwcError::TokenMismatch { .. } => Status::PERMISSION_DENIED,
            HwcError::Decode(_) => Status::NOT_ENOUGH_DATA,
            HwcError::UnknownOperation(_) => Status::UNKNOWN_TRANSACTION,
            HwcError::Io(_) | HwcError::ConnectionClosed => Status::DEAD_OBJECT,
            HwcError::BackpressureTimeout => Status::WOULD_BLOCK,
            HwcError::Json(_) | HwcError::Protocol(_) => Status::FAILED_TRANSACTION,
        }
    }
}

/// Result type alias using HwcError.
pub type Result<T> = std::result::Result<T, HwcError>;
