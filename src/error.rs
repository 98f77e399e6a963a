//! Error types for the permessage-deflate extension.
//!
//! This module defines all error conditions that can occur while negotiating
//! the extension, signalling compressed frames and running the stream adapters.

use std::fmt;

use thiserror::Error;

/// Result type alias for extension operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a rejected extension parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterErrorKind {
    /// Parameter name is not defined for permessage-deflate.
    Unexpected,
    /// Parameter appears more than once.
    Duplicate,
    /// Parameter value is missing, present where forbidden, or out of range.
    Invalid,
}

impl fmt::Display for ParameterErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParameterErrorKind::Unexpected => "unexpected",
            ParameterErrorKind::Duplicate => "duplicate",
            ParameterErrorKind::Invalid => "invalid",
        })
    }
}

/// Errors that can occur during extension operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Offer or response carries a malformed extension parameter.
    #[error("{kind} extension parameter {key:?}: {:?}", .value.as_deref().unwrap_or(""))]
    InvalidParameter {
        /// Why the parameter was rejected.
        kind: ParameterErrorKind,
        /// Parameter name as received.
        key: String,
        /// Parameter value as received, if any.
        value: Option<String>,
    },

    /// Protocol violation detected.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// RSV1 was already set by someone else before the extension set it.
    #[error("Compression bit is already set")]
    CompressionBitSet,

    /// The compressor did not terminate its output with the sync-flush trailer.
    #[error("Bad compressor: unexpected stream tail: {actual:02x?} vs {expected:02x?}")]
    BadCompressorTail {
        /// Trailer every sync flush must end with.
        expected: [u8; 4],
        /// Bytes actually held back at flush time.
        actual: Vec<u8>,
    },

    /// Per-frame helpers only work on complete messages.
    #[error("Fragmented messages are not allowed")]
    FragmentedMessage,

    /// Control frames are never compressed.
    #[error("Control frames cannot be compressed")]
    ControlFrame,

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// Invalid extension configuration.
    #[error("Invalid extension: {0}")]
    InvalidExtension(String),
}

impl Error {
    pub(crate) fn parameter(kind: ParameterErrorKind, key: &str, value: Option<&str>) -> Self {
        Error::InvalidParameter {
            kind,
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }

    /// Returns the parameter classification if this is a parameter error.
    pub fn parameter_kind(&self) -> Option<ParameterErrorKind> {
        match self {
            Error::InvalidParameter { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        std::io::Error::other(err)
    }
}
