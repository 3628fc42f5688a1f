//! # Decode Error Handling
//!
//! This module defines the DecodeError enum, which represents the different error
//! types that can occur in the sigfox-rs crate.
//!
//! An uplink whose length matches no frame kind is *not* an error: it comes back as
//! an unrecognized [`Decoded`](crate::sigfox::Decoded) result. Errors are reserved for
//! input that cannot be interpreted at all (malformed hex, unknown family) and for
//! configuration problems.

use crate::util::hex::HexError;
use thiserror::Error;

/// Represents the different error types that can occur in the Sigfox crate.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload is not valid ASCII hex.
    #[error("Invalid hexadecimal payload: {0}")]
    InvalidHex(#[from] HexError),

    /// A read went past the end of the payload.
    #[error("Payload truncated: {size} byte(s) at offset {offset}, payload is {actual} byte(s)")]
    Truncated {
        offset: usize,
        size: usize,
        actual: usize,
    },

    /// Indicates a nom parsing error.
    #[error("Nom error: {0}")]
    NomError(String),

    /// The family name is unknown, or the device is not registered and the
    /// callback does not name one.
    #[error("Unknown device family: {0}")]
    UnknownFamily(String),

    /// The decoder configuration is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a configuration or replay file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl<E: std::fmt::Debug> From<nom::Err<E>> for DecodeError {
    fn from(err: nom::Err<E>) -> Self {
        DecodeError::NomError(format!("{err:?}"))
    }
}
