//! # Hex Encoding/Decoding Utilities
//!
//! Sigfox callbacks deliver the uplink payload as an ASCII-hex string (at most 12
//! bytes, so 24 characters). This module turns that string into bytes and back,
//! and provides compact formatting for log output.
//!
//! ## Usage
//!
//! ```rust
//! use sigfox_rs::util::hex::{decode_payload, encode_hex, format_hex_compact};
//!
//! let bytes = decode_payload("2FA302063BAD0D5F1D").unwrap();
//! assert_eq!(bytes.len(), 9);
//! assert_eq!(encode_hex(&bytes), "2fa302063bad0d5f1d");
//! assert_eq!(format_hex_compact(&bytes[..2]), "2f a3");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Invalid hex character: {0:?}")]
    InvalidCharacter(char),

    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to lowercase hex string
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Encode bytes to uppercase hex string
pub fn encode_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decode an uplink payload.
///
/// Accepts upper- and lowercase digits and surrounding whitespace. An empty string
/// decodes to an empty payload; whether that is meaningful is up to the family
/// decoder.
pub fn decode_payload(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let trimmed = hex_str.trim();

    if let Some(bad) = trimmed.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(HexError::InvalidCharacter(bad));
    }

    if trimmed.len() % 2 != 0 {
        return Err(HexError::OddLength(trimmed.len()));
    }

    hex::decode(trimmed).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "2f a3 02" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_mixed_case() {
        assert_eq!(decode_payload("0dFf").unwrap(), vec![0x0D, 0xFF]);
    }

    #[test]
    fn test_decode_trims_whitespace() {
        assert_eq!(decode_payload(" 0102\n").unwrap(), vec![0x01, 0x02]);
    }

    #[test]
    fn test_empty_payload_is_not_an_error() {
        assert_eq!(decode_payload("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_encode_case() {
        let data = vec![0xAB, 0xCD, 0xEF];
        assert_eq!(encode_hex(&data), "abcdef");
        assert_eq!(encode_hex_upper(&data), "ABCDEF");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_hex_compact(&[0x2F, 0xA3, 0x02]), "2f a3 02");
    }

    #[test]
    fn test_errors() {
        assert_eq!(decode_payload("abc"), Err(HexError::OddLength(3)));
        assert_eq!(decode_payload("GG"), Err(HexError::InvalidCharacter('G')));
        assert_eq!(decode_payload("01 02"), Err(HexError::InvalidCharacter(' ')));
    }
}
