//! Shieldmint Primitives
//!
//! Values exchanged with a PXE node. Everything here is owned by the node or
//! the contract; this crate only knows how to name, parse and print them.
//!
//! ```text
//! Fr           = canonical BN254 scalar, 32 bytes big-endian, "0x…" on the wire
//! AztecAddress = Fr
//! TxHash       = 32 opaque bytes, "0x…" on the wire
//! ```

pub mod field;
pub mod tx;

pub use field::{AztecAddress, Fr};
pub use tx::{CompleteAddress, NodeInfo, TxHash, TxReceipt, TxStatus};

use thiserror::Error;

/// Parse failures for primitive values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("value is {0} bytes long, at most 32 allowed")]
    TooLong(usize),

    #[error("{0} is not a canonical field element")]
    NotInField(String),

    #[error("field element {0} does not fit in 128 bits")]
    Overflow(String),

    #[error("tx hash must be 32 bytes, got {0}")]
    TxHashLength(usize),
}

/// Decode a hex string with an optional `0x` prefix. Odd lengths get a
/// leading zero nibble.
pub(crate) fn decode_hex(s: &str) -> Result<Vec<u8>, PrimitiveError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() {
        return Err(PrimitiveError::InvalidHex(s.to_string()));
    }

    let padded;
    let digits = if digits.len() % 2 == 1 {
        padded = format!("0{digits}");
        padded.as_str()
    } else {
        digits
    };

    hex::decode(digits).map_err(|_| PrimitiveError::InvalidHex(s.to_string()))
}
