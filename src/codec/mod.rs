//! Checksum and codec primitives used by the second-pass verifiers.
//!
//! Everything in here is a pure function over its input. Malformed input is
//! reported through [`CodecError`] so scanners can turn it into "no match".

pub mod base58;
pub mod entropy;
pub mod luhn;
pub mod sha256;

pub use base58::{base58_decode, base58_encode, base58check_decode, Base58Check};
pub use entropy::{hex_entropy, shannon_entropy};
pub use luhn::{luhn_check, mask_card};
pub use sha256::{double_sha256, sha256, Sha256};

/// Reasons a codec rejected its input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("invalid base58 character {ch:?} at index {index}")]
    InvalidCharacter { ch: char, index: usize },
    #[error("decoded payload too short: {0} bytes")]
    TooShort(usize),
    #[error("base58check checksum mismatch")]
    ChecksumMismatch,
}
