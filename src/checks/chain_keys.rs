//! Multi-chain private key detection
//!
//! Each validator checks structure first (length, leading character) and only
//! then decodes, so most candidates are rejected before any hashing. The
//! scanning pass walks the validators in priority order and refuses any
//! candidate that overlaps an already accepted match.
//!
//! Known limitation: a bare 64-hex string with high entropy cannot be told
//! apart from other random 32-byte values such as transaction hashes.

use super::{ClaimedRanges, Span};
use crate::codec::{base58_decode, base58check_decode, hex_entropy, shannon_entropy, CodecError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Minimum entropy (bits/char) of a hex rendering to count as key material
pub const HEX_ENTROPY_THRESHOLD: f64 = 3.5;

/// Minimum entropy of a Base58 candidate's own text; rejects single-character fills
const BASE58_TEXT_ENTROPY_THRESHOLD: f64 = 4.0;

const WIF_VERSION: u8 = 0x80;

static WIF_CANDIDATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[5KL][1-9A-HJ-NP-Za-km-z]{50,51}\b").expect("Invalid regex")
});

static SOLANA_KEYPAIR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[1-9A-HJ-NP-Za-km-z]{87,88}\b").expect("Invalid regex")
});

static SOLANA_SEED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[1-9A-HJ-NP-Za-km-z]{43,44}\b").expect("Invalid regex")
});

static HEX64_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9a-fA-F]{64}\b").expect("Invalid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    Bitcoin,
    Solana,
    Tron,
    Ethereum,
    Unknown,
}

impl Chain {
    pub fn name(&self) -> &'static str {
        match self {
            Chain::Bitcoin => "Bitcoin",
            Chain::Solana => "Solana",
            Chain::Tron => "Tron",
            Chain::Ethereum => "Ethereum",
            Chain::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    PrivateKey,
    Wif,
    Seed,
    Keypair,
}

impl KeyKind {
    pub fn name(&self) -> &'static str {
        match self {
            KeyKind::PrivateKey => "Private Key",
            KeyKind::Wif => "WIF",
            KeyKind::Seed => "Seed",
            KeyKind::Keypair => "Keypair",
        }
    }
}

/// Stage at which a candidate was turned down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRejection {
    /// Length or leading character wrong; nothing was decoded
    Structure,
    /// Not valid in the encoding's alphabet
    Encoding(CodecError),
    /// Base58Check digest did not match
    Checksum,
    /// Decoded, but the version byte is not a private-key version
    Version(u8),
    /// Decoded to the wrong number of bytes
    Length(usize),
    /// Too regular to be random key material
    Entropy,
}

impl From<CodecError> for KeyRejection {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::ChecksumMismatch => KeyRejection::Checksum,
            CodecError::TooShort(n) => KeyRejection::Length(n),
            other => KeyRejection::Encoding(other),
        }
    }
}

/// A verified key candidate; `position` is in the scanned text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainKeyMatch {
    pub chain: Chain,
    pub key_kind: KeyKind,
    pub matched_text: String,
    pub confidence: f64,
    pub position: Span,
}

impl ChainKeyMatch {
    pub fn label(&self) -> String {
        format!("Private Key ({} {})", self.chain.name(), self.key_kind.name())
    }

    pub fn masked(&self) -> String {
        format!("[{} {} REDACTED]", self.chain.name().to_uppercase(), self.key_kind.name().to_uppercase())
    }
}

/// Bitcoin Wallet Import Format
pub fn validate_wif(candidate: &str) -> Result<KeyKind, KeyRejection> {
    let len = candidate.len();
    if !(51..=52).contains(&len) || !candidate.starts_with(['5', 'K', 'L']) {
        return Err(KeyRejection::Structure);
    }

    let decoded = base58check_decode(candidate)?;
    if decoded.version != WIF_VERSION {
        return Err(KeyRejection::Version(decoded.version));
    }

    match decoded.payload.len() {
        32 => Ok(KeyKind::Wif),
        33 if decoded.payload[32] == 0x01 => Ok(KeyKind::Wif),
        n => Err(KeyRejection::Length(n)),
    }
}

/// Solana seed (32 bytes) or keypair (64 bytes), plain Base58
pub fn validate_solana(candidate: &str) -> Result<KeyKind, KeyRejection> {
    let len = candidate.len();
    let expected = match len {
        43 | 44 => KeyKind::Seed,
        87 | 88 => KeyKind::Keypair,
        _ => return Err(KeyRejection::Structure),
    };

    let bytes = base58_decode(candidate)?;
    let kind = match (bytes.len(), expected) {
        (32, KeyKind::Seed) => KeyKind::Seed,
        (64, KeyKind::Keypair) => KeyKind::Keypair,
        (n, _) => return Err(KeyRejection::Length(n)),
    };

    if hex_entropy(&bytes) <= HEX_ENTROPY_THRESHOLD
        || shannon_entropy(candidate) <= BASE58_TEXT_ENTROPY_THRESHOLD
    {
        return Err(KeyRejection::Entropy);
    }

    Ok(kind)
}

/// Bare 64-hex key (Tron style, also raw EVM keys without `0x`)
pub fn validate_hex_key(candidate: &str) -> Result<KeyKind, KeyRejection> {
    if candidate.len() != 64 || !candidate.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(KeyRejection::Structure);
    }
    if shannon_entropy(candidate) <= HEX_ENTROPY_THRESHOLD {
        return Err(KeyRejection::Entropy);
    }
    Ok(KeyKind::PrivateKey)
}

/// Scan free text for keys of every supported chain
pub fn scan_chain_keys(text: &str) -> Vec<ChainKeyMatch> {
    scan_chain_keys_claimed(text, &mut ClaimedRanges::new())
}

/// Scan, skipping (and extending) ranges claimed by earlier detectors
pub fn scan_chain_keys_claimed(text: &str, claimed: &mut ClaimedRanges) -> Vec<ChainKeyMatch> {
    let mut matches = Vec::new();

    for mat in WIF_CANDIDATE_REGEX.find_iter(text) {
        let span = Span::from(mat);
        if claimed.is_claimed(&span) || validate_wif(mat.as_str()).is_err() {
            continue;
        }
        claimed.claim(span);
        matches.push(ChainKeyMatch {
            chain: Chain::Bitcoin,
            key_kind: KeyKind::Wif,
            matched_text: mat.as_str().to_string(),
            confidence: 0.99,
            position: span,
        });
    }

    for (regex, confidence) in [(&*SOLANA_KEYPAIR_REGEX, 0.95), (&*SOLANA_SEED_REGEX, 0.60)] {
        for mat in regex.find_iter(text) {
            let span = Span::from(mat);
            if claimed.is_claimed(&span) {
                continue;
            }
            let Ok(kind) = validate_solana(mat.as_str()) else {
                continue;
            };
            claimed.claim(span);
            matches.push(ChainKeyMatch {
                chain: Chain::Solana,
                key_kind: kind,
                matched_text: mat.as_str().to_string(),
                confidence,
                position: span,
            });
        }
    }

    for mat in HEX64_REGEX.find_iter(text) {
        let span = Span::from(mat);
        // 0x-prefixed keys belong to the EVM private key check
        if text[..span.start].ends_with("0x") || text[..span.start].ends_with("0X") {
            continue;
        }
        if claimed.is_claimed(&span) || validate_hex_key(mat.as_str()).is_err() {
            continue;
        }
        claimed.claim(span);
        matches.push(ChainKeyMatch {
            chain: Chain::Tron,
            key_kind: KeyKind::PrivateKey,
            matched_text: mat.as_str().to_string(),
            confidence: 0.85,
            position: span,
        });
    }

    if !matches.is_empty() {
        tracing::debug!(count = matches.len(), "chain key candidates verified");
    }

    matches
}
