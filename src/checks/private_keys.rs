//! Raw 256-bit private keys in hex form

use super::{Category, ClaimedRanges, Detection, Span};
use crate::checks::chain_keys::HEX_ENTROPY_THRESHOLD;
use crate::codec::shannon_entropy;
use once_cell::sync::Lazy;
use regex::Regex;

pub const PRIVATE_KEY_MASK: &str = "[PRIVATE KEY REDACTED]";

static PREFIXED_HEX_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b0[xX][0-9a-fA-F]{64}\b").expect("Invalid regex")
});

static BARE_HEX_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9a-fA-F]{64}\b").expect("Invalid regex")
});

pub fn check(content: &str, claimed: &mut ClaimedRanges) -> Vec<Detection> {
    let mut detections = Vec::new();

    // 0x prefix plus exactly 32 bytes is an EVM key regardless of entropy
    for mat in PREFIXED_HEX_KEY_REGEX.find_iter(content) {
        let span = Span::from(mat);
        if !claimed.try_claim(span) {
            continue;
        }
        detections.push(Detection::new(
            Category::PrivateKey,
            "Private Key (Ethereum)",
            mat.as_str(),
            PRIVATE_KEY_MASK.to_string(),
            0.95,
            span,
        ));
    }

    for mat in BARE_HEX_KEY_REGEX.find_iter(content) {
        let span = Span::from(mat);
        if claimed.is_claimed(&span) || shannon_entropy(mat.as_str()) <= HEX_ENTROPY_THRESHOLD {
            continue;
        }
        claimed.claim(span);
        detections.push(Detection::new(
            Category::PrivateKey,
            Category::PrivateKey.title(),
            mat.as_str(),
            PRIVATE_KEY_MASK.to_string(),
            0.85,
            span,
        ));
    }

    if !detections.is_empty() {
        tracing::debug!(count = detections.len(), "hex private keys matched");
    }

    detections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_vectors::TestVectors;

    fn run(content: &str) -> Vec<Detection> {
        check(content, &mut ClaimedRanges::new())
    }

    #[test]
    fn test_prefixed_key_always_flagged() {
        let content = format!("PRIVATE_KEY=0x{}", TestVectors::HEX_LOW_ENTROPY);
        let detections = run(&content);
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label(), "Private Key (Ethereum)");
        assert_eq!(detections[0].original().len(), 66);
    }

    #[test]
    fn test_bare_key_needs_entropy() {
        assert_eq!(run(TestVectors::HEX_KEY).len(), 1);
        assert!(run(TestVectors::HEX_LOW_ENTROPY).is_empty());
    }

    #[test]
    fn test_bare_part_of_prefixed_key_not_reported_twice() {
        let detections = run(&format!("0x{}", TestVectors::HEX_KEY));
        assert_eq!(detections.len(), 1);
        assert!((detections[0].confidence() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_address_length_hex_ignored() {
        assert!(run(TestVectors::CONTRACT_ADDRESS).is_empty());
    }

    #[test]
    fn test_mask_does_not_rescan() {
        assert!(run(PRIVATE_KEY_MASK).is_empty());
    }
}
