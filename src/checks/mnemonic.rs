//! BIP-39 seed phrases
//!
//! The English list is always available. The secondary vocabulary is only
//! consulted by [`check_with_secondary`], which may wait on its first load.

use super::{Category, ClaimedRanges, Detection};
use crate::wordlist::{find_phrases_async, find_phrases_sync, LazyVocabulary, PhraseMatch};

pub const SEED_PHRASE_MASK: &str = "[SEED PHRASE REDACTED]";

fn confidence_for(word_count: usize) -> f64 {
    if word_count >= 24 {
        0.99
    } else {
        0.95
    }
}

fn to_detection(m: &PhraseMatch) -> Detection {
    Detection::new(
        Category::SeedPhrase,
        &format!("Seed Phrase ({} words)", m.word_count),
        &m.phrase,
        SEED_PHRASE_MASK.to_string(),
        confidence_for(m.word_count),
        m.span,
    )
}

/// English-only phrase check
pub fn check(content: &str, claimed: &mut ClaimedRanges) -> Vec<Detection> {
    let mut detections = Vec::new();

    for m in find_phrases_sync(content) {
        if claimed.try_claim(m.span) {
            tracing::debug!(words = m.word_count, "seed phrase matched");
            detections.push(to_detection(&m));
        }
    }

    detections
}

/// English check followed by the secondary vocabulary.
///
/// A phrase both paths report is kept once.
pub async fn check_with_secondary(
    content: &str,
    claimed: &mut ClaimedRanges,
    secondary: &LazyVocabulary,
) -> Vec<Detection> {
    let mut detections = check(content, claimed);

    for m in find_phrases_async(content, secondary).await {
        let duplicate = detections.iter().any(|d| d.original() == m.phrase);
        if !duplicate && claimed.try_claim(m.span) {
            tracing::debug!(words = m.word_count, "seed phrase matched in secondary vocabulary");
            detections.push(to_detection(&m));
        }
    }

    detections
}
