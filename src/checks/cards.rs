//! Payment card numbers: digit-run pre-filter, Luhn verification

use super::{Category, ClaimedRanges, Detection, Span};
use crate::codec::{luhn_check, mask_card};
use once_cell::sync::Lazy;
use regex::Regex;

static CARD_CANDIDATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d[ -]?){12,18}\d\b").expect("Invalid regex")
});

const CARD_CONFIDENCE: f64 = 0.98;

pub fn check(content: &str, claimed: &mut ClaimedRanges) -> Vec<Detection> {
    let mut detections = Vec::new();

    for mat in CARD_CANDIDATE_REGEX.find_iter(content) {
        let candidate = mat.as_str();
        if !luhn_check(candidate) || is_repeated_digit(candidate) {
            continue;
        }

        let span = Span::from(mat);
        if !claimed.try_claim(span) {
            continue;
        }

        tracing::debug!(start = span.start, end = span.end, "card number verified by luhn");
        detections.push(Detection::new(
            Category::CreditCard,
            Category::CreditCard.title(),
            candidate,
            mask_card(candidate),
            CARD_CONFIDENCE,
            span,
        ));
    }

    detections
}

/// `0000 0000 0000 0` style fills pass Luhn but are never real cards
fn is_repeated_digit(candidate: &str) -> bool {
    let mut digits = candidate.chars().filter(|c| c.is_ascii_digit());
    match digits.next() {
        Some(first) => digits.all(|d| d == first),
        None => true,
    }
}
