//! National ID numbers, phone numbers and email addresses
//!
//! National IDs carry a mod-11 check character and are verified. Phone and
//! email recognizers are pattern-only, so they report lower confidence and
//! lean on nearby labels ("phone:", "email") for a small boost.

use super::{partial_mask, Category, ClaimedRanges, Detection, Span};
use once_cell::sync::Lazy;
use regex::Regex;

const ID_WEIGHTS: [u32; 17] = [7, 9, 10, 5, 8, 4, 2, 1, 6, 3, 7, 9, 10, 5, 8, 4, 2];
const ID_CHECK_CHARS: [char; 11] = ['1', '0', 'X', '9', '8', '7', '6', '5', '4', '3', '2'];

static NATIONAL_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{17}[\dXx]\b").expect("Invalid regex")
});

static MOBILE_PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+86[\s-]?)?\b1[3-9]\d{9}\b").expect("Invalid regex")
});

// Separators are required so bare digit runs are left to the card scanner
static NANP_PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+1[\s.-]?)?(?:\(\d{3}\)\s?|\b\d{3}[\s.-])\d{3}[\s.-]\d{4}\b").expect("Invalid regex")
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("Invalid regex")
});

const PHONE_LABELS: &[&str] = &["phone", "tel", "mobile", "cell", "call", "电话", "手机"];
const EMAIL_LABELS: &[&str] = &["email", "e-mail", "mail", "contact", "邮箱"];

/// How far back to look for a label
const LABEL_WINDOW: usize = 24;

/// Verify an 18-character national ID by its mod-11 check character
pub fn validate_national_id(id: &str) -> bool {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() != 18 {
        return false;
    }

    let mut sum = 0u32;
    for (ch, weight) in chars[..17].iter().zip(ID_WEIGHTS.iter()) {
        match ch.to_digit(10) {
            Some(d) => sum += d * weight,
            None => return false,
        }
    }

    let expected = ID_CHECK_CHARS[(sum % 11) as usize];
    chars[17].to_ascii_uppercase() == expected
}

pub fn check(content: &str, claimed: &mut ClaimedRanges) -> Vec<Detection> {
    let mut detections = Vec::new();

    for mat in NATIONAL_ID_REGEX.find_iter(content) {
        if !validate_national_id(mat.as_str()) {
            continue;
        }
        let span = Span::from(mat);
        if claimed.try_claim(span) {
            detections.push(Detection::new(
                Category::NationalId,
                Category::NationalId.title(),
                mat.as_str(),
                partial_mask(mat.as_str(), 3, 2),
                0.95,
                span,
            ));
        }
    }

    for regex in [&*MOBILE_PHONE_REGEX, &*NANP_PHONE_REGEX] {
        for mat in regex.find_iter(content) {
            let span = Span::from(mat);
            if !claimed.try_claim(span) {
                continue;
            }
            detections.push(Detection::new(
                Category::Phone,
                Category::Phone.title(),
                mat.as_str(),
                mask_phone(mat.as_str()),
                label_confidence(content, span, PHONE_LABELS, 0.65, 0.15),
                span,
            ));
        }
    }

    for mat in EMAIL_REGEX.find_iter(content) {
        let span = Span::from(mat);
        if !claimed.try_claim(span) {
            continue;
        }
        detections.push(Detection::new(
            Category::Email,
            Category::Email.title(),
            mat.as_str(),
            mask_email(mat.as_str()),
            label_confidence(content, span, EMAIL_LABELS, 0.60, 0.10),
            span,
        ));
    }

    detections
}

/// Base confidence, raised when a label precedes the match
fn label_confidence(content: &str, span: Span, labels: &[&str], base: f64, boost: f64) -> f64 {
    let mut from = span.start.saturating_sub(LABEL_WINDOW);
    while !content.is_char_boundary(from) {
        from -= 1;
    }
    let before = content[from..span.start].to_lowercase();
    if labels.iter().any(|l| before.contains(l)) {
        base + boost
    } else {
        base
    }
}

/// Star out every digit but the last four
fn mask_phone(phone: &str) -> String {
    let total = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let mut seen = 0;
    phone
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen += 1;
                if seen + 4 > total {
                    c
                } else {
                    '*'
                }
            } else {
                c
            }
        })
        .collect()
}

/// `jane.doe@example.com` becomes `j***@example.com`
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        None => "*".repeat(email.len()),
    }
}
