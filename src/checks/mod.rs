//! Category scanners and the detection type they produce

pub mod api_keys;
pub mod cards;
pub mod chain_keys;
pub mod mnemonic;
pub mod pii;
pub mod private_keys;

use serde::Serialize;

/// What kind of secret a detection is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CreditCard,
    SeedPhrase,
    PrivateKey,
    ApiKey,
    EnvSecret,
    NationalId,
    Phone,
    Email,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CreditCard => "credit_card",
            Category::SeedPhrase => "seed_phrase",
            Category::PrivateKey => "private_key",
            Category::ApiKey => "api_key",
            Category::EnvSecret => "env_secret",
            Category::NationalId => "national_id",
            Category::Phone => "phone",
            Category::Email => "email",
        }
    }

    /// Human-readable title
    pub fn title(&self) -> &'static str {
        match self {
            Category::CreditCard => "Credit Card Number",
            Category::SeedPhrase => "Seed Phrase",
            Category::PrivateKey => "Private Key",
            Category::ApiKey => "API Key",
            Category::EnvSecret => ".env Secret",
            Category::NationalId => "National ID Number",
            Category::Phone => "Phone Number",
            Category::Email => "Email Address",
        }
    }
}

/// Byte range `[start, end)` in the scanned text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl From<regex::Match<'_>> for Span {
    fn from(m: regex::Match<'_>) -> Self {
        Span::new(m.start(), m.end())
    }
}

/// A verified secret found in the input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    category: Category,
    /// Sub-kind shown to the user, e.g. "API Key (OpenAI)"
    label: String,
    /// Never serialized
    #[serde(skip)]
    original: String,
    masked: String,
    confidence: f64,
    position: Span,
}

impl Detection {
    pub fn new(
        category: Category,
        label: &str,
        original: &str,
        masked: String,
        confidence: f64,
        position: Span,
    ) -> Self {
        Self {
            category,
            label: label.to_string(),
            original: original.to_string(),
            masked,
            confidence: confidence.clamp(0.0, 1.0),
            position,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn masked(&self) -> &str {
        &self.masked
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn position(&self) -> Span {
        self.position
    }

    /// Get confidence as a descriptive string
    pub fn confidence_label(&self) -> &'static str {
        match (self.confidence * 100.0).round() as u32 {
            90..=100 => "Very High",
            70..=89 => "High",
            50..=69 => "Medium",
            25..=49 => "Low",
            _ => "Very Low",
        }
    }
}

/// Ranges already owned by an accepted detection.
///
/// Scanners run in a fixed priority order and consult this list before
/// accepting a candidate, so detections never overlap.
#[derive(Debug, Default, Clone)]
pub struct ClaimedRanges {
    spans: Vec<Span>,
}

impl ClaimedRanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_claimed(&self, span: &Span) -> bool {
        self.spans.iter().any(|s| s.overlaps(span))
    }

    pub fn claim(&mut self, span: Span) {
        self.spans.push(span);
    }

    /// Claim `span` unless it overlaps an existing claim
    pub fn try_claim(&mut self, span: Span) -> bool {
        if self.is_claimed(&span) {
            return false;
        }
        self.claim(span);
        true
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Keep the first `prefix` and last `suffix` characters, star out the rest
pub fn partial_mask(value: &str, prefix: usize, suffix: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= prefix + suffix + 4 {
        return "*".repeat(chars.len());
    }
    let mut out: String = chars[..prefix].iter().collect();
    out.push_str(&"*".repeat(chars.len() - prefix - suffix));
    out.extend(&chars[chars.len() - suffix..]);
    out
}
