//! API keys, bearer tokens and `.env` style secrets

use super::{partial_mask, Category, ClaimedRanges, Detection, Span};
use once_cell::sync::Lazy;
use regex::Regex;

pub const REDACTED: &str = "[REDACTED]";

// Provider keys with a recognizable prefix
static ANTHROPIC_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bsk-ant-(?:api03-)?[A-Za-z0-9_\-]{20,}").expect("Invalid regex")
});

static OPENAI_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bsk-(?:proj-)?[A-Za-z0-9_\-]{16,}").expect("Invalid regex")
});

static AWS_ACCESS_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bAKIA[0-9A-Z]{16}\b").expect("Invalid regex")
});

static GITHUB_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bgh[pousr]_[A-Za-z0-9]{36}\b").expect("Invalid regex")
});

static STRIPE_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[sr]k_(?:live|test)_[A-Za-z0-9]{24,}\b").expect("Invalid regex")
});

// Generic assignments; group 1 is the value
static GENERIC_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(?:api[_\-]?key|secret[_\-]?key|access[_\-]?token|auth[_\-]?token|client[_\-]?secret)["']?\s*[:=]\s*["']?([A-Za-z0-9_\-./+=]{16,})"#
    ).expect("Invalid regex")
});

static BEARER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbearer\s+([A-Za-z0-9_\-.=]{20,})").expect("Invalid regex")
});

// NAME_KEY=value lines; group 1 is the name, group 2 the value
static ENV_SECRET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*(?:export[ \t]+)?([A-Z][A-Z0-9_]*(?:KEY|SECRET|TOKEN|PASSWORD|PASSWD|PWD|CREDENTIALS?))[ \t]*=[ \t]*["']?([A-Za-z0-9_\-./+=:@]{8,})"#
    ).expect("Invalid regex")
});

struct Provider {
    name: &'static str,
    regex: &'static Lazy<Regex>,
}

/// Checked in order; Anthropic before OpenAI since both start with `sk-`
static PROVIDERS: &[Provider] = &[
    Provider { name: "Anthropic", regex: &ANTHROPIC_KEY_REGEX },
    Provider { name: "OpenAI", regex: &OPENAI_KEY_REGEX },
    Provider { name: "AWS", regex: &AWS_ACCESS_KEY_REGEX },
    Provider { name: "GitHub", regex: &GITHUB_TOKEN_REGEX },
    Provider { name: "Stripe", regex: &STRIPE_KEY_REGEX },
];

const PLACEHOLDER_MARKERS: &[&str] = &[
    "your", "example", "placeholder", "changeme", "change_me", "dummy", "xxxx", "redacted", "<",
];

pub fn check(content: &str, claimed: &mut ClaimedRanges) -> Vec<Detection> {
    let mut detections = Vec::new();

    for provider in PROVIDERS {
        for mat in provider.regex.find_iter(content) {
            let span = Span::from(mat);
            if !claimed.try_claim(span) {
                continue;
            }
            tracing::debug!(provider = provider.name, "provider api key matched");
            detections.push(Detection::new(
                Category::ApiKey,
                &format!("API Key ({})", provider.name),
                mat.as_str(),
                partial_mask(mat.as_str(), 5, 3),
                0.97,
                span,
            ));
        }
    }

    for regex in [&*GENERIC_KEY_REGEX, &*BEARER_REGEX] {
        for caps in regex.captures_iter(content) {
            let Some(value) = caps.get(1) else { continue };
            let span = Span::from(value);
            if is_placeholder(value.as_str()) || !claimed.try_claim(span) {
                continue;
            }
            detections.push(Detection::new(
                Category::ApiKey,
                "API Key (Generic)",
                value.as_str(),
                REDACTED.to_string(),
                0.70,
                span,
            ));
        }
    }

    for caps in ENV_SECRET_REGEX.captures_iter(content) {
        let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let span = Span::from(value);
        if is_placeholder(value.as_str()) || !claimed.try_claim(span) {
            continue;
        }
        detections.push(Detection::new(
            Category::EnvSecret,
            &format!("{} ({})", Category::EnvSecret.title(), name.as_str()),
            value.as_str(),
            REDACTED.to_string(),
            0.80,
            span,
        ));
    }

    detections
}

/// Template values such as `your-api-key-here` or `xxxxxxxxxxxxxxxx`
fn is_placeholder(value: &str) -> bool {
    let lower = value.to_lowercase();
    if PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m)) {
        return true;
    }
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => true,
    }
}
