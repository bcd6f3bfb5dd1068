//! Detection orchestrator: runs the category scanners in priority order

use crate::checks::{self, ClaimedRanges, Detection};
use crate::wordlist::LazyVocabulary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Scanner names, in the order they run
pub const ALL_PATTERNS: &[&str] = &[
    "cards",
    "mnemonic",
    "private_keys",
    "chain_keys",
    "api_keys",
    "pii",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Block,
}

/// Outcome of one scan. The verdict always agrees with the detections.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    verdict: Verdict,
    detections: Vec<Detection>,
    scanned_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn from_detections(detections: Vec<Detection>) -> Self {
        Self::with_timestamp(detections, Utc::now())
    }

    fn with_timestamp(detections: Vec<Detection>, scanned_at: DateTime<Utc>) -> Self {
        let verdict = if detections.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Block
        };
        Self {
            verdict,
            detections,
            scanned_at,
        }
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_blocked(&self) -> bool {
        self.verdict == Verdict::Block
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    /// Drop detections below `threshold` and re-derive the verdict
    pub fn filtered(&self, threshold: f64) -> ScanResult {
        let kept = self
            .detections
            .iter()
            .filter(|d| d.confidence() >= threshold)
            .cloned()
            .collect();
        Self::with_timestamp(kept, self.scanned_at)
    }

    /// `original` with every detection replaced by its masked form
    pub fn masked_text(&self, original: &str) -> String {
        mask_text(original, &self.detections)
    }
}

/// Replace each detection's span, last one first so earlier offsets stay valid
pub fn mask_text(text: &str, detections: &[Detection]) -> String {
    let mut ordered: Vec<&Detection> = detections.iter().collect();
    ordered.sort_by(|a, b| b.position().start.cmp(&a.position().start));

    let mut out = text.to_string();
    for d in ordered {
        let span = d.position();
        if span.end > out.len() || !out.is_char_boundary(span.start) || !out.is_char_boundary(span.end) {
            tracing::warn!(start = span.start, end = span.end, "detection span outside text, not masked");
            continue;
        }
        out.replace_range(span.start..span.end, d.masked());
    }
    out
}

/// The main secret scanner
pub struct Scanner {
    enabled_patterns: Vec<String>,
    secondary: Arc<LazyVocabulary>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    /// Create a new scanner with all checks enabled
    pub fn new() -> Self {
        Self::with_patterns(ALL_PATTERNS)
    }

    /// Create a scanner with specific patterns enabled
    pub fn with_patterns(patterns: &[&str]) -> Self {
        for p in patterns {
            if !ALL_PATTERNS.contains(p) {
                tracing::warn!(pattern = %p, "unknown scanner category ignored");
            }
        }
        Self {
            enabled_patterns: patterns.iter().map(|s| s.to_string()).collect(),
            secondary: LazyVocabulary::shared(),
        }
    }

    /// Use a different secondary mnemonic vocabulary
    pub fn with_secondary_vocabulary(mut self, secondary: Arc<LazyVocabulary>) -> Self {
        self.secondary = secondary;
        self
    }

    pub fn is_pattern_enabled(&self, pattern: &str) -> bool {
        self.enabled_patterns.iter().any(|p| p == pattern)
    }

    /// Full scan, including the secondary mnemonic vocabulary
    pub async fn scan(&self, text: &str) -> ScanResult {
        let mut claimed = ClaimedRanges::new();
        let mut detections = Vec::new();

        if self.is_pattern_enabled("cards") {
            detections.extend(checks::cards::check(text, &mut claimed));
        }
        if self.is_pattern_enabled("mnemonic") {
            detections.extend(
                checks::mnemonic::check_with_secondary(text, &mut claimed, &self.secondary).await,
            );
        }
        self.scan_remaining(text, &mut claimed, &mut detections);

        self.finish(detections)
    }

    /// Scan without waiting on the secondary vocabulary
    pub fn scan_sync(&self, text: &str) -> ScanResult {
        let mut claimed = ClaimedRanges::new();
        let mut detections = Vec::new();

        if self.is_pattern_enabled("cards") {
            detections.extend(checks::cards::check(text, &mut claimed));
        }
        if self.is_pattern_enabled("mnemonic") {
            detections.extend(checks::mnemonic::check(text, &mut claimed));
        }
        self.scan_remaining(text, &mut claimed, &mut detections);

        self.finish(detections)
    }

    /// Stages after the mnemonic check; identical for both scan paths
    fn scan_remaining(&self, text: &str, claimed: &mut ClaimedRanges, detections: &mut Vec<Detection>) {
        if self.is_pattern_enabled("private_keys") {
            detections.extend(checks::private_keys::check(text, claimed));
        }

        if self.is_pattern_enabled("chain_keys") {
            for m in checks::chain_keys::scan_chain_keys_claimed(text, claimed) {
                detections.push(Detection::new(
                    checks::Category::PrivateKey,
                    &m.label(),
                    &m.matched_text,
                    m.masked(),
                    m.confidence,
                    m.position,
                ));
            }
        }

        if self.is_pattern_enabled("api_keys") {
            detections.extend(checks::api_keys::check(text, claimed));
        }

        if self.is_pattern_enabled("pii") {
            detections.extend(checks::pii::check(text, claimed));
        }
    }

    fn finish(&self, detections: Vec<Detection>) -> ScanResult {
        let result = ScanResult::from_detections(detections);
        tracing::debug!(
            detections = result.detections().len(),
            verdict = ?result.verdict(),
            "scan complete"
        );
        result
    }
}
