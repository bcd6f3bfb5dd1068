//! Report generation and output formatting

use crate::checks::{Category, Detection};
use crate::scanner::{ScanResult, Verdict};
use crate::scoring::Sensitivity;
use crate::tx::{RiskLevel, RiskVerdict};
use crate::utils::line_of;
use anyhow::Result;
use colored::*;
use serde::Serialize;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

pub fn colorize_risk(level: RiskLevel, text: &str) -> ColoredString {
    match level {
        RiskLevel::Safe => text.green(),
        RiskLevel::Warning => text.yellow().bold(),
        RiskLevel::Danger => text.bright_red().bold(),
    }
}

fn colorize_confidence(confidence: f64) -> ColoredString {
    let pct = (confidence * 100.0).round() as u32;
    let text = format!("{}%", pct);
    match pct {
        90..=100 => text.bright_green(),
        70..=89 => text.green(),
        50..=69 => text.yellow(),
        _ => text.red(),
    }
}

/// JSON report structure for a text scan
#[derive(Serialize)]
pub struct JsonScanReport {
    pub version: String,
    pub scanned_at: String,
    pub verdict: Verdict,
    pub sensitivity: Sensitivity,
    pub threshold: f64,
    pub summary: Vec<CategoryCount>,
    pub detections: Vec<JsonDetection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked_text: Option<String>,
}

#[derive(Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// A detection as reported; the secret itself is never included
#[derive(Serialize)]
pub struct JsonDetection {
    pub category: Category,
    pub label: String,
    pub masked: String,
    pub confidence: f64,
    pub confidence_label: String,
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

/// JSON report structure for a wallet request
#[derive(Serialize)]
pub struct JsonRiskReport<'a> {
    pub version: String,
    pub analyzed_at: String,
    pub origin: String,
    pub remote: bool,
    #[serde(flatten)]
    pub verdict: &'a RiskVerdict,
}

fn category_counts(detections: &[Detection]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for d in detections {
        match counts.iter_mut().find(|c| c.category == d.category()) {
            Some(c) => c.count += 1,
            None => counts.push(CategoryCount {
                category: d.category(),
                count: 1,
            }),
        }
    }
    counts
}

/// Print a text-formatted scan report
pub fn print_scan_report(result: &ScanResult, content: &str, sensitivity: Sensitivity, masked: Option<&str>) {
    println!("{}", "=".repeat(60).bright_cyan());

    let verdict = match result.verdict() {
        Verdict::Pass => "PASS".green().bold(),
        Verdict::Block => "BLOCK".bright_red().bold(),
    };
    println!(
        "Verdict: {}  (sensitivity: {}, threshold {:.0}%)",
        verdict,
        sensitivity.as_str().bold(),
        sensitivity.threshold() * 100.0
    );
    println!("   Found {} sensitive item(s)\n", result.detections().len());

    for d in result.detections() {
        print_detection(d, content);
    }

    if let Some(masked) = masked {
        println!("{}", "Masked text:".bright_blue().bold());
        for line in masked.lines() {
            println!("   | {}", line.dimmed());
        }
        println!();
    }

    println!("{}", "=".repeat(60).bright_cyan());

    if result.detections().is_empty() {
        println!("{} No sensitive data detected.", "[OK]".green());
    } else {
        println!(
            "{} Remove or mask the items above before sharing this text.",
            "[TIP]".bright_yellow()
        );
    }
    println!();
}

fn print_detection(d: &Detection, content: &str) {
    println!(
        "{} {} ({}, {})",
        "[!!]".bright_red(),
        d.label().bold(),
        colorize_confidence(d.confidence()),
        d.confidence_label()
    );
    println!(
        "   {} line {}, bytes {}..{}",
        "[AT]".bright_blue(),
        line_of(content, d.position().start).to_string().bright_yellow(),
        d.position().start,
        d.position().end
    );
    println!("   {} {}", "Masked:".bright_yellow(), d.masked());
    println!();
}

/// Generate a JSON scan report
pub fn generate_scan_json(
    result: &ScanResult,
    content: &str,
    sensitivity: Sensitivity,
    masked: Option<&str>,
) -> Result<String> {
    let detections = result
        .detections()
        .iter()
        .map(|d| JsonDetection {
            category: d.category(),
            label: d.label().to_string(),
            masked: d.masked().to_string(),
            confidence: d.confidence(),
            confidence_label: d.confidence_label().to_string(),
            start: d.position().start,
            end: d.position().end,
            line: line_of(content, d.position().start),
        })
        .collect();

    let report = JsonScanReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        scanned_at: result.scanned_at().to_rfc3339(),
        verdict: result.verdict(),
        sensitivity,
        threshold: sensitivity.threshold(),
        summary: category_counts(result.detections()),
        detections,
        masked_text: masked.map(str::to_string),
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

/// Print a text-formatted wallet request verdict
pub fn print_risk_report(verdict: &RiskVerdict, origin: &str) {
    println!("{}", "=".repeat(60).bright_cyan());
    println!(
        "Risk: {}  method {}  origin {}",
        colorize_risk(verdict.risk_level, &verdict.risk_level.as_str().to_uppercase()),
        verdict.method.bright_white().bold(),
        if origin.is_empty() { "(none)" } else { origin }
    );

    if let Some(action) = &verdict.decoded_action {
        println!("   {} {}", "[ACTION]".bright_blue(), action);
    }
    println!();
    println!("   {}", verdict.explanation);

    if !verdict.risk_factors.is_empty() {
        println!();
        println!("   {} Risk factors:", "[INFO]".bright_cyan());
        for factor in &verdict.risk_factors {
            println!("      - {}", factor);
        }
    }

    println!("{}", "=".repeat(60).bright_cyan());
    println!();
}

/// Generate a JSON wallet request report
pub fn generate_risk_json(verdict: &RiskVerdict, origin: &str, remote: bool) -> Result<String> {
    let report = JsonRiskReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        analyzed_at: chrono::Utc::now().to_rfc3339(),
        origin: origin.to_string(),
        remote,
        verdict,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
