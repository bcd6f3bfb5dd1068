//! Utility functions for input handling and text slicing

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Read a file's contents
pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Text to scan: the argument, else the file, else all of stdin
pub fn read_input(text: Option<&str>, file: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text.to_string());
    }
    if let Some(path) = file {
        return read_file(path);
    }

    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read from stdin")?;
    Ok(buf)
}

/// Parse a JSON document from a file
pub fn read_json_file(path: &Path) -> Result<serde_json::Value> {
    let content = read_file(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// At most `max` characters, never splitting a character
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// 1-based line number of a byte offset
pub fn line_of(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content.as_bytes()[..offset].iter().filter(|&&b| b == b'\n').count() + 1
}
