//! Sensitivity policy: maps a user-facing level to a confidence threshold

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How eager the scanner should be to block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    /// Only near-certain detections block
    Low,
    #[default]
    Medium,
    /// Pattern-only detections (phone, email) block too
    High,
}

impl Sensitivity {
    /// Minimum detection confidence that still blocks
    pub fn threshold(&self) -> f64 {
        match self {
            Sensitivity::Low => 0.95,
            Sensitivity::Medium => 0.80,
            Sensitivity::High => 0.60,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sensitivity::Low => "low",
            Sensitivity::Medium => "medium",
            Sensitivity::High => "high",
        }
    }
}

impl FromStr for Sensitivity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Sensitivity::Low),
            "medium" => Ok(Sensitivity::Medium),
            "high" => Ok(Sensitivity::High),
            other => anyhow::bail!("unknown sensitivity '{}', expected low, medium or high", other),
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
