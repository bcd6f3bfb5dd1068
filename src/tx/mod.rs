//! Wallet request risk analysis
//!
//! [`analyze`] is a pure local pre-screen. [`analyze_with_remote`] runs it
//! first and, unless the request is already `danger`, asks a remote
//! reasoning service for a second opinion through a [`ReasoningTransport`].

pub mod decoder;
pub mod local;
pub mod remote;

pub use decoder::{decode_transaction, DecodeError, DecodedCall};
pub use local::analyze;
pub use remote::{analyze_with_remote, ReasoningTransport, RemoteContext, RemoteOptions};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered: `Safe < Warning < Danger`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Warning,
    Danger,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Warning => "warning",
            RiskLevel::Danger => "danger",
        }
    }

    /// Strict parse; anything outside the three levels is `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "safe" => Some(RiskLevel::Safe),
            "warning" => Some(RiskLevel::Warning),
            "danger" => Some(RiskLevel::Danger),
            _ => None,
        }
    }
}

/// A wallet call as the page submitted it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRequest {
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    #[serde(default)]
    pub origin: String,
}

impl WalletRequest {
    pub fn new(method: &str, params: Vec<Value>, origin: &str) -> Self {
        Self {
            method: method.to_string(),
            params,
            origin: origin.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskVerdict {
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub risk_factors: Vec<String>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_action: Option<String>,
}

impl RiskVerdict {
    pub fn new(risk_level: RiskLevel, explanation: &str, method: &str) -> Self {
        Self {
            risk_level,
            explanation: explanation.to_string(),
            risk_factors: Vec::new(),
            method: method.to_string(),
            decoded_action: None,
        }
    }

    /// Add a factor unless an identical one is already listed
    pub fn add_factor(&mut self, factor: impl Into<String>) {
        let factor = factor.into();
        if !self.risk_factors.contains(&factor) {
            self.risk_factors.push(factor);
        }
    }

    /// Raise the level; never lowers it
    pub fn escalate(&mut self, level: RiskLevel) {
        self.risk_level = self.risk_level.max(level);
    }
}
