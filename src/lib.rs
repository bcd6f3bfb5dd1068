//! OmniGuard - local secret-leak detection and wallet request risk analysis
//!
//! Two entry points:
//!
//! - [`scanner::Scanner`] decides whether a text fragment contains a payment
//!   card, seed phrase, private key, API token or personal data. Every
//!   candidate a pattern pre-filter finds is confirmed by a checksum,
//!   encoding, entropy or word list check before it is reported.
//! - [`tx::analyze`] and [`tx::analyze_with_remote`] score a wallet request
//!   before the user signs it.
//!
//! No network access happens unless a [`tx::ReasoningTransport`] is supplied.

pub mod checks;
pub mod codec;
pub mod config;
pub mod report;
pub mod scanner;
pub mod scoring;
pub mod transport;
pub mod tx;
pub mod utils;
pub mod wordlist;

#[cfg(test)]
mod test_vectors;

pub use checks::{Category, Detection, Span};
pub use scanner::{ScanResult, Scanner, Verdict};
pub use scoring::Sensitivity;
pub use tx::{RiskLevel, RiskVerdict, WalletRequest};
