//! OmniGuard - secret-leak scanner and wallet request risk analyzer
//!
//! Scans text for payment cards, seed phrases, private keys, API tokens and
//! personal data, and scores wallet signing requests before they are approved.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

use omniguard::config::Config;
use omniguard::report::{self, OutputFormat};
use omniguard::scanner::{ScanResult, Scanner};
use omniguard::scoring::Sensitivity;
use omniguard::transport::HttpTransport;
use omniguard::tx::{self, RemoteContext, RemoteOptions, RiskVerdict, WalletRequest};
use omniguard::utils;

/// OmniGuard - secret-leak scanner and wallet request risk analyzer
#[derive(Parser)]
#[command(name = "omniguard")]
#[command(version)]
#[command(about = "Detect secrets in text and score wallet requests before signing", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan text for secrets and personal data
    Scan {
        /// Text to scan (reads --file or stdin when omitted)
        text: Option<String>,

        /// Read the text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Sensitivity: low, medium, high (default from config, else medium)
        #[arg(short, long)]
        sensitivity: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        output: String,

        /// Comma-separated scanners: cards, mnemonic, private_keys, chain_keys, api_keys, pii
        #[arg(long)]
        categories: Option<String>,

        /// Print the text with every detection masked
        #[arg(long)]
        mask: bool,

        /// Exit with error if anything is detected (for CI/CD)
        #[arg(long)]
        ci: bool,
    },

    /// Score a wallet request before signing
    AnalyzeTx {
        /// JSON-RPC method, e.g. eth_sendTransaction
        #[arg(short, long)]
        method: String,

        /// JSON array of request params
        #[arg(short, long, default_value = "[]")]
        params: String,

        /// Origin of the requesting site
        #[arg(long, default_value = "")]
        origin: String,

        /// Ask the remote reasoning service for a second opinion
        #[arg(long)]
        remote: bool,

        /// Typed-data JSON file to include in the remote prompt
        #[arg(long)]
        typed_data: Option<PathBuf>,

        /// Contract source file to include in the remote prompt
        #[arg(long)]
        contract_source: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load();

    // Print banner (only for text output)
    if !is_structured_output(&cli) {
        print_banner();
    }

    match cli.command {
        Commands::Scan {
            text,
            file,
            sensitivity,
            output,
            categories,
            mask,
            ci,
        } => {
            run_scan(
                &config,
                text.as_deref(),
                file.as_deref(),
                sensitivity.as_deref(),
                &output,
                categories.as_deref(),
                mask,
                ci,
            )
            .await?;
        }
        Commands::AnalyzeTx {
            method,
            params,
            origin,
            remote,
            typed_data,
            contract_source,
            output,
        } => {
            run_analyze_tx(
                &config,
                &method,
                &params,
                &origin,
                remote,
                typed_data.as_deref(),
                contract_source.as_deref(),
                &output,
            )
            .await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so JSON on stdout stays parseable
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "omniguard=debug" } else { "omniguard=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Check if the output format is structured (JSON)
fn is_structured_output(cli: &Cli) -> bool {
    let output = match &cli.command {
        Commands::Scan { output, .. } => output,
        Commands::AnalyzeTx { output, .. } => output,
    };
    OutputFormat::from_str(output) != OutputFormat::Text
}

fn print_banner() {
    println!();
    println!(
        "{}",
        "+---------------------------------------------------------+"
            .bright_cyan()
            .bold()
    );
    println!(
        "{}",
        format!("|           OMNIGUARD v{:<35}|", env!("CARGO_PKG_VERSION"))
            .bright_cyan()
            .bold()
    );
    println!(
        "{}",
        "|     Secret-Leak Scanner & Wallet Request Analyzer       |"
            .bright_cyan()
            .bold()
    );
    println!(
        "{}",
        "+---------------------------------------------------------+"
            .bright_cyan()
            .bold()
    );
    println!();
}

#[allow(clippy::too_many_arguments)]
async fn run_scan(
    config: &Config,
    text: Option<&str>,
    file: Option<&std::path::Path>,
    sensitivity: Option<&str>,
    output_format: &str,
    categories: Option<&str>,
    mask: bool,
    ci_mode: bool,
) -> Result<()> {
    let content = utils::read_input(text, file)?;

    let sensitivity = match sensitivity {
        Some(s) => s.parse::<Sensitivity>()?,
        None => config.sensitivity(),
    };

    let patterns: Vec<String> = match categories {
        Some(list) => list.split(',').map(|p| p.trim().to_lowercase()).filter(|p| !p.is_empty()).collect(),
        None => config.categories(),
    };
    let pattern_refs: Vec<&str> = patterns.iter().map(String::as_str).collect();
    let scanner = Scanner::with_patterns(&pattern_refs);

    let result: ScanResult = scanner.scan(&content).await.filtered(sensitivity.threshold());
    let masked = mask.then(|| result.masked_text(&content));

    let format = OutputFormat::from_str(output_format);
    match format {
        OutputFormat::Text => {
            report::print_scan_report(&result, &content, sensitivity, masked.as_deref());
        }
        OutputFormat::Json => {
            let json = report::generate_scan_json(&result, &content, sensitivity, masked.as_deref())?;
            println!("{}", json);
        }
    }

    // CI mode: exit with error if anything was detected
    if ci_mode && result.is_blocked() {
        eprintln!(
            "\n{} CI check failed: {} sensitive item(s) detected",
            "[ERROR]".red(),
            result.detections().len()
        );
        std::process::exit(1);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_analyze_tx(
    config: &Config,
    method: &str,
    params: &str,
    origin: &str,
    remote: bool,
    typed_data: Option<&std::path::Path>,
    contract_source: Option<&std::path::Path>,
    output_format: &str,
) -> Result<()> {
    let params: Vec<serde_json::Value> =
        serde_json::from_str(params).context("--params must be a JSON array")?;
    let request = WalletRequest::new(method, params, origin);

    let verdict: RiskVerdict = if remote {
        let transport = match &config.remote_endpoint {
            Some(endpoint) => HttpTransport::new(endpoint, config.remote_api_key.as_deref()),
            None => HttpTransport::from_env()?,
        };

        let context = RemoteContext {
            typed_data: typed_data.map(utils::read_json_file).transpose()?,
            contract_source: contract_source.map(utils::read_file).transpose()?,
        };
        let options = RemoteOptions {
            timeout: config.remote_timeout(),
        };

        tracing::info!(endpoint = transport.endpoint(), "remote analysis enabled");
        tx::analyze_with_remote(&request, &context, &transport, &options).await
    } else {
        tx::analyze(&request)
    };

    let format = OutputFormat::from_str(output_format);
    match format {
        OutputFormat::Text => report::print_risk_report(&verdict, origin),
        OutputFormat::Json => println!("{}", report::generate_risk_json(&verdict, origin, remote)?),
    }

    Ok(())
}
