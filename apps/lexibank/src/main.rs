//! # Lexibank
//!
//! The main binary for the Lexibank vocabulary manager.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for banks, reviews and courses
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │              apps/lexibank (THE BINARY)           │
//! │                                                   │
//! │   ┌─────────────┐            ┌─────────────┐      │
//! │   │    CLI      │            │  HTTP API   │      │
//! │   │   (clap)    │            │   (axum)    │      │
//! │   └──────┬──────┘            └──────┬──────┘      │
//! │          └──────────────┬───────────┘             │
//! │                         ▼                         │
//! │                ┌─────────────────┐                │
//! │                │  lexibank-core  │                │
//! │                │ (store + stages)│                │
//! │                └─────────────────┘                │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! lexibank bank create "Spanish A1"
//! lexibank import --bank 1 -f words.txt -t text
//! lexibank review --bank 1 --correct 1,2 --incorrect 3
//! lexibank server --host 0.0.0.0 --port 8080
//! ```

use clap::Parser;
use lexibank::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // LEXIBANK_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LEXIBANK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lexibank=info,lexibank_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  ╦  ╔═╗═╗ ╦╦╔╗ ╔═╗╔╗╔╦╔═
  ║  ║╣ ╔╩╦╝║╠╩╗╠═╣║║║╠╩╗
  ╩═╝╚═╝╩ ╚═╩╚═╝╩ ╩╝╚╝╩ ╩

  Vocabulary banks v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
