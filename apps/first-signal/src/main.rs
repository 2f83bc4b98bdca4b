//! # First Signal
//!
//! The main binary for the First Signal decision log.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for logging decisions and inspecting the causal graph
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │          apps/first-signal (THE BINARY)       │
//! │                                               │
//! │    ┌─────────────┐        ┌─────────────┐     │
//! │    │    CLI      │        │  HTTP API   │     │
//! │    │   (clap)    │        │   (axum)    │     │
//! │    └──────┬──────┘        └──────┬──────┘     │
//! │           └───────────┬──────────┘            │
//! │                       ▼                       │
//! │               ┌───────────────┐               │
//! │               │  signal-core  │               │
//! │               │ (THE ENGINE)  │               │
//! │               └───────────────┘               │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! first-signal server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! first-signal log -d "Launched referral program" -o "Signups increased by 15%" -k success
//! first-signal patterns
//! first-signal status
//! ```

use clap::Parser;
use first_signal::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // FIRST_SIGNAL_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("FIRST_SIGNAL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "first_signal=info,signal_core=info,tower_http=debug".into());

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
                .with(tracing_subscriber::fmt::layer())
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
  ┌─┐┬┬─┐┌─┐┌┬┐  ┌─┐┬┌─┐┌┐┌┌─┐┬
  ├┤ │├┬┘└─┐ │   └─┐││ ┬│││├─┤│
  └  ┴┴└─└─┘ ┴   └─┘┴└─┘┘└┘┴ ┴┴─┘

  Cognitive State Engine v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
