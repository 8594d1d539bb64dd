//! # skillgraph
//!
//! The main binary for the skill graph builder and validation service.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for building and scoring graphs
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                apps/skillgraph (THE BINARY)             │
//! │                                                         │
//! │      ┌─────────────┐            ┌─────────────┐         │
//! │      │    CLI      │            │  HTTP API   │         │
//! │      │   (clap)    │            │   (axum)    │         │
//! │      └──────┬──────┘            └──────┬──────┘         │
//! │             └─────────────┬────────────┘                │
//! │                           ▼                             │
//! │                  ┌─────────────────┐                    │
//! │                  │ skillgraph-core │                    │
//! │                  │  (THE LOGIC)    │                    │
//! │                  └─────────────────┘                    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! skillgraph server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! skillgraph build ./vault -o graph.json
//! skillgraph validate graph.json
//! skillgraph rubric
//! ```

use clap::Parser;
use skillgraph::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // SKILLGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("SKILLGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "skillgraph=debug,skillgraph_core=debug,tower_http=debug"
    } else {
        "skillgraph=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so `build` can stream the graph on stdout.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if cli.is_server() && !cli.quiet {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  skillgraph v{}

  Markdown in, skill graph out, scored 0-100
"#,
        env!("CARGO_PKG_VERSION")
    );
}
