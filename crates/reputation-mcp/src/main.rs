//! Reputation MCP Server
//!
//! MCP server that exposes the reputation scoring and eligibility engine as
//! tools for AI agents and scripts. Implements the MCP protocol using pure
//! JSON-RPC over stdio; every tool is a synchronous computation.

mod config;
mod error;
mod rate_limit;
mod tools;

use std::io::{self, BufRead, Write};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::AppConfig;
use rate_limit::create_rate_limiter;
use reputation_core::BadgeEvaluator;
use tools::{handle_line, ReputationTools};

fn main() -> anyhow::Result<()> {
    // Initialize logging to stderr (stdout is for MCP protocol)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("reputation_mcp=info,reputation_core=info")
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Reputation MCP Server");

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        error::McpError::from(e)
    })?;

    tracing::info!(
        salt_version = %config.commitment.salt_version,
        tolerance_bps = config.commitment.tolerance_bps,
        early_adopter_cutoff = ?config.eligibility.early_adopter_cutoff,
        rate_limit = config.rate_limit.max_requests,
        rate_window_seconds = config.rate_limit.window_seconds,
        "Configuration loaded"
    );

    // Initialize components
    let tools = ReputationTools::new(
        config.commitment.codec(),
        BadgeEvaluator::new(config.eligibility.early_adopter_policy()),
        create_rate_limiter(&config.rate_limit),
    );

    tracing::info!("MCP server ready, listening on stdio");

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = %e, "Error reading stdin");
                break;
            }
        };

        // Notifications and blank lines produce no response
        let Some(response) = handle_line(&tools, &line) else {
            continue;
        };

        let written = serde_json::to_writer(&mut stdout, &response)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(stdout))
            .and_then(|()| stdout.flush());
        if let Err(e) = written {
            tracing::error!(error = %e, "Error writing response");
            break;
        }
    }

    tracing::info!("MCP server shutting down");
    Ok(())
}
