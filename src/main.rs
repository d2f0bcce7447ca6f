//! docstore-mcp binary.
//!
//! Loads a document source, builds it and serves it over stdin/stdout until
//! input closes or SIGINT/SIGTERM arrives.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use docstore_mcp::{
    DocumentSession, DocumentSource, McpError, McpServer, Result, ServerConfig, StoreError,
};

/// MCP server for a single structured document.
#[derive(Parser, Debug)]
#[command(name = "docstore-mcp", version, about)]
struct Cli {
    /// JSON document source to load
    #[arg(long, value_name = "PATH")]
    document: PathBuf,

    /// Reject requests other than initialize/ping until the client initializes
    #[arg(long)]
    strict_lifecycle: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries JSON-RPC frames only
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Single-threaded: requests are handled one at a time
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };
    let outcome = runtime.block_on(run(cli));
    // A pending stdin read cannot be cancelled; don't wait for it
    runtime.shutdown_background();

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(McpError::Store(StoreError::Invalid(violations))) => {
            for violation in &violations {
                error!(%violation, "Document rule violated");
            }
            error!(count = violations.len(), "Document is invalid");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let document = DocumentSource::from_path(&cli.document)?.build()?;
    info!(
        title = %document.info().title,
        blocks = document.len(),
        hash = %document.content_hash(),
        "Serving document"
    );

    let config = ServerConfig {
        strict_lifecycle: cli.strict_lifecycle,
        ..ServerConfig::default()
    };
    let mut server = McpServer::with_config(DocumentSession::new(document), config)?;
    server.run(shutdown_signal()).await?;

    info!("docstore-mcp shutting down");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM (Ctrl-C off unix).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigint, mut sigterm) =
            match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
                (Err(e), _) | (_, Err(e)) => {
                    error!(error = %e, "Failed to install signal handlers");
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received"),
            _ = sigterm.recv() => info!("SIGTERM received"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
