//! Tutor bot CLI and HTTP entry point.
//!
//! Binary name: `tutor`
//!
//! Parses CLI arguments, opens the data directory, then either serves the
//! inbound message endpoint, runs a terminal chat session, or performs one
//! of the offline archive commands.

mod cli;
mod http;
mod state;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use tutor_observe::tracing_setup::{
    filter_for_verbosity, init_tracing, shutdown_tracing, TracingOptions,
};

use cli::{Cli, Commands};
use state::{AppState, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "tutor", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(&TracingOptions {
        default_filter: filter_for_verbosity(cli.verbose, cli.quiet).to_string(),
        json: cli.log_json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let storage = Arc::new(Storage::open().await?);

    match cli.command {
        Commands::Serve { port, host } => serve(storage, &host, port, cli.json).await?,

        Commands::Chat { channel } => {
            storage.restore().await?;
            let state = AppState::init(storage)?;
            cli::chat::run_chat(state, &channel, cli.json).await?;
        }

        Commands::Flush => cli::flush::flush(&storage, cli.json).await?,

        Commands::Status => cli::status::status(&storage, cli.json).await?,

        Commands::Completions { .. } => unreachable!("handled before tracing setup"),
    }

    Ok(())
}

async fn serve(storage: Arc<Storage>, host: &str, port: u16, json: bool) -> anyhow::Result<()> {
    let (loaded, recovered) = storage.restore().await?;
    let state = AppState::init(storage)?;

    let cancel = CancellationToken::new();
    let maintenance = state.start_maintenance(cancel.clone());

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    if !json {
        println!(
            "  {} Tutor listening on {}",
            console::style("⚡").bold(),
            console::style(format!("http://{addr}")).cyan()
        );
        println!(
            "  {}",
            console::style(format!(
                "Restored {} entries for {} student(s), {} from checkpoint",
                loaded.entries, loaded.students, recovered.recovered
            ))
            .dim()
        );
        println!("  {}", console::style("Press Ctrl+C to stop").dim());
    }

    let router = http::router::build_router(state.clone());
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    maintenance.stop().await;
    let report = state.shutdown().await;
    if !json {
        println!("\n  Server stopped.");
    }
    cli::print_shutdown_report(&report, json)?;

    if !report.is_clean() {
        anyhow::bail!("shutdown left unarchived turns in the checkpoint");
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
