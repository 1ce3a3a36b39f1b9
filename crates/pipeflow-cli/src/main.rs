#![doc = include_str!("../README.md")]

mod app;

use app::cep::{ViaCepClient, scan};
use app::config::{CepConfig, CliArgs, RunConfig};
use app::telemetry::init_telemetry;
use clap::Parser;
use pipeflow::CancellationToken;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    // Reject bad settings before any exporter is installed.
    let config = RunConfig::try_from(args.command)?;

    let providers = init_telemetry()?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let outcome = match config {
        RunConfig::Cep(config) => run_cep(config, &cancel).await,
        RunConfig::Primes(config) => {
            log_startup_info("primes", &config);
            app::primes::run(&config, &cancel).await.map(|_| ())
        }
    };

    providers.shutdown();
    outcome
}

async fn run_cep(config: CepConfig, cancel: &CancellationToken) -> anyhow::Result<()> {
    log_startup_info("cep", &config);

    let client = ViaCepClient::new(config.base_url.as_str(), config.request_timeout)?;
    let summary = scan(&config, client, cancel.clone()).await?;
    print!("{summary}");

    tracing::info!(
        "Scan finished: {} valid, {} invalid",
        summary.valid,
        summary.invalid
    );
    Ok(())
}

fn log_startup_info(command: &str, config: &impl core::fmt::Debug) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting `{command}` with full config: {config:#?}");
    } else {
        tracing::info!("Starting `{command}`");
    }
}

/// Raises `cancel` on Ctrl+C or SIGTERM so running pipelines wind down and
/// report what they collected.
async fn cancel_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = cancel.cancelled() => return,
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, cancelling running work...");
    cancel.cancel();
}
