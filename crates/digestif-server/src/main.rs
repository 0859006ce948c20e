#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use digestif_core::{HashPipeline, PipelineConfig};
use server::config::{CliArgs, ServerConfig};
use server::routes;
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    init_telemetry()?;

    let pipeline = HashPipeline::new(PipelineConfig {
        hash_delay: config.hash_delay,
        queue_capacity: config.queue_capacity,
    });
    let shutdown = CancellationToken::new();
    let app = routes::router(pipeline.clone(), shutdown.clone());

    let listener = TcpListener::bind(&config.server_addr).await?;
    tracing::info!(
        "Starting hash service on {} (delay {:?}, queue capacity {})",
        config.server_addr,
        config.hash_delay,
        config.queue_capacity
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    // The listener is closed; finish everything already admitted before
    // exiting so no accepted request is lost.
    pipeline.shutdown().await;

    tracing::info!("Service shut down successfully");
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
        () = token.cancelled() => {
            tracing::info!("Received shutdown request over HTTP");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
