mod config;
mod error;
mod handlers;
mod router;
mod state;

use anyhow::Context;
use clap::Parser;
use config::GatewayArgs;
use persistence::journal::JournalConfig;
use persistence::store::JsonlStore;
use router::create_router;
use state::AppState;
use std::sync::Arc;
use stream::LocalTransport;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    fix_telemetry::init_logging();

    let args = GatewayArgs::parse();
    tracing::info!(
        journal = %args.journal_dir.display(),
        store = %args.store_path.display(),
        report = %args.report_path.display(),
        "Starting Gateway API service"
    );

    // The gateway owns the stream: entries are journaled here and served
    // to consumers over /v1/stream.
    let transport = LocalTransport::open_journal(JournalConfig::new(&args.journal_dir))
        .with_context(|| format!("opening stream journal {}", args.journal_dir.display()))?;
    let store = JsonlStore::open(&args.store_path)
        .with_context(|| format!("opening record store {}", args.store_path.display()))?;

    let state = AppState::new(Arc::new(transport), Arc::new(store), args.report_path.clone());
    let app = create_router(state);

    let listener = TcpListener::bind(args.addr).await?;
    tracing::info!("Listening on {}", args.addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
