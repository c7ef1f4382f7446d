use anyhow::Context;
use clap::Parser;
use consumer::{ConsumerArgs, StreamConsumer};
use persistence::checkpoint::CheckpointManager;
use persistence::store::JsonlStore;
use stream::HttpTransport;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fix_telemetry::init_logging();

    let args = ConsumerArgs::parse();
    info!(
        stream = %format!("{}:{}", args.stream_host, args.stream_port),
        checkpoint = %args.checkpoint_path.display(),
        store = %args.store_path.display(),
        policy = ?args.persist_failure_policy,
        "Starting FIX consumer"
    );

    let transport = HttpTransport::new(&args.stream_host, args.stream_port)?;
    let store = JsonlStore::open(&args.store_path)
        .with_context(|| format!("opening record store {}", args.store_path.display()))?;
    let checkpoints = CheckpointManager::new(&args.checkpoint_path);

    let mut consumer = StreamConsumer::new(transport, store, checkpoints, args.consumer_config());
    let result = consumer.run_until(shutdown_signal()).await;

    let stats = consumer.stats();
    info!(
        processed = stats.entries_processed,
        persistence_failures = stats.persistence_failures,
        checkpoint_failures = stats.checkpoint_failures,
        empty_polls = stats.empty_polls,
        state = ?consumer.state(),
        "FIX consumer exiting"
    );

    result.map_err(Into::into)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C, running until failure");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
