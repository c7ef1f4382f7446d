use anyhow::Context;
use clap::Parser;
use fix_codec::Splitter;
use fix_types::tags::FIX44_HEADER;
use producer::{DEFAULT_PROGRESS_EVERY, Producer};
use std::path::PathBuf;
use stream::HttpTransport;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fix-producer", version, about = "Publish the FIX messages of a log file to the stream")]
struct Cli {
    /// FIX log file, one or more messages per line
    input: PathBuf,

    /// Stream host
    #[arg(long, env = "STREAM_HOST", default_value = "localhost")]
    stream_host: String,

    /// Stream port
    #[arg(long, env = "STREAM_PORT", default_value_t = 8080)]
    stream_port: u16,

    /// Header that starts every message
    #[arg(long, default_value = FIX44_HEADER)]
    marker: String,

    /// Log progress every N published messages
    #[arg(long, default_value_t = DEFAULT_PROGRESS_EVERY)]
    progress_every: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fix_telemetry::init_logging();

    let cli = Cli::parse();
    info!(
        input = %cli.input.display(),
        stream = %format!("{}:{}", cli.stream_host, cli.stream_port),
        "Reading FIX messages"
    );

    let transport = HttpTransport::new(&cli.stream_host, cli.stream_port)?;
    let producer = Producer::new(transport, Splitter::new(cli.marker))
        .with_progress_every(cli.progress_every);

    let stats = producer
        .publish_file(&cli.input)
        .await
        .with_context(|| format!("replaying {}", cli.input.display()))?;

    info!(published = stats.published, lines = stats.lines, "Done");
    Ok(())
}
