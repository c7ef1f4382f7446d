use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "gateway", version, about = "FIX ingress, report and stream API")]
pub struct GatewayArgs {
    /// Listen address
    #[arg(long, env = "GATEWAY_ADDR", default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,

    /// Directory of the stream journal segments
    #[arg(long, env = "JOURNAL_DIR", default_value = "data/stream")]
    pub journal_dir: PathBuf,

    /// Record store the reports are computed from
    #[arg(long, env = "STORE_PATH", default_value = "data/fix_messages.jsonl")]
    pub store_path: PathBuf,

    /// Where the report artifact is written
    #[arg(long, env = "REPORT_PATH", default_value = "reports/fix_report.txt")]
    pub report_path: PathBuf,
}
