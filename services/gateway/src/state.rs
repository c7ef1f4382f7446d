use persistence::store::RecordStore;
use report::ReportGenerator;
use std::path::PathBuf;
use std::sync::Arc;
use stream::Transport;

#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<dyn Transport>,
    pub reports: ReportGenerator,
    pub report_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn RecordStore>,
        report_path: PathBuf,
    ) -> Self {
        Self {
            transport,
            reports: ReportGenerator::new(store),
            report_path: Arc::new(report_path),
        }
    }
}
