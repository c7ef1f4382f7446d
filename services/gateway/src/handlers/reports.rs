use crate::error::AppError;
use crate::state::AppState;
use anyhow::anyhow;
use axum::extract::State;
use report::ReportGenerator;

pub async fn generate_report(State(state): State<AppState>) -> Result<String, AppError> {
    let reports = state.reports.clone();
    let path = state.report_path.clone();

    // Scanning the store and writing the artifact is blocking file I/O
    tokio::task::spawn_blocking(move || reports.generate(&path))
        .await
        .map_err(|e| AppError::InternalError(anyhow!("report task failed: {}", e)))??;

    Ok(format!("Report saved to: {}", state.report_path.display()))
}

pub async fn read_report(State(state): State<AppState>) -> Result<String, AppError> {
    let path = state.report_path.clone();
    let text = tokio::task::spawn_blocking(move || ReportGenerator::read(&path))
        .await
        .map_err(|e| AppError::InternalError(anyhow!("report task failed: {}", e)))??;
    Ok(text)
}
