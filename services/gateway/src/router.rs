use crate::handlers::{self, entries, fix, reports};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/fix/parse", post(fix::parse_message))
        .route("/report/generate", get(reports::generate_report))
        .route("/report/read", get(reports::read_report));

    let stream_routes = Router::new().route(
        "/stream/entries",
        post(entries::publish_entry).get(entries::read_entries),
    );

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        .nest("/v1", stream_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
