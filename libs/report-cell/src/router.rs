// libs/report-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn report_routes(state: Arc<AppConfig>) -> Router {
    // Every report operation requires an authenticated staff user; the
    // role check itself lives in the service layer.
    let protected_routes = Router::new()
        .route("/", post(handlers::upload_report))
        .route("/", get(handlers::search_reports))
        .route("/{report_id}/note", put(handlers::update_report_note))
        .route("/{report_id}/archive", post(handlers::archive_report))
        .route("/{report_id}/delete", post(handlers::delete_report))
        .route("/{report_id}/download", get(handlers::download_report))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
