use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use report_cell::router::report_routes;
use scheduling_cell::router::scheduling_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic portal API is running!" }))
        .nest("/appointments", scheduling_routes(state.clone()))
        .nest("/reports", report_routes(state.clone()))
}
