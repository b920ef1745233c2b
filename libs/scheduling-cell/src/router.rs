// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn scheduling_routes(state: Arc<AppConfig>) -> Router {
    // All scheduling operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/", get(handlers::list_appointments))
        .route("/slots", get(handlers::get_free_slots))
        .route("/doctors", get(handlers::list_doctors))
        .route("/specialties", get(handlers::list_specialties))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route(
            "/{appointment_id}/status",
            put(handlers::update_appointment_status),
        )
        .route("/{appointment_id}", delete(handlers::delete_appointment))
        .route(
            "/{appointment_id}/archive-reports",
            post(handlers::archive_appointment_reports),
        )
        .route("/{appointment_id}/notify", post(handlers::notify_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
