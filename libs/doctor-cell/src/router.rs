use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/facets", get(handlers::get_doctor_facets));

    let protected_routes = Router::new()
        .route("/{doctor_id}/slots", get(handlers::get_available_slots))
        .route("/{doctor_id}/slots/{slot_id}", get(handlers::get_slot))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
