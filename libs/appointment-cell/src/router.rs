use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // Every booking operation needs a signed-in caller
    let protected_routes = Router::new()
        .route("/mine", get(handlers::get_my_bookings))
        .route(
            "/doctors/{doctor_id}",
            post(handlers::submit_booking).get(handlers::get_doctor_bookings),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
