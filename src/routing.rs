//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    AppState, CredentialHasher,
    auth::{log_in, register_user},
    course::{create_course_endpoint, get_courses_endpoint},
    endpoints, logging_middleware,
};

/// Return a router with all the app's routes.
pub fn build_router<H>(state: AppState<H>) -> Router
where
    H: CredentialHasher,
{
    Router::new()
        .route(endpoints::ROOT, get(get_server_status))
        .route(endpoints::REGISTER, post(register_user::<H>))
        .route(endpoints::LOG_IN, post(log_in::<H>))
        .route(
            endpoints::COURSES,
            get(get_courses_endpoint).post(create_course_endpoint),
        )
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The root path '/' reports that the server is up.
async fn get_server_status() -> &'static str {
    "Server is working!"
}

async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
