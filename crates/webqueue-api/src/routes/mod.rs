//! API routes.

pub mod health;
pub mod jobs;

use crate::AppState;
use crate::error::ApiError;
use axum::Router;
use axum::http::{Method, Uri};

/// Build the main API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(jobs::router())
        .merge(health::router())
        .fallback(bad_request)
        .with_state(state)
}

/// Unknown paths and unsupported methods on known paths.
async fn bad_request(method: Method, uri: Uri) -> ApiError {
    ApiError::BadRequest(format!(
        "bad request for {} method, check url: {}",
        method,
        uri.path()
    ))
}
