//! Job submission and query endpoints.
//!
//! `HEAD` is answered only on `/queue`, through its `GET` route. A `HEAD` on
//! any other path falls through to the 400 fallback.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;
use webqueue_core::{Job, JobId, Payload};

use super::bad_request;
use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/queue", get(list_queue).fallback(bad_request))
        .route("/monitor", post(submit_job).fallback(bad_request))
        .route("/results", post(get_result).fallback(bad_request))
}

async fn list_queue(State(state): State<AppState>) -> Json<Vec<Job>> {
    let jobs = state.scheduler.list_pending();
    info!(count = jobs.len(), "Returning queue");
    Json(jobs)
}

async fn submit_job(
    State(state): State<AppState>,
    body: Result<Json<Payload>, JsonRejection>,
) -> Result<Json<Job>, ApiError> {
    let Json(payload) = body?;
    let job = state.scheduler.submit(payload).await?;
    Ok(Json(job))
}

/// Body of a results query. Other keys (e.g. the rest of a job record
/// echoed back by the client) are ignored.
#[derive(Debug, Deserialize)]
struct ResultRequest {
    id: JobId,
}

async fn get_result(
    State(state): State<AppState>,
    body: Result<Json<ResultRequest>, JsonRejection>,
) -> Result<Json<Job>, ApiError> {
    let Json(req) = body?;
    let job = state.scheduler.result(&req.id).await?;
    Ok(Json(job))
}
