//! HTTP transport over a [`Dispatcher`].
//!
//! `POST /solve` answers 200 with the solution, 202 while the job is still
//! pending, 422 on invalid input and 500 when solving fails.
//! `GET /result/{task_id}` answers with the same codes for a submitted task,
//! or 400 when the id does not parse.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use convoy_core::{JobOutcome, SolveRequest, TaskId};
use log::{error, info};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{Dispatcher, SubmitError, Submission};

/// Build the service's router.
#[must_use]
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/solve", post(solve))
        .route("/result/:task_id", get(result))
        .with_state(dispatcher)
}

/// Serve the router on `listener` until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns the listener's IO error.
pub async fn serve(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn solve(
    State(dispatcher): State<Arc<Dispatcher>>,
    body: Result<Json<SolveRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return error_body(StatusCode::UNPROCESSABLE_ENTITY, &rejection.body_text());
        }
    };
    match dispatcher.submit(request).await {
        Ok(submission) => submission_response(submission),
        Err(err) => submit_error_response(&err),
    }
}

async fn result(
    State(dispatcher): State<Arc<Dispatcher>>,
    task_id: Result<Path<TaskId>, PathRejection>,
) -> Response {
    let Ok(Path(task_id)) = task_id else {
        return error_body(StatusCode::BAD_REQUEST, "task id is not a valid UUID");
    };
    match dispatcher.status(task_id).await {
        Ok(submission) => submission_response(submission),
        Err(err) => {
            error!("cannot read outcome of job {task_id}: {err}");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

fn submission_response(submission: Submission) -> Response {
    match submission {
        Submission::Completed {
            outcome: JobOutcome::Solved(solution),
            ..
        } => (StatusCode::OK, Json(solution)).into_response(),
        Submission::Completed {
            outcome: JobOutcome::Failed { error },
            ..
        } => error_body(StatusCode::INTERNAL_SERVER_ERROR, &error),
        Submission::Pending { task_id } => (
            StatusCode::ACCEPTED,
            [(header::LOCATION, format!("/result/{task_id}"))],
            Json(json!({ "task_id": task_id, "status": "pending" })),
        )
            .into_response(),
    }
}

fn submit_error_response(err: &SubmitError) -> Response {
    match err {
        SubmitError::Validation(violation) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": violation.to_string(), "fields": violation.fields() })),
        )
            .into_response(),
        other => {
            error!("submission failed: {other}");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, &other.to_string())
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
