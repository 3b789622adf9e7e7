//! HTTP request handlers for the reconciliation API.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::ReconciliationReport;
use crate::reconcile::{ReconciliationInputs, Reconciler};

use super::request::ReconcileRequest;
use super::response::{ApiError, ApiErrorResponse, ReconcileResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/reconcile", post(reconcile_handler))
        .with_state(state)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

/// Handler for POST /reconcile.
async fn reconcile_handler(
    State(state): State<AppState>,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> Response {
    // Generate correlation ID for request tracking
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing reconciliation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    ApiError::malformed_json(body_text)
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            return json_response(StatusCode::BAD_REQUEST, error);
        }
    };

    let submit_audit = request.submit_audit;
    let inputs: ReconciliationInputs = request.into();

    let start_time = Instant::now();
    let report = match Reconciler::new(state.config().config()).run(&inputs) {
        Ok(report) => report,
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Reconciliation failed"
            );
            let api_error: ApiErrorResponse = err.into();
            return json_response(api_error.status, api_error.error);
        }
    };

    info!(
        correlation_id = %correlation_id,
        run_signature = %report.run_signature,
        employees = report.summary.employees,
        mismatched = report.summary.overall.mismatched,
        errors = report.summary.overall.errors,
        duration_us = start_time.elapsed().as_micros(),
        "Reconciliation completed"
    );

    let audit_submitted = submit_audit && submit_to_audit(&state, &report, correlation_id);
    json_response(
        StatusCode::OK,
        ReconcileResponse {
            audit_submitted,
            report,
        },
    )
}

/// Sends the run to the audit sink unless it was sent before.
///
/// A failing sink is logged and does not fail the request.
fn submit_to_audit(state: &AppState, report: &ReconciliationReport, correlation_id: Uuid) -> bool {
    let mut log = match state.audit_log().lock() {
        Ok(log) => log,
        Err(poisoned) => poisoned.into_inner(),
    };
    match log.submit_once(report, state.audit_sink()) {
        Ok(submitted) => submitted,
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                run_signature = %report.run_signature,
                error = %err,
                "Audit submission failed"
            );
            false
        }
    }
}
