//! HTTP API for the bonus reconciliation engine.
//!
//! A single endpoint, `POST /reconcile`, takes the input workbooks as JSON
//! and returns the reconciliation report.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::ReconcileRequest;
pub use response::{ApiError, ReconcileResponse};
pub use state::AppState;
