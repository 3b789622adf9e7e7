//! Application state for the reconciliation API.

use std::sync::{Arc, Mutex};

use crate::config::ConfigLoader;
use crate::reconcile::{AuditLog, AuditSink, TracingAuditSink};

/// Shared application state.
///
/// Holds the loaded configuration and the audit log, so a run is sent to
/// the sink once no matter how many requests reproduce it.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    audit_log: Arc<Mutex<AuditLog>>,
    audit_sink: Arc<dyn AuditSink>,
}

impl AppState {
    /// Creates a state that audits through `tracing`.
    pub fn new(config: ConfigLoader) -> Self {
        Self::with_audit_sink(config, Arc::new(TracingAuditSink))
    }

    /// Creates a state with a specific audit sink.
    pub fn with_audit_sink(config: ConfigLoader, audit_sink: Arc<dyn AuditSink>) -> Self {
        Self {
            config: Arc::new(config),
            audit_log: Arc::new(Mutex::new(AuditLog::new())),
            audit_sink,
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    pub(crate) fn audit_log(&self) -> &Mutex<AuditLog> {
        &self.audit_log
    }

    pub(crate) fn audit_sink(&self) -> &dyn AuditSink {
        self.audit_sink.as_ref()
    }
}
