//! Error types for the bonus reconciliation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate.
//! Only structural problems (missing configuration, missing input workbooks,
//! workbooks with no usable sheet) are errors; per-cell and per-employee
//! problems are recovered into row statuses by the pipeline.

use thiserror::Error;

/// The main error type for the reconciliation engine.
///
/// # Example
///
/// ```
/// use bonus_recon::error::EngineError;
///
/// let error = EngineError::MissingInput {
///     role: "hr".to_string(),
/// };
/// assert_eq!(error.to_string(), "Required input workbook missing: hr");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but is not usable.
    #[error("Invalid configuration '{field}': {message}")]
    InvalidConfig {
        /// The offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// A required input workbook was not supplied.
    #[error("Required input workbook missing: {role}")]
    MissingInput {
        /// The input role (e.g. "staff", "hr").
        role: String,
    },

    /// An input workbook was supplied but no sheet in it could be located.
    #[error("No usable sheet in '{role}' workbook: {message}")]
    NoUsableSheets {
        /// The input role.
        role: String,
        /// Why every sheet was rejected.
        message: String,
    },

    /// A workbook file could not be opened or decoded.
    #[error("Failed to read workbook '{path}': {message}")]
    WorkbookRead {
        /// The path of the workbook.
        path: String,
        /// The decoder's message.
        message: String,
    },

    /// Report rows could not be serialized for signing.
    #[error("Failed to serialize report: {message}")]
    Serialization {
        /// The serializer's message.
        message: String,
    },

    /// The audit sink rejected a submission.
    #[error("Audit sink error: {message}")]
    AuditSink {
        /// A description of the failure.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/policy.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/policy.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_invalid_config_displays_field() {
        let error = EngineError::InvalidConfig {
            field: "window.actual_months".to_string(),
            message: "must be at least 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration 'window.actual_months': must be at least 1"
        );
    }

    #[test]
    fn test_no_usable_sheets_displays_role() {
        let error = EngineError::NoUsableSheets {
            role: "staff".to_string(),
            message: "no sheet name maps to a month in the window".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "No usable sheet in 'staff' workbook: no sheet name maps to a month in the window"
        );
    }

    #[test]
    fn test_workbook_read_displays_path() {
        let error = EngineError::WorkbookRead {
            path: "hr.xlsx".to_string(),
            message: "not a zip archive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to read workbook 'hr.xlsx': not a zip archive"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_missing_input() -> EngineResult<()> {
            Err(EngineError::MissingInput {
                role: "loans".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_missing_input()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
