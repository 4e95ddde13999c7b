//! # App Error Type
//!
//! Unified error type for the service and state layers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kirana POS                         │
//! │                                                                     │
//! │  ValidationError ──┐                                                │
//! │  CoreError ────────┤                                                │
//! │  DbError ──────────┼──► AppError ──► ErrorCode + user_message()     │
//! │  collaborator ─────┘        │                                       │
//! │  failures                   ▼                                       │
//! │             state layer stores the message in an observable         │
//! │             field; prior state is left unchanged on failure         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Service operations report success/failure via explicit `Result` values.
//! The presentation layer's sole job is to map a failure to a display
//! string - nothing is silently swallowed and nothing crashes through.

use thiserror::Error;

use kirana_core::{CoreError, ValidationError};
use kirana_db::DbError;

/// Result type for app-layer operations.
pub type AppResult<T> = Result<T, AppError>;

/// Unified error for services and presentation state.
#[derive(Debug, Error)]
pub enum AppError {
    /// No signed-in user. Every operation fails closed without one; the UI
    /// is expected to route to sign-in rather than retry.
    #[error("Not signed in")]
    Unauthenticated,

    /// Input validation failed before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Business rule violation.
    #[error(transparent)]
    Core(CoreError),

    /// Entity not found - an expected outcome, not an exceptional path.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Database operation failed.
    #[error(transparent)]
    Db(DbError),

    /// Cloud profile store failure.
    #[error("Profile store failed: {0}")]
    Profile(String),

    /// Receipt rendering collaborator failure.
    #[error("Receipt rendering failed: {0}")]
    Receipt(String),

    /// Catalog export/import failure (file I/O or malformed data).
    #[error("Catalog export/import failed: {0}")]
    Export(String),

    /// Configuration file failure.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Machine-readable error codes for programmatic handling in a UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthenticated,
    NotFound,
    ValidationError,
    BusinessLogic,
    DatabaseError,
    ProfileError,
    ReceiptError,
    ExportError,
    ConfigError,
}

impl AppError {
    /// Creates a not-found error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// The machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Unauthenticated => ErrorCode::Unauthenticated,
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::Core(CoreError::Validation(_)) => ErrorCode::ValidationError,
            AppError::Core(_) => ErrorCode::BusinessLogic,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::Db(_) => ErrorCode::DatabaseError,
            AppError::Profile(_) => ErrorCode::ProfileError,
            AppError::Receipt(_) => ErrorCode::ReceiptError,
            AppError::Export(_) => ErrorCode::ExportError,
            AppError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// The human-readable message the presentation layer should display.
    ///
    /// Database internals are logged but not shown; everything else carries
    /// a field-level or operation-level message of its own.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Db(e) => {
                tracing::error!(error = %e, "Database operation failed");
                "Database operation failed".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Database errors map through, except NotFound which becomes the app-level
/// expected outcome.
impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AppError::NotFound { entity, id },
            other => AppError::Db(other),
        }
    }
}

/// Core errors map through; nested validation failures keep their
/// validation code.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => AppError::Validation(v),
            other => AppError::Core(other),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_not_found_becomes_app_not_found() {
        let err: AppError = DbError::not_found("Product", "p-1").into();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.to_string(), "Product not found: p-1");
    }

    #[test]
    fn test_core_validation_keeps_validation_code() {
        let err: AppError = CoreError::Validation(ValidationError::Required {
            field: "name".to_string(),
        })
        .into();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_db_errors_get_generic_user_message() {
        let err: AppError = DbError::QueryFailed("secret internals".to_string()).into();
        assert_eq!(err.user_message(), "Database operation failed");
    }
}
