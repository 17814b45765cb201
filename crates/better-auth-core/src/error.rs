// Error types shared by every database backend.
//
// Maps to: packages/core/src/error/index.ts (BetterAuthError)

use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP-equivalent status codes carried by storage-layer errors.
///
/// Document stores report "not found" as a 404 the same way their HTTP
/// APIs do, so adapters inspect this to decide what is an expected miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpStatus {
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    Conflict = 409,
    UnprocessableEntity = 422,
    InternalServerError = 500,
    ServiceUnavailable = 503,
}

impl HttpStatus {
    pub fn status_code(&self) -> u16 {
        *self as u16
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status_code())
    }
}

/// Internal (non-HTTP) error — corresponds to `BetterAuthError` in TypeScript.
/// Used for configuration errors, database failures, etc.
#[derive(Debug, thiserror::Error)]
pub enum BetterAuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BetterAuthError {
    /// Whether this error signals a setup problem rather than a runtime failure.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Unified result type for better-auth operations.
pub type Result<T> = std::result::Result<T, BetterAuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(HttpStatus::NotFound.status_code(), 404);
        assert!(HttpStatus::NotFound.is_not_found());
        assert!(!HttpStatus::Conflict.is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = BetterAuthError::Config("collection 'users' not found".into());
        assert_eq!(err.to_string(), "Configuration error: collection 'users' not found");
        assert!(err.is_config());
        assert!(!BetterAuthError::Database("boom".into()).is_config());
    }
}
