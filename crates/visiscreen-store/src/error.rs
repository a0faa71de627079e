//! Store error types.

use thiserror::Error;

/// Errors that can occur when talking to a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record is stored under the id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The store rejected the credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The store returned an error response.
    #[error("store API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),
}

impl StoreError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Timeout(_) | StoreError::Network(_) => true,
            StoreError::Api { status, .. } => *status >= 500,
            StoreError::NotFound(_) | StoreError::Unauthorized(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(StoreError::Timeout(30).is_transient());
        assert!(StoreError::Api {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(!StoreError::Api {
            status: 400,
            message: String::new()
        }
        .is_transient());
        assert!(!StoreError::NotFound("x".into()).is_transient());
        assert_eq!(
            StoreError::NotFound("abc".into()).to_string(),
            "record not found: abc"
        );
    }
}
