//! # Console Error Types
//!
//! Defines the error taxonomy surfaced by the secret-store client, the vault
//! registry and the console controller.
//!
//! Every variant renders as a single human-readable message. The console shows
//! that message verbatim, so backend messages are carried through unchanged.

use thiserror::Error;

/// Result alias used throughout the library
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Console error with classification
#[derive(Debug, Clone, Error)]
pub enum ConsoleError {
    /// The requested secret does not exist in the vault
    #[error("Secret \"{name}\" was not found")]
    NotFound {
        /// Name of the missing secret
        name: String,
    },

    /// The backend rejected the call (permissions, malformed input, transient failure)
    #[error("{0}")]
    Service(String),

    /// Client-side rejection before any backend call (empty field, duplicate vault)
    #[error("{0}")]
    Validation(String),

    /// Local persistence failure (registry or preference file)
    #[error("{0}")]
    Storage(String),
}

impl ConsoleError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Message shown to the user for this error
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Short classification string for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ConsoleError::NotFound { .. } => "not_found",
            ConsoleError::Service(_) => "service_error",
            ConsoleError::Validation(_) => "validation_error",
            ConsoleError::Storage(_) => "storage_error",
        }
    }
}

impl From<std::io::Error> for ConsoleError {
    fn from(e: std::io::Error) -> Self {
        ConsoleError::Storage(format!("Local storage error: {e}"))
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(e: serde_json::Error) -> Self {
        ConsoleError::Storage(format!("Failed to parse stored data: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_message_is_verbatim() {
        let err = ConsoleError::service("The user does not have secrets set permission");
        assert_eq!(
            err.user_message(),
            "The user does not have secrets set permission"
        );
        assert_eq!(err.kind(), "service_error");
    }

    #[test]
    fn test_not_found_message_names_secret() {
        let err = ConsoleError::not_found("db-password");
        assert_eq!(err.user_message(), "Secret \"db-password\" was not found");
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_io_error_becomes_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConsoleError = io.into();
        assert!(matches!(err, ConsoleError::Storage(_)));
        assert!(err.user_message().contains("denied"));
    }
}
