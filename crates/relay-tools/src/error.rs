//! Error types for the tool wrappers.
//!
//! These never reach the agent: every public wrapper converts them into an
//! error [`ToolResponse`](crate::ToolResponse).

use thiserror::Error;

/// Result type for tool wrapper internals.
pub type Result<T> = std::result::Result<T, ToolsError>;

/// Errors raised inside wrapper logic.
#[derive(Debug, Error)]
pub enum ToolsError {
    /// The underlying client failed.
    #[error(transparent)]
    Client(#[from] relay_client::Error),

    /// The remote tool ran and reported failure.
    #[error("{0}")]
    ToolFailure(String),

    /// A required argument was not supplied.
    #[error("missing required parameter '{name}': {hint}")]
    MissingParameter { name: String, hint: String },

    /// An argument was supplied with the wrong shape.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// A file pattern could not be compiled.
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// No function is registered under this name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolsError {
    /// Create a missing parameter error.
    pub fn missing(name: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingParameter {
            name: name.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ToolsError::missing("path", "file to read");
        assert_eq!(
            err.to_string(),
            "missing required parameter 'path': file to read"
        );

        let err = ToolsError::invalid("attributes", "expected an object");
        assert!(err.to_string().contains("attributes"));

        let err: ToolsError = glob::Pattern::new("[").unwrap_err().into();
        assert!(err.to_string().starts_with("invalid file pattern"));
    }

    #[test]
    fn test_client_error_is_transparent() {
        let err: ToolsError = relay_client::Error::NoActiveSession.into();
        assert_eq!(err.to_string(), relay_client::Error::NoActiveSession.to_string());
    }
}
