//! The normalized shape every agent-facing function returns.

use std::fmt;

use relay_client::{Error as ClientError, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::ToolsError;

/// Message reported when a call is attempted without a session.
pub const NO_SESSION_MESSAGE: &str = "No active MCP session. Please try again.";

/// Outcome discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{ "status": "success" | "error", ...fields }`.
///
/// Errors always carry an `error_message` field; multi-step workflows add
/// context such as `failed_step` next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResponse {
    pub status: Status,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ToolResponse {
    /// An empty success.
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            fields: Map::new(),
        }
    }

    /// An error with a human-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            fields: Map::new(),
        }
        .with("error_message", message.into())
    }

    /// An error for a local failure inside wrapper logic.
    pub fn exception(tool: &str, err: impl fmt::Display) -> Self {
        error!(tool, error = %err, "tool wrapper failed");
        Self::error(format!("Exception: {}", err))
    }

    /// Map a wrapper-internal error to a response.
    pub fn from_error(tool: &str, err: &ToolsError) -> Self {
        match err {
            ToolsError::Client(client) => Self::from_client_error(tool, client),
            ToolsError::ToolFailure(message) => Self::error(message.clone()),
            other => Self::exception(tool, other),
        }
    }

    /// Map a client error to a response. A missing session gets its own message.
    pub fn from_client_error(tool: &str, err: &ClientError) -> Self {
        if err.is_no_session() {
            warn!(tool, "tool called without an active session");
            Self::error(NO_SESSION_MESSAGE)
        } else {
            Self::exception(tool, err)
        }
    }

    /// Add a field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The error message, if this is an error.
    pub fn error_message(&self) -> Option<&str> {
        self.fields.get("error_message").and_then(Value::as_str)
    }

    /// Flatten into a JSON object.
    pub fn into_value(self) -> Value {
        let mut object = self.fields;
        let status = match self.status {
            Status::Success => "success",
            Status::Error => "error",
        };
        object.insert("status".to_string(), Value::String(status.to_string()));
        Value::Object(object)
    }
}

/// Turn a tool call outcome into a response.
///
/// Client errors and tool-reported failures become error responses; a
/// successful result is handed to `on_success`.
pub(crate) fn respond(
    tool: &str,
    outcome: relay_client::Result<ToolResult>,
    fallback: &str,
    on_success: impl FnOnce(&ToolResult) -> ToolResponse,
) -> ToolResponse {
    match outcome {
        Ok(result) if result.is_success() => on_success(&result),
        Ok(result) => {
            let message = result.error_or(fallback);
            warn!(tool, error = %message, "tool reported failure");
            ToolResponse::error(message)
        }
        Err(e) => ToolResponse::from_client_error(tool, &e),
    }
}
