//! Request, result and event types exchanged with the MCP server.
//!
//! These types mirror the server's wire contract.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Reserved parameter key carrying the MCP session id on every tool call.
pub const SESSION_ID_PARAM: &str = "mcp_session_id";

/// Parameter mapping sent with a tool call.
pub type Parameters = Map<String, Value>;

/// Convert a `json!({...})` literal into [`Parameters`]. Non-objects yield an
/// empty mapping.
pub fn parameters(value: Value) -> Parameters {
    match value {
        Value::Object(map) => map,
        _ => Parameters::new(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

/// Response body of `POST /api/session`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreateSessionResponse {
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool calls
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /api/adk-webhook`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Framework-level correlation id. Not the MCP session id.
    pub session_id: String,
    /// Name of the remote tool.
    pub tool_name: String,
    /// Tool parameters, including [`SESSION_ID_PARAM`].
    pub parameters: Parameters,
    /// Unique id of this call.
    pub request_id: String,
}

impl ToolRequest {
    /// Build a request for `tool_name`, stamping `mcp_session_id` over whatever
    /// the caller put under that key.
    pub fn new(tool_name: impl Into<String>, mut parameters: Parameters, mcp_session_id: &str) -> Self {
        parameters.insert(
            SESSION_ID_PARAM.to_string(),
            Value::String(mcp_session_id.to_string()),
        );
        Self {
            session_id: Uuid::new_v4().to_string(),
            tool_name: tool_name.into(),
            parameters,
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Outcome of a tool call as reported by the server (or synthesized by the
/// transport when the call never produced a valid reply).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool succeeded.
    #[serde(default)]
    pub success: bool,
    /// Tool output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error description when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// A successful result carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failed result carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Check if the tool reported success.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The data payload, or `Value::Null` when absent.
    pub fn data(&self) -> &Value {
        self.data.as_ref().unwrap_or(&Value::Null)
    }

    /// Look up a field of an object-shaped data payload.
    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }

    /// The error message, or `fallback` when the server gave none.
    pub fn error_or(&self, fallback: impl Into<String>) -> String {
        self.error.clone().unwrap_or_else(|| fallback.into())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// A server-pushed event from the session's event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The `type` tag, when present and a string.
    pub event_type: Option<String>,
    /// The `payload` field, or `Value::Null`.
    pub payload: Value,
    /// The complete decoded event object.
    pub raw: Value,
}

impl Event {
    /// Decode an SSE `data` field. Anything but a JSON object is rejected.
    pub fn parse(data: &str) -> serde_json::Result<Self> {
        let object: Map<String, Value> = serde_json::from_str(data)?;
        let event_type = object
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);
        let payload = object.get("payload").cloned().unwrap_or(Value::Null);
        Ok(Self {
            event_type,
            payload,
            raw: Value::Object(object),
        })
    }
}
