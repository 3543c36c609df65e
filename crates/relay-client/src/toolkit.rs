//! The toolkit: session, event listener and tool execution behind one handle.
//!
//! Build it once at boot with [`Toolkit::bootstrap`] and share the returned
//! `Arc<Toolkit>` with whatever owns the tool registry.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::events::{EventCallback, EventListener, ListenerConfig, ListenerStatus};
use crate::session::SessionManager;
use crate::transport::McpHttp;
use crate::types::{Event, Parameters, ToolRequest, ToolResult, parameters};

/// Encoding sent with file operations.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Bounded retry for establishing the first session at boot.
#[derive(Debug, Clone, Copy)]
pub struct StartupRetry {
    /// Total attempts, at least one.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for StartupRetry {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Health snapshot of a toolkit.
#[derive(Debug, Clone, Serialize)]
pub struct ToolkitHealth {
    /// Server base URL.
    pub server_url: String,
    /// Current session, if any.
    pub session_id: Option<String>,
    /// Listener status.
    pub listener: ListenerStatus,
}

impl ToolkitHealth {
    /// "connected" when a session is held, "disconnected" otherwise.
    pub fn mcp_status(&self) -> &'static str {
        if self.session_id.is_some() {
            "connected"
        } else {
            "disconnected"
        }
    }
}

/// Client for an MCP execution server.
pub struct Toolkit {
    transport: McpHttp,
    session: SessionManager,
    listener: EventListener,
}

impl Toolkit {
    /// Create a toolkit with no session and a stopped listener.
    pub fn new(transport: McpHttp, listener_config: ListenerConfig) -> Self {
        Self {
            session: SessionManager::new(transport.clone()),
            listener: EventListener::new(transport.clone(), listener_config),
            transport,
        }
    }

    /// Build a toolkit, try to open a session and start the listener.
    ///
    /// Session failures are logged, not returned: the toolkit still comes back,
    /// without a session, and every tool call reports "no active session"
    /// until [`Toolkit::initialize_session`] or [`Toolkit::reconnect_session`]
    /// succeeds.
    pub async fn bootstrap(
        transport: McpHttp,
        listener_config: ListenerConfig,
        retry: StartupRetry,
    ) -> Arc<Self> {
        let toolkit = Arc::new(Self::new(transport, listener_config));
        let attempts = retry.attempts.max(1);

        for attempt in 1..=attempts {
            match toolkit.initialize_session().await {
                Ok(_) => break,
                Err(e) => {
                    error!(attempt, attempts, error = %e, "failed to initialize MCP toolkit");
                    if attempt < attempts {
                        tokio::time::sleep(retry.delay).await;
                    }
                }
            }
        }

        if toolkit.has_session() {
            let callback: EventCallback = Arc::new(|event: &Event| {
                debug!(event_type = ?event.event_type, "event received");
            });
            toolkit.start_listener(Some(callback)).await;
        } else {
            warn!("no active MCP session, toolkit running degraded");
        }

        toolkit
    }

    /// Server base URL.
    pub fn server_url(&self) -> &str {
        self.transport.base_url().as_str()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new server session and adopt it.
    pub async fn initialize_session(&self) -> Result<String> {
        self.session.initialize_session().await
    }

    /// Adopt an existing session and (re)start the listener on it.
    ///
    /// The listener is started whatever its previous state, so a toolkit that
    /// booted degraded or whose listener gave up gets its event stream back.
    pub async fn reconnect_session(&self, session_id: &str) -> bool {
        if !self.session.reconnect_session(session_id).await {
            return false;
        }
        if !self.listener.is_running() {
            info!(state = %self.listener.state(), "starting event listener after reconnect");
        }
        self.listener.restart(session_id).await;
        true
    }

    /// Current session id.
    pub fn session_id(&self) -> Option<String> {
        self.session.session_id()
    }

    /// Whether a session is active.
    pub fn has_session(&self) -> bool {
        self.session.has_session()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    /// Start (or restart) the event listener. Returns `false` without a
    /// session.
    pub async fn start_listener(&self, callback: Option<EventCallback>) -> bool {
        let Some(session_id) = self.session.session_id() else {
            error!("cannot start event listener: no active session");
            return false;
        };
        self.listener.start(&session_id, callback).await;
        true
    }

    /// Stop the event listener. No-op when it is not running.
    pub async fn stop_listener(&self) {
        self.listener.stop().await;
    }

    /// Register a callback for one event type. Callbacks outlive listener
    /// restarts and session changes.
    pub fn register_event_callback<F>(&self, event_type: impl Into<String>, callback: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.listener.register_callback(event_type, callback);
    }

    /// Listener status.
    pub fn listener_status(&self) -> ListenerStatus {
        self.listener.status()
    }

    /// Health snapshot.
    pub fn health(&self) -> ToolkitHealth {
        ToolkitHealth {
            server_url: self.server_url().to_string(),
            session_id: self.session_id(),
            listener: self.listener.status(),
        }
    }

    /// Stop the listener and drop the session.
    pub async fn shutdown(&self) {
        self.listener.stop().await;
        self.session.clear_session();
        info!("MCP toolkit shut down");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tool execution
    // ─────────────────────────────────────────────────────────────────────────

    /// Run `tool_name` on the server.
    ///
    /// Fails with [`Error::NoActiveSession`] before any network traffic when no
    /// session is held. Everything else, including transport failures, comes
    /// back as a [`ToolResult`].
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: Parameters,
    ) -> Result<ToolResult> {
        let Some(session_id) = self.session.session_id() else {
            error!(tool = tool_name, "cannot execute tool: no active session");
            return Err(Error::NoActiveSession);
        };

        let request = ToolRequest::new(tool_name, parameters, &session_id);
        Ok(self.transport.post_tool(&request).await)
    }

    /// Read a file through the `file_system` tool.
    pub async fn read_file(&self, path: &str) -> Result<ToolResult> {
        self.execute_tool(
            "file_system",
            parameters(json!({
                "operation": "read",
                "path": path,
                "encoding": DEFAULT_ENCODING,
            })),
        )
        .await
    }

    /// Write a file through the `file_system` tool.
    pub async fn write_file(&self, path: &str, content: &str) -> Result<ToolResult> {
        self.execute_tool(
            "file_system",
            parameters(json!({
                "operation": "write",
                "path": path,
                "content": content,
                "encoding": DEFAULT_ENCODING,
            })),
        )
        .await
    }

    /// List a directory through the `file_system` tool.
    pub async fn list_files(&self, directory: &str) -> Result<ToolResult> {
        self.execute_tool(
            "file_system",
            parameters(json!({
                "operation": "list",
                "path": directory,
            })),
        )
        .await
    }

    /// Delete a file through the `file_system` tool.
    pub async fn delete_file(&self, path: &str) -> Result<ToolResult> {
        self.execute_tool(
            "file_system",
            parameters(json!({
                "operation": "delete",
                "path": path,
            })),
        )
        .await
    }

    /// Make an HTTP call through the `api_call` tool.
    pub async fn call_api(
        &self,
        endpoint: &str,
        method: &str,
        data: Option<Value>,
        headers: Option<Value>,
    ) -> Result<ToolResult> {
        self.execute_tool(
            "api_call",
            parameters(json!({
                "endpoint": endpoint,
                "method": method,
                "data": data,
                "headers": headers,
            })),
        )
        .await
    }

    /// Read session storage; all of it when `key` is `None`.
    pub async fn get_session_data(&self, key: Option<&str>) -> Result<ToolResult> {
        let mut params = parameters(json!({ "action": "get" }));
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            params.insert("key".to_string(), json!(key));
        }
        self.execute_tool("session_data", params).await
    }

    /// Merge `data` into session storage.
    pub async fn set_session_data(&self, data: Parameters) -> Result<ToolResult> {
        self.execute_tool(
            "session_data",
            parameters(json!({
                "action": "set",
                "data": data,
            })),
        )
        .await
    }

    /// Weather lookup through the `weather` tool.
    pub async fn get_weather(&self, location: &str) -> Result<ToolResult> {
        self.execute_tool("weather", parameters(json!({ "location": location })))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_toolkit() -> Toolkit {
        let transport = McpHttp::builder()
            .base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        Toolkit::new(transport, ListenerConfig::default())
    }

    #[tokio::test]
    async fn test_execute_without_session_fails_fast() {
        let toolkit = offline_toolkit();
        let result = toolkit.read_file("a.txt").await;
        assert!(matches!(result, Err(Error::NoActiveSession)));
    }

    #[tokio::test]
    async fn test_start_listener_without_session() {
        let toolkit = offline_toolkit();
        assert!(!toolkit.start_listener(None).await);
        assert_eq!(toolkit.listener_status().state, crate::ListenerState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_listener_is_idempotent() {
        let toolkit = offline_toolkit();
        toolkit.stop_listener().await;
        toolkit.stop_listener().await;
        assert_eq!(toolkit.listener_status().state, crate::ListenerState::Stopped);
    }

    #[test]
    fn test_health_without_session() {
        let toolkit = offline_toolkit();
        let health = toolkit.health();
        assert_eq!(health.mcp_status(), "disconnected");
        assert_eq!(health.server_url, "http://127.0.0.1:1/");
    }
}
