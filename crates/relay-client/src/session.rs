//! Session ownership.
//!
//! [`SessionManager`] is the only writer of the session id. Everything else
//! reads it through [`SessionManager::session_id`]; `None` means "not ready".

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::Result;
use crate::transport::McpHttp;

/// Holds the current MCP session id and moves it through its lifecycle.
pub struct SessionManager {
    transport: McpHttp,
    session_id: RwLock<Option<String>>,
}

impl SessionManager {
    /// Create a manager with no session.
    pub fn new(transport: McpHttp) -> Self {
        Self {
            transport,
            session_id: RwLock::new(None),
        }
    }

    /// Create a fresh session on the server and adopt it.
    ///
    /// Errors propagate: the caller decides whether to retry or give up.
    pub async fn initialize_session(&self) -> Result<String> {
        let id = self.transport.create_session().await?;
        *self.session_id.write() = Some(id.clone());
        info!(session_id = %id, "session initialized");
        Ok(id)
    }

    /// Adopt an existing session if the server still knows it.
    ///
    /// Leaves the current session untouched and returns `false` otherwise.
    pub async fn reconnect_session(&self, session_id: &str) -> bool {
        if !self.transport.session_exists(session_id).await {
            warn!(session_id, "session not found or expired");
            return false;
        }
        *self.session_id.write() = Some(session_id.to_string());
        info!(session_id, "reconnected to session");
        true
    }

    /// Forget the current session.
    pub fn clear_session(&self) {
        if let Some(id) = self.session_id.write().take() {
            info!(session_id = %id, "session terminated");
        }
    }

    /// The current session id, if any.
    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().clone()
    }

    /// Whether a session is active.
    pub fn has_session(&self) -> bool {
        self.session_id.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn manager_for(server: &MockServer) -> SessionManager {
        let transport = McpHttp::builder().base_url(server.uri()).build().unwrap();
        SessionManager::new(transport)
    }

    #[tokio::test]
    async fn test_initialize_adopts_server_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessionId": "s-42"})))
            .mount(&server)
            .await;

        let manager = manager_for(&server).await;
        assert!(!manager.has_session());
        assert_eq!(manager.initialize_session().await.unwrap(), "s-42");
        assert_eq!(manager.session_id().as_deref(), Some("s-42"));
    }

    #[tokio::test]
    async fn test_initialize_failure_leaves_no_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/session"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let manager = manager_for(&server).await;
        assert!(manager.initialize_session().await.is_err());
        assert!(manager.session_id().is_none());
    }

    #[tokio::test]
    async fn test_reconnect_success_and_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/session/old"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/session/expired"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let manager = manager_for(&server).await;
        assert!(manager.reconnect_session("old").await);
        assert_eq!(manager.session_id().as_deref(), Some("old"));

        assert!(!manager.reconnect_session("expired").await);
        assert_eq!(manager.session_id().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_clear_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/session/s-1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let manager = manager_for(&server).await;
        assert!(manager.reconnect_session("s-1").await);
        manager.clear_session();
        assert!(!manager.has_session());
        manager.clear_session();
    }
}
