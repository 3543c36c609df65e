//! HTTP transport to the MCP server.
//!
//! Every endpoint the toolkit needs lives here. Session creation is the only
//! call that surfaces failures as `Err`; tool calls fold every failure into a
//! [`ToolResult`] so that nothing network-shaped escapes to callers.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::types::{CreateSessionResponse, ToolRequest, ToolResult};

/// Server URL used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Default timeout for request/response calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for establishing a TCP connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP transport for the MCP server API.
#[derive(Clone)]
pub struct McpHttp {
    /// Inner shared state.
    inner: Arc<TransportInner>,
}

/// Inner transport state (shared across clones).
struct TransportInner {
    /// HTTP client.
    http: reqwest::Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Request timeout. The event stream is exempt.
    timeout: Duration,
}

impl McpHttp {
    /// Create a new transport builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build a URL for an API path.
    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner
            .base_url
            .join(&format!("api/{}", path))
            .map_err(Error::from)
    }

    /// Build `api/{endpoint}/{session_id}` with the id as one escaped segment.
    pub(crate) fn session_url(&self, endpoint: &str, session_id: &str) -> Result<Url> {
        if matches!(session_id.trim(), "" | "." | "..") {
            return Err(Error::InvalidSessionId(session_id.to_string()));
        }
        let mut url = self.url(endpoint)?;
        let url_str = url.to_string();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("base URL {} cannot hold a path", url_str)))?
            .pop_if_empty()
            .push(session_id);
        Ok(url)
    }

    /// `POST /api/session`: create a session and return its id.
    pub async fn create_session(&self) -> Result<String> {
        let url = self.url("session")?;
        let response = self
            .inner
            .http
            .post(url)
            .timeout(self.inner.timeout)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let err = extract_error(response).await;
            error!(error = %err, "failed to initialize session");
            return Err(err);
        }

        let body: CreateSessionResponse = response.json().await?;
        match body.session_id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(Error::MissingSessionId),
        }
    }

    /// `GET /api/session/{id}`: whether the server still knows this session.
    pub async fn session_exists(&self, session_id: &str) -> bool {
        let url = match self.session_url("session", session_id) {
            Ok(url) => url,
            Err(e) => {
                warn!(session_id, error = %e, "cannot build session url");
                return false;
            }
        };

        match self
            .inner
            .http
            .get(url)
            .timeout(self.inner.timeout)
            .send()
            .await
        {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                warn!(session_id, status = response.status().as_u16(), "session not found or expired");
                false
            }
            Err(e) => {
                error!(session_id, error = %e, "error probing session");
                false
            }
        }
    }

    /// `POST /api/adk-webhook`: run a tool. Never fails; transport problems
    /// come back as `success: false`.
    pub async fn post_tool(&self, request: &ToolRequest) -> ToolResult {
        let url = match self.url("adk-webhook") {
            Ok(url) => url,
            Err(e) => return ToolResult::failure(e.to_string()),
        };

        debug!(
            tool = %request.tool_name,
            request_id = %request.request_id,
            "executing tool"
        );

        let response = match self
            .inner
            .http
            .post(url)
            .json(request)
            .timeout(self.inner.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(tool = %request.tool_name, error = %e, "error executing tool");
                return ToolResult::failure(e.to_string());
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Tool execution failed: HTTP {} - {}", status.as_u16(), body);
            error!(tool = %request.tool_name, status = status.as_u16(), "{}", message);
            return ToolResult::failure(message);
        }

        match response.json::<ToolResult>().await {
            Ok(result) => {
                debug!(
                    tool = %request.tool_name,
                    success = result.success,
                    "tool execution finished"
                );
                result
            }
            Err(e) => {
                error!(tool = %request.tool_name, error = %e, "unreadable tool result");
                ToolResult::failure(format!("Invalid tool result: {}", e))
            }
        }
    }

    /// `GET /api/sse/{id}`: open the long-lived event stream.
    pub async fn open_event_stream(&self, session_id: &str) -> Result<reqwest::Response> {
        let url = self.session_url("sse", session_id)?;
        info!(%url, "connecting to event stream");

        let response = self
            .inner
            .http
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(Error::Handshake {
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }
}

/// Turn a failed response into an [`Error::Api`], keeping the body text.
async fn extract_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        body
    };
    Error::Api { status, message }
}

/// Builder for creating an [`McpHttp`] transport.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the base URL for the server. Defaults to [`DEFAULT_SERVER_URL`].
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<McpHttp> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(Error::Config("base_url cannot be empty".to_string()));
        }

        // Parse and normalize base URL
        let mut base_url = Url::parse(base_url.trim())?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("relay-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .connect_timeout(self.connect_timeout)
            .build()?;

        info!(server_url = %base_url, "MCP transport initialized");

        Ok(McpHttp {
            inner: Arc::new(TransportInner {
                http,
                base_url,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Parameters;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_builder_defaults_to_localhost() {
        let http = ClientBuilder::new().build().unwrap();
        assert_eq!(http.base_url().as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let http = ClientBuilder::new()
            .base_url("http://mcp.internal:9000/")
            .build()
            .unwrap();
        assert_eq!(http.base_url().as_str(), "http://mcp.internal:9000/");
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        assert!(ClientBuilder::new().base_url("not a url").build().is_err());
        assert!(ClientBuilder::new().base_url("  ").build().is_err());
    }

    #[test]
    fn test_url_building() {
        let http = ClientBuilder::new()
            .base_url("http://localhost:8080/prefix")
            .build()
            .unwrap();

        let url = http.url("session").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/prefix/api/session");

        let url = http.url("/sse/s-1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/prefix/api/sse/s-1");
    }

    #[test]
    fn test_session_id_is_one_segment() {
        let http = ClientBuilder::new()
            .base_url("http://localhost:8080")
            .build()
            .unwrap();

        let url = http.session_url("sse", "s-1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/sse/s-1");

        let url = http.session_url("session", "../adk-webhook?x=1#y").unwrap();
        assert_eq!(url.path(), "/api/session/..%2Fadk-webhook%3Fx=1%23y");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());

        for bad in ["", ".", ".."] {
            assert!(matches!(
                http.session_url("session", bad),
                Err(Error::InvalidSessionId(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_session_probe_escapes_slashes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/session/a%2Fb"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/session/a/b"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let http = ClientBuilder::new().base_url(server.uri()).build().unwrap();
        assert!(http.session_exists("a/b").await);
    }

    #[tokio::test]
    async fn test_create_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessionId": "s-1"})))
            .mount(&server)
            .await;

        let http = ClientBuilder::new().base_url(server.uri()).build().unwrap();
        assert_eq!(http.create_session().await.unwrap(), "s-1");
    }

    #[tokio::test]
    async fn test_create_session_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/session"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let http = ClientBuilder::new().base_url(server.uri()).build().unwrap();
        match http.create_session().await {
            Err(Error::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "unavailable");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_session_missing_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let http = ClientBuilder::new().base_url(server.uri()).build().unwrap();
        assert!(matches!(
            http.create_session().await,
            Err(Error::MissingSessionId)
        ));
    }

    #[tokio::test]
    async fn test_session_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/session/live"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/session/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let http = ClientBuilder::new().base_url(server.uri()).build().unwrap();
        assert!(http.session_exists("live").await);
        assert!(!http.session_exists("gone").await);
    }

    #[tokio::test]
    async fn test_session_exists_unreachable_server() {
        let http = ClientBuilder::new()
            .base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        assert!(!http.session_exists("s-1").await);
    }

    #[tokio::test]
    async fn test_post_tool_error_status_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/adk-webhook"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let http = ClientBuilder::new().base_url(server.uri()).build().unwrap();
        let request = ToolRequest::new("weather", Parameters::new(), "s-1");
        let result = http.post_tool(&request).await;

        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("500"));
        assert!(error.contains("boom"));
    }

    #[tokio::test]
    async fn test_post_tool_network_failure_is_data() {
        let http = ClientBuilder::new()
            .base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        let request = ToolRequest::new("weather", Parameters::new(), "s-1");
        let result = http.post_tool(&request).await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_post_tool_unreadable_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/adk-webhook"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let http = ClientBuilder::new().base_url(server.uri()).build().unwrap();
        let request = ToolRequest::new("weather", Parameters::new(), "s-1");
        let result = http.post_tool(&request).await;
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Invalid tool result"));
    }

    #[tokio::test]
    async fn test_open_event_stream_handshake_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sse/s-1"))
            .and(header("accept", "text/event-stream"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let http = ClientBuilder::new().base_url(server.uri()).build().unwrap();
        assert!(matches!(
            http.open_event_stream("s-1").await,
            Err(Error::Handshake { status: 403 })
        ));
    }
}
