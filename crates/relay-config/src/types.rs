//! Configuration types.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

pub use relay_client::DEFAULT_SERVER_URL;
pub use relay_tools::DEFAULT_STORAGE_ROOT;

/// Root configuration.
///
/// ```toml
/// [server]
/// url = "http://mcp.internal:8080"
/// request_timeout_secs = 30
///
/// [listener]
/// initial_backoff_secs = 5
/// max_backoff_secs = 60
/// max_consecutive_failures = 10
/// handshake_failure = "abort"
///
/// [startup]
/// attempts = 3
/// delay_secs = 2
///
/// [tools]
/// storage_root = "data/repos"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// MCP server connection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,
    /// Event listener tuning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listener: Option<ListenerSection>,
    /// Boot-time session retry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup: Option<StartupConfig>,
    /// Tool wrapper settings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfig>,
}

impl RelayConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: RelayConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.listener.is_some() {
            self.listener = other.listener;
        }
        if other.startup.is_some() {
            self.startup = other.startup;
        }
        if other.tools.is_some() {
            self.tools = other.tools;
        }
    }

    /// Effective `[server]` section.
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// Effective `[listener]` section.
    pub fn listener(&self) -> ListenerSection {
        self.listener.clone().unwrap_or_default()
    }

    /// Effective `[startup]` section.
    pub fn startup(&self) -> StartupConfig {
        self.startup.clone().unwrap_or_default()
    }

    /// Effective `[tools]` section.
    pub fn tools(&self) -> ToolsConfig {
        self.tools.clone().unwrap_or_default()
    }

    /// Replace the server URL, keeping the rest of `[server]`.
    pub fn set_server_url(&mut self, url: impl Into<String>) {
        let mut server = self.server();
        server.url = url.into();
        self.server = Some(server);
    }

    /// Reject values that cannot be used.
    pub fn validate(&self) -> Result<()> {
        let server = self.server();
        if server.url.trim().is_empty() {
            return Err(invalid("server.url", "must not be empty"));
        }
        if server.request_timeout_secs == 0 {
            return Err(invalid("server.request_timeout_secs", "must be positive"));
        }

        let listener = self.listener();
        if listener.initial_backoff_secs == 0 {
            return Err(invalid("listener.initial_backoff_secs", "must be positive"));
        }
        if listener.max_backoff_secs < listener.initial_backoff_secs {
            return Err(invalid(
                "listener.max_backoff_secs",
                "must not be below initial_backoff_secs",
            ));
        }

        if self.startup().attempts == 0 {
            return Err(invalid("startup.attempts", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the MCP server.
    pub url: String,
    /// Per-request timeout for session and tool calls.
    pub request_timeout_secs: u64,
    /// TCP connect timeout.
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// What the listener does when the stream endpoint rejects the handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeFailure {
    /// Stop and report the listener as failed.
    #[default]
    Abort,
    /// Back off and try again like any other failure.
    Retry,
}

/// `[listener]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerSection {
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
    /// Zero retries forever.
    pub max_consecutive_failures: u32,
    pub stop_timeout_ms: u64,
    pub handshake_failure: HandshakeFailure,
}

impl Default for ListenerSection {
    fn default() -> Self {
        Self {
            initial_backoff_secs: 5,
            max_backoff_secs: 60,
            max_consecutive_failures: 10,
            stop_timeout_ms: 2000,
            handshake_failure: HandshakeFailure::Abort,
        }
    }
}

/// `[startup]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Session attempts at boot.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay_secs: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_secs: 2,
        }
    }
}

/// `[tools]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Prefix applied to repository-relative paths.
    pub storage_root: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            storage_root: DEFAULT_STORAGE_ROOT.to_string(),
        }
    }
}
