//! CLI command handlers.

pub mod call;
pub mod config;
pub mod listen;
pub mod reconnect;
pub mod status;
pub mod tools;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use relay_client::{
    HandshakeFailurePolicy, ListenerConfig, McpHttp, StartupRetry, Toolkit,
};
use relay_config::{HandshakeFailure, LoadedConfig, RelayConfig};
use relay_tools::{ToolRegistry, Tools};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective configuration, CLI overrides applied.
    pub config: RelayConfig,
    /// What discovery found, for reporting.
    pub loaded: LoadedConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    pub fn server_url(&self) -> String {
        self.config.server().url
    }

    /// HTTP transport for the configured server.
    pub fn transport(&self) -> Result<McpHttp> {
        let server = self.config.server();
        Ok(McpHttp::builder()
            .base_url(server.url)
            .timeout(Duration::from_secs(server.request_timeout_secs))
            .connect_timeout(Duration::from_secs(server.connect_timeout_secs))
            .build()?)
    }

    pub fn listener_config(&self) -> ListenerConfig {
        listener_config(&self.config)
    }

    pub fn startup_retry(&self) -> StartupRetry {
        let startup = self.config.startup();
        StartupRetry {
            attempts: startup.attempts,
            delay: Duration::from_secs(startup.delay_secs),
        }
    }

    /// A toolkit with no session and a stopped listener.
    pub fn offline_toolkit(&self) -> Result<Toolkit> {
        Ok(Toolkit::new(self.transport()?, self.listener_config()))
    }

    /// Connect: open a session with retry and start the listener.
    pub async fn toolkit(&self) -> Result<Arc<Toolkit>> {
        Ok(Toolkit::bootstrap(self.transport()?, self.listener_config(), self.startup_retry()).await)
    }

    /// Tool registry over a toolkit.
    pub fn registry(&self, toolkit: Arc<Toolkit>) -> ToolRegistry {
        let tools = Tools::new(toolkit).with_storage_root(self.config.tools().storage_root);
        ToolRegistry::new(tools)
    }
}

/// Map the `[listener]` section onto the client's listener settings.
pub fn listener_config(config: &RelayConfig) -> ListenerConfig {
    let section = config.listener();
    let max_failures = match section.max_consecutive_failures {
        0 => None,
        n => Some(n),
    };
    let policy = match section.handshake_failure {
        HandshakeFailure::Abort => HandshakeFailurePolicy::Abort,
        HandshakeFailure::Retry => HandshakeFailurePolicy::Retry,
    };
    ListenerConfig::default()
        .with_initial_backoff(Duration::from_secs(section.initial_backoff_secs))
        .with_max_backoff(Duration::from_secs(section.max_backoff_secs))
        .with_max_consecutive_failures(max_failures)
        .with_stop_timeout(Duration::from_millis(section.stop_timeout_ms))
        .with_handshake_failure(policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_config_mapping() {
        let config = RelayConfig::from_toml(
            r#"
[listener]
initial_backoff_secs = 1
max_backoff_secs = 8
max_consecutive_failures = 0
stop_timeout_ms = 500
handshake_failure = "retry"
"#,
        )
        .unwrap();

        let listener = listener_config(&config);
        assert_eq!(listener.initial_backoff, Duration::from_secs(1));
        assert_eq!(listener.max_backoff, Duration::from_secs(8));
        assert_eq!(listener.max_consecutive_failures, None);
        assert_eq!(listener.stop_timeout, Duration::from_millis(500));
        assert_eq!(listener.handshake_failure, HandshakeFailurePolicy::Retry);
    }

    #[test]
    fn test_defaults_match_client_defaults() {
        let listener = listener_config(&RelayConfig::default());
        let defaults = ListenerConfig::default();
        assert_eq!(listener.initial_backoff, defaults.initial_backoff);
        assert_eq!(listener.max_backoff, defaults.max_backoff);
        assert_eq!(listener.max_consecutive_failures, defaults.max_consecutive_failures);
        assert_eq!(listener.stop_timeout, defaults.stop_timeout);
        assert_eq!(listener.handshake_failure, defaults.handshake_failure);
    }
}
