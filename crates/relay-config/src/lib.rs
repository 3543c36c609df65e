//! Configuration for the MCP relay.
//!
//! TOML configuration with:
//! - Server connection and timeouts (`[server]`)
//! - Event listener backoff and failure policy (`[listener]`)
//! - Boot-time session retry (`[startup]`)
//! - Tool wrapper settings (`[tools]`)
//! - Config file layering (user config + project-local + environment)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, SERVER_URL_ENV, load_config, load_config_file,
    load_config_with_options, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
