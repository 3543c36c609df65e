//! Agent-facing tool functions for an MCP execution server.
//!
//! Every function here returns a [`ToolResponse`]: a JSON object with a
//! `status` of `"success"` or `"error"` plus operation-specific fields or an
//! `error_message`. Failures are always reported as data, never as `Err`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use relay_client::{ListenerConfig, McpHttp, StartupRetry, Toolkit};
//! use relay_tools::{ToolRegistry, Tools};
//!
//! # async fn example() -> relay_client::Result<()> {
//! let transport = McpHttp::builder().build()?;
//! let toolkit = Toolkit::bootstrap(transport, ListenerConfig::default(), StartupRetry::default()).await;
//! let registry = ToolRegistry::new(Tools::new(toolkit));
//!
//! let response = registry
//!     .invoke("mcp_read_file", serde_json::json!({ "file_path": "notes.txt" }))
//!     .await;
//! println!("{}", response);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use relay_client::Toolkit;

pub mod api;
pub mod error;
pub mod files;
pub mod git;
pub mod gitlab;
pub mod paths;
pub mod registry;
pub mod repository;
pub mod response;
pub mod session_data;
pub mod terraform;
pub mod weather;

pub use error::{Result, ToolsError};
pub use git::{GitCredentials, GitOperation};
pub use registry::ToolRegistry;
pub use repository::DEFAULT_STORAGE_ROOT;
pub use response::{NO_SESSION_MESSAGE, Status, ToolResponse};
pub use terraform::{
    AddResourceRequest, FormatOutcome, TerraformCommand, format_resource_block,
    format_terraform_value,
};

/// Handle the tool functions hang off.
///
/// Cheap to clone; all clones share one toolkit.
#[derive(Clone)]
pub struct Tools {
    toolkit: Arc<Toolkit>,
    storage_root: String,
}

impl Tools {
    /// Wrap a toolkit, using the default storage root.
    pub fn new(toolkit: Arc<Toolkit>) -> Self {
        Self {
            toolkit,
            storage_root: DEFAULT_STORAGE_ROOT.to_string(),
        }
    }

    /// Set the directory repositories live under on the server.
    pub fn with_storage_root(mut self, root: impl Into<String>) -> Self {
        let root = root.into();
        self.storage_root = root.trim_end_matches('/').to_string();
        self
    }

    pub fn toolkit(&self) -> &Arc<Toolkit> {
        &self.toolkit
    }

    pub fn storage_root(&self) -> &str {
        &self.storage_root
    }
}
