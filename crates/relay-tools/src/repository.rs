//! Repository functions and storage-root path handling.
//!
//! The server keeps cloned repositories under a storage root. Callers may
//! refer to a repository by name (`my-repo`) or by its full path
//! (`data/repos/my-repo`); paths are stripped to the name before sending and
//! re-qualified when reading results.

use serde_json::{Value, json};
use tracing::info;

use crate::Tools;
use crate::response::{ToolResponse, respond};

/// Default storage root on the server.
pub const DEFAULT_STORAGE_ROOT: &str = "data/repos";

/// Strip a leading `/` and the storage root prefix.
pub fn normalize_repo_path(path: &str, storage_root: &str) -> String {
    let clean = path.trim_start_matches('/');
    let root = storage_root.trim_matches('/');
    if root.is_empty() {
        return clean.to_string();
    }
    match clean.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_string(),
        _ => clean.to_string(),
    }
}

/// Place a repository-relative path under the storage root.
pub fn qualify_repo_path(path: &str, storage_root: &str) -> String {
    let relative = normalize_repo_path(path, storage_root);
    let root = storage_root.trim_end_matches('/');
    if root.is_empty() {
        relative
    } else if relative.is_empty() {
        root.to_string()
    } else {
        format!("{}/{}", root, relative)
    }
}

impl Tools {
    /// Repository path as the server expects it.
    pub(crate) fn repo_name(&self, repo_path: &str) -> String {
        normalize_repo_path(repo_path, &self.storage_root)
    }

    /// Path of a file inside a repository, as the file system tool expects it.
    pub(crate) fn repo_file(&self, repo_path: &str, file_path: &str) -> String {
        let repo = qualify_repo_path(repo_path, &self.storage_root);
        format!("{}/{}", repo, file_path.trim_start_matches('/'))
    }

    fn qualified(&self, path: Option<&Value>) -> Value {
        match path.and_then(Value::as_str) {
            Some(p) => Value::String(qualify_repo_path(p, &self.storage_root)),
            None => Value::Null,
        }
    }

    /// Clone a GitHub or GitLab repository. Returns `repo_path` and `message`.
    pub async fn mcp_clone_repository(&self, url: &str) -> ToolResponse {
        info!(url, "cloning repository");
        let params = relay_client::parameters(json!({ "operation": "clone", "url": url }));
        let outcome = self.toolkit.execute_tool("repository", params).await;
        respond(
            "mcp_clone_repository",
            outcome,
            "Unknown error cloning repository",
            |r| {
                let message = r
                    .data_field("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Repository cloned successfully")
                    .to_string();
                ToolResponse::success()
                    .with("repo_path", self.qualified(r.data_field("path")))
                    .with("message", message)
            },
        )
    }

    /// List cloned repositories. Returns `repositories`.
    pub async fn mcp_list_repositories(&self) -> ToolResponse {
        let params = relay_client::parameters(json!({ "operation": "list" }));
        let outcome = self.toolkit.execute_tool("repository", params).await;
        respond(
            "mcp_list_repositories",
            outcome,
            "Unknown error listing repositories",
            |r| {
                ToolResponse::success().with(
                    "repositories",
                    r.data.clone().unwrap_or_else(|| Value::Array(Vec::new())),
                )
            },
        )
    }

    /// Describe a repository's structure and contents. Returns `analysis`.
    pub async fn mcp_analyze_repository(&self, repo_path: &str) -> ToolResponse {
        let path = self.repo_name(repo_path);
        info!(path = %path, "analyzing repository");
        let params = relay_client::parameters(json!({ "operation": "analyze", "path": path }));
        let outcome = self.toolkit.execute_tool("repository", params).await;
        respond(
            "mcp_analyze_repository",
            outcome,
            "Unknown error analyzing repository",
            |r| {
                ToolResponse::success()
                    .with("analysis", r.data.clone().unwrap_or_else(|| json!({})))
            },
        )
    }

    /// Generate a README. Returns `readme_path` and `content`.
    pub async fn mcp_generate_readme(&self, repo_path: &str) -> ToolResponse {
        let path = self.repo_name(repo_path);
        info!(path = %path, "generating README");
        let params =
            relay_client::parameters(json!({ "operation": "generate_readme", "path": path }));
        let outcome = self.toolkit.execute_tool("repository", params).await;
        respond(
            "mcp_generate_readme",
            outcome,
            "Unknown error generating README",
            |r| {
                ToolResponse::success()
                    .with("readme_path", self.qualified(r.data_field("path")))
                    .with("content", r.data_field("content").cloned().unwrap_or(Value::Null))
            },
        )
    }
}
