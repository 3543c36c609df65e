//! Git operations on a cloned repository.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::response::{ToolResponse, respond};
use crate::{Result, Tools, ToolsError};

/// Credentials for push and pull against private remotes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCredentials {
    #[serde(default, skip_serializing_if = "blank")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "blank")]
    pub token: Option<String>,
}

impl GitCredentials {
    /// Neither a username nor a token.
    pub fn is_empty(&self) -> bool {
        blank(&self.username) && blank(&self.token)
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

fn no_files(files: &Option<Vec<String>>) -> bool {
    files.as_ref().is_none_or(Vec::is_empty)
}

fn no_credentials(credentials: &Option<GitCredentials>) -> bool {
    credentials.as_ref().is_none_or(GitCredentials::is_empty)
}

/// One operation on the `git` tool. Each variant carries only the fields
/// that operation accepts. Optional fields that are absent, empty or blank
/// are not sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum GitOperation {
    CreateBranch {
        branch: String,
        #[serde(default, skip_serializing_if = "blank")]
        base: Option<String>,
    },
    CheckoutBranch {
        branch: String,
    },
    Commit {
        message: String,
        #[serde(default, skip_serializing_if = "no_files")]
        files: Option<Vec<String>>,
    },
    Push {
        #[serde(default, skip_serializing_if = "blank")]
        remote: Option<String>,
        #[serde(default, skip_serializing_if = "blank")]
        branch: Option<String>,
        #[serde(default, skip_serializing_if = "no_credentials")]
        credentials: Option<GitCredentials>,
    },
    Status,
    Pull {
        #[serde(default, skip_serializing_if = "blank")]
        remote: Option<String>,
        #[serde(default, skip_serializing_if = "blank")]
        branch: Option<String>,
        #[serde(default, skip_serializing_if = "no_credentials")]
        credentials: Option<GitCredentials>,
    },
    Find {
        pattern: String,
    },
}

impl GitOperation {
    /// Wire name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateBranch { .. } => "create_branch",
            Self::CheckoutBranch { .. } => "checkout_branch",
            Self::Commit { .. } => "commit",
            Self::Push { .. } => "push",
            Self::Status => "status",
            Self::Pull { .. } => "pull",
            Self::Find { .. } => "find",
        }
    }

    /// Parameters for the `git` tool, including `repo_path`.
    pub fn to_parameters(&self, repo_path: &str) -> Result<relay_client::Parameters> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut params)) => {
                params.insert("repo_path".to_string(), Value::from(repo_path));
                Ok(params)
            }
            Ok(_) => Err(ToolsError::invalid("operation", "did not encode as an object")),
            Err(e) => Err(ToolsError::invalid("operation", e.to_string())),
        }
    }
}

impl Tools {
    /// Run one operation through the `git` tool.
    pub(crate) async fn run_git(
        &self,
        repo_path: &str,
        operation: &GitOperation,
    ) -> Result<relay_client::ToolResult> {
        let params = operation.to_parameters(&self.repo_name(repo_path))?;
        Ok(self.toolkit.execute_tool("git", params).await?)
    }

    /// Run a Git operation. Returns `operation` and `result`.
    pub async fn mcp_git_operation(&self, repo_path: &str, operation: GitOperation) -> ToolResponse {
        let name = operation.name();
        info!(repo_path, operation = name, "git operation");

        let outcome = match self.run_git(repo_path, &operation).await {
            Ok(result) => Ok(result),
            Err(ToolsError::Client(e)) => Err(e),
            Err(e) => return ToolResponse::exception("mcp_git_operation", e),
        };
        let fallback = format!("Unknown error running git {}", name);
        respond("mcp_git_operation", outcome, &fallback, |r| {
            ToolResponse::success()
                .with("operation", name)
                .with("result", r.data().clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_present_fields_are_sent() {
        let op = GitOperation::Commit {
            message: "init".to_string(),
            files: None,
        };
        let params = op.to_parameters("my-repo").unwrap();
        assert_eq!(
            Value::Object(params),
            json!({ "operation": "commit", "message": "init", "repo_path": "my-repo" })
        );

        let op = GitOperation::Push {
            remote: Some("origin".to_string()),
            branch: None,
            credentials: Some(GitCredentials {
                username: None,
                token: Some("t".to_string()),
            }),
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({ "operation": "push", "remote": "origin", "credentials": { "token": "t" } })
        );
    }

    #[test]
    fn test_empty_fields_are_dropped() {
        let op = GitOperation::Pull {
            remote: Some(String::new()),
            branch: Some("  ".to_string()),
            credentials: Some(GitCredentials::default()),
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({ "operation": "pull" })
        );

        let op = GitOperation::Commit {
            message: "wip".to_string(),
            files: Some(Vec::new()),
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({ "operation": "commit", "message": "wip" })
        );
    }

    #[test]
    fn test_unit_variant() {
        assert_eq!(
            serde_json::to_value(GitOperation::Status).unwrap(),
            json!({ "operation": "status" })
        );
    }

    #[test]
    fn test_parse_from_arguments() {
        let args = json!({
            "repo_path": "my-repo",
            "operation": "create_branch",
            "branch": "feature/x"
        });
        let op: GitOperation = serde_json::from_value(args).unwrap();
        assert_eq!(
            op,
            GitOperation::CreateBranch {
                branch: "feature/x".to_string(),
                base: None
            }
        );
        assert_eq!(op.name(), "create_branch");

        let missing = json!({ "operation": "checkout_branch" });
        assert!(serde_json::from_value::<GitOperation>(missing).is_err());

        let unknown = json!({ "operation": "rebase" });
        assert!(serde_json::from_value::<GitOperation>(unknown).is_err());
    }
}
