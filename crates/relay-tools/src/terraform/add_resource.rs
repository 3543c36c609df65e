//! Adding a resource block to a repository's Terraform code.
//!
//! Steps run in order and the first failure stops the workflow. Work already
//! done (a created branch, a written file) is reported, not rolled back.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::TerraformCommand;
use super::format::{format_resource_block, invalid_attribute_name};
use crate::git::GitOperation;
use crate::response::{NO_SESSION_MESSAGE, ToolResponse};
use crate::{Tools, ToolsError};

const TOOL: &str = "mcp_terraform_add_resource";

/// Where a new resource goes when the repository has no Terraform files.
pub const DEFAULT_TERRAFORM_FILE: &str = "infra/main.tf";

/// Arguments for [`Tools::mcp_terraform_add_resource`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddResourceRequest {
    pub repo_path: String,
    pub resource_type: String,
    pub resource_name: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Target file; discovered when absent.
    #[serde(default)]
    pub file_path: Option<String>,
    /// Create and check out this branch first.
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub commit_message: Option<String>,
}

impl AddResourceRequest {
    pub fn new(
        repo_path: impl Into<String>,
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
        attributes: Map<String, Value>,
    ) -> Self {
        Self {
            repo_path: repo_path.into(),
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
            attributes,
            file_path: None,
            branch_name: None,
            commit_message: None,
        }
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch_name = Some(branch.into());
        self
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = Some(message.into());
        self
    }

    /// `type.name`.
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.resource_name)
    }

    /// Commit message to use.
    pub fn message(&self) -> String {
        match &self.commit_message {
            Some(m) if !m.trim().is_empty() => m.clone(),
            _ => format!("Add {} Terraform resource", self.address()),
        }
    }

    fn validate(&self) -> crate::Result<()> {
        if self.repo_path.trim().is_empty() {
            return Err(ToolsError::missing("repo_path", "repository to modify"));
        }
        for (field, value) in [
            ("resource_type", &self.resource_type),
            ("resource_name", &self.resource_name),
        ] {
            let valid = !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !valid {
                return Err(ToolsError::invalid(
                    field,
                    format!("'{}' is not a valid Terraform identifier", value),
                ));
            }
        }
        if let Some(name) = invalid_attribute_name(&self.attributes) {
            return Err(ToolsError::invalid(
                "attributes",
                format!("'{}' is not a valid Terraform argument name", name),
            ));
        }
        Ok(())
    }
}

/// Workflow steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateBranch,
    CheckoutBranch,
    LocateFile,
    ReadFile,
    WriteFile,
    Format,
    Commit,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::CreateBranch => "create_branch",
            Step::CheckoutBranch => "checkout_branch",
            Step::LocateFile => "locate_file",
            Step::ReadFile => "read_file",
            Step::WriteFile => "write_file",
            Step::Format => "format",
            Step::Commit => "commit",
        }
    }
}

/// Result of the best-effort `terraform fmt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    Formatted,
    /// Formatting failed; the resource was still written.
    Warning(String),
}

struct StepFailure {
    step: Step,
    message: String,
}

/// How the target file was chosen.
enum Target {
    Explicit(String),
    Discovered(String),
    Default,
}

impl Target {
    fn path(&self) -> &str {
        match self {
            Target::Explicit(p) | Target::Discovered(p) => p,
            Target::Default => DEFAULT_TERRAFORM_FILE,
        }
    }
}

/// Check one step's tool call.
fn check(
    step: Step,
    outcome: crate::Result<relay_client::ToolResult>,
) -> Result<relay_client::ToolResult, StepFailure> {
    let message = match outcome {
        Ok(result) if result.is_success() => return Ok(result),
        Ok(result) => result.error_or("Unknown error"),
        Err(ToolsError::Client(e)) if e.is_no_session() => NO_SESSION_MESSAGE.to_string(),
        Err(e) => e.to_string(),
    };
    Err(StepFailure { step, message })
}

/// Choose the shallowest path, then the alphabetically first.
fn shallowest(files: &[String]) -> Option<&String> {
    files
        .iter()
        .min_by(|a, b| {
            let depth = |p: &str| p.matches('/').count();
            depth(a).cmp(&depth(b)).then_with(|| a.cmp(b))
        })
}

/// Append a block to existing file content.
fn append_block(existing: &str, block: &str) -> String {
    let existing = existing.trim_end();
    if existing.is_empty() {
        block.to_string()
    } else {
        format!("{}\n\n{}", existing, block)
    }
}

/// Messages a file tool uses for a missing file.
const NOT_FOUND_MARKERS: &[&str] = &["not found", "no such file", "does not exist", "enoent"];

/// Whether a failed read means the file is absent, as opposed to unreadable.
fn is_not_found(message: &str) -> bool {
    let message = message.to_lowercase();
    NOT_FOUND_MARKERS.iter().any(|m| message.contains(m))
}

fn parent_dir(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(dir, _)| dir)
}

impl Tools {
    async fn locate_target(&self, request: &AddResourceRequest) -> Target {
        if let Some(path) = request.file_path.as_deref().filter(|p| !p.trim().is_empty()) {
            return Target::Explicit(path.trim_start_matches('/').to_string());
        }

        for pattern in ["**/main.tf", "**/*.tf"] {
            match self.find_in_repo(&request.repo_path, pattern).await {
                Ok(files) => {
                    if let Some(found) = shallowest(&files) {
                        return Target::Discovered(found.clone());
                    }
                }
                Err(e) => {
                    warn!(pattern, error = %e, "terraform file search failed");
                    break;
                }
            }
        }
        Target::Default
    }

    async fn add_resource(
        &self,
        request: &AddResourceRequest,
        completed: &mut Vec<&'static str>,
        warnings: &mut Vec<String>,
    ) -> Result<ToolResponse, StepFailure> {
        let repo = request.repo_path.as_str();

        if let Some(branch) = request.branch_name.as_deref().filter(|b| !b.is_empty()) {
            let create = GitOperation::CreateBranch {
                branch: branch.to_string(),
                base: None,
            };
            check(Step::CreateBranch, self.run_git(repo, &create).await)?;
            completed.push(Step::CreateBranch.as_str());

            let checkout = GitOperation::CheckoutBranch {
                branch: branch.to_string(),
            };
            check(Step::CheckoutBranch, self.run_git(repo, &checkout).await)?;
            completed.push(Step::CheckoutBranch.as_str());
        }

        let target = self.locate_target(request).await;
        let file_path = target.path().to_string();
        completed.push(Step::LocateFile.as_str());
        debug!(file_path = %file_path, "terraform target chosen");

        let full_path = self.repo_file(repo, &file_path);
        let read = self.toolkit.read_file(&full_path).await.map_err(ToolsError::from);
        let existing = match (&target, check(Step::ReadFile, read)) {
            (_, Ok(result)) => {
                completed.push(Step::ReadFile.as_str());
                result.data().as_str().unwrap_or_default().to_string()
            }
            (Target::Explicit(_) | Target::Default, Err(failure))
                if is_not_found(&failure.message) =>
            {
                debug!(error = %failure.message, "target does not exist, creating it");
                String::new()
            }
            (_, Err(failure)) => return Err(failure),
        };

        let block = format_resource_block(
            &request.resource_type,
            &request.resource_name,
            &request.attributes,
        );
        let content = append_block(&existing, &block);
        let write = self
            .toolkit
            .write_file(&full_path, &content)
            .await
            .map_err(ToolsError::from);
        check(Step::WriteFile, write)?;
        completed.push(Step::WriteFile.as_str());

        let working_dir = match parent_dir(&file_path) {
            Some(dir) => format!("{}/{}", self.repo_name(repo), dir),
            None => self.repo_name(repo),
        };
        let format = match check(
            Step::Format,
            self.run_terraform(&working_dir, &TerraformCommand::fmt()).await,
        ) {
            Ok(_) => {
                completed.push(Step::Format.as_str());
                FormatOutcome::Formatted
            }
            Err(failure) => {
                warn!(error = %failure.message, "terraform fmt failed, keeping unformatted file");
                FormatOutcome::Warning(failure.message)
            }
        };
        if let FormatOutcome::Warning(message) = &format {
            warnings.push(format!("terraform fmt failed: {}", message));
        }

        let message = request.message();
        let commit = GitOperation::Commit {
            message: message.clone(),
            files: Some(vec![file_path.clone()]),
        };
        check(Step::Commit, self.run_git(repo, &commit).await)?;
        completed.push(Step::Commit.as_str());

        Ok(ToolResponse::success()
            .with(
                "message",
                format!("Added {} to {}", request.address(), file_path),
            )
            .with("file_path", file_path)
            .with("resource_address", request.address())
            .with("resource_block", block)
            .with("branch", request.branch_name.clone())
            .with("commit_message", message)
            .with("formatted", format == FormatOutcome::Formatted))
    }

    /// Add a resource block to a repository and commit it.
    ///
    /// On success returns `file_path`, `resource_block`, `commit_message`,
    /// `formatted`, `warnings` and `completed_steps`. On failure the error
    /// carries `failed_step` and `completed_steps`.
    pub async fn mcp_terraform_add_resource(&self, request: AddResourceRequest) -> ToolResponse {
        if let Err(e) = request.validate() {
            return ToolResponse::from_error(TOOL, &e);
        }
        if !self.toolkit.has_session() {
            return ToolResponse::error(NO_SESSION_MESSAGE);
        }

        info!(
            repo = %request.repo_path,
            resource = %request.address(),
            "adding terraform resource"
        );

        let mut completed = Vec::new();
        let mut warnings = Vec::new();
        match self.add_resource(&request, &mut completed, &mut warnings).await {
            Ok(response) => response
                .with("warnings", warnings)
                .with("completed_steps", completed),
            Err(failure) => {
                error!(
                    step = failure.step.as_str(),
                    error = %failure.message,
                    "terraform add resource failed"
                );
                ToolResponse::error(format!(
                    "Step '{}' failed: {}",
                    failure.step.as_str(),
                    failure.message
                ))
                .with("failed_step", failure.step.as_str())
                .with("completed_steps", completed)
            }
        }
    }
}
