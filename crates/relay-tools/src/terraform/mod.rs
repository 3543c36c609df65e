//! Terraform commands and the add-resource workflow.

mod add_resource;
mod format;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::response::{ToolResponse, respond};
use crate::{Result, Tools, ToolsError};

pub use add_resource::{AddResourceRequest, FormatOutcome, Step};
pub use format::{
    format_resource_block, format_terraform_value, invalid_attribute_name, is_reference, quote,
};

fn is_false(value: &bool) -> bool {
    !*value
}

/// One command on the `terraform` tool. Empty option lists, empty variable
/// maps and a false `auto_approve` are left out of the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum TerraformCommand {
    Init {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        options: Vec<String>,
    },
    Validate,
    Fmt {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        options: Vec<String>,
    },
    Plan {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        variables: BTreeMap<String, Value>,
    },
    Apply {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        variables: BTreeMap<String, Value>,
        #[serde(default, skip_serializing_if = "is_false")]
        auto_approve: bool,
    },
    Destroy {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        variables: BTreeMap<String, Value>,
        #[serde(default, skip_serializing_if = "is_false")]
        auto_approve: bool,
    },
    Output {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        options: Vec<String>,
    },
}

impl TerraformCommand {
    /// `terraform fmt` with no options.
    pub fn fmt() -> Self {
        Self::Fmt {
            options: Vec::new(),
        }
    }

    /// Wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Validate => "validate",
            Self::Fmt { .. } => "fmt",
            Self::Plan { .. } => "plan",
            Self::Apply { .. } => "apply",
            Self::Destroy { .. } => "destroy",
            Self::Output { .. } => "output",
        }
    }

    /// Parameters for the `terraform` tool, including `working_dir`.
    pub fn to_parameters(&self, working_dir: &str) -> Result<relay_client::Parameters> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut params)) => {
                params.insert("working_dir".to_string(), Value::from(working_dir));
                Ok(params)
            }
            Ok(_) => Err(ToolsError::invalid("operation", "did not encode as an object")),
            Err(e) => Err(ToolsError::invalid("operation", e.to_string())),
        }
    }
}

impl Tools {
    pub(crate) async fn run_terraform(
        &self,
        working_dir: &str,
        command: &TerraformCommand,
    ) -> Result<relay_client::ToolResult> {
        let params = command.to_parameters(&self.repo_name(working_dir))?;
        Ok(self.toolkit.execute_tool("terraform", params).await?)
    }

    /// Run a Terraform command in a repository directory. Returns
    /// `operation` and `output`.
    pub async fn mcp_terraform_operation(
        &self,
        working_dir: &str,
        command: TerraformCommand,
    ) -> ToolResponse {
        let name = command.name();
        info!(working_dir, operation = name, "terraform operation");

        let outcome = match self.run_terraform(working_dir, &command).await {
            Ok(result) => Ok(result),
            Err(ToolsError::Client(e)) => Err(e),
            Err(e) => return ToolResponse::exception("mcp_terraform_operation", e),
        };
        let fallback = format!("Unknown error running terraform {}", name);
        respond("mcp_terraform_operation", outcome, &fallback, |r| {
            ToolResponse::success()
                .with("operation", name)
                .with("output", r.data().clone())
        })
    }
}
