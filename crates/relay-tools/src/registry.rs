//! Name-based dispatch of the tool functions.
//!
//! The agent framework only knows function names and JSON arguments; this
//! maps both onto [`Tools`] methods and always answers with a JSON object.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::git::GitOperation;
use crate::response::ToolResponse;
use crate::terraform::{AddResourceRequest, TerraformCommand};
use crate::{Result, Tools, ToolsError};

/// Every exposed function, in registration order.
const TOOL_NAMES: &[&str] = &[
    "mcp_read_file",
    "mcp_write_file",
    "mcp_list_files",
    "mcp_delete_file",
    "mcp_call_api",
    "mcp_get_weather",
    "mcp_store_data",
    "mcp_store_number",
    "mcp_store_boolean",
    "mcp_retrieve_data",
    "mcp_clone_repository",
    "mcp_list_repositories",
    "mcp_analyze_repository",
    "mcp_generate_readme",
    "debug_gitlab_job",
    "mcp_git_operation",
    "mcp_terraform_operation",
    "mcp_terraform_add_resource",
    "mcp_find_files",
    "mcp_ensure_file_path",
];

/// Typed access to JSON call arguments.
trait Args {
    fn required_str(&self, name: &'static str, hint: &'static str) -> Result<&str>;
    fn optional_str(&self, name: &str) -> Option<&str>;
    fn required_f64(&self, name: &'static str, hint: &'static str) -> Result<f64>;
    fn required_bool(&self, name: &'static str, hint: &'static str) -> Result<bool>;
    fn optional_value(&self, name: &str) -> Option<Value>;
}

impl Args for Value {
    fn required_str(&self, name: &'static str, hint: &'static str) -> Result<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| ToolsError::missing(name, hint))
    }

    fn optional_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    fn required_f64(&self, name: &'static str, hint: &'static str) -> Result<f64> {
        self.get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolsError::missing(name, hint))
    }

    fn required_bool(&self, name: &'static str, hint: &'static str) -> Result<bool> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| ToolsError::missing(name, hint))
    }

    fn optional_value(&self, name: &str) -> Option<Value> {
        self.get(name).filter(|v| !v.is_null()).cloned()
    }
}

fn parse<T: DeserializeOwned>(args: &Value, what: &str) -> Result<T> {
    serde_json::from_value(args.clone()).map_err(|e| ToolsError::invalid(what, e.to_string()))
}

/// Dispatches tool calls by name.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Tools,
}

impl ToolRegistry {
    pub fn new(tools: Tools) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &Tools {
        &self.tools
    }

    /// Names of every function this registry answers to.
    pub fn names(&self) -> &'static [&'static str] {
        TOOL_NAMES
    }

    /// Check if a function is registered.
    pub fn contains(&self, name: &str) -> bool {
        TOOL_NAMES.contains(&name)
    }

    /// Call a function by name. Unknown names and bad arguments are reported
    /// as error objects like any other failure.
    pub async fn invoke(&self, name: &str, args: Value) -> Value {
        let args = match args {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        debug!(tool = name, "invoking tool");

        let response = match self.dispatch(name, &args).await {
            Ok(response) => response,
            Err(e) => {
                warn!(tool = name, error = %e, "tool call rejected");
                if matches!(e, ToolsError::UnknownTool(_)) {
                    ToolResponse::error(e.to_string())
                } else {
                    ToolResponse::from_error(name, &e)
                }
            }
        };
        response.into_value()
    }

    async fn dispatch(&self, name: &str, args: &Value) -> Result<ToolResponse> {
        let tools = &self.tools;
        let response = match name {
            "mcp_read_file" => {
                tools
                    .mcp_read_file(args.required_str("file_path", "path of the file to read")?)
                    .await
            }
            "mcp_write_file" => {
                let path = args.required_str("file_path", "where to write the file")?;
                let content = args.required_str("content", "text to write")?;
                tools.mcp_write_file(path, content).await
            }
            "mcp_list_files" => {
                tools
                    .mcp_list_files(args.required_str("directory_path", "directory to list")?)
                    .await
            }
            "mcp_delete_file" => {
                tools
                    .mcp_delete_file(args.required_str("file_path", "path of the file to delete")?)
                    .await
            }
            "mcp_call_api" => {
                let endpoint = args.required_str("endpoint", "URL to call")?;
                tools
                    .mcp_call_api(
                        endpoint,
                        args.optional_str("method"),
                        args.optional_value("data"),
                        args.optional_value("headers"),
                    )
                    .await
            }
            "mcp_get_weather" => {
                tools
                    .mcp_get_weather(args.required_str("location", "place to get weather for")?)
                    .await
            }
            "mcp_store_data" => {
                let key = args.required_str("key", "key to store under")?;
                let value = args.required_str("value", "string value to store")?;
                tools.mcp_store_data(key, value).await
            }
            "mcp_store_number" => {
                let key = args.required_str("key", "key to store under")?;
                let value = args.required_f64("value", "numeric value to store")?;
                tools.mcp_store_number(key, value).await
            }
            "mcp_store_boolean" => {
                let key = args.required_str("key", "key to store under")?;
                let value = args.required_bool("value", "boolean value to store")?;
                tools.mcp_store_boolean(key, value).await
            }
            "mcp_retrieve_data" => {
                tools
                    .mcp_retrieve_data(args.required_str("key", "key to look up")?)
                    .await
            }
            "mcp_clone_repository" => {
                tools
                    .mcp_clone_repository(args.required_str("url", "GitHub or GitLab URL")?)
                    .await
            }
            "mcp_list_repositories" => tools.mcp_list_repositories().await,
            "mcp_analyze_repository" => {
                tools
                    .mcp_analyze_repository(args.required_str("repo_path", "repository name or path")?)
                    .await
            }
            "mcp_generate_readme" => {
                tools
                    .mcp_generate_readme(args.required_str("repo_path", "repository name or path")?)
                    .await
            }
            "debug_gitlab_job" => {
                let job_url = args.required_str("job_url", "URL of the GitLab job")?;
                tools
                    .debug_gitlab_job(job_url, args.optional_str("access_token"))
                    .await
            }
            "mcp_git_operation" => {
                let repo_path = args.required_str("repo_path", "repository name or path")?;
                let operation: GitOperation = parse(args, "operation")?;
                tools.mcp_git_operation(repo_path, operation).await
            }
            "mcp_terraform_operation" => {
                let working_dir = args.required_str("working_dir", "directory to run in")?;
                let command: TerraformCommand = parse(args, "operation")?;
                tools.mcp_terraform_operation(working_dir, command).await
            }
            "mcp_terraform_add_resource" => {
                let request: AddResourceRequest = parse(args, "request")?;
                tools.mcp_terraform_add_resource(request).await
            }
            "mcp_find_files" => {
                let repo_path = args.required_str("repo_path", "repository name or path")?;
                let pattern = args.required_str("pattern", "glob pattern")?;
                tools.mcp_find_files(repo_path, pattern).await
            }
            "mcp_ensure_file_path" => {
                let repo_path = args.required_str("repo_path", "repository name or path")?;
                let file_path = args.required_str("file_path", "file to check")?;
                tools.mcp_ensure_file_path(repo_path, file_path).await
            }
            other => return Err(ToolsError::UnknownTool(other.to_string())),
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_client::{ListenerConfig, McpHttp, Toolkit};
    use serde_json::json;
    use std::sync::Arc;

    fn offline_registry() -> ToolRegistry {
        let transport = McpHttp::builder()
            .base_url("http://127.0.0.1:1")
            .build()
            .unwrap();
        let toolkit = Arc::new(Toolkit::new(transport, ListenerConfig::default()));
        ToolRegistry::new(Tools::new(toolkit))
    }

    #[test]
    fn test_names_are_unique() {
        let registry = offline_registry();
        let mut names = registry.names().to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), registry.names().len());
        assert!(registry.contains("mcp_terraform_add_resource"));
        assert!(!registry.contains("rm_rf"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let response = offline_registry().invoke("rm_rf", json!({})).await;
        assert_eq!(response["status"], "error");
        assert_eq!(response["error_message"], "unknown tool: rm_rf");
    }

    #[tokio::test]
    async fn test_missing_argument_is_an_exception() {
        let response = offline_registry().invoke("mcp_read_file", Value::Null).await;
        assert_eq!(response["status"], "error");
        let message = response["error_message"].as_str().unwrap();
        assert!(message.starts_with("Exception: "), "{}", message);
        assert!(message.contains("file_path"));
    }

    #[tokio::test]
    async fn test_every_tool_reports_missing_session() {
        let registry = offline_registry();
        let args = json!({
            "file_path": "a.txt",
            "content": "x",
            "directory_path": "/",
            "endpoint": "example.com",
            "location": "Paris",
            "key": "k",
            "url": "https://github.com/o/r",
            "repo_path": "r",
            "job_url": "https://gitlab.com/g/p/-/jobs/1",
            "operation": "status",
            "working_dir": "r",
            "resource_type": "null_resource",
            "resource_name": "x",
            "pattern": "*.tf"
        });

        for name in registry.names() {
            let mut args = args.clone();
            args["value"] = match *name {
                "mcp_store_number" => json!(1.5),
                "mcp_store_boolean" => json!(true),
                _ => json!("v"),
            };
            if *name == "mcp_terraform_operation" {
                args["operation"] = json!("validate");
            }
            let response = registry.invoke(name, args).await;
            assert_eq!(response["status"], "error", "{}", name);
            assert_eq!(
                response["error_message"],
                crate::NO_SESSION_MESSAGE,
                "{}",
                name
            );
        }
    }
}
