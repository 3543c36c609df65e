//! File system functions.

use serde_json::{Value, json};

use crate::Tools;
use crate::response::{ToolResponse, respond};

impl Tools {
    /// Read a file. Returns `content`.
    pub async fn mcp_read_file(&self, file_path: &str) -> ToolResponse {
        let outcome = self.toolkit.read_file(file_path).await;
        respond("mcp_read_file", outcome, "Unknown error reading file", |r| {
            ToolResponse::success().with("content", r.data.clone().unwrap_or_else(|| json!("")))
        })
    }

    /// Write a file. Returns `message`.
    pub async fn mcp_write_file(&self, file_path: &str, content: &str) -> ToolResponse {
        let outcome = self.toolkit.write_file(file_path, content).await;
        respond("mcp_write_file", outcome, "Unknown error writing file", |_| {
            ToolResponse::success().with(
                "message",
                format!("File successfully written to {}", file_path),
            )
        })
    }

    /// List a directory. Returns `files`.
    pub async fn mcp_list_files(&self, directory_path: &str) -> ToolResponse {
        let outcome = self.toolkit.list_files(directory_path).await;
        respond("mcp_list_files", outcome, "Unknown error listing files", |r| {
            ToolResponse::success().with(
                "files",
                r.data.clone().unwrap_or_else(|| Value::Array(Vec::new())),
            )
        })
    }

    /// Delete a file. Returns `message`.
    pub async fn mcp_delete_file(&self, file_path: &str) -> ToolResponse {
        let outcome = self.toolkit.delete_file(file_path).await;
        respond("mcp_delete_file", outcome, "Unknown error deleting file", |_| {
            ToolResponse::success().with(
                "message",
                format!("File {} successfully deleted", file_path),
            )
        })
    }
}
