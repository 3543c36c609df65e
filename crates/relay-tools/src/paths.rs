//! Finding files in a repository and choosing where new files should go.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::git::GitOperation;
use crate::response::ToolResponse;
use crate::{Result, Tools, ToolsError};

/// Minimum normalized similarity for a file name to count as a match.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Extensions treated as source code.
const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "ts", "jsx", "tsx", "go", "java", "kt", "rb", "c", "h", "cpp", "hpp", "cs",
    "swift", "scala", "php",
];

/// Pull file paths out of a `find` result. Accepts a bare list, a `files`
/// list, and entries that are strings or objects with a `path`.
pub fn file_list(data: &Value) -> Vec<String> {
    let items = match data {
        Value::Array(items) => items,
        Value::Object(object) => match object.get("files") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(o) => o.get("path").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

fn extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Conventional location for a file that does not exist yet.
pub fn default_location(file_path: &str) -> (String, &'static str) {
    let name = file_name(file_path);
    let parent = file_path.trim_start_matches('/').rsplit_once('/').map(|(dir, _)| dir);
    match extension(file_path).as_deref() {
        Some("tf") | Some("tfvars") => {
            let dir = match parent {
                Some(dir) if dir == "infra" || dir.starts_with("infra/") => dir,
                _ => "infra",
            };
            (
                format!("{}/{}", dir, name),
                "Terraform files belong in the infra directory",
            )
        }
        Some(ext) if SOURCE_EXTENSIONS.contains(&ext) => {
            let dir = match parent {
                Some(dir) if dir == "src" || dir.starts_with("src/") => dir,
                _ => "src",
            };
            (
                format!("{}/{}", dir, name),
                "Source files belong in the src directory",
            )
        }
        _ => (
            name.to_string(),
            "No matching file found; using the repository root",
        ),
    }
}

/// The candidate whose file name is closest to `file_path`, if close enough.
/// Only candidates with the same extension are considered.
pub fn most_similar<'a>(file_path: &str, candidates: &'a [String]) -> Option<&'a str> {
    let target = file_name(file_path);
    let target_ext = extension(file_path);
    candidates
        .iter()
        .filter(|c| extension(c) == target_ext)
        .map(|c| (c, strsim::normalized_levenshtein(target, file_name(c))))
        .filter(|(_, score)| *score >= SIMILARITY_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c.as_str())
}

impl Tools {
    /// Strip any storage-root or repository prefix from a returned path.
    fn relative_to_repo(&self, repo_path: &str, path: &str) -> String {
        let repo = self.repo_name(repo_path);
        let path = self.repo_name(path);
        match path.strip_prefix(&repo) {
            Some(rest) if !repo.is_empty() && rest.starts_with('/') => {
                rest.trim_start_matches('/').to_string()
            }
            _ => path,
        }
    }

    /// Files in a repository matching a glob, relative to the repository.
    pub(crate) async fn find_in_repo(&self, repo_path: &str, pattern: &str) -> Result<Vec<String>> {
        glob::Pattern::new(pattern)?;
        let result = self
            .run_git(
                repo_path,
                &GitOperation::Find {
                    pattern: pattern.to_string(),
                },
            )
            .await?;
        if !result.is_success() {
            return Err(ToolsError::ToolFailure(
                result.error_or("Unknown error finding files"),
            ));
        }
        Ok(file_list(result.data())
            .iter()
            .map(|p| self.relative_to_repo(repo_path, p))
            .collect())
    }

    /// Find files by glob pattern. Returns `files`.
    pub async fn mcp_find_files(&self, repo_path: &str, pattern: &str) -> ToolResponse {
        match self.find_in_repo(repo_path, pattern).await {
            Ok(files) => ToolResponse::success()
                .with("count", files.len())
                .with("files", files),
            Err(ToolsError::ToolFailure(message)) => ToolResponse::error(message),
            Err(e) => ToolResponse::from_error("mcp_find_files", &e),
        }
    }

    /// Check whether a file exists, suggesting a location when it does not.
    ///
    /// Returns `exists` and `path` for existing files, otherwise `exists`,
    /// `suggested_path` and `reason`. A suggestion is always produced: search
    /// failures fall back to the conventional location.
    pub async fn mcp_ensure_file_path(&self, repo_path: &str, file_path: &str) -> ToolResponse {
        if !self.toolkit.has_session() {
            return ToolResponse::from_client_error(
                "mcp_ensure_file_path",
                &relay_client::Error::NoActiveSession,
            );
        }

        let wanted = file_path.trim_start_matches('/').to_string();
        let exact = glob::Pattern::escape(&wanted);
        match self.find_in_repo(repo_path, &exact).await {
            Ok(found) if found.iter().any(|f| *f == wanted) => {
                return ToolResponse::success()
                    .with("exists", true)
                    .with("path", wanted);
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "exact lookup failed"),
        }

        if let Some(ext) = extension(&wanted) {
            let pattern = format!("**/*.{}", glob::Pattern::escape(&ext));
            match self.find_in_repo(repo_path, &pattern).await {
                Ok(candidates) => {
                    if let Some(similar) = most_similar(&wanted, &candidates) {
                        return ToolResponse::success()
                            .with("exists", false)
                            .with("suggested_path", similar)
                            .with("reason", format!("A similar file exists at {}", similar));
                    }
                }
                Err(e) => warn!(error = %e, "similar file search failed, using default location"),
            }
        }

        let (suggested, reason) = default_location(&wanted);
        ToolResponse::success()
            .with("exists", false)
            .with("suggested_path", suggested)
            .with("reason", reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_list_shapes() {
        assert_eq!(file_list(&json!(["a.tf", "b.tf"])), vec!["a.tf", "b.tf"]);
        assert_eq!(
            file_list(&json!({ "files": [{ "path": "x.rs" }, "y.rs", 3] })),
            vec!["x.rs", "y.rs"]
        );
        assert!(file_list(&json!("nope")).is_empty());
    }

    #[test]
    fn test_default_location() {
        assert_eq!(default_location("main.tf").0, "infra/main.tf");
        assert_eq!(default_location("infra/modules/vpc.tf").0, "infra/modules/vpc.tf");
        assert_eq!(default_location("lib/app.py").0, "src/app.py");
        assert_eq!(default_location("src/app.py").0, "src/app.py");
        assert_eq!(default_location("docs/README.md").0, "README.md");
    }

    #[test]
    fn test_most_similar() {
        let candidates = vec![
            "infra/network.tf".to_string(),
            "infra/mains.tf".to_string(),
            "src/main.rs".to_string(),
        ];
        assert_eq!(most_similar("main.tf", &candidates), Some("infra/mains.tf"));
        assert_eq!(most_similar("zzzzzz.tf", &candidates), None);
        // Same name but a different extension does not count.
        assert_eq!(most_similar("main.go", &candidates), None);
    }
}
