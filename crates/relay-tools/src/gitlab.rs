//! GitLab CI job diagnostics.

use serde_json::{Map, Value, json};
use tracing::info;

use crate::Tools;
use crate::response::{ToolResponse, respond};

/// Reshape the server's job analysis into the fields the agent reads.
pub fn job_report(data: &Value) -> ToolResponse {
    let empty = Value::Object(Map::new());
    let analysis = data.get("analysis").unwrap_or(&empty);
    let metadata = analysis.get("gitlab_job_metadata").unwrap_or(&empty);

    let pick = |source: &Value, key: &str| source.get(key).cloned().unwrap_or(Value::Null);
    let or = |source: &Value, key: &str, default: Value| {
        source.get(key).cloned().unwrap_or(default)
    };

    let job_metadata = json!({
        "id": pick(metadata, "id"),
        "status": pick(metadata, "status"),
        "stage": pick(metadata, "stage"),
        "name": pick(metadata, "name"),
        "ref": pick(metadata, "ref"),
        "started_at": pick(metadata, "started_at"),
        "finished_at": pick(metadata, "finished_at"),
        "duration": pick(metadata, "duration"),
    });
    let error_stats = json!({
        "error_count": or(analysis, "error_count", json!(0)),
        "warning_count": or(analysis, "warning_count", json!(0)),
        "exit_code": pick(analysis, "exit_code"),
        "log_length": or(analysis, "log_length", json!(0)),
    });

    ToolResponse::success()
        .with("job_url", pick(data, "job_url"))
        .with("gitlab_instance", or(data, "gitlab_instance", json!("Unknown GitLab instance")))
        .with("project_path", or(data, "project_path", json!("Unknown project")))
        .with("job_metadata", job_metadata)
        .with("error_stats", error_stats)
        .with("error_samples", or(analysis, "errors", json!([])))
        .with("warning_samples", or(analysis, "warnings", json!([])))
        .with("identified_issues", or(analysis, "identified_issues", json!([])))
        .with("root_causes", or(analysis, "root_causes", json!([])))
        .with("suggestions", or(analysis, "suggestions", json!([])))
        .with("contextual_analysis", or(analysis, "contextual_analysis", json!({})))
        .with("raw_logs", or(data, "raw_logs", json!("")))
}

impl Tools {
    /// Fetch and analyze the trace of a GitLab job.
    ///
    /// Works with gitlab.com and self-hosted instances; `access_token` is only
    /// needed for private projects.
    pub async fn debug_gitlab_job(
        &self,
        job_url: &str,
        access_token: Option<&str>,
    ) -> ToolResponse {
        info!(job_url, "debugging GitLab job");
        let mut params = relay_client::parameters(json!({
            "operation": "debug",
            "job_url": job_url,
        }));
        if let Some(token) = access_token.filter(|t| !t.is_empty()) {
            params.insert("access_token".to_string(), Value::from(token));
        }

        let outcome = self.toolkit.execute_tool("debug_gitlab_job", params).await;
        respond(
            "debug_gitlab_job",
            outcome,
            "Unknown error debugging GitLab job",
            |r| job_report(r.data()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_defaults() {
        let report = job_report(&Value::Null);
        assert!(report.is_success());
        assert_eq!(report.get("gitlab_instance"), Some(&json!("Unknown GitLab instance")));
        assert_eq!(report.get("error_stats").unwrap()["error_count"], 0);
        assert_eq!(report.get("root_causes"), Some(&json!([])));
        assert_eq!(report.get("job_metadata").unwrap()["id"], Value::Null);
    }

    #[test]
    fn test_report_fields() {
        let data = json!({
            "job_url": "https://gitlab.com/g/p/-/jobs/1",
            "project_path": "g/p",
            "raw_logs": "$ make\nerror: boom",
            "analysis": {
                "error_count": 1,
                "exit_code": 2,
                "errors": ["error: boom"],
                "suggestions": ["fix the build"],
                "gitlab_job_metadata": { "id": 1, "stage": "test", "ref": "main" }
            }
        });
        let report = job_report(&data);
        assert_eq!(report.get("project_path"), Some(&json!("g/p")));
        assert_eq!(report.get("error_samples"), Some(&json!(["error: boom"])));
        assert_eq!(report.get("error_stats").unwrap()["exit_code"], 2);
        assert_eq!(report.get("job_metadata").unwrap()["ref"], "main");
        assert_eq!(report.get("raw_logs"), Some(&json!("$ make\nerror: boom")));
    }
}
