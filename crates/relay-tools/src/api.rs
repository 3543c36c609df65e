//! Outbound HTTP calls made by the server on the agent's behalf.

use serde_json::{Value, json};
use tracing::info;

use crate::Tools;
use crate::response::{ToolResponse, respond};

/// Uppercase the method, defaulting to GET.
pub fn normalize_method(method: Option<&str>) -> String {
    match method.map(str::trim) {
        Some(m) if !m.is_empty() => m.to_ascii_uppercase(),
        _ => "GET".to_string(),
    }
}

/// Prepend `http://` when the endpoint has no scheme.
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.is_empty() || endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

impl Tools {
    /// Make an API call through the server. Returns `data`.
    ///
    /// The body is dropped for GET requests.
    pub async fn mcp_call_api(
        &self,
        endpoint: &str,
        method: Option<&str>,
        data: Option<Value>,
        headers: Option<Value>,
    ) -> ToolResponse {
        let method = normalize_method(method);
        let endpoint = normalize_endpoint(endpoint);
        let data = if method == "GET" { None } else { data };

        info!(endpoint = %endpoint, method = %method, "making API call");
        let outcome = self.toolkit.call_api(&endpoint, &method, data, headers).await;
        respond("mcp_call_api", outcome, "Unknown error making API call", |r| {
            ToolResponse::success().with("data", r.data.clone().unwrap_or_else(|| json!({})))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_method() {
        assert_eq!(normalize_method(Some("post")), "POST");
        assert_eq!(normalize_method(Some(" ")), "GET");
        assert_eq!(normalize_method(None), "GET");
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint("example.com/x"), "http://example.com/x");
        assert_eq!(normalize_endpoint("https://example.com"), "https://example.com");
        assert_eq!(normalize_endpoint("http://example.com"), "http://example.com");
        assert_eq!(normalize_endpoint(""), "");
    }
}
