//! Key/value storage scoped to the server session.

use serde_json::{Map, Value};

use crate::Tools;
use crate::response::{ToolResponse, respond};

/// Format a stored number; whole numbers keep a trailing `.0`.
fn display_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

impl Tools {
    async fn store(
        &self,
        tool: &str,
        key: &str,
        value: Value,
        fallback: &str,
        message: String,
    ) -> ToolResponse {
        let mut data = Map::new();
        data.insert(key.to_string(), value);
        let outcome = self.toolkit.set_session_data(data).await;
        respond(tool, outcome, fallback, |_| {
            ToolResponse::success().with("message", message)
        })
    }

    /// Store a string. Returns `message`.
    pub async fn mcp_store_data(&self, key: &str, value: &str) -> ToolResponse {
        self.store(
            "mcp_store_data",
            key,
            Value::from(value),
            "Unknown error storing data",
            format!("Data stored successfully with key: {}", key),
        )
        .await
    }

    /// Store a number. Returns `message`.
    pub async fn mcp_store_number(&self, key: &str, value: f64) -> ToolResponse {
        self.store(
            "mcp_store_number",
            key,
            Value::from(value),
            "Unknown error storing number",
            format!(
                "Number {} stored successfully with key: {}",
                display_number(value),
                key
            ),
        )
        .await
    }

    /// Store a boolean. Returns `message`.
    pub async fn mcp_store_boolean(&self, key: &str, value: bool) -> ToolResponse {
        self.store(
            "mcp_store_boolean",
            key,
            Value::from(value),
            "Unknown error storing boolean value",
            format!("Boolean value {} stored successfully with key: {}", value, key),
        )
        .await
    }

    /// Look up a stored value. Returns `value`.
    pub async fn mcp_retrieve_data(&self, key: &str) -> ToolResponse {
        let outcome = self.toolkit.get_session_data(Some(key)).await;
        let fallback = format!("No data found for key: {}", key);
        respond("mcp_retrieve_data", outcome, &fallback, |r| {
            ToolResponse::success().with("value", r.data().clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_number() {
        assert_eq!(display_number(5.0), "5.0");
        assert_eq!(display_number(-2.0), "-2.0");
        assert_eq!(display_number(2.5), "2.5");
        assert_eq!(display_number(0.1), "0.1");
    }
}
