//! Weather lookups, rendered as a sentence for the agent.
//!
//! Numeric fields print as the server sent them, so `5.0` stays `5.0`.

use serde_json::Value;

use crate::Tools;
use crate::response::{ToolResponse, respond};

/// Render a weather payload as one sentence.
pub fn weather_report(location: &str, data: &Value) -> String {
    let field = |key: &str| match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    };
    format!(
        "The weather in {} is {} with a temperature of {}. Humidity is {} and wind speed is {}.",
        location,
        field("condition"),
        field("temperature"),
        field("humidity"),
        field("windSpeed"),
    )
}

impl Tools {
    /// Current weather for a location. Returns `report`.
    pub async fn mcp_get_weather(&self, location: &str) -> ToolResponse {
        let outcome = self.toolkit.get_weather(location).await;
        let fallback = format!("Weather information for '{}' is not available.", location);
        respond("mcp_get_weather", outcome, &fallback, |r| {
            ToolResponse::success().with("report", weather_report(location, r.data()))
        })
    }
}
