//! Device messages and their projection onto condition bindings.

use crate::query::{Bindings, QueryValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// A telemetry message as seen by the router.
///
/// Application properties are exposed to conditions as `properties.<name>`,
/// system properties as `$<name>` and scalar leaves of a JSON body as
/// `$body.<path>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub properties: BTreeMap<String, JsonValue>,
    #[serde(default, rename = "systemProperties")]
    pub system_properties: BTreeMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<JsonValue>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_system_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<JsonValue>,
    ) -> Self {
        self.system_properties.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Flatten the message into the field values conditions can reference
    pub fn bindings(&self) -> Bindings {
        let mut bindings = Bindings::new();

        for (name, value) in &self.properties {
            bindings.insert(format!("properties.{}", name), QueryValue::from(value));
        }

        for (name, value) in &self.system_properties {
            bindings.insert(format!("${}", name), system_value(value));
        }

        if let Some(body) = &self.body {
            flatten_body("$body", body, &mut bindings);
        }

        bindings
    }
}

impl From<&Message> for Bindings {
    fn from(message: &Message) -> Self {
        message.bindings()
    }
}

/// System timestamps arrive as RFC 3339 strings
fn system_value(value: &JsonValue) -> QueryValue {
    if let JsonValue::String(s) = value {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return QueryValue::DateTime(dt.with_timezone(&Utc));
        }
    }
    QueryValue::from(value)
}

fn flatten_body(prefix: &str, value: &JsonValue, bindings: &mut Bindings) {
    match value {
        JsonValue::Object(fields) => {
            for (key, child) in fields {
                flatten_body(&format!("{}.{}", prefix, key), child, bindings);
            }
        }
        // Arrays are not addressable
        JsonValue::Array(_) => {}
        scalar => {
            bindings.insert(prefix, QueryValue::from(scalar));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_bindings_from_message() {
        let message = Message::new()
            .with_property("color", "RED")
            .with_property("count", 3)
            .with_system_property("contentType", "application/json")
            .with_system_property("enqueuedTime", "2024-05-01T08:00:00Z")
            .with_body(json!({
                "temp": 21.5,
                "sensor": {"id": "s-1", "ok": true, "tags": ["a", "b"]},
                "note": null
            }));

        let bindings = message.bindings();

        assert_eq!(bindings.get("properties.color"), &QueryValue::from("RED"));
        assert_eq!(bindings.get("properties.count"), &QueryValue::Number(3.0));
        assert_eq!(
            bindings.get("$contentType"),
            &QueryValue::from("application/json")
        );
        assert_eq!(
            bindings.get("$enqueuedTime"),
            &QueryValue::DateTime(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())
        );
        assert_eq!(bindings.get("$body.temp"), &QueryValue::Number(21.5));
        assert_eq!(bindings.get("$body.sensor.id"), &QueryValue::from("s-1"));
        assert_eq!(bindings.get("$body.sensor.ok"), &QueryValue::Bool(true));
        assert_eq!(bindings.get("$body.note"), &QueryValue::Null);
        assert!(!bindings.contains("$body.sensor.tags"));
        assert!(!bindings.contains("$body.sensor"));
    }

    #[test]
    fn test_scalar_body() {
        let bindings = Message::new().with_body(json!(7)).bindings();
        assert_eq!(bindings.get("$body"), &QueryValue::Number(7.0));
    }

    #[test]
    fn test_deserialize_message() {
        let message: Message = serde_json::from_str(
            r#"{
                "properties": {"level": "critical"},
                "systemProperties": {"connectionDeviceId": "sensor-7"},
                "body": {"temp": 30}
            }"#,
        )
        .unwrap();

        assert_eq!(message.properties["level"], json!("critical"));
        assert_eq!(message.system_properties["connectionDeviceId"], json!("sensor-7"));

        let empty: Message = serde_json::from_str("{}").unwrap();
        assert!(empty.bindings().is_empty());
    }
}
