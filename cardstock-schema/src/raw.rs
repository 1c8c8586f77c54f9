//! Unvalidated field group shapes as they arrive from callers.
//!
//! These mirror the persisted JSON exactly: `type` is a plain string tag and
//! select options live under `config.options` (a bare top-level `options`
//! array is accepted on read for older documents). Definition-time validation
//! consumes these and hands back typed [`FieldGroup`](crate::types::FieldGroup)s,
//! so an unknown type string becomes a reported field error instead of a
//! deserialization failure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single field definition before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawFieldDefinition {
    pub name: String,
    /// Field type tag, e.g. `"text"` or `"select"`. Validated against the
    /// field type registry, not at parse time.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Legacy top-level options list, accepted on read and written back under
    /// `config.options`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}

impl RawFieldDefinition {
    /// Minimal definition with the given name and type tag.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            required: false,
            default: None,
            options: None,
            config: None,
        }
    }

    /// Mark the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set a config entry.
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Set select/multiselect options under `config.options`.
    pub fn with_options<I, S>(self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = options
            .into_iter()
            .map(|o| Value::String(o.into()))
            .collect();
        self.with_config("options", Value::Array(values))
    }

    /// The options array under `config.options`, if present. The legacy
    /// top-level list is exposed separately via [`Self::legacy_options`].
    pub fn effective_options(&self) -> Option<&Value> {
        self.config.as_ref().and_then(|c| c.get("options"))
    }

    /// The legacy top-level options list, if present.
    pub fn legacy_options(&self) -> Option<&[String]> {
        self.options.as_deref()
    }
}

/// A group of field definitions before validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawFieldGroup {
    #[serde(rename = "sourceId")]
    pub source_id: String,
    #[serde(default)]
    pub fields: Vec<RawFieldDefinition>,
}

impl RawFieldGroup {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field definition.
    pub fn field(mut self, field: RawFieldDefinition) -> Self {
        self.fields.push(field);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_field_json_shape() {
        let raw: RawFieldDefinition = serde_json::from_value(json!({
            "name": "priority",
            "type": "select",
            "required": true,
            "config": { "options": ["low", "medium", "high"] }
        }))
        .unwrap();
        assert_eq!(raw.name, "priority");
        assert_eq!(raw.kind, "select");
        assert!(raw.required);
        assert_eq!(
            raw.effective_options(),
            Some(&json!(["low", "medium", "high"]))
        );
    }

    #[test]
    fn type_key_round_trips() {
        let raw = RawFieldDefinition::new("title", "text").required();
        let value = serde_json::to_value(&raw).unwrap();
        assert_eq!(value["type"], "text");
        assert!(value.get("kind").is_none());
        let back: RawFieldDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn missing_required_defaults_to_false() {
        let raw: RawFieldDefinition =
            serde_json::from_value(json!({ "name": "body", "type": "richtext" })).unwrap();
        assert!(!raw.required);
        assert!(raw.config.is_none());
    }

    #[test]
    fn legacy_top_level_options_accepted() {
        let raw: RawFieldDefinition = serde_json::from_value(json!({
            "name": "status",
            "type": "select",
            "options": ["open", "closed"]
        }))
        .unwrap();
        assert!(raw.effective_options().is_none());
        assert_eq!(
            raw.legacy_options(),
            Some(&["open".to_string(), "closed".to_string()][..])
        );
    }

    #[test]
    fn group_source_id_renames() {
        let group = RawFieldGroup::new("_self").field(RawFieldDefinition::new("title", "text"));
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["sourceId"], "_self");
        assert_eq!(value["fields"][0]["name"], "title");
    }
}
