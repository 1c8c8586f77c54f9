//! Instance-time validation of card payloads against a resolved schema.
//!
//! The resolved groups split into exactly one basic group (`sourceId` of
//! `_self`, or `basic` by legacy convention) and zero or more meta groups.
//! Basic fields are read from the top level of the payload; meta fields are
//! read from `payload.meta` and their error paths carry a `meta.` prefix.
//! Validation walks every field of every group and reports the complete set
//! of failures in one error; it never stops at the first.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use crate::error::{Result, SchemaError, ValidationErrors};
use crate::types::{FieldDefinition, FieldKind, ResolvedSchema, SelectConfig, TextConfig};

static REFERENCE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-_/]+$").expect("reference id pattern"));

/// Validate a card payload against a resolved schema.
///
/// `payload` must be a JSON object; meta-group fields are looked up inside
/// its `meta` member when present.
pub fn validate_payload(schema: &ResolvedSchema, payload: &Value) -> Result<()> {
    let mut errors = ValidationErrors::new();

    let Some(object) = payload.as_object() else {
        errors.insert("payload", "Payload must be a JSON object");
        return Err(SchemaError::Validation(errors));
    };
    let meta = object.get("meta").and_then(Value::as_object);

    for group in &schema.groups {
        let basic = group.is_basic();
        for field in &group.fields {
            let (value, path) = if basic {
                (object.get(&field.name), field.name.clone())
            } else {
                (
                    meta.and_then(|m| m.get(&field.name)),
                    format!("meta.{}", field.name),
                )
            };
            check_field(field, value, &path, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Validation(errors))
    }
}

/// Absent, `null`, and `""` are all "empty" for required-field detection.
fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn check_field(
    field: &FieldDefinition,
    value: Option<&Value>,
    path: &str,
    errors: &mut ValidationErrors,
) {
    if is_empty(value) {
        if field.required {
            errors.insert(path, format!("Missing required field: {}", field.name));
        }
        return;
    }
    let Some(value) = value else {
        return;
    };

    let violation = match &field.kind {
        FieldKind::Text(config)
        | FieldKind::Textarea(config)
        | FieldKind::Richtext(config)
        | FieldKind::File(config)
        | FieldKind::Image(config)
        | FieldKind::Url(config)
        | FieldKind::Email(config) => check_string(value, config),
        FieldKind::Number => check_number(value),
        FieldKind::Boolean => check_boolean(value),
        FieldKind::Date => check_date(value),
        FieldKind::Select(config) => check_select(value, config),
        FieldKind::Multiselect(config) => check_multiselect(value, config),
        FieldKind::Reference => check_reference(value),
    };

    if let Some(message) = violation {
        errors.insert(
            path,
            format!("Invalid value for field {}: {message}", field.name),
        );
    }
}

fn check_string(value: &Value, config: &TextConfig) -> Option<String> {
    let Some(s) = value.as_str() else {
        return Some("expected a string".into());
    };
    if let Some(max) = config.max_length {
        if s.chars().count() > max {
            return Some(format!("exceeds maximum length of {max}"));
        }
    }
    None
}

fn check_number(value: &Value) -> Option<String> {
    match value.as_f64() {
        Some(n) if n.is_finite() => None,
        _ => Some("expected a finite number".into()),
    }
}

fn check_boolean(value: &Value) -> Option<String> {
    if value.is_boolean() {
        None
    } else {
        Some("expected a boolean".into())
    }
}

/// A date is a parseable calendar date/time: an RFC 3339 string, a plain
/// `YYYY-MM-DD` date, a `YYYY-MM-DDTHH:MM:SS` local timestamp, or a finite
/// epoch-milliseconds number.
fn check_date(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let parsed = DateTime::parse_from_rfc3339(s).is_ok()
                || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
                || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
                || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok();
            if parsed {
                None
            } else {
                Some("expected a date".into())
            }
        }
        Value::Number(n) if n.as_f64().is_some_and(f64::is_finite) => None,
        _ => Some("expected a date".into()),
    }
}

fn check_select(value: &Value, config: &SelectConfig) -> Option<String> {
    match value.as_str() {
        Some(s) if config.options.iter().any(|o| o == s) => None,
        _ => Some(format!("expected one of {}", config.options.join(", "))),
    }
}

fn check_multiselect(value: &Value, config: &SelectConfig) -> Option<String> {
    let Some(items) = value.as_array() else {
        return Some("expected an array".into());
    };
    for item in items {
        let member = item
            .as_str()
            .is_some_and(|s| config.options.iter().any(|o| o == s));
        if !member {
            return Some(format!("expected members of {}", config.options.join(", ")));
        }
    }
    None
}

fn check_reference(value: &Value) -> Option<String> {
    match value.as_str() {
        Some(s) if REFERENCE_ID.is_match(s) => None,
        _ => Some("expected a reference id".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldGroup, TextConfig};
    use serde_json::json;

    fn schema_with(group: FieldGroup) -> ResolvedSchema {
        ResolvedSchema {
            model_id: "m".into(),
            groups: vec![group],
        }
    }

    fn basic_schema(field: FieldDefinition) -> ResolvedSchema {
        schema_with(FieldGroup::own().field(field))
    }

    fn text(name: &str) -> FieldDefinition {
        FieldDefinition::new(name, FieldKind::Text(TextConfig::default()))
    }

    #[test]
    fn non_object_payload_rejected() {
        let schema = basic_schema(text("title"));
        let err = validate_payload(&schema, &json!([1, 2])).unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().get("payload"),
            Some("Payload must be a JSON object")
        );
    }

    #[test]
    fn required_treats_missing_null_and_empty_alike() {
        let schema = basic_schema(text("title").required());
        for payload in [json!({}), json!({ "title": null }), json!({ "title": "" })] {
            let err = validate_payload(&schema, &payload).unwrap_err();
            assert_eq!(
                err.validation_errors().unwrap().get("title"),
                Some("Missing required field: title"),
                "payload: {payload}"
            );
        }
    }

    #[test]
    fn optional_absent_field_is_skipped() {
        let schema = basic_schema(text("subtitle"));
        assert!(validate_payload(&schema, &json!({})).is_ok());
        assert!(validate_payload(&schema, &json!({ "subtitle": null })).is_ok());
    }

    #[test]
    fn required_error_suppresses_type_check() {
        let schema = basic_schema(
            FieldDefinition::new("count", FieldKind::Number).required(),
        );
        let err = validate_payload(&schema, &json!({ "count": "" })).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("count"), Some("Missing required field: count"));
    }

    #[test]
    fn string_kinds_reject_non_strings_and_overlong_values() {
        let schema = basic_schema(FieldDefinition::new(
            "title",
            FieldKind::Text(TextConfig { max_length: Some(5) }),
        ));
        assert!(validate_payload(&schema, &json!({ "title": "short" })).is_ok());

        let err = validate_payload(&schema, &json!({ "title": 42 })).unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().get("title"),
            Some("Invalid value for field title: expected a string")
        );

        let err = validate_payload(&schema, &json!({ "title": "too long" })).unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().get("title"),
            Some("Invalid value for field title: exceeds maximum length of 5")
        );
    }

    #[test]
    fn number_and_boolean_rules() {
        let schema = schema_with(
            FieldGroup::own()
                .field(FieldDefinition::new("count", FieldKind::Number))
                .field(FieldDefinition::new("done", FieldKind::Boolean)),
        );
        assert!(validate_payload(&schema, &json!({ "count": 3.5, "done": true })).is_ok());

        let err =
            validate_payload(&schema, &json!({ "count": "3", "done": "yes" })).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.get("count"),
            Some("Invalid value for field count: expected a finite number")
        );
        assert_eq!(
            errors.get("done"),
            Some("Invalid value for field done: expected a boolean")
        );
    }

    #[test]
    fn date_rule_accepts_common_shapes() {
        let schema = basic_schema(FieldDefinition::new("due", FieldKind::Date));
        for ok in [
            json!({ "due": "2026-08-24" }),
            json!({ "due": "2026-08-24T10:30:00Z" }),
            json!({ "due": "2026-08-24T10:30:00" }),
            json!({ "due": 1756023000000u64 }),
        ] {
            assert!(validate_payload(&schema, &ok).is_ok(), "payload: {ok}");
        }

        let err = validate_payload(&schema, &json!({ "due": "next tuesday" })).unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().get("due"),
            Some("Invalid value for field due: expected a date")
        );
    }

    #[test]
    fn select_rule_requires_membership() {
        let schema = basic_schema(FieldDefinition::new(
            "priority",
            FieldKind::Select(SelectConfig {
                options: vec!["low".into(), "medium".into(), "high".into()],
            }),
        ));
        assert!(validate_payload(&schema, &json!({ "priority": "medium" })).is_ok());

        let err = validate_payload(&schema, &json!({ "priority": "urgent" })).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("priority"),
            Some("Invalid value for field priority: expected one of low, medium, high")
        );
    }

    #[test]
    fn multiselect_rule_checks_every_member() {
        let schema = basic_schema(FieldDefinition::new(
            "tags",
            FieldKind::Multiselect(SelectConfig {
                options: vec!["a".into(), "b".into()],
            }),
        ));
        assert!(validate_payload(&schema, &json!({ "tags": ["a", "b"] })).is_ok());
        assert!(validate_payload(&schema, &json!({ "tags": [] })).is_ok());

        for bad in [json!({ "tags": "a" }), json!({ "tags": ["a", "c"] })] {
            let err = validate_payload(&schema, &bad).unwrap_err();
            assert_eq!(err.validation_errors().unwrap().len(), 1, "payload: {bad}");
        }
    }

    #[test]
    fn reference_rule_matches_identifier_pattern() {
        let schema = basic_schema(FieldDefinition::new("link", FieldKind::Reference));
        assert!(validate_payload(&schema, &json!({ "link": "models/basic_01" })).is_ok());

        for bad in [json!({ "link": "no spaces" }), json!({ "link": 7 })] {
            let err = validate_payload(&schema, &bad).unwrap_err();
            assert_eq!(
                err.validation_errors().unwrap().get("link"),
                Some("Invalid value for field link: expected a reference id"),
                "payload: {bad}"
            );
        }
    }

    #[test]
    fn meta_group_fields_read_from_meta_with_prefixed_paths() {
        let schema = ResolvedSchema {
            model_id: "m".into(),
            groups: vec![
                FieldGroup::own().field(text("title").required()),
                FieldGroup::new("calendar").field(
                    FieldDefinition::new("start", FieldKind::Date).required(),
                ),
            ],
        };

        let ok = json!({ "title": "standup", "meta": { "start": "2026-08-24" } });
        assert!(validate_payload(&schema, &ok).is_ok());

        let err = validate_payload(&schema, &json!({ "title": "standup" })).unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().get("meta.start"),
            Some("Missing required field: start")
        );
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let schema = ResolvedSchema {
            model_id: "m".into(),
            groups: vec![
                FieldGroup::own()
                    .field(text("title").required())
                    .field(FieldDefinition::new("count", FieldKind::Number)),
                FieldGroup::new("calendar")
                    .field(FieldDefinition::new("start", FieldKind::Date).required()),
            ],
        };

        let err = validate_payload(
            &schema,
            &json!({ "count": "many", "meta": { "start": "soon" } }),
        )
        .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.len(), 3);
        assert!(errors.get("title").is_some());
        assert!(errors.get("count").is_some());
        assert!(errors.get("meta.start").is_some());
    }
}
