//! Core schema types: field definitions, field groups, models, and the
//! resolved view produced by inheritance resolution.
//!
//! All types serialize to the persisted JSON shape. A field's `type` is a
//! lowercase string tag on the wire; internally it is the closed [`FieldKind`]
//! enum, one variant per registry entry, each carrying its own config payload.
//! Conversion in both directions goes through
//! [`RawFieldDefinition`](crate::raw::RawFieldDefinition).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::raw::RawFieldDefinition;

/// Sentinel `sourceId` for the group of fields a model owns directly.
pub const SELF_SOURCE: &str = "_self";

/// Legacy name some seeded documents use for their own group.
pub const LEGACY_BASIC_SOURCE: &str = "basic";

/// Config payload for string-valued field kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextConfig {
    /// Maximum accepted length in characters, if any.
    pub max_length: Option<usize>,
}

/// Config payload for select and multiselect fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectConfig {
    /// Allowed values. Non-empty by construction.
    pub options: Vec<String>,
}

/// The closed set of recognized field types.
///
/// Adding a type means adding a variant here and a rule in the payload
/// validator; it is a registry change, never a schema-data change.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text(TextConfig),
    Textarea(TextConfig),
    Richtext(TextConfig),
    Number,
    Boolean,
    Date,
    Select(SelectConfig),
    Multiselect(SelectConfig),
    File(TextConfig),
    Image(TextConfig),
    Url(TextConfig),
    Email(TextConfig),
    Reference,
}

/// A raw definition could not be mapped onto the field type registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldKindError {
    #[error("Unknown field type: {tag}")]
    UnknownType { tag: String },
    #[error("{tag} fields require a non-empty options array")]
    MissingOptions { tag: String },
}

impl FieldKind {
    /// The wire tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Textarea(_) => "textarea",
            Self::Richtext(_) => "richtext",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Select(_) => "select",
            Self::Multiselect(_) => "multiselect",
            Self::File(_) => "file",
            Self::Image(_) => "image",
            Self::Url(_) => "url",
            Self::Email(_) => "email",
            Self::Reference => "reference",
        }
    }

    /// Build a kind from a raw definition, reading `config.options` (or the
    /// legacy top-level list) for select kinds and `config.maxLength` for
    /// string-valued kinds.
    pub fn from_raw(raw: &RawFieldDefinition) -> Result<Self, FieldKindError> {
        match raw.kind.as_str() {
            "text" => Ok(Self::Text(text_config(raw))),
            "textarea" => Ok(Self::Textarea(text_config(raw))),
            "richtext" => Ok(Self::Richtext(text_config(raw))),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "select" => Ok(Self::Select(select_config(raw)?)),
            "multiselect" => Ok(Self::Multiselect(select_config(raw)?)),
            "file" => Ok(Self::File(text_config(raw))),
            "image" => Ok(Self::Image(text_config(raw))),
            "url" => Ok(Self::Url(text_config(raw))),
            "email" => Ok(Self::Email(text_config(raw))),
            "reference" => Ok(Self::Reference),
            other => Err(FieldKindError::UnknownType {
                tag: other.to_string(),
            }),
        }
    }

    /// Text-family config, for kinds that carry one.
    pub fn text_config(&self) -> Option<&TextConfig> {
        match self {
            Self::Text(c)
            | Self::Textarea(c)
            | Self::Richtext(c)
            | Self::File(c)
            | Self::Image(c)
            | Self::Url(c)
            | Self::Email(c) => Some(c),
            _ => None,
        }
    }

    /// Allowed option values, for select and multiselect kinds.
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::Select(c) | Self::Multiselect(c) => Some(&c.options),
            _ => None,
        }
    }
}

fn text_config(raw: &RawFieldDefinition) -> TextConfig {
    let max_length = raw
        .config
        .as_ref()
        .and_then(|c| c.get("maxLength"))
        .and_then(Value::as_u64)
        .map(|n| n as usize);
    TextConfig { max_length }
}

fn select_config(raw: &RawFieldDefinition) -> Result<SelectConfig, FieldKindError> {
    let missing = || FieldKindError::MissingOptions {
        tag: raw.kind.clone(),
    };
    if let Some(value) = raw.config.as_ref().and_then(|c| c.get("options")) {
        let items = value.as_array().ok_or_else(missing)?;
        let mut options = Vec::with_capacity(items.len());
        for item in items {
            options.push(item.as_str().ok_or_else(missing)?.to_string());
        }
        if options.is_empty() {
            return Err(missing());
        }
        return Ok(SelectConfig { options });
    }
    match raw.legacy_options() {
        Some(options) if !options.is_empty() => Ok(SelectConfig {
            options: options.to_vec(),
        }),
        _ => Err(missing()),
    }
}

/// A validated field definition.
///
/// Immutable once embedded in a persisted group except via explicit schema
/// update. Serializes back to the raw shape, so `options` and `maxLength`
/// reappear under `config` and unrecognized config keys survive round trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RawFieldDefinition", try_from = "RawFieldDefinition")]
pub struct FieldDefinition {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
    /// Config keys the registry does not interpret, preserved verbatim.
    pub extra_config: Map<String, Value>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            extra_config: Map::new(),
        }
    }

    /// Mark the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

impl TryFrom<RawFieldDefinition> for FieldDefinition {
    type Error = FieldKindError;

    fn try_from(raw: RawFieldDefinition) -> Result<Self, Self::Error> {
        let kind = FieldKind::from_raw(&raw)?;
        let mut extra_config = raw.config.unwrap_or_default();
        extra_config.remove("options");
        extra_config.remove("maxLength");
        Ok(Self {
            name: raw.name,
            kind,
            required: raw.required,
            default: raw.default,
            extra_config,
        })
    }
}

impl From<FieldDefinition> for RawFieldDefinition {
    fn from(field: FieldDefinition) -> Self {
        let mut config = field.extra_config;
        if let Some(max_length) = field.kind.text_config().and_then(|c| c.max_length) {
            config.insert("maxLength".into(), Value::from(max_length as u64));
        }
        if let Some(options) = field.kind.options() {
            let values: Vec<Value> = options.iter().cloned().map(Value::String).collect();
            config.insert("options".into(), Value::Array(values));
        }
        Self {
            name: field.name,
            kind: field.kind.tag().to_string(),
            required: field.required,
            default: field.default,
            options: None,
            config: (!config.is_empty()).then_some(config),
        }
    }
}

/// A named bundle of field definitions tagged with the model it came from.
///
/// Field names are unique within a group. Uniqueness is not enforced across
/// groups; the resolver's first-writer-wins merge decides shadowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGroup {
    #[serde(rename = "sourceId")]
    pub source_id: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl FieldGroup {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            fields: Vec::new(),
        }
    }

    /// A group owned directly by its model (`sourceId = _self`).
    pub fn own() -> Self {
        Self::new(SELF_SOURCE)
    }

    /// Append a field definition.
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether payload validation reads this group's fields from the
    /// top level of the payload rather than from `meta`.
    pub fn is_basic(&self) -> bool {
        self.source_id == SELF_SOURCE || self.source_id == LEGACY_BASIC_SOURCE
    }
}

/// A named, inheritable schema definition.
///
/// `own_fields` is the `_self` group. `meta_groups` are snapshot groups a
/// model carries from ancestors, tagged with the ancestor's id; the resolver
/// walks them verbatim, which is what makes diamond inheritance observable
/// one level down without recursing into grandparents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub name: String,
    pub own_fields: FieldGroup,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta_groups: Vec<FieldGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_ids: Vec<String>,
    /// System models are seeded at install time and can never be deleted.
    #[serde(default)]
    pub system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Create a model owning the given `_self` group.
    pub fn new(id: impl Into<String>, name: impl Into<String>, own_fields: FieldGroup) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            own_fields,
            meta_groups: Vec::new(),
            parent_ids: Vec::new(),
            system: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set parent model ids, in declaration order.
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_ids = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a snapshot group carried from an ancestor.
    pub fn with_meta_group(mut self, group: FieldGroup) -> Self {
        self.meta_groups.push(group);
        self
    }

    /// Mark as a system model.
    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }

    /// All stored groups, own group first.
    pub fn groups(&self) -> impl Iterator<Item = &FieldGroup> {
        std::iter::once(&self.own_fields).chain(self.meta_groups.iter())
    }
}

/// The flattened, ephemeral view of a model's effective fields.
///
/// Never persisted and never cached: always recomputed from the live model
/// graph so concurrent edits are visible to the next resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSchema {
    pub model_id: String,
    pub groups: Vec<FieldGroup>,
}

impl ResolvedSchema {
    /// Look up a field by group source and name.
    pub fn field(&self, source_id: &str, name: &str) -> Option<&FieldDefinition> {
        self.groups
            .iter()
            .find(|g| g.source_id == source_id)
            .and_then(|g| g.get(name))
    }

    /// Total number of fields across all groups.
    pub fn field_count(&self) -> usize {
        self.groups.iter().map(|g| g.fields.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawFieldDefinition;
    use serde_json::json;

    #[test]
    fn kind_from_raw_text_reads_max_length() {
        let raw = RawFieldDefinition::new("title", "text").with_config("maxLength", json!(80));
        let kind = FieldKind::from_raw(&raw).unwrap();
        assert_eq!(kind, FieldKind::Text(TextConfig { max_length: Some(80) }));
    }

    #[test]
    fn kind_from_raw_unknown_tag() {
        let raw = RawFieldDefinition::new("x", "geolocation");
        let err = FieldKind::from_raw(&raw).unwrap_err();
        assert_eq!(
            err,
            FieldKindError::UnknownType {
                tag: "geolocation".into()
            }
        );
    }

    #[test]
    fn kind_from_raw_select_requires_options() {
        let raw = RawFieldDefinition::new("priority", "select");
        assert!(matches!(
            FieldKind::from_raw(&raw),
            Err(FieldKindError::MissingOptions { .. })
        ));

        let raw = RawFieldDefinition::new("priority", "select").with_options(["low", "high"]);
        let kind = FieldKind::from_raw(&raw).unwrap();
        assert_eq!(kind.options(), Some(&["low".to_string(), "high".into()][..]));
    }

    #[test]
    fn kind_from_raw_select_rejects_empty_or_non_array() {
        let raw = RawFieldDefinition::new("priority", "select")
            .with_config("options", json!("low,high"));
        assert!(FieldKind::from_raw(&raw).is_err());

        let raw = RawFieldDefinition::new("priority", "select").with_config("options", json!([]));
        assert!(FieldKind::from_raw(&raw).is_err());
    }

    #[test]
    fn kind_from_raw_select_legacy_top_level_options() {
        let raw: RawFieldDefinition = serde_json::from_value(json!({
            "name": "status",
            "type": "multiselect",
            "options": ["open", "closed"]
        }))
        .unwrap();
        let kind = FieldKind::from_raw(&raw).unwrap();
        assert_eq!(
            kind.options(),
            Some(&["open".to_string(), "closed".into()][..])
        );
    }

    #[test]
    fn field_definition_json_round_trip() {
        let field = FieldDefinition::new(
            "priority",
            FieldKind::Select(SelectConfig {
                options: vec!["low".into(), "medium".into(), "high".into()],
            }),
        )
        .required()
        .with_default(json!("low"));

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], "select");
        assert_eq!(value["config"]["options"], json!(["low", "medium", "high"]));
        assert_eq!(value["default"], "low");

        let back: FieldDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn field_definition_preserves_unknown_config_keys() {
        let field: FieldDefinition = serde_json::from_value(json!({
            "name": "title",
            "type": "text",
            "config": { "maxLength": 120, "placeholder": "Untitled" }
        }))
        .unwrap();
        assert_eq!(
            field.kind.text_config().and_then(|c| c.max_length),
            Some(120)
        );
        assert_eq!(field.extra_config.get("placeholder"), Some(&json!("Untitled")));

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["config"]["maxLength"], 120);
        assert_eq!(value["config"]["placeholder"], "Untitled");
    }

    #[test]
    fn field_definition_rejects_unknown_type_on_deserialize() {
        let result: Result<FieldDefinition, _> =
            serde_json::from_value(json!({ "name": "x", "type": "hologram" }));
        assert!(result.is_err());
    }

    #[test]
    fn model_json_uses_camel_case_keys() {
        let model = Model::new(
            "datecard",
            "Date card",
            FieldGroup::own().field(FieldDefinition::new(
                "title",
                FieldKind::Text(TextConfig::default()),
            )),
        )
        .with_parents(["basic"]);

        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value["ownFields"]["sourceId"], "_self");
        assert_eq!(value["parentIds"], json!(["basic"]));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("metaGroups").is_none());

        let back: Model = serde_json::from_value(value).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn group_basic_classification() {
        assert!(FieldGroup::own().is_basic());
        assert!(FieldGroup::new("basic").is_basic());
        assert!(!FieldGroup::new("event-meta").is_basic());
    }

    #[test]
    fn model_groups_iterates_own_first() {
        let model = Model::new("m", "M", FieldGroup::own())
            .with_meta_group(FieldGroup::new("ancestor"));
        let sources: Vec<_> = model.groups().map(|g| g.source_id.as_str()).collect();
        assert_eq!(sources, ["_self", "ancestor"]);
    }
}
