//! Built-in system models.
//!
//! `builtin_defaults()` provides the models every installation starts with.
//! Stores pass them to their seeding path on first open; models already on
//! disk (matched by id) are never overwritten, so user edits survive
//! upgrades.

use crate::types::{FieldDefinition, FieldGroup, FieldKind, Model, TextConfig};

/// Id of the seeded basic card model.
pub const BASIC_MODEL_ID: &str = "basic";

/// A collection of models to seed on first open.
#[derive(Debug, Default)]
pub struct ModelDefaults {
    models: Vec<Model>,
}

impl ModelDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default model.
    pub fn model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    /// Access the default models.
    pub fn models(&self) -> &[Model] {
        &self.models
    }
}

/// The stock set of system models: a `basic` card with a required title and
/// a rich-text body.
pub fn builtin_defaults() -> ModelDefaults {
    ModelDefaults::new().model(
        Model::new(
            BASIC_MODEL_ID,
            "Basic card",
            FieldGroup::own()
                .field(
                    FieldDefinition::new("title", FieldKind::Text(TextConfig::default()))
                        .required(),
                )
                .field(FieldDefinition::new(
                    "body",
                    FieldKind::Richtext(TextConfig::default()),
                )),
        )
        .system(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::validate_payload;
    use crate::resolve::resolve;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn builtin_basic_model_shape() {
        let defaults = builtin_defaults();
        let basic = &defaults.models()[0];
        assert_eq!(basic.id, BASIC_MODEL_ID);
        assert!(basic.system);
        assert!(basic.own_fields.get("title").unwrap().required);
        assert!(!basic.own_fields.get("body").unwrap().required);
    }

    #[test]
    fn builtin_basic_model_validates_cards() {
        let mut store = MemoryStore::new();
        for model in builtin_defaults().models() {
            store.put_model(model.clone());
        }

        let schema = resolve(&store, BASIC_MODEL_ID).unwrap();
        assert!(validate_payload(&schema, &json!({ "title": "hello" })).is_ok());
        assert!(validate_payload(&schema, &json!({ "body": "no title" })).is_err());
    }
}
