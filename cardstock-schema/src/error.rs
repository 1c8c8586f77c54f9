//! Error types for the schema engine

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for schema engine operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Machine-readable reason a mutation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenReason {
    /// The model is seeded at install time and protected from deletion.
    SystemModel,
    /// Another model lists this one in its `parentIds`.
    HasChildren,
    /// At least one card is instantiated from this model.
    UsedByCards,
}

impl ForbiddenReason {
    /// The snake_case reason code as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemModel => "system_model",
            Self::HasChildren => "has_children",
            Self::UsedByCards => "used_by_cards",
        }
    }
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated field-level violations, keyed by field path.
///
/// Paths are `groups[i].fields[j].<part>` for definition-time checks and the
/// field name (`meta.`-prefixed for meta groups) for payload checks. The map
/// is ordered so error listings are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation. The first message for a path wins; later rules for
    /// the same field do not overwrite it.
    pub fn insert(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(path.into()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// The message recorded for a path, if any.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.fields.get(path).map(String::as_str)
    }

    /// Iterate violations in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Borrow the underlying path → message map.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid field(s)", self.fields.len())?;
        let mut sep = ": ";
        for path in self.fields.keys() {
            write!(f, "{sep}{path}")?;
            sep = ", ";
        }
        Ok(())
    }
}

/// Errors that can occur in schema engine operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Model not found in the schema store
    #[error("model not found: {id}")]
    ModelNotFound { id: String },

    /// A schema definition or card payload violates structural/type rules.
    /// Always carries every violation at once, never just the first.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// A mutation was blocked by a lifecycle invariant
    #[error("operation forbidden: {reason}")]
    Forbidden { reason: ForbiddenReason },
}

impl SchemaError {
    /// Create a model-not-found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::ModelNotFound { id: id.into() }
    }

    /// Create a forbidden error with the given reason code
    pub fn forbidden(reason: ForbiddenReason) -> Self {
        Self::Forbidden { reason }
    }

    /// The accumulated violations, when this is a validation error.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::not_found("datecard");
        assert_eq!(err.to_string(), "model not found: datecard");
    }

    #[test]
    fn test_forbidden_reason_codes() {
        assert_eq!(ForbiddenReason::SystemModel.as_str(), "system_model");
        assert_eq!(ForbiddenReason::HasChildren.as_str(), "has_children");
        assert_eq!(ForbiddenReason::UsedByCards.as_str(), "used_by_cards");

        let json = serde_json::to_string(&ForbiddenReason::UsedByCards).unwrap();
        assert_eq!(json, "\"used_by_cards\"");
    }

    #[test]
    fn test_validation_errors_accumulate() {
        let mut errors = ValidationErrors::new();
        errors.insert("title", "Missing required field: title");
        errors.insert("meta.due", "Invalid value for field due: expected a date");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("title"), Some("Missing required field: title"));

        let display = SchemaError::Validation(errors).to_string();
        assert!(display.contains("2 invalid field(s)"));
        assert!(display.contains("meta.due"));
    }

    #[test]
    fn test_first_message_per_path_wins() {
        let mut errors = ValidationErrors::new();
        errors.insert("title", "first");
        errors.insert("title", "second");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("title"), Some("first"));
    }
}
