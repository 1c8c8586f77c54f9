//! The persisted card document.
//!
//! The schema engine never stores card data; this type belongs to the store
//! collaborator. A card's payload must have validated against the resolved
//! schema of the model it references at the time it was written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

/// A document instantiated from a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub model_id: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Create a card with a fresh ULID id.
    pub fn new(model_id: impl Into<String>, payload: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new().to_string(),
            model_id: model_id.into(),
            payload,
            created_at: now,
            updated_at: now,
        }
    }
}
