//! The schema store seam and an in-memory implementation.
//!
//! The engine never owns persistence. Everything it needs from the outside
//! world is the narrow [`SchemaStore`] trait: a single authoritative model
//! read plus two existence checks used by the mutation guard. [`MemoryStore`]
//! is the reference implementation, used by tests and by embedders that keep
//! their model graph in memory.

use std::collections::HashMap;

use crate::types::Model;

/// Read-only view of the model graph and card usage, as consumed by the
/// resolver and the mutation guard.
pub trait SchemaStore {
    /// Fetch a model by id.
    fn model_by_id(&self, id: &str) -> Option<&Model>;

    /// Whether any other model lists `id` in its `parentIds`.
    fn has_child_models(&self, id: &str) -> bool;

    /// Whether at least one card is instantiated from the model.
    fn any_card_uses_model(&self, id: &str) -> bool;
}

/// In-memory model graph with card usage tracking.
#[derive(Debug, Default)]
pub struct MemoryStore {
    models: Vec<Model>,
    id_index: HashMap<String, usize>,
    /// card id → model id
    cards: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a model, keyed by id.
    pub fn put_model(&mut self, model: Model) {
        if let Some(&idx) = self.id_index.get(&model.id) {
            self.models[idx] = model;
        } else {
            let idx = self.models.len();
            self.id_index.insert(model.id.clone(), idx);
            self.models.push(model);
        }
    }

    /// Remove a model by id. Returns the removed model, if present.
    pub fn remove_model(&mut self, id: &str) -> Option<Model> {
        let idx = self.id_index.remove(id)?;
        let removed = self.models.swap_remove(idx);
        if idx < self.models.len() {
            let moved_id = self.models[idx].id.clone();
            self.id_index.insert(moved_id, idx);
        }
        Some(removed)
    }

    /// Record that a card is instantiated from a model.
    pub fn put_card(&mut self, card_id: impl Into<String>, model_id: impl Into<String>) {
        self.cards.insert(card_id.into(), model_id.into());
    }

    /// Forget a card.
    pub fn remove_card(&mut self, card_id: &str) {
        self.cards.remove(card_id);
    }

    /// All models, in insertion order modulo removals.
    pub fn models(&self) -> &[Model] {
        &self.models
    }
}

impl SchemaStore for MemoryStore {
    fn model_by_id(&self, id: &str) -> Option<&Model> {
        self.id_index.get(id).map(|&idx| &self.models[idx])
    }

    fn has_child_models(&self, id: &str) -> bool {
        self.models
            .iter()
            .any(|m| m.id != id && m.parent_ids.iter().any(|p| p == id))
    }

    fn any_card_uses_model(&self, id: &str) -> bool {
        self.cards.values().any(|model_id| model_id == id)
    }
}
