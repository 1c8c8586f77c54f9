//! ModelStore: file-backed persistence for models and cards.
//!
//! Owns a directory with one YAML document per model under `models/` and one
//! per card under `cards/`. Everything is loaded into memory on open and
//! served from name/id indexes; writes go through a temp-file rename so a
//! crash never leaves a half-written document. Mutations run the schema
//! engine first: definitions are validated on create/update, the deletion
//! guard runs before a model is removed, and card payloads are validated
//! against the freshly resolved schema of their model.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};
use ulid::Ulid;

use cardstock_schema::{
    guard_delete, guard_update, resolve, validate_groups, validate_payload, FieldGroup,
    Model, ModelDefaults, RawFieldGroup, ResolvedSchema, SchemaError, SchemaStore, SELF_SOURCE,
};

use crate::card::Card;
use crate::error::{Result, StoreError};

/// Builder for `ModelStore`. Created by `ModelStore::open()`.
pub struct ModelStoreBuilder {
    root: PathBuf,
    defaults: Option<ModelDefaults>,
}

impl ModelStoreBuilder {
    /// Provide system models to seed on first open. Models already on disk
    /// (matched by id) are preserved.
    pub fn with_defaults(mut self, defaults: ModelDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Build the store: create directories, seed defaults, load from disk.
    pub async fn build(self) -> Result<ModelStore> {
        let root = self.root;

        let models_dir = root.join("models");
        let cards_dir = root.join("cards");
        fs::create_dir_all(&models_dir).await?;
        fs::create_dir_all(&cards_dir).await?;

        if let Some(defaults) = self.defaults {
            seed_defaults(&models_dir, &defaults).await?;
        }

        let mut store = ModelStore {
            root,
            models: Vec::new(),
            id_index: HashMap::new(),
            name_index: HashMap::new(),
            cards: Vec::new(),
            card_index: HashMap::new(),
        };

        store.load_models().await?;
        store.load_cards().await?;

        debug!(
            models = store.models.len(),
            cards = store.cards.len(),
            "model store opened"
        );

        Ok(store)
    }
}

/// Seed default models that don't already exist on disk.
///
/// Documents are keyed by model id, so a seeded model the user has since
/// edited (or renamed) is never overwritten.
async fn seed_defaults(models_dir: &Path, defaults: &ModelDefaults) -> Result<()> {
    for model in defaults.models() {
        let path = models_dir.join(format!("{}.yaml", model.id));
        if !path.exists() {
            let yaml = serde_yaml_ng::to_string(model)?;
            atomic_write(&path, yaml.as_bytes()).await?;
            debug!(id = %model.id, name = %model.name, "seeded default model");
        }
    }
    Ok(())
}

/// File-backed store of models and cards.
///
/// Directory structure:
/// ```text
/// store/
///   models/    ← one .yaml per model
///   cards/     ← one .yaml per card
/// ```
pub struct ModelStore {
    root: PathBuf,
    models: Vec<Model>,
    id_index: HashMap<String, usize>,
    name_index: HashMap<String, usize>,
    cards: Vec<Card>,
    card_index: HashMap<String, usize>,
}

impl ModelStore {
    /// Open or create a store directory. Returns a builder for optional
    /// configuration.
    pub fn open(root: impl Into<PathBuf>) -> ModelStoreBuilder {
        ModelStoreBuilder {
            root: root.into(),
            defaults: None,
        }
    }

    // --- Models ---

    /// Get a model by id.
    pub fn model(&self, id: &str) -> Option<&Model> {
        self.id_index.get(id).map(|&i| &self.models[i])
    }

    /// Get a model by name.
    pub fn model_by_name(&self, name: &str) -> Option<&Model> {
        self.name_index.get(name).map(|&i| &self.models[i])
    }

    /// All models.
    pub fn all_models(&self) -> &[Model] {
        &self.models
    }

    /// Resolve a model's effective schema from the live graph.
    pub fn resolve(&self, model_id: &str) -> Result<ResolvedSchema> {
        Ok(resolve(self, model_id)?)
    }

    /// Create a model from raw field groups.
    ///
    /// The groups are validated structurally first; the group with
    /// `sourceId = _self` becomes the model's own group and the rest are
    /// stored as snapshot meta groups.
    pub async fn create_model(
        &mut self,
        name: &str,
        groups: &[RawFieldGroup],
        parent_ids: Vec<String>,
    ) -> Result<Model> {
        if self.name_index.contains_key(name) {
            return Err(StoreError::DuplicateName { name: name.into() });
        }
        let typed = validate_groups(groups)?;
        let (own, meta) = split_own_group(typed);

        let mut model = Model::new(Ulid::new().to_string(), name, own).with_parents(parent_ids);
        model.meta_groups = meta;

        self.persist_model(&model).await?;
        let idx = self.models.len();
        self.id_index.insert(model.id.clone(), idx);
        self.name_index.insert(model.name.clone(), idx);
        self.models.push(model.clone());

        debug!(id = %model.id, name = %model.name, "created model");
        Ok(model)
    }

    /// Update a model's name, field groups, and parents.
    ///
    /// Runs the structural update guard; the system flag and creation time
    /// are never changed through this path.
    pub async fn update_model(
        &mut self,
        id: &str,
        name: &str,
        groups: &[RawFieldGroup],
        parent_ids: Vec<String>,
    ) -> Result<Model> {
        let idx = *self
            .id_index
            .get(id)
            .ok_or_else(|| SchemaError::not_found(id))?;
        if let Some(&other) = self.name_index.get(name) {
            if other != idx {
                return Err(StoreError::DuplicateName { name: name.into() });
            }
        }

        let typed = guard_update(groups)?;
        let (own, meta) = split_own_group(typed);

        let mut model = self.models[idx].clone();
        let old_name = std::mem::replace(&mut model.name, name.to_string());
        model.own_fields = own;
        model.meta_groups = meta;
        model.parent_ids = parent_ids;
        model.updated_at = chrono::Utc::now();

        self.persist_model(&model).await?;
        if old_name != model.name {
            self.name_index.remove(&old_name);
            self.name_index.insert(model.name.clone(), idx);
        }
        self.models[idx] = model.clone();

        debug!(id = %model.id, name = %model.name, "updated model");
        Ok(model)
    }

    /// Delete a model, subject to the lifecycle guard.
    pub async fn delete_model(&mut self, id: &str) -> Result<()> {
        guard_delete(&*self, id)?;

        let path = self.model_path(id);
        let _ = fs::remove_file(&path).await;

        // Guard succeeded, so the id is indexed.
        if let Some(idx) = self.id_index.remove(id) {
            let removed = self.models.swap_remove(idx);
            self.name_index.remove(&removed.name);
            if idx < self.models.len() {
                let moved = &self.models[idx];
                self.id_index.insert(moved.id.clone(), idx);
                self.name_index.insert(moved.name.clone(), idx);
            }
            debug!(id = %removed.id, "deleted model");
        }
        Ok(())
    }

    // --- Cards ---

    /// Get a card by id.
    pub fn card(&self, id: &str) -> Option<&Card> {
        self.card_index.get(id).map(|&i| &self.cards[i])
    }

    /// All cards.
    pub fn all_cards(&self) -> &[Card] {
        &self.cards
    }

    /// Cards instantiated from the given model.
    pub fn cards_for_model(&self, model_id: &str) -> Vec<&Card> {
        self.cards
            .iter()
            .filter(|c| c.model_id == model_id)
            .collect()
    }

    /// Create a card: resolve the model's schema, validate the payload
    /// against it, then persist.
    pub async fn create_card(&mut self, model_id: &str, payload: Value) -> Result<Card> {
        let schema = resolve(&*self, model_id)?;
        validate_payload(&schema, &payload)?;

        let card = Card::new(model_id, payload);
        let yaml = serde_yaml_ng::to_string(&card)?;
        atomic_write(&self.card_path(&card.id), yaml.as_bytes()).await?;

        let idx = self.cards.len();
        self.card_index.insert(card.id.clone(), idx);
        self.cards.push(card.clone());

        debug!(id = %card.id, model = %model_id, "created card");
        Ok(card)
    }

    /// Delete a card by id.
    pub async fn delete_card(&mut self, id: &str) -> Result<()> {
        let idx = self
            .card_index
            .remove(id)
            .ok_or_else(|| StoreError::CardNotFound { id: id.into() })?;

        let path = self.card_path(id);
        let _ = fs::remove_file(&path).await;

        self.cards.swap_remove(idx);
        if idx < self.cards.len() {
            let moved_id = self.cards[idx].id.clone();
            self.card_index.insert(moved_id, idx);
        }
        Ok(())
    }

    /// The root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // --- Internal ---

    fn model_path(&self, id: &str) -> PathBuf {
        self.root.join("models").join(format!("{id}.yaml"))
    }

    fn card_path(&self, id: &str) -> PathBuf {
        self.root.join("cards").join(format!("{id}.yaml"))
    }

    async fn persist_model(&self, model: &Model) -> Result<()> {
        let yaml = serde_yaml_ng::to_string(model)?;
        atomic_write(&self.model_path(&model.id), yaml.as_bytes()).await
    }

    async fn load_models(&mut self) -> Result<()> {
        let models_dir = self.root.join("models");
        let mut entries = fs::read_dir(&models_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            match serde_yaml_ng::from_str::<Model>(&content) {
                Ok(model) => {
                    let idx = self.models.len();
                    self.id_index.insert(model.id.clone(), idx);
                    self.name_index.insert(model.name.clone(), idx);
                    self.models.push(model);
                }
                Err(e) => {
                    warn!(?path, %e, "skipping invalid model document");
                }
            }
        }
        Ok(())
    }

    async fn load_cards(&mut self) -> Result<()> {
        let cards_dir = self.root.join("cards");
        let mut entries = fs::read_dir(&cards_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            match serde_yaml_ng::from_str::<Card>(&content) {
                Ok(card) => {
                    let idx = self.cards.len();
                    self.card_index.insert(card.id.clone(), idx);
                    self.cards.push(card);
                }
                Err(e) => {
                    warn!(?path, %e, "skipping invalid card document");
                }
            }
        }
        Ok(())
    }
}

impl SchemaStore for ModelStore {
    fn model_by_id(&self, id: &str) -> Option<&Model> {
        self.model(id)
    }

    fn has_child_models(&self, id: &str) -> bool {
        self.models
            .iter()
            .any(|m| m.id != id && m.parent_ids.iter().any(|p| p == id))
    }

    fn any_card_uses_model(&self, id: &str) -> bool {
        self.cards.iter().any(|c| c.model_id == id)
    }
}

/// Pull the `_self` group out of a validated group list; everything else is
/// stored as snapshot meta groups.
fn split_own_group(groups: Vec<FieldGroup>) -> (FieldGroup, Vec<FieldGroup>) {
    let mut own = None;
    let mut meta = Vec::new();
    for group in groups {
        if own.is_none() && group.source_id == SELF_SOURCE {
            own = Some(group);
        } else {
            meta.push(group);
        }
    }
    (own.unwrap_or_else(FieldGroup::own), meta)
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
