//! Lifecycle invariants that gate model mutation.
//!
//! Deletion is refused while anything still depends on the model; the checks
//! run in a fixed order and the first failure wins. Updates only need the
//! structural re-check; existing cards stay valid by the convention that
//! fields are only ever added, never removed.

use crate::error::{ForbiddenReason, Result, SchemaError};
use crate::raw::RawFieldGroup;
use crate::store::SchemaStore;
use crate::types::FieldGroup;
use crate::validate::validate_groups;

/// Check whether a model may be deleted.
///
/// Rules, in order, first failure wins:
/// 1. system models are never deleted (`system_model`);
/// 2. models listed in another model's `parentIds` are kept (`has_children`);
/// 3. models with instantiated cards are kept (`used_by_cards`).
pub fn guard_delete(store: &dyn SchemaStore, model_id: &str) -> Result<()> {
    let model = store
        .model_by_id(model_id)
        .ok_or_else(|| SchemaError::not_found(model_id))?;

    if model.system {
        return Err(SchemaError::forbidden(ForbiddenReason::SystemModel));
    }
    if store.has_child_models(model_id) {
        return Err(SchemaError::forbidden(ForbiddenReason::HasChildren));
    }
    if store.any_card_uses_model(model_id) {
        return Err(SchemaError::forbidden(ForbiddenReason::UsedByCards));
    }
    Ok(())
}

/// Check whether a model may be updated with the given field groups.
///
/// Only the structural rules apply; children and card usage never block an
/// update. Returns the typed groups for the caller to persist.
pub fn guard_update(new_groups: &[RawFieldGroup]) -> Result<Vec<FieldGroup>> {
    validate_groups(new_groups)
}
