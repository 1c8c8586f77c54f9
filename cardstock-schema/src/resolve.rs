//! Inheritance resolution: merging a model's stored groups with its parents'
//! into one effective schema.
//!
//! Resolution is a pure function of the current model graph. Nothing is
//! memoized or version-stamped; every call re-reads the store so a resolution
//! after a concurrent edit sees the fresh graph.

use tracing::{debug, trace};

use crate::error::{Result, SchemaError};
use crate::store::SchemaStore;
use crate::types::{FieldGroup, ResolvedSchema};

/// Resolve a model's effective field set.
///
/// The model's own groups are seeded first, then each parent's stored groups
/// are walked in `parentIds` declaration order, one level deep: a parent's
/// own parents are never expanded, so a grandparent contributes only through
/// snapshot groups the parent itself carries. Groups with an unseen
/// `sourceId` are appended verbatim; a group whose `sourceId` is already
/// present (diamond inheritance) is merged field-by-field, keeping the field
/// already in place. Net effect: self overrides parents, and
/// earlier-declared parents override later ones.
pub fn resolve(store: &dyn SchemaStore, model_id: &str) -> Result<ResolvedSchema> {
    let model = store
        .model_by_id(model_id)
        .ok_or_else(|| SchemaError::not_found(model_id))?;

    let mut groups: Vec<FieldGroup> = model.groups().cloned().collect();

    for parent_id in &model.parent_ids {
        let Some(parent) = store.model_by_id(parent_id) else {
            // Dangling parent reference; resolution tolerates it the same way
            // a reader tolerates a deleted ancestor.
            debug!(model = %model_id, parent = %parent_id, "skipping missing parent model");
            continue;
        };
        for group in parent.groups() {
            merge_group(&mut groups, group);
        }
    }

    trace!(
        model = %model_id,
        groups = groups.len(),
        "resolved schema"
    );

    Ok(ResolvedSchema {
        model_id: model.id.clone(),
        groups,
    })
}

/// Append `incoming` or, when a group with the same `sourceId` already
/// exists, merge it in with first-writer-wins per field name.
fn merge_group(groups: &mut Vec<FieldGroup>, incoming: &FieldGroup) {
    match groups.iter_mut().find(|g| g.source_id == incoming.source_id) {
        Some(existing) => {
            for field in &incoming.fields {
                if existing.get(&field.name).is_none() {
                    existing.fields.push(field.clone());
                }
            }
        }
        None => groups.push(incoming.clone()),
    }
}
