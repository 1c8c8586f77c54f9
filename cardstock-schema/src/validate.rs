//! Definition-time validation of schema field groups.
//!
//! Checks a raw group list for structural problems and accumulates every
//! violation before failing, so a caller can surface all problems in one
//! response. On success the raw groups come back as typed groups; the rest
//! of the engine never re-checks what was validated here.

use std::collections::BTreeSet;

use crate::error::{Result, SchemaError, ValidationErrors};
use crate::raw::RawFieldGroup;
use crate::types::{FieldDefinition, FieldGroup, FieldKindError};

/// Validate raw field groups, returning the typed equivalents.
///
/// Rules, applied to every group and every field (never fail-fast):
/// - every group carries a non-empty `sourceId`;
/// - every field has a non-empty `name`, unique within its group;
/// - every field `type` is drawn from the field type registry;
/// - `select`/`multiselect` fields carry a non-empty `config.options` array.
///
/// Error keys are `groups[i].sourceId` and `groups[i].fields[j].<part>`.
pub fn validate_groups(groups: &[RawFieldGroup]) -> Result<Vec<FieldGroup>> {
    let mut errors = ValidationErrors::new();
    let mut typed = Vec::with_capacity(groups.len());

    for (i, group) in groups.iter().enumerate() {
        if group.source_id.trim().is_empty() {
            errors.insert(format!("groups[{i}].sourceId"), "Missing group source id");
        }

        let mut seen = BTreeSet::new();
        let mut fields = Vec::with_capacity(group.fields.len());

        for (j, raw) in group.fields.iter().enumerate() {
            if raw.name.trim().is_empty() {
                errors.insert(
                    format!("groups[{i}].fields[{j}].name"),
                    "Missing field name",
                );
            } else if !seen.insert(raw.name.as_str()) {
                errors.insert(
                    format!("groups[{i}].fields[{j}].name"),
                    format!("Duplicate field name: {}", raw.name),
                );
            }

            match FieldDefinition::try_from(raw.clone()) {
                Ok(field) => fields.push(field),
                Err(err @ FieldKindError::UnknownType { .. }) => {
                    errors.insert(format!("groups[{i}].fields[{j}].type"), err.to_string());
                }
                Err(err @ FieldKindError::MissingOptions { .. }) => {
                    errors.insert(
                        format!("groups[{i}].fields[{j}].config.options"),
                        err.to_string(),
                    );
                }
            }
        }

        typed.push(FieldGroup {
            source_id: group.source_id.clone(),
            fields,
        });
    }

    if errors.is_empty() {
        Ok(typed)
    } else {
        Err(SchemaError::Validation(errors))
    }
}
