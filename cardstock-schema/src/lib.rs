//! Schema inheritance and validation engine
//!
//! `cardstock-schema` is a standalone, schema-only crate: it resolves a card
//! model's effective field set from its (possibly multi-parent) inheritance
//! graph and validates schema definitions and card payloads against it. It
//! owns no persistence and no transport; callers supply a [`SchemaStore`]
//! and decide how errors are presented.
//!
//! # Architecture
//!
//! - **Pure and request-scoped**: resolution and validation are synchronous
//!   functions of caller-supplied data; resolved schemas are never cached
//! - **Closed type registry**: field types are one enum, so adding a type is
//!   a registry change the compiler checks exhaustively
//! - **Collect-all errors**: definition and payload validation report every
//!   violation at once, keyed by field path
//! - **Guarded mutation**: deletes are refused for system models and models
//!   still referenced by children or cards

pub mod defaults;
pub mod error;
pub mod guard;
pub mod payload;
pub mod raw;
pub mod resolve;
pub mod store;
pub mod types;
pub mod validate;

pub use defaults::{builtin_defaults, ModelDefaults, BASIC_MODEL_ID};
pub use error::{ForbiddenReason, Result, SchemaError, ValidationErrors};
pub use guard::{guard_delete, guard_update};
pub use payload::validate_payload;
pub use raw::{RawFieldDefinition, RawFieldGroup};
pub use resolve::resolve;
pub use store::{MemoryStore, SchemaStore};
pub use validate::validate_groups;
pub use types::{
    FieldDefinition, FieldGroup, FieldKind, FieldKindError, Model, ResolvedSchema, SelectConfig,
    TextConfig, LEGACY_BASIC_SOURCE, SELF_SOURCE,
};
