//! File-backed model and card store
//!
//! `cardstock-store` persists card models and cards as YAML documents and
//! plays the caller role the schema engine expects: definitions are
//! validated before they are written, the deletion guard runs before a model
//! is removed, and card payloads are validated against the freshly resolved
//! schema of their model.
//!
//! # Architecture
//!
//! - **One document per entity**: `models/<id>.yaml`, `cards/<id>.yaml`
//! - **Atomic writes**: temp file + rename, never a half-written document
//! - **In-memory indexes**: loaded on open, lookups are synchronous
//! - **Default seeding**: `with_defaults()` writes system models that don't
//!   exist yet and preserves user edits (matched by id)

pub mod card;
pub mod context;
pub mod error;

pub use card::Card;
pub use context::{ModelStore, ModelStoreBuilder};
pub use error::{Result, StoreError};
