//! Entity data model.
//!
//! # Responsibility
//! - Define the generic record (`Entity`), its values and its schema.
//! - Keep model types free of storage concerns.
//!
//! # Invariants
//! - Every stored entity is identified by a stable `EntityId`.
//! - Field values always carry their own `FieldType`.

pub mod entity;
pub mod schema;
pub mod value;
