//! Repository layer abstractions and the in-memory implementation.
//!
//! # Responsibility
//! - Define the entity data access contract.
//! - Keep storage details out of query and service code.
//!
//! # Invariants
//! - Repository writes must pass schema validation before mutating state.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateIdentifier`).

pub mod entity_repo;
pub mod memory_repo;
