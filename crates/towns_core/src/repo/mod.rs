//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record store contract the registry delegates storage to.
//! - Isolate SQLite query details from registry orchestration.
//!
//! # Invariants
//! - Repository writes validate town input before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateName`)
//!   in addition to storage transport errors.

pub mod memory_repo;
pub mod town_repo;
