//! Domain model for town records.
//!
//! # Responsibility
//! - Define the canonical town record used by the registry and stores.
//! - Own the input validation rules shared by every write path.
//!
//! # Invariants
//! - Every stored town carries a store-assigned `TownId`.
//! - Town names are unique by their lowercase name key.

pub mod town;
