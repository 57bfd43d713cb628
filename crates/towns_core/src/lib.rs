//! Core domain logic for the town registry.
//! This crate is the single source of truth for town invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::town::{Town, TownId, TownValidationError};
pub use repo::memory_repo::InMemoryTownRepository;
pub use repo::town_repo::{RepoError, RepoResult, SqliteTownRepository, TownRepository};
pub use service::town_registry::{RegistryResult, TownRegistry, TownRegistryError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
