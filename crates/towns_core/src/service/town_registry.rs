//! Town registry use-case service.
//!
//! # Responsibility
//! - Validate caller input before any store access.
//! - Map store-level `NotFound`/`DuplicateName` outcomes onto the registry's
//!   silent no-op contract.
//!
//! # Invariants
//! - Name is validated before population.
//! - A failed call leaves the store unchanged.
//! - Adding a name that already exists (case-insensitive) keeps the existing
//!   record untouched and returns it.
//! - Update and delete of unknown ids succeed without effect.

use crate::model::town::{
    validate_population, validate_town_name, Town, TownId, TownValidationError,
};
use crate::repo::town_repo::{RepoError, TownRepository};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RegistryResult<T> = Result<T, TownRegistryError>;

/// Error returned by registry operations.
#[derive(Debug)]
pub enum TownRegistryError {
    /// Caller input failed validation. Displays the fixed validation message.
    InvalidArgument(TownValidationError),
    /// Backing store failure.
    Store(RepoError),
}

impl TownRegistryError {
    /// Returns the validation error when this is a caller input failure.
    pub fn as_invalid_argument(&self) -> Option<TownValidationError> {
        match self {
            Self::InvalidArgument(err) => Some(*err),
            Self::Store(_) => None,
        }
    }
}

impl Display for TownRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "town store failure: {err}"),
        }
    }
}

impl Error for TownRegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidArgument(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<TownValidationError> for TownRegistryError {
    fn from(value: TownValidationError) -> Self {
        Self::InvalidArgument(value)
    }
}

impl From<RepoError> for TownRegistryError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidArgument(err),
            other => Self::Store(other),
        }
    }
}

/// Validating facade over a town record store.
pub struct TownRegistry<R: TownRepository> {
    repo: R,
}

impl<R: TownRepository> TownRegistry<R> {
    /// Creates a registry on top of the provided store.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the backing store.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Adds a town, or returns the existing one when the name is taken.
    ///
    /// # Errors
    /// - `InvalidArgument(InvalidName)` when `name` is absent, empty or
    ///   shorter than three characters. Checked first.
    /// - `InvalidArgument(NonPositivePopulation)` when `population <= 0`.
    pub fn add_town<'a>(
        &self,
        name: impl Into<Option<&'a str>>,
        population: i64,
    ) -> RegistryResult<Town> {
        let name = validate_town_name(name.into())?;
        let population = validate_population(population)?;

        if let Some(existing) = self.repo.find_town_by_name(name)? {
            debug!(
                "event=town_add module=registry status=skipped reason=duplicate_name town_id={}",
                existing.id
            );
            return Ok(existing);
        }

        match self.repo.create_town(name, population) {
            Ok(town) => {
                info!(
                    "event=town_add module=registry status=ok town_id={} population={}",
                    town.id, town.population
                );
                Ok(town)
            }
            // Lost a race with another writer on a shared store.
            Err(RepoError::DuplicateName(_)) => self
                .repo
                .find_town_by_name(name)?
                .ok_or_else(|| {
                    TownRegistryError::Store(RepoError::InvalidData(format!(
                        "duplicate town `{name}` vanished during add"
                    )))
                }),
            Err(err) => {
                warn!("event=town_add module=registry status=error error={err}");
                Err(err.into())
            }
        }
    }

    /// Looks up a town by case-insensitive name.
    pub fn get_town_by_name(&self, name: &str) -> RegistryResult<Option<Town>> {
        Ok(self.repo.find_town_by_name(name)?)
    }

    /// Looks up a town by id.
    pub fn get_town(&self, id: TownId) -> RegistryResult<Option<Town>> {
        Ok(self.repo.get_town(id)?)
    }

    /// Replaces the population of an existing town.
    ///
    /// Unknown ids are a no-op whatever `population` is. For an existing
    /// town, `population <= 0` fails with `InvalidArgument` and the record
    /// is left unchanged.
    pub fn update_town(&self, id: TownId, population: i64) -> RegistryResult<()> {
        if self.repo.get_town(id)?.is_none() {
            debug!("event=town_update module=registry status=skipped reason=not_found town_id={id}");
            return Ok(());
        }

        let population = validate_population(population)?;
        match self.repo.update_population(id, population) {
            Ok(()) => {
                info!(
                    "event=town_update module=registry status=ok town_id={id} population={population}"
                );
                Ok(())
            }
            Err(RepoError::NotFound(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes a town by id. Unknown ids are a no-op.
    pub fn delete_town(&self, id: TownId) -> RegistryResult<()> {
        match self.repo.delete_town(id) {
            Ok(()) => {
                info!("event=town_delete module=registry status=ok town_id={id}");
                Ok(())
            }
            Err(RepoError::NotFound(_)) => {
                debug!(
                    "event=town_delete module=registry status=skipped reason=not_found town_id={id}"
                );
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Lists all towns in insertion order.
    pub fn list_towns(&self) -> RegistryResult<Vec<Town>> {
        Ok(self.repo.list_towns()?)
    }

    /// Removes every town and restarts id assignment.
    pub fn reset_database(&self) -> RegistryResult<()> {
        self.repo.clear_towns()?;
        info!("event=registry_reset module=registry status=ok");
        Ok(())
    }
}
