//! In-memory town repository.
//!
//! # Responsibility
//! - Provide a storage-free `TownRepository` for sessions and tests that do
//!   not need durability.
//!
//! # Invariants
//! - Towns are kept in insertion order.
//! - `name_index` maps every live name key to exactly one town id.
//! - Ids grow monotonically and are only rewound by `clear_towns`.
//! - All state sits behind one `RwLock`: one writer at a time, readers only
//!   run with no writer in flight.

use crate::model::town::{town_name_key, validate_population, validate_town_name, Town, TownId};
use crate::repo::town_repo::{RepoError, RepoResult, TownRepository};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct MemoryState {
    towns: Vec<Town>,
    name_index: HashMap<String, TownId>,
    last_id: TownId,
}

impl MemoryState {
    fn position(&self, id: TownId) -> Option<usize> {
        self.towns.iter().position(|town| town.id == id)
    }
}

/// `RwLock`-guarded in-memory town repository.
#[derive(Debug, Default)]
pub struct InMemoryTownRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryTownRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|_| RepoError::LockPoisoned)
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|_| RepoError::LockPoisoned)
    }
}

impl TownRepository for InMemoryTownRepository {
    fn create_town(&self, name: &str, population: i64) -> RepoResult<Town> {
        let name = validate_town_name(Some(name))?;
        let population = validate_population(population)?;
        let key = town_name_key(name);

        let mut state = self.write()?;
        if state.name_index.contains_key(&key) {
            return Err(RepoError::DuplicateName(name.to_string()));
        }

        state.last_id += 1;
        let town = Town {
            id: state.last_id,
            name: name.to_string(),
            population,
        };
        state.name_index.insert(key, town.id);
        state.towns.push(town.clone());
        Ok(town)
    }

    fn get_town(&self, id: TownId) -> RepoResult<Option<Town>> {
        let state = self.read()?;
        Ok(state.towns.iter().find(|town| town.id == id).cloned())
    }

    fn find_town_by_name(&self, name: &str) -> RepoResult<Option<Town>> {
        let state = self.read()?;
        let found = state
            .name_index
            .get(&town_name_key(name))
            .and_then(|id| state.towns.iter().find(|town| town.id == *id))
            .cloned();
        Ok(found)
    }

    fn update_population(&self, id: TownId, population: i64) -> RepoResult<()> {
        let population = validate_population(population)?;

        let mut state = self.write()?;
        let town = state
            .towns
            .iter_mut()
            .find(|town| town.id == id)
            .ok_or(RepoError::NotFound(id))?;
        town.population = population;
        Ok(())
    }

    fn delete_town(&self, id: TownId) -> RepoResult<()> {
        let mut state = self.write()?;
        let index = state.position(id).ok_or(RepoError::NotFound(id))?;
        let removed = state.towns.remove(index);
        state.name_index.remove(&removed.name_key());
        Ok(())
    }

    fn list_towns(&self) -> RepoResult<Vec<Town>> {
        Ok(self.read()?.towns.clone())
    }

    fn clear_towns(&self) -> RepoResult<()> {
        *self.write()? = MemoryState::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryTownRepository;
    use crate::repo::town_repo::{RepoError, TownRepository};

    #[test]
    fn name_index_tracks_deletes() {
        let repo = InMemoryTownRepository::new();
        let town = repo.create_town("Burgas", 200).unwrap();

        repo.delete_town(town.id).unwrap();
        assert!(repo.find_town_by_name("burgas").unwrap().is_none());

        let recreated = repo.create_town("BURGAS", 300).unwrap();
        assert_eq!(recreated.id, town.id + 1);
    }

    #[test]
    fn duplicate_name_key_is_rejected() {
        let repo = InMemoryTownRepository::new();
        repo.create_town("Ruse", 10).unwrap();

        let err = repo.create_town("rUSE", 20).unwrap_err();
        assert!(matches!(err, RepoError::DuplicateName(name) if name == "rUSE"));
        assert_eq!(repo.list_towns().unwrap().len(), 1);
    }

    #[test]
    fn poisoned_lock_surfaces_as_repo_error() {
        let repo = InMemoryTownRepository::new();
        let _ = std::panic::catch_unwind(|| {
            let _guard = repo.state.write().unwrap();
            panic!("poison the lock");
        });

        let err = repo.list_towns().unwrap_err();
        assert!(matches!(err, RepoError::LockPoisoned));
    }
}
