//! Town domain model and validation rules.
//!
//! # Responsibility
//! - Define the `Town` record returned by registry and store APIs.
//! - Validate names and populations before any write reaches a store.
//!
//! # Invariants
//! - `name` has at least `MIN_TOWN_NAME_CHARS` characters.
//! - `population` is strictly positive.
//! - `id` is assigned by the store and never changes.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minimum number of characters accepted for a town name.
pub const MIN_TOWN_NAME_CHARS: usize = 3;

/// Store-assigned town identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TownId = i64;

/// Validation failures for town input.
///
/// `Display` output is part of the public contract and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TownValidationError {
    /// Name is absent, empty, or too short.
    InvalidName,
    /// Population is zero or negative.
    NonPositivePopulation,
}

impl Display for TownValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "Invalid town name."),
            Self::NonPositivePopulation => write!(f, "Population must be a positive number."),
        }
    }
}

impl Error for TownValidationError {}

/// Canonical town record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TownWire")]
pub struct Town {
    /// Store-assigned identifier.
    pub id: TownId,
    /// Display name as supplied at creation.
    pub name: String,
    /// Always > 0 for stored towns.
    pub population: i64,
}

impl Town {
    /// Builds a validated town record.
    ///
    /// Used by store implementations after an id has been assigned.
    pub fn new(
        id: TownId,
        name: impl Into<String>,
        population: i64,
    ) -> Result<Self, TownValidationError> {
        let town = Self {
            id,
            name: name.into(),
            population,
        };
        town.validate()?;
        Ok(town)
    }

    /// Checks name and population rules, name first.
    pub fn validate(&self) -> Result<(), TownValidationError> {
        validate_town_name(Some(self.name.as_str()))?;
        validate_population(self.population)?;
        Ok(())
    }

    /// Returns the case-insensitive uniqueness key of this town.
    pub fn name_key(&self) -> String {
        town_name_key(&self.name)
    }
}

#[derive(Deserialize)]
struct TownWire {
    id: TownId,
    name: String,
    population: i64,
}

impl TryFrom<TownWire> for Town {
    type Error = TownValidationError;

    fn try_from(value: TownWire) -> Result<Self, Self::Error> {
        Self::new(value.id, value.name, value.population)
    }
}

/// Validates a town name and returns it unchanged on success.
///
/// `None` models a missing name from callers that accept optional input.
pub fn validate_town_name(name: Option<&str>) -> Result<&str, TownValidationError> {
    match name {
        Some(value) if value.chars().count() >= MIN_TOWN_NAME_CHARS => Ok(value),
        _ => Err(TownValidationError::InvalidName),
    }
}

/// Validates that a population is strictly positive.
pub fn validate_population(population: i64) -> Result<i64, TownValidationError> {
    if population > 0 {
        Ok(population)
    } else {
        Err(TownValidationError::NonPositivePopulation)
    }
}

/// Normalizes a town name into its uniqueness key.
///
/// The key is the full Unicode lowercase form; no trimming is applied.
pub fn town_name_key(name: &str) -> String {
    name.to_lowercase()
}

