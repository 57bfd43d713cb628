//! Town repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over canonical `towns` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate input before SQL mutations.
//! - Name uniqueness is enforced by the `name_key` unique index.
//! - `AUTOINCREMENT` ids are never reused until `clear_towns` resets them.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::town::{
    town_name_key, validate_population, validate_town_name, Town, TownId, TownValidationError,
};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const TOWNS_TABLE: &str = "towns";
const REQUIRED_TOWN_COLUMNS: &[&str] = &["id", "name", "name_key", "population"];

const TOWN_SELECT_SQL: &str = "SELECT
    id,
    name,
    population
FROM towns";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for town persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(TownValidationError),
    Db(DbError),
    NotFound(TownId),
    DuplicateName(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "town not found: {id}"),
            Self::DuplicateName(name) => write!(f, "town name already exists: `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted town data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is behind required {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
            Self::LockPoisoned => write!(f, "town store lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TownValidationError> for RepoError {
    fn from(value: TownValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Record store contract for town CRUD operations.
///
/// Implementations assign ids on create and match names case-insensitively.
pub trait TownRepository {
    fn create_town(&self, name: &str, population: i64) -> RepoResult<Town>;
    fn get_town(&self, id: TownId) -> RepoResult<Option<Town>>;
    fn find_town_by_name(&self, name: &str) -> RepoResult<Option<Town>>;
    fn update_population(&self, id: TownId, population: i64) -> RepoResult<()>;
    fn delete_town(&self, id: TownId) -> RepoResult<()>;
    /// Lists every town in insertion order.
    fn list_towns(&self) -> RepoResult<Vec<Town>>;
    /// Removes every town and restarts id assignment.
    fn clear_towns(&self) -> RepoResult<()>;
}

/// SQLite-backed town repository.
pub struct SqliteTownRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTownRepository<'conn> {
    /// Wraps a connection after verifying its schema is ready.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   does not match the expected `towns` shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version < expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        if actual_version > expected_version {
            return Err(RepoError::Db(DbError::UnsupportedSchemaVersion {
                db_version: actual_version,
                latest_supported: expected_version,
            }));
        }

        ensure_towns_schema(conn)?;
        Ok(Self { conn })
    }
}

impl TownRepository for SqliteTownRepository<'_> {
    fn create_town(&self, name: &str, population: i64) -> RepoResult<Town> {
        let name = validate_town_name(Some(name))?;
        let population = validate_population(population)?;

        let inserted = self.conn.execute(
            "INSERT INTO towns (name, name_key, population) VALUES (?1, ?2, ?3);",
            params![name, town_name_key(name), population],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::DuplicateName(name.to_string()));
            }
            Err(err) => return Err(err.into()),
        }

        Ok(Town {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            population,
        })
    }

    fn get_town(&self, id: TownId) -> RepoResult<Option<Town>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TOWN_SELECT_SQL} WHERE id = ?1;"))?;
        let raw = stmt.query_row([id], read_raw_town).optional()?;
        raw.map(RawTown::into_town).transpose()
    }

    fn find_town_by_name(&self, name: &str) -> RepoResult<Option<Town>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TOWN_SELECT_SQL} WHERE name_key = ?1;"))?;
        let raw = stmt
            .query_row([town_name_key(name)], read_raw_town)
            .optional()?;
        raw.map(RawTown::into_town).transpose()
    }

    fn update_population(&self, id: TownId, population: i64) -> RepoResult<()> {
        let population = validate_population(population)?;

        let changed = self.conn.execute(
            "UPDATE towns
             SET
                population = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![population, id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_town(&self, id: TownId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM towns WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn list_towns(&self) -> RepoResult<Vec<Town>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TOWN_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut towns = Vec::new();

        while let Some(row) = rows.next()? {
            towns.push(read_raw_town(row)?.into_town()?);
        }

        Ok(towns)
    }

    fn clear_towns(&self) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM towns;", [])?;
        tx.execute("DELETE FROM sqlite_sequence WHERE name = ?1;", [TOWNS_TABLE])?;
        tx.commit()?;
        Ok(())
    }
}

struct RawTown {
    id: TownId,
    name: String,
    population: i64,
}

impl RawTown {
    fn into_town(self) -> RepoResult<Town> {
        let id = self.id;
        Town::new(id, self.name, self.population)
            .map_err(|err| RepoError::InvalidData(format!("towns.id={id}: {err}")))
    }
}

fn read_raw_town(row: &Row<'_>) -> rusqlite::Result<RawTown> {
    Ok(RawTown {
        id: row.get("id")?,
        name: row.get("name")?,
        population: row.get("population")?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn ensure_towns_schema(conn: &Connection) -> RepoResult<()> {
    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [TOWNS_TABLE],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(TOWNS_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([TOWNS_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for &column in REQUIRED_TOWN_COLUMNS {
        if !columns.iter().any(|existing| existing == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: TOWNS_TABLE,
                column,
            });
        }
    }

    Ok(())
}
