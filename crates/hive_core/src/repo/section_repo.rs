//! Section repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide predicate queries and unit-of-work writes over `hive_sections`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Query results are always ordered by `id ASC`.
//! - Writes open a unit of work lazily; nothing is durable until `commit`.
//! - A repository only commits or rolls back a transaction it began itself;
//!   writes inside a caller-owned transaction are refused.
//! - `update` never writes `hive_id` or `created_by`.
//! - Unique-code violations surface as `RepoError::DuplicateCode`.

use crate::db::DbError;
use crate::model::hive_section::{HiveId, HiveSectionRecord, NewHiveSection, SectionId};
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, Connection, ErrorCode, Row};
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SECTION_SELECT_SQL: &str = "SELECT
    id,
    hive_id,
    name,
    code,
    is_deleted,
    created_by,
    last_updated_by,
    last_updated
FROM hive_sections";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for section persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(SectionId),
    /// Storage-level unique constraint on `code` was violated.
    DuplicateCode(String),
    /// Connection already has a transaction this repository did not open.
    TransactionInProgress,
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "hive section not found: {id}"),
            Self::DuplicateCode(code) => write!(f, "hive section code already in use: `{code}`"),
            Self::TransactionInProgress => {
                write!(f, "connection has a transaction not owned by this repository")
            }
            Self::InvalidData(message) => {
                write!(f, "invalid persisted hive section data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
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

/// Predicate for section queries. Unset fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionFilter {
    pub id: Option<SectionId>,
    pub exclude_id: Option<SectionId>,
    pub hive_id: Option<HiveId>,
    pub code: Option<String>,
}

impl SectionFilter {
    /// Matches every section, deleted ones included.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: SectionId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_hive(hive_id: HiveId) -> Self {
        Self {
            hive_id: Some(hive_id),
            ..Self::default()
        }
    }

    pub fn by_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Narrows the predicate to rows other than `id`.
    pub fn excluding(mut self, id: SectionId) -> Self {
        self.exclude_id = Some(id);
        self
    }
}

/// Repository interface for hive section persistence.
///
/// Writes (`add`, `update`, `remove`) join one pending unit of work that
/// `commit` makes durable and `rollback` discards.
pub trait SectionRepository {
    fn query(&self, filter: &SectionFilter) -> RepoResult<Vec<HiveSectionRecord>>;
    /// Inserts a section and returns its storage-assigned id.
    fn add(&self, section: &NewHiveSection) -> RepoResult<SectionId>;
    fn update(&self, section: &HiveSectionRecord) -> RepoResult<()>;
    fn remove(&self, id: SectionId) -> RepoResult<()>;
    fn commit(&self) -> RepoResult<()>;
    fn rollback(&self) -> RepoResult<()>;
}

/// SQLite-backed section repository.
pub struct SqliteSectionRepository<'conn> {
    conn: &'conn Connection,
    /// Set while a `BEGIN IMMEDIATE` issued by this repository is open.
    owns_transaction: Cell<bool>,
}

impl<'conn> SqliteSectionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            owns_transaction: Cell::new(false),
        }
    }

    fn begin_if_needed(&self) -> RepoResult<()> {
        if self.owns_transaction.get() {
            return Ok(());
        }
        if !self.conn.is_autocommit() {
            warn!("event=unit_of_work module=repo status=error error_code=foreign_transaction");
            return Err(RepoError::TransactionInProgress);
        }
        // IMMEDIATE takes the write lock up front so a competing writer
        // waits on the busy timeout instead of failing mid-unit.
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        self.owns_transaction.set(true);
        debug!("event=unit_of_work module=repo status=start");
        Ok(())
    }

    fn finish(&self, statement: &str) -> RepoResult<bool> {
        if !self.owns_transaction.get() {
            return Ok(false);
        }
        if !self.conn.is_autocommit() {
            self.conn.execute_batch(statement)?;
        }
        self.owns_transaction.set(false);
        Ok(true)
    }
}

impl SectionRepository for SqliteSectionRepository<'_> {
    fn query(&self, filter: &SectionFilter) -> RepoResult<Vec<HiveSectionRecord>> {
        let mut sql = format!("{SECTION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(id) = filter.id {
            sql.push_str(" AND id = ?");
            bind_values.push(Value::Integer(id));
        }
        if let Some(exclude_id) = filter.exclude_id {
            sql.push_str(" AND id <> ?");
            bind_values.push(Value::Integer(exclude_id));
        }
        if let Some(hive_id) = filter.hive_id {
            sql.push_str(" AND hive_id = ?");
            bind_values.push(Value::Integer(hive_id));
        }
        if let Some(code) = &filter.code {
            sql.push_str(" AND code = ?");
            bind_values.push(Value::Text(code.clone()));
        }
        sql.push_str(" ORDER BY id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut sections = Vec::new();
        while let Some(row) = rows.next()? {
            sections.push(parse_section_row(row)?);
        }

        Ok(sections)
    }

    fn add(&self, section: &NewHiveSection) -> RepoResult<SectionId> {
        self.begin_if_needed()?;

        self.conn
            .execute(
                "INSERT INTO hive_sections (
                    hive_id,
                    name,
                    code,
                    is_deleted,
                    created_by,
                    last_updated_by,
                    last_updated
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    section.hive_id,
                    section.name.as_str(),
                    section.code.as_str(),
                    section.is_deleted,
                    section.created_by,
                    section.last_updated_by,
                    section.last_updated,
                ],
            )
            .map_err(|err| translate_write_error(err, section.code.as_str()))?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, section: &HiveSectionRecord) -> RepoResult<()> {
        self.begin_if_needed()?;

        let changed = self
            .conn
            .execute(
                "UPDATE hive_sections
                 SET
                    name = ?1,
                    code = ?2,
                    is_deleted = ?3,
                    last_updated_by = ?4,
                    last_updated = ?5
                 WHERE id = ?6;",
                params![
                    section.name.as_str(),
                    section.code.as_str(),
                    section.is_deleted,
                    section.last_updated_by,
                    section.last_updated,
                    section.id,
                ],
            )
            .map_err(|err| translate_write_error(err, section.code.as_str()))?;

        if changed == 0 {
            return Err(RepoError::NotFound(section.id));
        }
        Ok(())
    }

    fn remove(&self, id: SectionId) -> RepoResult<()> {
        self.begin_if_needed()?;

        let changed = self
            .conn
            .execute("DELETE FROM hive_sections WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn commit(&self) -> RepoResult<()> {
        if self.finish("COMMIT;")? {
            debug!("event=unit_of_work module=repo status=ok");
        }
        Ok(())
    }

    fn rollback(&self) -> RepoResult<()> {
        if self.finish("ROLLBACK;")? {
            warn!("event=unit_of_work module=repo status=rolled_back");
        }
        Ok(())
    }
}

fn translate_write_error(err: rusqlite::Error, code: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::DuplicateCode(code.to_string())
        }
        _ => err.into(),
    }
}

fn parse_section_row(row: &Row<'_>) -> RepoResult<HiveSectionRecord> {
    let is_deleted = match row.get::<_, i64>("is_deleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in hive_sections.is_deleted"
            )));
        }
    };

    Ok(HiveSectionRecord {
        id: row.get("id")?,
        hive_id: row.get("hive_id")?,
        name: row.get("name")?,
        code: row.get("code")?,
        is_deleted,
        created_by: row.get("created_by")?,
        last_updated_by: row.get("last_updated_by")?,
        last_updated: row.get("last_updated")?,
    })
}
