//! Operator repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `operators` table.
//! - Own the guarded load increment used by the distribution orchestrator.
//!
//! # Invariants
//! - Write paths call `Operator::validate()` before SQL mutations.
//! - `increment_load` refuses to push `current_load` past `max_load`.
//! - List order is deterministic: `created_at ASC, uuid ASC`.

use crate::model::operator::{Operator, OperatorId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, int_to_u32, normalize_page_limit,
    parse_uuid, PageQuery, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const OPERATOR_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    is_active,
    max_load,
    current_load
FROM operators";

/// Repository interface for operator CRUD and load accounting.
pub trait OperatorRepository {
    /// Creates one operator and returns its stable id.
    fn create_operator(&self, operator: &Operator) -> RepoResult<OperatorId>;
    /// Full replace of mutable fields (`name`, `is_active`, `max_load`).
    fn update_operator(&self, operator: &Operator) -> RepoResult<()>;
    /// Loads one operator by id.
    fn get_operator(&self, id: OperatorId) -> RepoResult<Option<Operator>>;
    /// Lists operators with offset/limit pagination.
    fn list_operators(&self, page: &PageQuery) -> RepoResult<Vec<Operator>>;
    /// Increments `current_load` by exactly 1, guarded by `max_load`.
    ///
    /// Returns the number of affected rows (0 means the operator was absent
    /// or already at capacity).
    fn increment_load(&self, id: OperatorId) -> RepoResult<usize>;
}

/// SQLite-backed operator repository.
pub struct SqliteOperatorRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOperatorRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl OperatorRepository for SqliteOperatorRepository<'_> {
    fn create_operator(&self, operator: &Operator) -> RepoResult<OperatorId> {
        operator.validate()?;

        self.conn.execute(
            "INSERT INTO operators (uuid, name, is_active, max_load, current_load)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                operator.uuid.to_string(),
                operator.name.as_str(),
                bool_to_int(operator.is_active),
                operator.max_load,
                operator.current_load,
            ],
        )?;

        Ok(operator.uuid)
    }

    fn update_operator(&self, operator: &Operator) -> RepoResult<()> {
        operator.validate()?;

        // current_load is intentionally not part of the update set; only the
        // orchestrator's increment path may touch it.
        let changed = self.conn.execute(
            "UPDATE operators
             SET
                name = ?1,
                is_active = ?2,
                max_load = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?4;",
            params![
                operator.name.as_str(),
                bool_to_int(operator.is_active),
                operator.max_load,
                operator.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "operator",
                id: operator.uuid,
            });
        }

        Ok(())
    }

    fn get_operator(&self, id: OperatorId) -> RepoResult<Option<Operator>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{OPERATOR_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_operator_row(row)?));
        }

        Ok(None)
    }

    fn list_operators(&self, page: &PageQuery) -> RepoResult<Vec<Operator>> {
        let limit = normalize_page_limit(page.limit);
        let mut stmt = self.conn.prepare(&format!(
            "{OPERATOR_SELECT_SQL}
             ORDER BY created_at ASC, uuid ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;

        let mut rows = stmt.query(params![limit, page.offset])?;
        let mut operators = Vec::new();
        while let Some(row) = rows.next()? {
            operators.push(parse_operator_row(row)?);
        }

        Ok(operators)
    }

    fn increment_load(&self, id: OperatorId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE operators
             SET
                current_load = current_load + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND current_load < max_load;",
            [id.to_string()],
        )?;

        Ok(changed)
    }
}

fn parse_operator_row(row: &Row<'_>) -> RepoResult<Operator> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "operators.uuid")?;
    let is_active = int_to_bool(row.get("is_active")?, "operators.is_active")?;
    let max_load = int_to_u32(row.get("max_load")?, "operators.max_load")?;
    let current_load = int_to_u32(row.get("current_load")?, "operators.current_load")?;

    Ok(Operator {
        uuid,
        name: row.get("name")?,
        is_active,
        max_load,
        current_load,
    })
}
