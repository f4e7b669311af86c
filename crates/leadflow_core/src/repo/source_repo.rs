//! Source repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `sources` table.
//! - Own per-source weight configuration with atomic replace semantics.
//!
//! # Invariants
//! - `replace_source_weights` swaps the whole weight set for one source in a
//!   single transaction; there is no partial update and no history.
//! - Weight rows are rejected before persistence when the weight is zero or
//!   the entry targets a different source.
//! - Weight retrieval order is rowid order of the last configuration write.

use crate::model::source::{Source, SourceId, SourceWeight};
use crate::model::ValidationError;
use crate::repo::{
    ensure_connection_ready, int_to_u32, normalize_page_limit, parse_uuid, PageQuery, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const SOURCE_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    description
FROM sources";

/// Repository interface for sources and their distribution weights.
pub trait SourceRepository {
    /// Creates one source and returns its stable id.
    fn create_source(&self, source: &Source) -> RepoResult<SourceId>;
    /// Loads one source by id.
    fn get_source(&self, id: SourceId) -> RepoResult<Option<Source>>;
    /// Lists sources with offset/limit pagination.
    fn list_sources(&self, page: &PageQuery) -> RepoResult<Vec<Source>>;
    /// Atomically replaces all weight rows for one source.
    fn replace_source_weights(
        &self,
        source_id: SourceId,
        entries: &[SourceWeight],
    ) -> RepoResult<()>;
    /// Lists weight rows for one source in retrieval order.
    fn list_source_weights(&self, source_id: SourceId) -> RepoResult<Vec<SourceWeight>>;
}

/// SQLite-backed source repository.
pub struct SqliteSourceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSourceRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SourceRepository for SqliteSourceRepository<'_> {
    fn create_source(&self, source: &Source) -> RepoResult<SourceId> {
        source.validate()?;

        self.conn.execute(
            "INSERT INTO sources (uuid, name, description)
             VALUES (?1, ?2, ?3);",
            params![
                source.uuid.to_string(),
                source.name.as_str(),
                source.description.as_deref(),
            ],
        )?;

        Ok(source.uuid)
    }

    fn get_source(&self, id: SourceId) -> RepoResult<Option<Source>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SOURCE_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_source_row(row)?));
        }

        Ok(None)
    }

    fn list_sources(&self, page: &PageQuery) -> RepoResult<Vec<Source>> {
        let limit = normalize_page_limit(page.limit);
        let mut stmt = self.conn.prepare(&format!(
            "{SOURCE_SELECT_SQL}
             ORDER BY created_at ASC, uuid ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;

        let mut rows = stmt.query(params![limit, page.offset])?;
        let mut sources = Vec::new();
        while let Some(row) = rows.next()? {
            sources.push(parse_source_row(row)?);
        }

        Ok(sources)
    }

    fn replace_source_weights(
        &self,
        source_id: SourceId,
        entries: &[SourceWeight],
    ) -> RepoResult<()> {
        for entry in entries {
            if entry.source_uuid != source_id {
                return Err(RepoError::InvalidData(format!(
                    "weight entry for operator {} targets source {}, expected {}",
                    entry.operator_uuid, entry.source_uuid, source_id
                )));
            }
            if entry.weight == 0 {
                return Err(RepoError::Validation(ValidationError::NonPositiveWeight {
                    operator: entry.operator_uuid,
                    weight: i64::from(entry.weight),
                }));
            }
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM operator_source_weights WHERE source_uuid = ?1;",
            [source_id.to_string()],
        )?;
        for entry in entries {
            tx.execute(
                "INSERT INTO operator_source_weights (operator_uuid, source_uuid, weight)
                 VALUES (?1, ?2, ?3);",
                params![
                    entry.operator_uuid.to_string(),
                    entry.source_uuid.to_string(),
                    entry.weight,
                ],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    fn list_source_weights(&self, source_id: SourceId) -> RepoResult<Vec<SourceWeight>> {
        let mut stmt = self.conn.prepare(
            "SELECT operator_uuid, source_uuid, weight
             FROM operator_source_weights
             WHERE source_uuid = ?1
             ORDER BY id ASC;",
        )?;

        let mut rows = stmt.query([source_id.to_string()])?;
        let mut weights = Vec::new();
        while let Some(row) = rows.next()? {
            weights.push(parse_weight_row(row)?);
        }

        Ok(weights)
    }
}

fn parse_source_row(row: &Row<'_>) -> RepoResult<Source> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Source {
        uuid: parse_uuid(&uuid_text, "sources.uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

fn parse_weight_row(row: &Row<'_>) -> RepoResult<SourceWeight> {
    let operator_text: String = row.get("operator_uuid")?;
    let source_text: String = row.get("source_uuid")?;
    Ok(SourceWeight {
        operator_uuid: parse_uuid(&operator_text, "operator_source_weights.operator_uuid")?,
        source_uuid: parse_uuid(&source_text, "operator_source_weights.source_uuid")?,
        weight: int_to_u32(row.get("weight")?, "operator_source_weights.weight")?,
    })
}
