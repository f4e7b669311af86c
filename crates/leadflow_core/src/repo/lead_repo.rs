//! Lead repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the lookup keys the lead resolver walks (external_id, email,
//!   phone) and lazy lead creation.
//!
//! # Invariants
//! - `external_id` is unique at the schema level; email/phone lookups pick
//!   the oldest matching row deterministically.
//! - Creation performs no uniqueness check on email/phone beyond the
//!   resolver's own lookup pass.

use crate::model::lead::{Lead, LeadId};
use crate::repo::{
    ensure_connection_ready, normalize_page_limit, parse_uuid, PageQuery, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const LEAD_SELECT_SQL: &str = "SELECT
    uuid,
    external_id,
    email,
    phone,
    created_at
FROM leads";

/// Repository interface for lead lookup and creation.
pub trait LeadRepository {
    /// Inserts one lead and returns the persisted read model.
    fn create_lead(&self, lead: &Lead) -> RepoResult<Lead>;
    /// Loads one lead by id.
    fn get_lead(&self, id: LeadId) -> RepoResult<Option<Lead>>;
    /// Finds a lead by exact external id.
    fn find_by_external_id(&self, external_id: &str) -> RepoResult<Option<Lead>>;
    /// Finds the oldest lead with this exact email.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<Lead>>;
    /// Finds the oldest lead with this exact phone.
    fn find_by_phone(&self, phone: &str) -> RepoResult<Option<Lead>>;
    /// Lists leads with offset/limit pagination.
    fn list_leads(&self, page: &PageQuery) -> RepoResult<Vec<Lead>>;
}

/// SQLite-backed lead repository.
pub struct SqliteLeadRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLeadRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn find_one(&self, column: &str, value: &str) -> RepoResult<Option<Lead>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LEAD_SELECT_SQL}
             WHERE {column} = ?1
             ORDER BY created_at ASC, uuid ASC
             LIMIT 1;"
        ))?;

        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_lead_row(row)?));
        }

        Ok(None)
    }
}

impl LeadRepository for SqliteLeadRepository<'_> {
    fn create_lead(&self, lead: &Lead) -> RepoResult<Lead> {
        self.conn.execute(
            "INSERT INTO leads (uuid, external_id, email, phone)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                lead.uuid.to_string(),
                lead.external_id.as_deref(),
                lead.email.as_deref(),
                lead.phone.as_deref(),
            ],
        )?;

        self.get_lead(lead.uuid)?.ok_or(RepoError::NotFound {
            entity: "lead",
            id: lead.uuid,
        })
    }

    fn get_lead(&self, id: LeadId) -> RepoResult<Option<Lead>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{LEAD_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_lead_row(row)?));
        }

        Ok(None)
    }

    fn find_by_external_id(&self, external_id: &str) -> RepoResult<Option<Lead>> {
        self.find_one("external_id", external_id)
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<Lead>> {
        self.find_one("email", email)
    }

    fn find_by_phone(&self, phone: &str) -> RepoResult<Option<Lead>> {
        self.find_one("phone", phone)
    }

    fn list_leads(&self, page: &PageQuery) -> RepoResult<Vec<Lead>> {
        let limit = normalize_page_limit(page.limit);
        let mut stmt = self.conn.prepare(&format!(
            "{LEAD_SELECT_SQL}
             ORDER BY created_at ASC, uuid ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;

        let mut rows = stmt.query(params![limit, page.offset])?;
        let mut leads = Vec::new();
        while let Some(row) = rows.next()? {
            leads.push(parse_lead_row(row)?);
        }

        Ok(leads)
    }
}

fn parse_lead_row(row: &Row<'_>) -> RepoResult<Lead> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Lead {
        uuid: parse_uuid(&uuid_text, "leads.uuid")?,
        external_id: row.get("external_id")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
    })
}
