//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist distributed contacts and expose paginated listing.
//!
//! # Invariants
//! - Inserted contacts carry status `new`; the repository persists whatever
//!   lifecycle state the model holds but never transitions it.
//! - List order is deterministic: `created_at ASC, uuid ASC`.

use crate::model::contact::{Contact, ContactId, ContactStatus};
use crate::repo::{
    ensure_connection_ready, normalize_page_limit, parse_uuid, PageQuery, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const CONTACT_SELECT_SQL: &str = "SELECT
    uuid,
    lead_uuid,
    source_uuid,
    operator_uuid,
    message,
    status,
    created_at
FROM contacts";

/// Repository interface for contact persistence.
pub trait ContactRepository {
    /// Inserts one contact and returns the persisted read model.
    fn create_contact(&self, contact: &Contact) -> RepoResult<Contact>;
    /// Loads one contact by id.
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    /// Lists contacts with offset/limit pagination.
    fn list_contacts(&self, page: &PageQuery) -> RepoResult<Vec<Contact>>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn create_contact(&self, contact: &Contact) -> RepoResult<Contact> {
        self.conn.execute(
            "INSERT INTO contacts (uuid, lead_uuid, source_uuid, operator_uuid, message, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                contact.uuid.to_string(),
                contact.lead_uuid.to_string(),
                contact.source_uuid.to_string(),
                contact.operator_uuid.map(|id| id.to_string()),
                contact.message.as_deref(),
                status_to_db(contact.status),
            ],
        )?;

        self.get_contact(contact.uuid)?.ok_or(RepoError::NotFound {
            entity: "contact",
            id: contact.uuid,
        })
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }

        Ok(None)
    }

    fn list_contacts(&self, page: &PageQuery) -> RepoResult<Vec<Contact>> {
        let limit = normalize_page_limit(page.limit);
        let mut stmt = self.conn.prepare(&format!(
            "{CONTACT_SELECT_SQL}
             ORDER BY created_at ASC, uuid ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;

        let mut rows = stmt.query(params![limit, page.offset])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }

        Ok(contacts)
    }
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let uuid_text: String = row.get("uuid")?;
    let lead_text: String = row.get("lead_uuid")?;
    let source_text: String = row.get("source_uuid")?;
    let operator_uuid = match row.get::<_, Option<String>>("operator_uuid")? {
        Some(value) => Some(parse_uuid(&value, "contacts.operator_uuid")?),
        None => None,
    };
    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in contacts.status"))
    })?;

    Ok(Contact {
        uuid: parse_uuid(&uuid_text, "contacts.uuid")?,
        lead_uuid: parse_uuid(&lead_text, "contacts.lead_uuid")?,
        source_uuid: parse_uuid(&source_text, "contacts.source_uuid")?,
        operator_uuid,
        message: row.get("message")?,
        status,
        created_at: row.get("created_at")?,
    })
}

fn status_to_db(status: ContactStatus) -> &'static str {
    match status {
        ContactStatus::New => "new",
        ContactStatus::InProgress => "in_progress",
        ContactStatus::Closed => "closed",
    }
}

fn parse_status(value: &str) -> Option<ContactStatus> {
    match value {
        "new" => Some(ContactStatus::New),
        "in_progress" => Some(ContactStatus::InProgress),
        "closed" => Some(ContactStatus::Closed),
        _ => None,
    }
}
