//! Contact domain model.
//!
//! # Responsibility
//! - Define one inbound interaction tied to a lead, a source and optionally
//!   an assigned operator.
//!
//! # Invariants
//! - `operator_uuid = None` means no operator had capacity at distribution
//!   time; this is a valid terminal outcome, not an error.
//! - The core only ever assigns status `new`; transitions between the other
//!   states belong to external callers.

use crate::model::lead::LeadId;
use crate::model::operator::OperatorId;
use crate::model::source::SourceId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a contact.
pub type ContactId = Uuid;

/// Contact lifecycle state. No transition rules are enforced in this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    /// Freshly distributed, the only state this core assigns.
    New,
    /// Being worked by an operator.
    InProgress,
    /// Finished.
    Closed,
}

/// One inbound interaction instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Stable global ID.
    pub uuid: ContactId,
    /// Resolved lead identity.
    pub lead_uuid: LeadId,
    /// Channel the contact arrived through.
    pub source_uuid: SourceId,
    /// Assigned operator, `None` when no operator was available.
    pub operator_uuid: Option<OperatorId>,
    /// Free-text message body.
    pub message: Option<String>,
    /// Lifecycle state.
    pub status: ContactStatus,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

impl Contact {
    /// Creates a `new`-status contact with a generated stable ID.
    ///
    /// `created_at` is assigned by storage defaults on insert; read models
    /// loaded back from the repository carry the persisted value.
    pub fn new(
        lead_uuid: LeadId,
        source_uuid: SourceId,
        operator_uuid: Option<OperatorId>,
        message: Option<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            lead_uuid,
            source_uuid,
            operator_uuid,
            message,
            status: ContactStatus::New,
            created_at: 0,
        }
    }
}
