//! Lead domain model.
//!
//! # Responsibility
//! - Define the deduplicated end-customer identity record.
//!
//! # Invariants
//! - `external_id`, when present, is unique across all leads.
//! - `email`/`phone` are lookup keys, not uniqueness constraints; concurrent
//!   contacts without an external_id can create duplicate leads by design.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a lead.
pub type LeadId = Uuid;

/// A deduplicated end-customer identity, created lazily on first contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Stable global ID.
    pub uuid: LeadId,
    /// Unique identifier assigned by an upstream system.
    pub external_id: Option<String>,
    /// Contact email. Lookup key only.
    pub email: Option<String>,
    /// Contact phone. Lookup key only.
    pub phone: Option<String>,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

impl Lead {
    /// Creates a lead carrying whatever identity subset was supplied.
    ///
    /// All three fields may be `None`; an anonymous lead is still a valid
    /// distribution target.
    pub fn new(
        external_id: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            external_id,
            email,
            phone,
            created_at: 0,
        }
    }
}
