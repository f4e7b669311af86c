//! Operator domain model.
//!
//! # Responsibility
//! - Define the canonical operator record with capacity accounting fields.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another operator.
//! - `current_load` never goes below zero; the schema mirrors this CHECK.
//! - `current_load <= max_load` is deliberately NOT a data invariant: it is
//!   enforced only at selection time and by the guarded increment.

use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an operator.
pub type OperatorId = Uuid;

/// An agent that inbound contacts can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    /// Stable global ID.
    pub uuid: OperatorId,
    /// Display name shown to dispatchers.
    pub name: String,
    /// Inactive operators are excluded from distribution.
    pub is_active: bool,
    /// Maximum number of concurrently assigned contacts.
    pub max_load: u32,
    /// Count of contacts assigned so far. Only ever incremented by the
    /// distribution orchestrator; no decrement path exists in this core.
    pub current_load: u32,
}

impl Operator {
    /// Creates an active operator with a generated stable ID and zero load.
    pub fn new(name: impl Into<String>, max_load: u32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            is_active: true,
            max_load,
            current_load: 0,
        }
    }

    /// Returns whether this operator can accept one more assignment.
    pub fn has_capacity(&self) -> bool {
        self.is_active && self.current_load < self.max_load
    }

    /// Checks entity invariants before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyOperatorName);
        }
        if self.max_load == 0 {
            return Err(ValidationError::ZeroCapacity);
        }
        Ok(())
    }
}
