//! Source domain model and per-source weight configuration.
//!
//! # Invariants
//! - Source names are unique (schema-level UNIQUE constraint).
//! - Weight rows always carry a positive weight; non-positive weights are
//!   rejected before persistence so cumulative sums stay monotonic during
//!   selection.

use crate::model::operator::OperatorId;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for an inbound channel.
pub type SourceId = Uuid;

/// An inbound channel, e.g. a marketing campaign or website form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Stable global ID.
    pub uuid: SourceId,
    /// Unique channel name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
}

impl Source {
    /// Creates a source with a generated stable ID.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            description,
        }
    }

    /// Checks entity invariants before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptySourceName);
        }
        Ok(())
    }
}

/// One routing weight: relative probability mass of an operator for a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceWeight {
    /// Referenced operator.
    pub operator_uuid: OperatorId,
    /// Referenced source.
    pub source_uuid: SourceId,
    /// Positive relative weight.
    pub weight: u32,
}
