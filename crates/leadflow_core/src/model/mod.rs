//! Domain model for lead distribution.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Enforce entity invariants at the write boundary via `validate()`.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID.
//! - Relationships are id references, never object-graph back-pointers.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod contact;
pub mod lead;
pub mod operator;
pub mod source;

/// Validation failures shared by entity write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Operator display name is empty or whitespace-only.
    EmptyOperatorName,
    /// Operator capacity must allow at least one assignment.
    ZeroCapacity,
    /// Source name is empty or whitespace-only.
    EmptySourceName,
    /// Distribution weight must be a positive integer.
    NonPositiveWeight { operator: uuid::Uuid, weight: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOperatorName => write!(f, "operator name must not be empty"),
            Self::ZeroCapacity => write!(f, "operator max_load must be at least 1"),
            Self::EmptySourceName => write!(f, "source name must not be empty"),
            Self::NonPositiveWeight { operator, weight } => write!(
                f,
                "distribution weight for operator {operator} must be positive, got {weight}"
            ),
        }
    }
}

impl Error for ValidationError {}
