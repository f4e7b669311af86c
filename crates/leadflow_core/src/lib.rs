//! Core domain logic for Leadflow.
//! This crate is the single source of truth for distribution invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{Contact, ContactId, ContactStatus};
pub use model::lead::{Lead, LeadId};
pub use model::operator::{Operator, OperatorId};
pub use model::source::{Source, SourceId, SourceWeight};
pub use model::ValidationError;
pub use repo::contact_repo::{ContactRepository, SqliteContactRepository};
pub use repo::lead_repo::{LeadRepository, SqliteLeadRepository};
pub use repo::operator_repo::{OperatorRepository, SqliteOperatorRepository};
pub use repo::source_repo::{SourceRepository, SqliteSourceRepository};
pub use repo::{PageQuery, RepoError, RepoResult};
pub use service::distribution_service::{
    available_operators, resolve_lead, select_operator, AvailableOperator, ContactRequest,
    DistributionError, DistributionService, RandomWeightSampler, WeightSampler,
};
pub use service::operator_service::{OperatorDraft, OperatorService};
pub use service::source_service::{DistributionConfig, SourceDraft, SourceService, WeightEntry};

/// Minimal liveness probe backing the API root endpoint.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
