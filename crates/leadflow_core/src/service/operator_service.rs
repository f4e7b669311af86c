//! Operator use-case service.
//!
//! # Responsibility
//! - Provide operator create/update/get/list APIs behind the HTTP layer.
//! - Map request drafts onto entities field by field.
//!
//! # Invariants
//! - Drafts never carry `current_load`; new operators start at zero and the
//!   counter is only ever touched by the distribution orchestrator.
//! - `update` is a full replace of the mutable fields (name, is_active,
//!   max_load) and aborts with `NotFound` when the id is absent.

use crate::model::operator::{Operator, OperatorId};
use crate::repo::operator_repo::OperatorRepository;
use crate::repo::{PageQuery, RepoError, RepoResult};
use serde::{Deserialize, Serialize};

/// Request model for creating or fully replacing an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDraft {
    /// Display name.
    pub name: String,
    /// Whether the operator participates in distribution.
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    /// Maximum concurrently assigned contacts.
    #[serde(default = "default_max_load")]
    pub max_load: u32,
}

fn default_is_active() -> bool {
    true
}

fn default_max_load() -> u32 {
    10
}

/// Use-case service for operator management.
pub struct OperatorService<R: OperatorRepository> {
    repo: R,
}

impl<R: OperatorRepository> OperatorService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one operator from a draft.
    ///
    /// # Contract
    /// - Starts active per the draft flag, with `current_load = 0`.
    /// - Rejects blank names and zero capacity before persistence.
    pub fn create(&self, draft: &OperatorDraft) -> RepoResult<Operator> {
        let mut operator = Operator::new(draft.name.clone(), draft.max_load);
        operator.is_active = draft.is_active;
        self.repo.create_operator(&operator)?;
        Ok(operator)
    }

    /// Fully replaces the mutable fields of one operator.
    pub fn update(&self, id: OperatorId, draft: &OperatorDraft) -> RepoResult<Operator> {
        let mut operator = self
            .repo
            .get_operator(id)?
            .ok_or(RepoError::NotFound {
                entity: "operator",
                id,
            })?;

        operator.name = draft.name.clone();
        operator.is_active = draft.is_active;
        operator.max_load = draft.max_load;
        self.repo.update_operator(&operator)?;
        Ok(operator)
    }

    /// Gets one operator by stable ID.
    pub fn get(&self, id: OperatorId) -> RepoResult<Option<Operator>> {
        self.repo.get_operator(id)
    }

    /// Lists operators using pagination options.
    pub fn list(&self, page: &PageQuery) -> RepoResult<Vec<Operator>> {
        self.repo.list_operators(page)
    }
}
