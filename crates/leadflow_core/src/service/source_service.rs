//! Source and distribution-config use-case service.
//!
//! # Responsibility
//! - Provide source create/get/list APIs.
//! - Apply per-source weight configuration with full-replace semantics.
//!
//! # Invariants
//! - A config write replaces every weight row of its source atomically; an
//!   empty operator list clears the config.
//! - Non-positive weights are rejected before persistence so the selector
//!   never sees them.

use crate::model::source::{Source, SourceId, SourceWeight};
use crate::repo::source_repo::SourceRepository;
use crate::repo::{PageQuery, RepoError, RepoResult};
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request model for creating a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDraft {
    /// Unique channel name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

/// One weight entry inside a distribution config write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightEntry {
    /// Target operator.
    pub operator_uuid: Uuid,
    /// Source the weight applies to; must match the config's source.
    pub source_uuid: Uuid,
    /// Positive relative weight.
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

/// Full weight configuration for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// Source being configured.
    pub source_uuid: SourceId,
    /// Complete replacement weight set. Empty clears the config.
    pub operators: Vec<WeightEntry>,
}

/// Use-case service for sources and their routing configuration.
pub struct SourceService<R: SourceRepository> {
    repo: R,
}

impl<R: SourceRepository> SourceService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one source from a draft.
    pub fn create(&self, draft: &SourceDraft) -> RepoResult<Source> {
        let source = Source::new(draft.name.clone(), draft.description.clone());
        self.repo.create_source(&source)?;
        Ok(source)
    }

    /// Gets one source by stable ID.
    pub fn get(&self, id: SourceId) -> RepoResult<Option<Source>> {
        self.repo.get_source(id)
    }

    /// Lists sources using pagination options.
    pub fn list(&self, page: &PageQuery) -> RepoResult<Vec<Source>> {
        self.repo.list_sources(page)
    }

    /// Atomically replaces the weight configuration of one source.
    ///
    /// # Contract
    /// - The target source must exist.
    /// - Every entry must target the config's source and carry a positive
    ///   weight; the first offending entry aborts the write untouched.
    pub fn replace_distribution_config(&self, config: &DistributionConfig) -> RepoResult<()> {
        if self.repo.get_source(config.source_uuid)?.is_none() {
            return Err(RepoError::NotFound {
                entity: "source",
                id: config.source_uuid,
            });
        }

        let entries: Vec<SourceWeight> = config
            .operators
            .iter()
            .map(|entry| SourceWeight {
                operator_uuid: entry.operator_uuid,
                source_uuid: entry.source_uuid,
                weight: entry.weight,
            })
            .collect();

        self.repo
            .replace_source_weights(config.source_uuid, &entries)?;

        info!(
            "event=distribution_config module=source status=ok source={} entries={}",
            config.source_uuid,
            entries.len()
        );
        Ok(())
    }

    /// Returns the active weight configuration of one source.
    pub fn distribution_config(&self, source_id: SourceId) -> RepoResult<Vec<SourceWeight>> {
        self.repo.list_source_weights(source_id)
    }
}
