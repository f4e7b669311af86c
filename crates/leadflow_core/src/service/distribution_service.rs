//! Distribution orchestration: lead resolution, availability filtering,
//! weighted-random operator selection and contact creation.
//!
//! # Responsibility
//! - Resolve or lazily create the lead behind an inbound contact.
//! - Filter the source's configured operators down to available ones.
//! - Select one operator by weighted-random draw, or none.
//! - Persist the contact and bump the winner's load in one transaction.
//!
//! # Invariants
//! - The whole distribute call runs inside one IMMEDIATE transaction: the
//!   availability read and the load increment are serialized against
//!   concurrent distributors, so an operator is never pushed past
//!   `max_load`.
//! - No available operator is not an error; the contact is persisted
//!   unassigned.
//! - Randomness is injected through `WeightSampler` so tests can script
//!   exact draws.

use crate::model::contact::Contact;
use crate::model::lead::Lead;
use crate::model::operator::Operator;
use crate::model::source::SourceId;
use crate::repo::contact_repo::{ContactRepository, SqliteContactRepository};
use crate::repo::lead_repo::{LeadRepository, SqliteLeadRepository};
use crate::repo::operator_repo::{OperatorRepository, SqliteOperatorRepository};
use crate::repo::source_repo::{SourceRepository, SqliteSourceRepository};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Uniform draw source for weighted selection.
///
/// Implementations return a value in `[0, total_weight)`; the selector
/// tolerates out-of-range draws by falling back to the first candidate.
pub trait WeightSampler {
    fn draw(&mut self, total_weight: f64) -> f64;
}

/// Production sampler over a small fast RNG.
pub struct RandomWeightSampler {
    rng: SmallRng,
}

impl RandomWeightSampler {
    /// Creates an entropy-seeded sampler.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Creates a reproducible sampler for replayable runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomWeightSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightSampler for RandomWeightSampler {
    fn draw(&mut self, total_weight: f64) -> f64 {
        self.rng.gen_range(0.0..total_weight)
    }
}

/// One selection candidate: an operator with capacity plus its weight for
/// the source being distributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableOperator {
    pub operator: Operator,
    pub weight: u32,
}

/// Request model for distributing one inbound contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    /// Upstream lead identifier, highest-priority lookup key.
    #[serde(default)]
    pub lead_external_id: Option<String>,
    /// Lead email lookup key.
    #[serde(default)]
    pub lead_email: Option<String>,
    /// Lead phone lookup key.
    #[serde(default)]
    pub lead_phone: Option<String>,
    /// Channel the contact arrived through.
    pub source_uuid: SourceId,
    /// Free-text message body.
    #[serde(default)]
    pub message: Option<String>,
}

/// Errors from the distribution orchestrator.
#[derive(Debug)]
pub enum DistributionError {
    /// The contact references a source that does not exist.
    SourceNotFound(SourceId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch inside the transaction.
    InconsistentState(&'static str),
}

impl Display for DistributionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceNotFound(id) => write!(f, "source not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent distribution state: {details}")
            }
        }
    }
}

impl Error for DistributionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DistributionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for DistributionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Resolves or lazily creates the lead behind an inbound contact.
///
/// Lookup order with first-match-wins: external_id, then email, then phone.
/// Empty or whitespace-only keys are treated as absent. When nothing
/// matches, a new lead is created carrying whatever key subset was
/// supplied; all three may be absent.
pub fn resolve_lead<R: LeadRepository>(
    repo: &R,
    external_id: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> RepoResult<Lead> {
    let external_id = normalized(external_id);
    let email = normalized(email);
    let phone = normalized(phone);

    if let Some(external_id) = external_id {
        if let Some(lead) = repo.find_by_external_id(external_id)? {
            return Ok(lead);
        }
    }
    if let Some(email) = email {
        if let Some(lead) = repo.find_by_email(email)? {
            return Ok(lead);
        }
    }
    if let Some(phone) = phone {
        if let Some(lead) = repo.find_by_phone(phone)? {
            return Ok(lead);
        }
    }

    repo.create_lead(&Lead::new(
        external_id.map(str::to_string),
        email.map(str::to_string),
        phone.map(str::to_string),
    ))
}

/// Computes the selection candidates for one source.
///
/// Walks the source's weight rows in retrieval order and keeps only
/// operators that are active and under their load cap. Excluded operators
/// are silently dropped, not reported.
pub fn available_operators<O, S>(
    operators: &O,
    sources: &S,
    source_id: SourceId,
) -> RepoResult<Vec<AvailableOperator>>
where
    O: OperatorRepository,
    S: SourceRepository,
{
    let weights = sources.list_source_weights(source_id)?;
    let mut available = Vec::new();
    for weight in weights {
        let Some(operator) = operators.get_operator(weight.operator_uuid)? else {
            continue;
        };
        if operator.has_capacity() {
            available.push(AvailableOperator {
                operator,
                weight: weight.weight,
            });
        }
    }
    Ok(available)
}

/// Picks one candidate by weighted-random draw, or `None` on empty input.
///
/// Sums the weights into `total`, draws `r` in `[0, total)` and returns the
/// first candidate whose cumulative weight reaches `r`. If floating-point
/// accumulation falls short of the draw, the first candidate is returned as
/// a documented fallback.
pub fn select_operator<'a, S: WeightSampler>(
    candidates: &'a [AvailableOperator],
    sampler: &mut S,
) -> Option<&'a Operator> {
    if candidates.is_empty() {
        return None;
    }

    let total: f64 = candidates
        .iter()
        .map(|candidate| f64::from(candidate.weight))
        .sum();
    let draw = sampler.draw(total);

    let mut cumulative = 0.0;
    for candidate in candidates {
        cumulative += f64::from(candidate.weight);
        if draw <= cumulative {
            return Some(&candidate.operator);
        }
    }

    // Rounding fallback: cumulative never reached the draw.
    Some(&candidates[0].operator)
}

/// Distribution orchestrator over one SQLite connection.
pub struct DistributionService<'conn, S: WeightSampler> {
    conn: &'conn Connection,
    sampler: S,
}

impl<'conn, S: WeightSampler> DistributionService<'conn, S> {
    /// Constructs the orchestrator from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection, sampler: S) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, sampler })
    }

    /// Distributes one inbound contact.
    ///
    /// # Contract
    /// - Runs resolve -> filter -> select -> contact insert -> load
    ///   increment as a single atomic unit: either the contact and the
    ///   increment both persist, or neither does.
    /// - Returns the persisted contact; `operator_uuid = None` means no
    ///   operator had capacity.
    pub fn distribute(&mut self, request: &ContactRequest) -> Result<Contact, DistributionError> {
        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        // Repositories share the service connection, so every statement
        // below participates in `tx`.
        let sources = SqliteSourceRepository::try_new(self.conn)?;
        let leads = SqliteLeadRepository::try_new(self.conn)?;
        let operators = SqliteOperatorRepository::try_new(self.conn)?;
        let contacts = SqliteContactRepository::try_new(self.conn)?;

        if sources.get_source(request.source_uuid)?.is_none() {
            return Err(DistributionError::SourceNotFound(request.source_uuid));
        }

        let lead = resolve_lead(
            &leads,
            request.lead_external_id.as_deref(),
            request.lead_email.as_deref(),
            request.lead_phone.as_deref(),
        )?;

        let candidates = available_operators(&operators, &sources, request.source_uuid)?;
        let selected = select_operator(&candidates, &mut self.sampler);

        let contact = Contact::new(
            lead.uuid,
            request.source_uuid,
            selected.map(|operator| operator.uuid),
            request.message.clone(),
        );
        let persisted = contacts.create_contact(&contact)?;

        if let Some(operator) = selected {
            // Guarded increment: the candidate was read under this
            // transaction with current_load < max_load, so zero affected
            // rows means the invariant broke.
            let changed = operators.increment_load(operator.uuid)?;
            if changed == 0 {
                return Err(DistributionError::InconsistentState(
                    "selected operator lost capacity inside transaction",
                ));
            }
        }

        tx.commit()?;

        info!(
            "event=distribute module=distribution status=ok source={} lead={} operator={} candidates={} duration_ms={}",
            request.source_uuid,
            lead.uuid,
            persisted
                .operator_uuid
                .map(|id| id.to_string())
                .unwrap_or_else(|| "none".to_string()),
            candidates.len(),
            started_at.elapsed().as_millis()
        );

        Ok(persisted)
    }
}

fn normalized(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{select_operator, AvailableOperator, RandomWeightSampler, WeightSampler};
    use crate::model::operator::Operator;

    /// Scripted sampler replaying a fixed draw sequence.
    struct SequenceSampler {
        draws: Vec<f64>,
        next: usize,
    }

    impl SequenceSampler {
        fn new(draws: Vec<f64>) -> Self {
            Self { draws, next: 0 }
        }
    }

    impl WeightSampler for SequenceSampler {
        fn draw(&mut self, _total_weight: f64) -> f64 {
            let value = self.draws[self.next % self.draws.len()];
            self.next += 1;
            value
        }
    }

    fn candidates(weights: &[u32]) -> Vec<AvailableOperator> {
        weights
            .iter()
            .enumerate()
            .map(|(index, weight)| AvailableOperator {
                operator: Operator::new(format!("op-{index}"), 10),
                weight: *weight,
            })
            .collect()
    }

    #[test]
    fn empty_candidates_select_nothing() {
        let mut sampler = SequenceSampler::new(vec![0.0]);
        assert!(select_operator(&[], &mut sampler).is_none());
    }

    #[test]
    fn draw_walks_cumulative_weights() {
        let pool = candidates(&[2, 3, 5]);

        let mut sampler = SequenceSampler::new(vec![1.5]);
        let first = select_operator(&pool, &mut sampler).unwrap();
        assert_eq!(first.uuid, pool[0].operator.uuid);

        let mut sampler = SequenceSampler::new(vec![4.999]);
        let second = select_operator(&pool, &mut sampler).unwrap();
        assert_eq!(second.uuid, pool[1].operator.uuid);

        let mut sampler = SequenceSampler::new(vec![9.5]);
        let third = select_operator(&pool, &mut sampler).unwrap();
        assert_eq!(third.uuid, pool[2].operator.uuid);
    }

    #[test]
    fn boundary_draw_lands_on_cumulative_edge() {
        let pool = candidates(&[2, 3]);

        // draw == cumulative weight of the first candidate still picks it.
        let mut sampler = SequenceSampler::new(vec![2.0]);
        let winner = select_operator(&pool, &mut sampler).unwrap();
        assert_eq!(winner.uuid, pool[0].operator.uuid);
    }

    #[test]
    fn out_of_range_draw_falls_back_to_first_candidate() {
        let pool = candidates(&[1, 1]);
        let mut sampler = SequenceSampler::new(vec![10.0]);
        let winner = select_operator(&pool, &mut sampler).unwrap();
        assert_eq!(winner.uuid, pool[0].operator.uuid);
    }

    #[test]
    fn seeded_sampler_is_reproducible() {
        let mut first = RandomWeightSampler::seeded(7);
        let mut second = RandomWeightSampler::seeded(7);
        for _ in 0..32 {
            let a = first.draw(4.0);
            let b = second.draw(4.0);
            assert_eq!(a, b);
            assert!((0.0..4.0).contains(&a));
        }
    }
}
