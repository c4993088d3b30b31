#![forbid(unsafe_code)]

use crate::aggregate::{fold_story, ProgramAggregateV1};
use crate::source::{ScoreSource, SourceError};
use crate::story::{ProgramKey, StoryV1};
use crate::store::{decode_u128, decode_u64, keys, LedgerStore, StoreError};
use score_core::arith::{ceil_div, checked_mul, pow10, ArithError};
use score_core::{AccountId, BadgeId, Hex32, ScaledU128, ScorerId, SubjectId};
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("caller {0} is not the authorized submitter")]
    NotAuthorized(AccountId),
    #[error("caller {0} is not the ledger owner")]
    NotOwner(AccountId),
    #[error("no scorer bound to the ledger")]
    ScorerNotBound,
    #[error("badge not in the bound scorer's set: {0}")]
    UnknownBadge(BadgeId),
    #[error("badge_ids and scores have mismatched lengths ({ids} vs {scores})")]
    LengthMismatch { ids: usize, scores: usize },
    #[error("review carries no badge/score pairs")]
    EmptyReview,
    #[error("story index {index} out of range for subject {subject_id} (count {count})")]
    OutOfRange {
        subject_id: SubjectId,
        index: u64,
        count: u64,
    },
    #[error("program has no reviews: {0}")]
    NotReviewed(ProgramKey),
    #[error(transparent)]
    Arith(#[from] ArithError),
    #[error("score source error: {0}")]
    Source(#[from] SourceError),
    #[error("store error: {0}")]
    Store(String),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        LedgerError::Store(e.to_string())
    }
}

/// Initial admin identities used when opening a fresh ledger. Stored values
/// win on reopen so ownership transfers survive restarts.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub owner: AccountId,
    pub authorized_submitter: AccountId,
}

/// The review ledger.
///
/// Story sequences are append-only per subject. Each program tracks the
/// subject's latest folded contribution so a further review revises it;
/// contribution, story and aggregate are written in one sled transaction,
/// so a failure commits nothing.
#[derive(Debug, Clone)]
pub struct ReviewLedger {
    store: LedgerStore,
}

impl ReviewLedger {
    pub fn open(path: impl AsRef<Path>, bootstrap: AdminBootstrap) -> Result<Self, LedgerError> {
        Self::with_store(LedgerStore::open(path)?, bootstrap)
    }

    pub fn with_store(store: LedgerStore, bootstrap: AdminBootstrap) -> Result<Self, LedgerError> {
        if store.get_owner()?.is_none() {
            store.set_owner(&bootstrap.owner)?;
            store.set_authorized_submitter(&bootstrap.authorized_submitter)?;
        }
        Ok(Self { store })
    }

    /// Submit a review for `subject_id` against `program_key`.
    ///
    /// Validates every badge against the bound scorer, computes the story's
    /// fixed-point average with ceiling rounding, folds it into the program
    /// aggregate (replacing this subject's previous contribution if any)
    /// and appends the story. Returns the updated aggregate.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_review(
        &self,
        source: &dyn ScoreSource,
        caller: &AccountId,
        subject_id: SubjectId,
        tx_ref: Hex32,
        program_key: &ProgramKey,
        badge_ids: &[BadgeId],
        scores: &[u8],
        timestamp: u64,
    ) -> Result<ProgramAggregateV1, LedgerError> {
        let submitter = self
            .store
            .get_authorized_submitter()?
            .ok_or_else(|| LedgerError::NotAuthorized(caller.clone()))?;
        if caller != &submitter {
            return Err(LedgerError::NotAuthorized(caller.clone()));
        }
        let scorer_id = self
            .store
            .get_scorer_binding()?
            .ok_or(LedgerError::ScorerNotBound)?;

        if badge_ids.len() != scores.len() {
            return Err(LedgerError::LengthMismatch {
                ids: badge_ids.len(),
                scores: scores.len(),
            });
        }
        if badge_ids.is_empty() {
            return Err(LedgerError::EmptyReview);
        }
        for badge_id in badge_ids {
            if !source.scorer_contains_badge(scorer_id, *badge_id)? {
                return Err(LedgerError::UnknownBadge(*badge_id));
            }
        }

        let scale = pow10(source.scorer_decimals(scorer_id)?)?;
        let sum: u128 = scores.iter().map(|s| u128::from(*s)).sum();
        let scaled_sum = checked_mul(sum, scale, "story score scaling")?;
        let story_average = ScaledU128(ceil_div(scaled_sum, badge_ids.len() as u128)?);

        let story = StoryV1 {
            timestamp,
            tx_ref,
            badge_ids: badge_ids.to_vec(),
            scores: scores.to_vec(),
            average_score: story_average,
        };

        let r = self.store.tree().transaction(|tree| {
            let story_index = tx_story_count(tree, subject_id)?;
            let prior_contribution = tx_contribution(tree, program_key, subject_id)?;
            let aggregate = tx_aggregate(tree, program_key)?;

            let updated = fold_story(&aggregate, story_average, prior_contribution)
                .map_err(|e| ConflictableTransactionError::Abort(TxError::Arith(e)))?;

            let story_bytes = serde_json::to_vec(&story).map_err(|e| {
                ConflictableTransactionError::Abort(TxError::Store(format!(
                    "failed encoding story json: {e}"
                )))
            })?;
            tree.insert(keys::story(subject_id, story_index), story_bytes)?;
            tree.insert(
                keys::story_count(subject_id),
                (story_index + 1).to_string().into_bytes(),
            )?;
            tree.insert(
                keys::contribution(program_key, subject_id),
                story_average.0.to_string().into_bytes(),
            )?;

            let agg_bytes = serde_json::to_vec(&updated).map_err(|e| {
                ConflictableTransactionError::Abort(TxError::Store(format!(
                    "failed encoding aggregate json: {e}"
                )))
            })?;
            tree.insert(keys::program(program_key), agg_bytes)?;

            Ok(updated)
        });

        let updated = match r {
            Ok(agg) => agg,
            Err(TransactionError::Abort(TxError::Arith(e))) => return Err(LedgerError::Arith(e)),
            Err(TransactionError::Abort(TxError::Store(s))) => return Err(LedgerError::Store(s)),
            Err(TransactionError::Storage(e)) => return Err(LedgerError::Store(e.to_string())),
        };

        info!(
            event = "review_submitted",
            subject_id = %subject_id,
            program_key = %program_key,
            story_average = %story_average,
            total = updated.total_review_count,
            valid = updated.valid_review_count,
            running_average = %updated.running_average
        );
        Ok(updated)
    }

    pub fn get_stories(&self, subject_id: SubjectId) -> Result<Vec<StoryV1>, LedgerError> {
        Ok(self.store.get_stories(subject_id)?)
    }

    pub fn get_story(&self, subject_id: SubjectId, index: u64) -> Result<StoryV1, LedgerError> {
        match self.store.get_story(subject_id, index)? {
            Some(story) => Ok(story),
            None => Err(LedgerError::OutOfRange {
                subject_id,
                index,
                count: self.store.get_story_count(subject_id)?,
            }),
        }
    }

    pub fn get_story_count(&self, subject_id: SubjectId) -> Result<u64, LedgerError> {
        Ok(self.store.get_story_count(subject_id)?)
    }

    /// `(total, valid)` review counts; zeroes for an unseen program.
    pub fn get_review_counts(&self, program_key: &ProgramKey) -> Result<(u64, u64), LedgerError> {
        let agg = self.store.get_aggregate(program_key)?.unwrap_or_default();
        Ok((agg.total_review_count, agg.valid_review_count))
    }

    pub fn get_average_score(&self, program_key: &ProgramKey) -> Result<ScaledU128, LedgerError> {
        match self.store.get_aggregate(program_key)? {
            Some(agg) if agg.valid_review_count > 0 => Ok(agg.running_average),
            _ => Err(LedgerError::NotReviewed(program_key.clone())),
        }
    }

    /// Generic aggregation-consumer entry point: decode a program key from
    /// the opaque payload and look up its average. `(false, 0)` for an
    /// undecodable payload or an unreviewed program, never an error.
    pub fn score_of(&self, payload: &[u8]) -> (bool, u128) {
        let Some(program_key) = ProgramKey::from_payload(payload) else {
            return (false, 0);
        };
        match self.get_average_score(&program_key) {
            Ok(avg) => (true, avg.0),
            Err(_) => (false, 0),
        }
    }

    pub fn owner(&self) -> Result<Option<AccountId>, LedgerError> {
        Ok(self.store.get_owner()?)
    }

    pub fn authorized_submitter(&self) -> Result<Option<AccountId>, LedgerError> {
        Ok(self.store.get_authorized_submitter()?)
    }

    pub fn scorer_binding(&self) -> Result<Option<ScorerId>, LedgerError> {
        Ok(self.store.get_scorer_binding()?)
    }

    pub fn set_scorer_binding(
        &self,
        scorer_id: ScorerId,
        caller: &AccountId,
    ) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        let old = self.store.get_scorer_binding()?;
        self.store.set_scorer_binding(scorer_id)?;
        info!(
            event = "scorer_binding_changed",
            old = old.map(|s| s.0).unwrap_or(0),
            new = scorer_id.0
        );
        Ok(())
    }

    pub fn set_authorized_submitter(
        &self,
        submitter: &AccountId,
        caller: &AccountId,
    ) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        let old = self.store.get_authorized_submitter()?;
        self.store.set_authorized_submitter(submitter)?;
        info!(
            event = "authorized_submitter_changed",
            old = old.as_ref().map(|a| a.as_str()).unwrap_or(""),
            new = %submitter
        );
        Ok(())
    }

    pub fn set_owner(&self, new_owner: &AccountId, caller: &AccountId) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        self.store.set_owner(new_owner)?;
        info!(event = "owner_changed", old = %caller, new = %new_owner);
        Ok(())
    }

    fn require_owner(&self, caller: &AccountId) -> Result<(), LedgerError> {
        match self.store.get_owner()? {
            Some(ref o) if o == caller => Ok(()),
            _ => Err(LedgerError::NotOwner(caller.clone())),
        }
    }
}

#[derive(Debug)]
enum TxError {
    Arith(ArithError),
    Store(String),
}

fn tx_story_count(
    tree: &TransactionalTree,
    subject_id: SubjectId,
) -> Result<u64, ConflictableTransactionError<TxError>> {
    let Some(v) = tree.get(keys::story_count(subject_id))? else {
        return Ok(0);
    };
    decode_u64(&v).map_err(|e| ConflictableTransactionError::Abort(TxError::Store(e.to_string())))
}

fn tx_contribution(
    tree: &TransactionalTree,
    program_key: &ProgramKey,
    subject_id: SubjectId,
) -> Result<Option<ScaledU128>, ConflictableTransactionError<TxError>> {
    let Some(v) = tree.get(keys::contribution(program_key, subject_id))? else {
        return Ok(None);
    };
    decode_u128(&v)
        .map(|n| Some(ScaledU128(n)))
        .map_err(|e| ConflictableTransactionError::Abort(TxError::Store(e.to_string())))
}

fn tx_aggregate(
    tree: &TransactionalTree,
    program_key: &ProgramKey,
) -> Result<ProgramAggregateV1, ConflictableTransactionError<TxError>> {
    let Some(v) = tree.get(keys::program(program_key))? else {
        return Ok(ProgramAggregateV1::default());
    };
    serde_json::from_slice(&v).map_err(|e| {
        ConflictableTransactionError::Abort(TxError::Store(format!(
            "failed decoding aggregate json: {e}"
        )))
    })
}
