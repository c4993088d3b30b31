#![forbid(unsafe_code)]

use crate::scorer::{LegacyScore, ScorerRecordV1};
use crate::store::{ScorerStore, StoreError};
use score_core::arith::{checked_add, checked_mul, pow10, ArithError};
use score_core::{AccountId, BadgeId, ScaledU128, ScorerId};
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ScoreSetError {
    #[error("scorer not found: {0}")]
    NotFound(ScorerId),
    #[error("badge_ids and badge_scores have mismatched lengths ({ids} vs {scores})")]
    LengthMismatch { ids: usize, scores: usize },
    #[error("badge already present: {0}")]
    AlreadyPresent(BadgeId),
    #[error("badge not present: {0}")]
    NotPresent(BadgeId),
    #[error("invalid badge id (zero)")]
    InvalidBadgeId,
    #[error("account {0} holds no badges for scorer {1}")]
    NoBadges(AccountId, ScorerId),
    #[error("caller {caller} is not the manager of scorer {scorer_id}")]
    NotManager {
        scorer_id: ScorerId,
        caller: AccountId,
    },
    #[error(transparent)]
    Arith(#[from] ArithError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Registry of scorers: weighted badge sets plus per-account membership.
#[derive(Debug, Clone)]
pub struct ScoreSet {
    store: ScorerStore,
}

impl ScoreSet {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScoreSetError> {
        Ok(Self {
            store: ScorerStore::open(path)?,
        })
    }

    pub fn with_store(store: ScorerStore) -> Self {
        Self { store }
    }

    /// Register a new scorer with its initial badge set.
    ///
    /// Each weight is stored pre-multiplied by `10^decimals`.
    #[allow(clippy::too_many_arguments)]
    pub fn register_scorer(
        &self,
        manager: AccountId,
        resolver: Option<AccountId>,
        badge_ids: &[BadgeId],
        badge_scores: &[u64],
        decimals: u8,
        metadata_uri: String,
    ) -> Result<ScorerId, ScoreSetError> {
        if badge_ids.len() != badge_scores.len() {
            return Err(ScoreSetError::LengthMismatch {
                ids: badge_ids.len(),
                scores: badge_scores.len(),
            });
        }
        let scale = pow10(decimals)?;
        let mut record = ScorerRecordV1 {
            decimals,
            manager,
            resolver,
            metadata_uri,
            ..ScorerRecordV1::default()
        };
        for (badge_id, score) in badge_ids.iter().zip(badge_scores) {
            if badge_id.is_zero() {
                return Err(ScoreSetError::InvalidBadgeId);
            }
            let weight = checked_mul(u128::from(*score), scale, "badge weight scaling")?;
            if record
                .badge_weights
                .insert(*badge_id, ScaledU128(weight))
                .is_some()
            {
                return Err(ScoreSetError::AlreadyPresent(*badge_id));
            }
        }
        let scorer_id = self.store.next_scorer_id()?;
        self.store.put_scorer(scorer_id, &record)?;
        info!(
            event = "scorer_registered",
            scorer_id = %scorer_id,
            badges = record.badge_weights.len(),
            decimals
        );
        Ok(scorer_id)
    }

    pub fn add_badge(
        &self,
        scorer_id: ScorerId,
        badge_id: BadgeId,
        score: u64,
        caller: &AccountId,
    ) -> Result<(), ScoreSetError> {
        if badge_id.is_zero() {
            return Err(ScoreSetError::InvalidBadgeId);
        }
        let mut record = self.require_scorer(scorer_id)?;
        self.require_manager(scorer_id, &record, caller)?;
        if record.contains_badge(badge_id) {
            return Err(ScoreSetError::AlreadyPresent(badge_id));
        }
        let scale = pow10(record.decimals)?;
        let weight = checked_mul(u128::from(score), scale, "badge weight scaling")?;
        record.badge_weights.insert(badge_id, ScaledU128(weight));
        self.store.put_scorer(scorer_id, &record)?;
        info!(event = "badge_added", scorer_id = %scorer_id, badge_id = %badge_id, score);
        Ok(())
    }

    pub fn remove_badge(
        &self,
        scorer_id: ScorerId,
        badge_id: BadgeId,
        caller: &AccountId,
    ) -> Result<(), ScoreSetError> {
        let mut record = self.require_scorer(scorer_id)?;
        self.require_manager(scorer_id, &record, caller)?;
        if record.badge_weights.remove(&badge_id).is_none() {
            return Err(ScoreSetError::NotPresent(badge_id));
        }
        self.store.put_scorer(scorer_id, &record)?;
        info!(event = "badge_removed", scorer_id = %scorer_id, badge_id = %badge_id);
        Ok(())
    }

    pub fn grant_badge(
        &self,
        scorer_id: ScorerId,
        account: &AccountId,
        badge_id: BadgeId,
        caller: &AccountId,
    ) -> Result<(), ScoreSetError> {
        let record = self.require_scorer(scorer_id)?;
        self.require_manager(scorer_id, &record, caller)?;
        let mut held = self.store.get_account_badges(scorer_id, account)?;
        if !held.insert(badge_id) {
            return Err(ScoreSetError::AlreadyPresent(badge_id));
        }
        self.store.put_account_badges(scorer_id, account, &held)?;
        info!(
            event = "badge_granted",
            scorer_id = %scorer_id,
            account = %account,
            badge_id = %badge_id
        );
        Ok(())
    }

    pub fn revoke_badge(
        &self,
        scorer_id: ScorerId,
        account: &AccountId,
        badge_id: BadgeId,
        caller: &AccountId,
    ) -> Result<(), ScoreSetError> {
        let record = self.require_scorer(scorer_id)?;
        self.require_manager(scorer_id, &record, caller)?;
        let mut held = self.store.get_account_badges(scorer_id, account)?;
        if !held.remove(&badge_id) {
            return Err(ScoreSetError::NotPresent(badge_id));
        }
        self.store.put_account_badges(scorer_id, account, &held)?;
        info!(
            event = "badge_revoked",
            scorer_id = %scorer_id,
            account = %account,
            badge_id = %badge_id
        );
        Ok(())
    }

    pub fn set_manager(
        &self,
        scorer_id: ScorerId,
        new_manager: AccountId,
        caller: &AccountId,
    ) -> Result<(), ScoreSetError> {
        let mut record = self.require_scorer(scorer_id)?;
        self.require_manager(scorer_id, &record, caller)?;
        info!(
            event = "scorer_manager_changed",
            scorer_id = %scorer_id,
            old = %record.manager,
            new = %new_manager
        );
        record.manager = new_manager;
        self.store.put_scorer(scorer_id, &record)?;
        Ok(())
    }

    pub fn set_resolver(
        &self,
        scorer_id: ScorerId,
        new_resolver: Option<AccountId>,
        caller: &AccountId,
    ) -> Result<(), ScoreSetError> {
        let mut record = self.require_scorer(scorer_id)?;
        self.require_manager(scorer_id, &record, caller)?;
        info!(
            event = "scorer_resolver_changed",
            scorer_id = %scorer_id,
            old = record.resolver.as_ref().map(|a| a.as_str()).unwrap_or(""),
            new = new_resolver.as_ref().map(|a| a.as_str()).unwrap_or("")
        );
        record.resolver = new_resolver;
        self.store.put_scorer(scorer_id, &record)?;
        Ok(())
    }

    pub fn set_metadata(
        &self,
        scorer_id: ScorerId,
        metadata_uri: String,
        caller: &AccountId,
    ) -> Result<(), ScoreSetError> {
        let mut record = self.require_scorer(scorer_id)?;
        self.require_manager(scorer_id, &record, caller)?;
        info!(
            event = "scorer_metadata_changed",
            scorer_id = %scorer_id,
            old = %record.metadata_uri,
            new = %metadata_uri
        );
        record.metadata_uri = metadata_uri;
        self.store.put_scorer(scorer_id, &record)?;
        Ok(())
    }

    /// A scorer exists iff its badge set is non-empty.
    pub fn exists(&self, scorer_id: ScorerId) -> Result<bool, ScoreSetError> {
        Ok(self
            .store
            .get_scorer(scorer_id)?
            .map(|r| r.is_live())
            .unwrap_or(false))
    }

    pub fn contains_badge(
        &self,
        scorer_id: ScorerId,
        badge_id: BadgeId,
    ) -> Result<bool, ScoreSetError> {
        Ok(self
            .store
            .get_scorer(scorer_id)?
            .map(|r| r.contains_badge(badge_id))
            .unwrap_or(false))
    }

    pub fn weight_of(
        &self,
        scorer_id: ScorerId,
        badge_id: BadgeId,
    ) -> Result<Option<ScaledU128>, ScoreSetError> {
        Ok(self
            .store
            .get_scorer(scorer_id)?
            .and_then(|r| r.badge_weights.get(&badge_id).copied()))
    }

    pub fn decimals(&self, scorer_id: ScorerId) -> Result<u8, ScoreSetError> {
        Ok(self.require_scorer(scorer_id)?.decimals)
    }

    pub fn manager(&self, scorer_id: ScorerId) -> Result<AccountId, ScoreSetError> {
        Ok(self.require_scorer(scorer_id)?.manager)
    }

    pub fn resolver_address(&self, scorer_id: ScorerId) -> Result<Option<AccountId>, ScoreSetError> {
        Ok(self.require_scorer(scorer_id)?.resolver)
    }

    pub fn badge_ids(&self, scorer_id: ScorerId) -> Result<Vec<BadgeId>, ScoreSetError> {
        Ok(self
            .require_scorer(scorer_id)?
            .badge_weights
            .keys()
            .copied()
            .collect())
    }

    pub fn account_badges(
        &self,
        scorer_id: ScorerId,
        account: &AccountId,
    ) -> Result<Vec<BadgeId>, ScoreSetError> {
        Ok(self
            .store
            .get_account_badges(scorer_id, account)?
            .into_iter()
            .collect())
    }

    /// Legacy sum/average scoring of one account against a scorer.
    ///
    /// Held badges no longer in the scorer's current badge set are skipped
    /// silently; the average divides by the *filtered* count with floor
    /// division.
    pub fn legacy_score_of(
        &self,
        account: &AccountId,
        scorer_id: ScorerId,
    ) -> Result<LegacyScore, ScoreSetError> {
        let record = self.require_scorer(scorer_id)?;
        let held = self.store.get_account_badges(scorer_id, account)?;
        if held.is_empty() {
            return Err(ScoreSetError::NoBadges(account.clone(), scorer_id));
        }

        let mut badge_ids = Vec::new();
        let mut weights = Vec::new();
        let mut total = 0u128;
        for badge_id in held {
            let Some(weight) = record.badge_weights.get(&badge_id) else {
                continue; // stale badge, since removed from the scorer
            };
            total = checked_add(total, weight.0, "legacy score sum")?;
            badge_ids.push(badge_id);
            weights.push(*weight);
        }
        if badge_ids.is_empty() {
            return Err(ScoreSetError::NoBadges(account.clone(), scorer_id));
        }
        let average = total / badge_ids.len() as u128;
        Ok(LegacyScore {
            badge_ids,
            weights,
            total: ScaledU128(total),
            average: ScaledU128(average),
        })
    }

    fn require_scorer(&self, scorer_id: ScorerId) -> Result<ScorerRecordV1, ScoreSetError> {
        self.store
            .get_scorer(scorer_id)?
            .ok_or(ScoreSetError::NotFound(scorer_id))
    }

    fn require_manager(
        &self,
        scorer_id: ScorerId,
        record: &ScorerRecordV1,
        caller: &AccountId,
    ) -> Result<(), ScoreSetError> {
        if &record.manager != caller {
            return Err(ScoreSetError::NotManager {
                scorer_id,
                caller: caller.clone(),
            });
        }
        Ok(())
    }
}
