#![forbid(unsafe_code)]

use score_core::{AccountId, BadgeId, ScorerId};
use score_set::{ScoreSet, ScoreSetError};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("scorer not found: {0}")]
    NotFound(ScorerId),
    #[error("score source error: {0}")]
    Other(String),
}

/// Read-only view of scorer state consumed during review submission.
///
/// Lookups must be side-effect free; any failure aborts the whole
/// submission before ledger state is touched.
pub trait ScoreSource {
    fn scorer_contains_badge(
        &self,
        scorer_id: ScorerId,
        badge_id: BadgeId,
    ) -> Result<bool, SourceError>;

    fn scorer_decimals(&self, scorer_id: ScorerId) -> Result<u8, SourceError>;

    fn resolver_address(&self, scorer_id: ScorerId) -> Result<Option<AccountId>, SourceError>;
}

impl ScoreSource for ScoreSet {
    fn scorer_contains_badge(
        &self,
        scorer_id: ScorerId,
        badge_id: BadgeId,
    ) -> Result<bool, SourceError> {
        self.contains_badge(scorer_id, badge_id)
            .map_err(|e| map_err(scorer_id, e))
    }

    fn scorer_decimals(&self, scorer_id: ScorerId) -> Result<u8, SourceError> {
        self.decimals(scorer_id).map_err(|e| map_err(scorer_id, e))
    }

    fn resolver_address(&self, scorer_id: ScorerId) -> Result<Option<AccountId>, SourceError> {
        self.resolver_address(scorer_id)
            .map_err(|e| map_err(scorer_id, e))
    }
}

fn map_err(scorer_id: ScorerId, e: ScoreSetError) -> SourceError {
    match e {
        ScoreSetError::NotFound(_) => SourceError::NotFound(scorer_id),
        other => SourceError::Other(other.to_string()),
    }
}
