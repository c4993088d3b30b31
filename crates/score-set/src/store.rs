#![forbid(unsafe_code)]

use crate::scorer::ScorerRecordV1;
use score_core::{AccountId, BadgeId, ScorerId};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("db error: {0}")]
    Db(#[from] sled::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct ScorerStore {
    tree: sled::Tree,
}

impl ScorerStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Self::open_in(&db)
    }

    pub fn open_in(db: &sled::Db) -> Result<Self, StoreError> {
        let tree = db.open_tree("score-set")?;
        Ok(Self { tree })
    }

    /// Allocate the next scorer id (single-writer monotonic counter).
    pub fn next_scorer_id(&self) -> Result<ScorerId, StoreError> {
        let next = match self.tree.get(keys::next_scorer_id())? {
            Some(v) => decode_u64(&v)?,
            None => 1,
        };
        self.tree
            .insert(keys::next_scorer_id(), (next + 1).to_string().into_bytes())?;
        Ok(ScorerId(next))
    }

    pub fn get_scorer(&self, scorer_id: ScorerId) -> Result<Option<ScorerRecordV1>, StoreError> {
        let Some(v) = self.tree.get(keys::scorer(scorer_id))? else {
            return Ok(None);
        };
        serde_json::from_slice::<ScorerRecordV1>(&v)
            .map(Some)
            .map_err(|e| StoreError::Decode(format!("failed decoding scorer json: {e}")))
    }

    pub fn put_scorer(
        &self,
        scorer_id: ScorerId,
        record: &ScorerRecordV1,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(record)
            .map_err(|e| StoreError::Decode(format!("failed encoding scorer json: {e}")))?;
        self.tree.insert(keys::scorer(scorer_id), bytes)?;
        Ok(())
    }

    pub fn get_account_badges(
        &self,
        scorer_id: ScorerId,
        account: &AccountId,
    ) -> Result<BTreeSet<BadgeId>, StoreError> {
        let Some(v) = self.tree.get(keys::account_badges(scorer_id, account))? else {
            return Ok(BTreeSet::new());
        };
        serde_json::from_slice::<BTreeSet<BadgeId>>(&v)
            .map_err(|e| StoreError::Decode(format!("failed decoding account badges json: {e}")))
    }

    pub fn put_account_badges(
        &self,
        scorer_id: ScorerId,
        account: &AccountId,
        badges: &BTreeSet<BadgeId>,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(badges)
            .map_err(|e| StoreError::Decode(format!("failed encoding account badges json: {e}")))?;
        self.tree
            .insert(keys::account_badges(scorer_id, account), bytes)?;
        Ok(())
    }
}

fn decode_u64(v: &sled::IVec) -> Result<u64, StoreError> {
    let s = String::from_utf8(v.to_vec())
        .map_err(|e| StoreError::Decode(format!("invalid utf8 counter: {e}")))?;
    s.parse::<u64>()
        .map_err(|e| StoreError::Decode(format!("invalid counter integer: {e}")))
}

pub mod keys {
    use score_core::{AccountId, ScorerId};

    pub fn next_scorer_id() -> &'static [u8] {
        b"next_scorer_id"
    }

    pub fn scorer(scorer_id: ScorerId) -> Vec<u8> {
        format!("scorer:{:020}", scorer_id.0).into_bytes()
    }

    pub fn account_badges(scorer_id: ScorerId, account: &AccountId) -> Vec<u8> {
        format!("acct:{:020}:{}", scorer_id.0, account.0).into_bytes()
    }
}
