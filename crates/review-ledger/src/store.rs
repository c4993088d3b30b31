#![forbid(unsafe_code)]

use crate::aggregate::ProgramAggregateV1;
use crate::story::{ProgramKey, StoryV1};
use score_core::{AccountId, ScorerId, SubjectId};
use sled::IVec;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("db error: {0}")]
    Db(#[from] sled::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct LedgerStore {
    tree: sled::Tree,
}

impl LedgerStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Self::open_in(&db)
    }

    pub fn open_in(db: &sled::Db) -> Result<Self, StoreError> {
        let tree = db.open_tree("review-ledger")?;
        Ok(Self { tree })
    }

    pub fn get_story_count(&self, subject_id: SubjectId) -> Result<u64, StoreError> {
        let Some(v) = self.tree.get(keys::story_count(subject_id))? else {
            return Ok(0);
        };
        decode_u64(&v)
    }

    pub fn get_story(
        &self,
        subject_id: SubjectId,
        index: u64,
    ) -> Result<Option<StoryV1>, StoreError> {
        let Some(v) = self.tree.get(keys::story(subject_id, index))? else {
            return Ok(None);
        };
        serde_json::from_slice::<StoryV1>(&v)
            .map(Some)
            .map_err(|e| StoreError::Decode(format!("failed decoding story json: {e}")))
    }

    pub fn get_stories(&self, subject_id: SubjectId) -> Result<Vec<StoryV1>, StoreError> {
        let count = self.get_story_count(subject_id)?;
        let mut out = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
        for index in 0..count {
            let Some(story) = self.get_story(subject_id, index)? else {
                return Err(StoreError::Decode(format!(
                    "story {index} missing for subject {subject_id}"
                )));
            };
            out.push(story);
        }
        Ok(out)
    }

    pub fn get_aggregate(
        &self,
        program: &ProgramKey,
    ) -> Result<Option<ProgramAggregateV1>, StoreError> {
        let Some(v) = self.tree.get(keys::program(program))? else {
            return Ok(None);
        };
        serde_json::from_slice::<ProgramAggregateV1>(&v)
            .map(Some)
            .map_err(|e| StoreError::Decode(format!("failed decoding aggregate json: {e}")))
    }

    pub fn get_owner(&self) -> Result<Option<AccountId>, StoreError> {
        self.get_account(keys::owner())
    }

    pub fn set_owner(&self, owner: &AccountId) -> Result<(), StoreError> {
        self.tree.insert(keys::owner(), owner.0.as_bytes())?;
        Ok(())
    }

    pub fn get_authorized_submitter(&self) -> Result<Option<AccountId>, StoreError> {
        self.get_account(keys::authorized_submitter())
    }

    pub fn set_authorized_submitter(&self, submitter: &AccountId) -> Result<(), StoreError> {
        self.tree
            .insert(keys::authorized_submitter(), submitter.0.as_bytes())?;
        Ok(())
    }

    pub fn get_scorer_binding(&self) -> Result<Option<ScorerId>, StoreError> {
        let Some(v) = self.tree.get(keys::scorer_binding())? else {
            return Ok(None);
        };
        decode_u64(&v).map(|n| Some(ScorerId(n)))
    }

    pub fn set_scorer_binding(&self, scorer_id: ScorerId) -> Result<(), StoreError> {
        self.tree
            .insert(keys::scorer_binding(), scorer_id.0.to_string().into_bytes())?;
        Ok(())
    }

    pub(crate) fn tree(&self) -> &sled::Tree {
        &self.tree
    }

    fn get_account(&self, key: &'static [u8]) -> Result<Option<AccountId>, StoreError> {
        let Some(v) = self.tree.get(key)? else {
            return Ok(None);
        };
        let s = String::from_utf8(v.to_vec())
            .map_err(|e| StoreError::Decode(format!("invalid utf8 account: {e}")))?;
        Ok(Some(AccountId(s)))
    }
}

pub(crate) fn decode_u64(v: &IVec) -> Result<u64, StoreError> {
    let s = std::str::from_utf8(v)
        .map_err(|e| StoreError::Decode(format!("invalid utf8 counter: {e}")))?;
    s.parse::<u64>()
        .map_err(|e| StoreError::Decode(format!("invalid counter integer: {e}")))
}

pub(crate) fn decode_u128(v: &IVec) -> Result<u128, StoreError> {
    let s = std::str::from_utf8(v)
        .map_err(|e| StoreError::Decode(format!("invalid utf8 amount: {e}")))?;
    s.parse::<u128>()
        .map_err(|e| StoreError::Decode(format!("invalid amount integer: {e}")))
}

pub mod keys {
    use crate::story::ProgramKey;
    use score_core::SubjectId;

    pub fn story(subject_id: SubjectId, index: u64) -> Vec<u8> {
        format!("story:{}:{index:010}", subject_id.to_hex()).into_bytes()
    }

    pub fn story_count(subject_id: SubjectId) -> Vec<u8> {
        format!("story_count:{}", subject_id.to_hex()).into_bytes()
    }

    pub fn program(program: &ProgramKey) -> Vec<u8> {
        format!("program:{}", program.0).into_bytes()
    }

    /// Last story average this subject folded into this program. The fixed
    /// 64-char hex suffix keeps the key unambiguous for any program string.
    pub fn contribution(program: &ProgramKey, subject_id: SubjectId) -> Vec<u8> {
        format!("contrib:{}:{}", program.0, subject_id.to_hex()).into_bytes()
    }

    pub fn owner() -> &'static [u8] {
        b"owner"
    }

    pub fn authorized_submitter() -> &'static [u8] {
        b"authorized_submitter"
    }

    pub fn scorer_binding() -> &'static [u8] {
        b"scorer_binding"
    }
}
