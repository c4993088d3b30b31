#![forbid(unsafe_code)]

use crate::grant::GrantV1;
use score_core::{AccountId, SubjectId};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("db error: {0}")]
    Db(#[from] sled::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct GrantStore {
    tree: sled::Tree,
}

impl GrantStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Self::open_in(&db)
    }

    pub fn open_in(db: &sled::Db) -> Result<Self, StoreError> {
        let tree = db.open_tree("grant-registry")?;
        Ok(Self { tree })
    }

    pub fn get_grant(&self, subject_id: SubjectId) -> Result<Option<GrantV1>, StoreError> {
        let Some(v) = self.tree.get(keys::grant(subject_id))? else {
            return Ok(None);
        };
        serde_json::from_slice::<GrantV1>(&v)
            .map(Some)
            .map_err(|e| StoreError::Decode(format!("failed decoding grant json: {e}")))
    }

    pub fn put_grant(&self, subject_id: SubjectId, grant: &GrantV1) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(grant)
            .map_err(|e| StoreError::Decode(format!("failed encoding grant json: {e}")))?;
        self.tree.insert(keys::grant(subject_id), bytes)?;
        Ok(())
    }

    pub fn delete_grant(&self, subject_id: SubjectId) -> Result<(), StoreError> {
        let _ = self.tree.remove(keys::grant(subject_id))?;
        Ok(())
    }

    pub fn contains_grant(&self, subject_id: SubjectId) -> Result<bool, StoreError> {
        Ok(self.tree.contains_key(keys::grant(subject_id))?)
    }

    pub fn get_manager(&self, subject_id: SubjectId) -> Result<Option<AccountId>, StoreError> {
        let Some(v) = self.tree.get(keys::manager(subject_id))? else {
            return Ok(None);
        };
        let s = String::from_utf8(v.to_vec())
            .map_err(|e| StoreError::Decode(format!("invalid utf8 manager: {e}")))?;
        Ok(Some(AccountId(s)))
    }

    pub fn set_manager(&self, subject_id: SubjectId, manager: &AccountId) -> Result<(), StoreError> {
        self.tree
            .insert(keys::manager(subject_id), manager.0.as_bytes())?;
        Ok(())
    }
}

pub mod keys {
    use score_core::SubjectId;

    pub fn grant(subject_id: SubjectId) -> Vec<u8> {
        format!("grant:{}", subject_id.to_hex()).into_bytes()
    }

    pub fn manager(subject_id: SubjectId) -> Vec<u8> {
        format!("manager:{}", subject_id.to_hex()).into_bytes()
    }
}
