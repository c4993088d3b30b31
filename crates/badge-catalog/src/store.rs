#![forbid(unsafe_code)]

use crate::badge::BadgeV1;
use score_core::BadgeId;
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
pub struct BadgeStore {
    tree: sled::Tree,
}

impl BadgeStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Self::open_in(&db)
    }

    /// Open the badge tree inside an already-open database (shared-db node).
    pub fn open_in(db: &sled::Db) -> Result<Self, StoreError> {
        let tree = db.open_tree("badge-catalog")?;
        Ok(Self { tree })
    }

    pub fn get_badge(&self, badge_id: BadgeId) -> Result<Option<BadgeV1>, StoreError> {
        let Some(v) = self.tree.get(keys::badge(badge_id))? else {
            return Ok(None);
        };
        serde_json::from_slice::<BadgeV1>(&v)
            .map(Some)
            .map_err(|e| StoreError::Decode(format!("failed decoding badge json: {e}")))
    }

    pub fn put_badge(&self, badge_id: BadgeId, badge: &BadgeV1) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(badge)
            .map_err(|e| StoreError::Decode(format!("failed encoding badge json: {e}")))?;
        self.tree.insert(keys::badge(badge_id), bytes)?;
        Ok(())
    }

    pub fn contains_badge(&self, badge_id: BadgeId) -> Result<bool, StoreError> {
        Ok(self.tree.contains_key(keys::badge(badge_id))?)
    }

    pub fn badge_count(&self) -> Result<u64, StoreError> {
        let mut n = 0u64;
        for item in self.tree.scan_prefix(b"badge:") {
            let _ = item?;
            n += 1;
        }
        Ok(n)
    }

    pub fn badge_ids(&self) -> Result<Vec<BadgeId>, StoreError> {
        let mut out = Vec::new();
        for item in self.tree.scan_prefix(b"badge:") {
            let (k, _) = item?;
            out.push(decode_badge_key(&k)?);
        }
        Ok(out)
    }
}

fn decode_badge_key(k: &IVec) -> Result<BadgeId, StoreError> {
    let s = std::str::from_utf8(k)
        .map_err(|e| StoreError::Decode(format!("invalid utf8 badge key: {e}")))?;
    let hex = s
        .strip_prefix("badge:")
        .ok_or_else(|| StoreError::Decode(format!("unexpected badge key: {s}")))?;
    BadgeId::from_hex(hex).map_err(StoreError::Decode)
}

pub mod keys {
    use score_core::BadgeId;

    pub fn badge(badge_id: BadgeId) -> Vec<u8> {
        format!("badge:{}", badge_id.to_hex()).into_bytes()
    }
}
