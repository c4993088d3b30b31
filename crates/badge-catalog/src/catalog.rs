#![forbid(unsafe_code)]

use crate::badge::BadgeV1;
use crate::store::{BadgeStore, StoreError};
use crate::validation::{validate_badge_v1_with_limits, ValidationError};
use score_core::{BadgeId, ValidationLimits};
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("badge already exists: {0}")]
    DuplicateBadge(BadgeId),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("canonicalization error: {0}")]
    Canonical(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ValidationError> for CatalogError {
    fn from(e: ValidationError) -> Self {
        CatalogError::Validation(e.to_string())
    }
}

/// Content-addressed badge catalog.
///
/// Badges are immutable: `create` is the only mutation, duplicates are
/// rejected on id collision, and nothing is ever updated or deleted.
#[derive(Debug, Clone)]
pub struct BadgeCatalog {
    store: BadgeStore,
    limits: ValidationLimits,
}

impl BadgeCatalog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Ok(Self {
            store: BadgeStore::open(path)?,
            limits: ValidationLimits::default(),
        })
    }

    pub fn with_store(store: BadgeStore) -> Self {
        Self {
            store,
            limits: ValidationLimits::default(),
        }
    }

    /// Register a new badge. Fails on empty name or duplicate content.
    pub fn create(&self, badge: &BadgeV1) -> Result<BadgeId, CatalogError> {
        validate_badge_v1_with_limits(badge, &self.limits)?;
        let badge_id = Self::generate_id(badge)?;
        if self.store.contains_badge(badge_id)? {
            return Err(CatalogError::DuplicateBadge(badge_id));
        }
        self.store.put_badge(badge_id, badge)?;
        info!(
            event = "badge_created",
            badge_id = %badge_id,
            name = %badge.name
        );
        Ok(badge_id)
    }

    pub fn get(&self, badge_id: BadgeId) -> Result<Option<BadgeV1>, CatalogError> {
        Ok(self.store.get_badge(badge_id)?)
    }

    pub fn exists(&self, badge_id: BadgeId) -> Result<bool, CatalogError> {
        Ok(self.store.contains_badge(badge_id)?)
    }

    /// Pure, deterministic content address for a badge definition.
    pub fn generate_id(badge: &BadgeV1) -> Result<BadgeId, CatalogError> {
        badge
            .derive_id()
            .map_err(|e| CatalogError::Canonical(e.to_string()))
    }

    pub fn len(&self) -> Result<u64, CatalogError> {
        Ok(self.store.badge_count()?)
    }

    pub fn is_empty(&self) -> Result<bool, CatalogError> {
        Ok(self.len()? == 0)
    }

    pub fn badge_ids(&self) -> Result<Vec<BadgeId>, CatalogError> {
        Ok(self.store.badge_ids()?)
    }
}
