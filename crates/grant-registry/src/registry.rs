#![forbid(unsafe_code)]

use crate::grant::GrantV1;
use crate::store::{GrantStore, StoreError};
use crate::validation::{validate_grant_v1_with_limits, ValidationError};
use score_core::{AccountId, ChainId, SubjectId, ValidationLimits};
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("grant not found: {0}")]
    NotFound(SubjectId),
    #[error("grant already exists: {0}")]
    AlreadyExists(SubjectId),
    #[error("caller {caller} is not the manager of {subject_id}")]
    NotManager {
        subject_id: SubjectId,
        caller: AccountId,
    },
    #[error("grant declares chain {declared}, registry runs on chain {local}")]
    InvalidChain { declared: ChainId, local: ChainId },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("canonicalization error: {0}")]
    Canonical(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ValidationError> for RegistryError {
    fn from(e: ValidationError) -> Self {
        RegistryError::Validation(e.to_string())
    }
}

/// Manager-gated grant registry pinned to one chain context.
#[derive(Debug, Clone)]
pub struct GrantRegistry {
    store: GrantStore,
    local_chain: ChainId,
    limits: ValidationLimits,
}

impl GrantRegistry {
    pub fn open(path: impl AsRef<Path>, local_chain: ChainId) -> Result<Self, RegistryError> {
        Ok(Self {
            store: GrantStore::open(path)?,
            local_chain,
            limits: ValidationLimits::default(),
        })
    }

    pub fn with_store(store: GrantStore, local_chain: ChainId) -> Self {
        Self {
            store,
            local_chain,
            limits: ValidationLimits::default(),
        }
    }

    /// Register a grant for `manager`. The id is the content hash of the
    /// record as submitted here and stays fixed across later updates.
    pub fn register(
        &self,
        grant: &GrantV1,
        manager: &AccountId,
    ) -> Result<SubjectId, RegistryError> {
        validate_grant_v1_with_limits(grant, &self.limits)?;
        if grant.chain_id != self.local_chain {
            return Err(RegistryError::InvalidChain {
                declared: grant.chain_id,
                local: self.local_chain,
            });
        }
        let subject_id = grant
            .derive_id()
            .map_err(|e| RegistryError::Canonical(e.to_string()))?;
        // Vacancy discriminant: a stored record with a non-empty grantee.
        if let Some(existing) = self.store.get_grant(subject_id)? {
            if !existing.grantee.0.is_empty() {
                return Err(RegistryError::AlreadyExists(subject_id));
            }
        }
        self.store.put_grant(subject_id, grant)?;
        // A stale manager entry from a removed grant of identical content is
        // overwritten by the new registration.
        self.store.set_manager(subject_id, manager)?;
        info!(
            event = "grant_registered",
            subject_id = %subject_id,
            manager = %manager,
            program_label = %grant.program_label
        );
        Ok(subject_id)
    }

    /// Replace the grant content. The id does not change.
    pub fn update(
        &self,
        subject_id: SubjectId,
        new_grant: &GrantV1,
        caller: &AccountId,
    ) -> Result<(), RegistryError> {
        validate_grant_v1_with_limits(new_grant, &self.limits)?;
        self.require_present(subject_id)?;
        self.require_manager(subject_id, caller)?;
        self.store.put_grant(subject_id, new_grant)?;
        info!(event = "grant_updated", subject_id = %subject_id, caller = %caller);
        Ok(())
    }

    /// Delete the grant record. The manager entry is deliberately left in
    /// place; a re-registration of identical content overwrites it.
    pub fn remove(&self, subject_id: SubjectId, caller: &AccountId) -> Result<(), RegistryError> {
        self.require_present(subject_id)?;
        self.require_manager(subject_id, caller)?;
        self.store.delete_grant(subject_id)?;
        info!(event = "grant_removed", subject_id = %subject_id, caller = %caller);
        Ok(())
    }

    pub fn transfer_manager(
        &self,
        subject_id: SubjectId,
        new_manager: &AccountId,
        caller: &AccountId,
    ) -> Result<(), RegistryError> {
        self.require_present(subject_id)?;
        self.require_manager(subject_id, caller)?;
        self.store.set_manager(subject_id, new_manager)?;
        info!(
            event = "manager_transferred",
            subject_id = %subject_id,
            old = %caller,
            new = %new_manager
        );
        Ok(())
    }

    pub fn get_grant(&self, subject_id: SubjectId) -> Result<GrantV1, RegistryError> {
        self.store
            .get_grant(subject_id)?
            .ok_or(RegistryError::NotFound(subject_id))
    }

    pub fn get_manager(&self, subject_id: SubjectId) -> Result<Option<AccountId>, RegistryError> {
        Ok(self.store.get_manager(subject_id)?)
    }

    pub fn exists(&self, subject_id: SubjectId) -> Result<bool, RegistryError> {
        Ok(self.store.contains_grant(subject_id)?)
    }

    fn require_present(&self, subject_id: SubjectId) -> Result<(), RegistryError> {
        if !self.store.contains_grant(subject_id)? {
            return Err(RegistryError::NotFound(subject_id));
        }
        Ok(())
    }

    fn require_manager(
        &self,
        subject_id: SubjectId,
        caller: &AccountId,
    ) -> Result<(), RegistryError> {
        match self.store.get_manager(subject_id)? {
            Some(ref m) if m == caller => Ok(()),
            _ => Err(RegistryError::NotManager {
                subject_id,
                caller: caller.clone(),
            }),
        }
    }
}
