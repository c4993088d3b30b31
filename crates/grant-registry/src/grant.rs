#![forbid(unsafe_code)]

use score_core::{content_hash32, AccountId, CanonicalizeError, ChainId, ScaledU128, SubjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    #[default]
    Proposed,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

/// Planned disbursements: parallel arrays of equal length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementV1 {
    pub tokens: Vec<AccountId>,
    pub amounts: Vec<ScaledU128>,
    pub disbursed: Vec<bool>,
}

impl DisbursementV1 {
    pub fn is_uniform(&self) -> bool {
        self.tokens.len() == self.amounts.len() && self.amounts.len() == self.disbursed.len()
    }
}

/// Grant record (v1).
///
/// The subject id is `blake3(canonical_bytes(grant))` over the content at
/// registration time and is never recomputed after an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantV1 {
    pub chain_id: ChainId,
    pub grantee: AccountId,
    pub program_label: String,
    pub project_label: String,
    #[serde(default)]
    pub external_links: Vec<String>,
    pub start_date: u64,
    pub end_date: u64,
    #[serde(default)]
    pub status: GrantStatus,
    #[serde(default)]
    pub disbursement: DisbursementV1,
}

impl GrantV1 {
    /// Content address at creation time.
    pub fn derive_id(&self) -> Result<SubjectId, CanonicalizeError> {
        content_hash32(self)
    }
}
