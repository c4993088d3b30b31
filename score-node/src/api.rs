#![forbid(unsafe_code)]

use crate::metrics;
use badge_catalog::{BadgeCatalog, BadgeStore, BadgeV1, CatalogError};
use grant_registry::{GrantRegistry, GrantStore, GrantV1, RegistryError};
use review_ledger::{
    AdminBootstrap, LedgerError, LedgerStore, ProgramAggregateV1, ProgramKey, ReviewLedger, StoryV1,
};
use score_core::{AccountId, BadgeId, ChainId, Hex32, ScorerId, SubjectId};
use score_set::{LegacyScore, ScoreSet, ScoreSetError, ScorerStore};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DuplicateBadge(_) => ApiError::Conflict(e.to_string()),
            CatalogError::Validation(_) => ApiError::BadRequest(e.to_string()),
            CatalogError::Canonical(_) | CatalogError::Store(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(_) => ApiError::NotFound(e.to_string()),
            RegistryError::AlreadyExists(_) => ApiError::Conflict(e.to_string()),
            RegistryError::NotManager { .. } => ApiError::Forbidden(e.to_string()),
            RegistryError::InvalidChain { .. } | RegistryError::Validation(_) => {
                ApiError::BadRequest(e.to_string())
            }
            RegistryError::Canonical(_) | RegistryError::Store(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<ScoreSetError> for ApiError {
    fn from(e: ScoreSetError) -> Self {
        match e {
            ScoreSetError::NotFound(_) | ScoreSetError::NoBadges(..) => {
                ApiError::NotFound(e.to_string())
            }
            ScoreSetError::AlreadyPresent(_) => ApiError::Conflict(e.to_string()),
            ScoreSetError::NotManager { .. } => ApiError::Forbidden(e.to_string()),
            ScoreSetError::LengthMismatch { .. }
            | ScoreSetError::NotPresent(_)
            | ScoreSetError::InvalidBadgeId
            | ScoreSetError::Arith(_) => ApiError::BadRequest(e.to_string()),
            ScoreSetError::Store(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotAuthorized(_) | LedgerError::NotOwner(_) => {
                ApiError::Forbidden(e.to_string())
            }
            LedgerError::OutOfRange { .. } | LedgerError::NotReviewed(_) => {
                ApiError::NotFound(e.to_string())
            }
            LedgerError::ScorerNotBound
            | LedgerError::UnknownBadge(_)
            | LedgerError::LengthMismatch { .. }
            | LedgerError::EmptyReview
            | LedgerError::Arith(_)
            | LedgerError::Source(_) => ApiError::BadRequest(e.to_string()),
            LedgerError::Store(_) => ApiError::Internal(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBadgeRequestV1 {
    pub badge: BadgeV1,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBadgeResponseV1 {
    pub schema_version: u32,
    pub badge_id: BadgeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterGrantRequestV1 {
    pub grant: GrantV1,
    pub manager: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterGrantResponseV1 {
    pub schema_version: u32,
    pub subject_id: SubjectId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateGrantRequestV1 {
    pub grant: GrantV1,
    pub caller: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerRequestV1 {
    pub caller: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferManagerRequestV1 {
    pub new_manager: AccountId,
    pub caller: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterScorerRequestV1 {
    pub manager: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver: Option<AccountId>,
    pub badge_ids: Vec<BadgeId>,
    pub badge_scores: Vec<u64>,
    pub decimals: u8,
    #[serde(default)]
    pub metadata_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterScorerResponseV1 {
    pub schema_version: u32,
    pub scorer_id: ScorerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddScorerBadgeRequestV1 {
    pub badge_id: BadgeId,
    pub score: u64,
    pub caller: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBadgeRequestV1 {
    pub badge_id: BadgeId,
    pub caller: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewRequestV1 {
    pub caller: AccountId,
    pub subject_id: SubjectId,
    pub tx_ref: Hex32,
    pub program_key: String,
    pub badge_ids: Vec<BadgeId>,
    pub scores: Vec<u8>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewResponseV1 {
    pub schema_version: u32,
    pub aggregate: ProgramAggregateV1,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreOfRequestV1 {
    /// Opaque payload, hex-encoded.
    pub payload_hex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreOfResponseV1 {
    pub schema_version: u32,
    pub success: bool,
    /// Scaled integer score encoded as a string.
    pub score: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramScoreResponseV1 {
    pub schema_version: u32,
    pub total_review_count: u64,
    pub valid_review_count: u64,
    /// Scaled integer average encoded as a string.
    pub running_average: String,
}

/// Facade over the four registries, sharing one sled database.
#[derive(Clone)]
pub struct RegistryApi {
    catalog: BadgeCatalog,
    grants: GrantRegistry,
    scorers: ScoreSet,
    ledger: ReviewLedger,
}

impl RegistryApi {
    pub fn open(
        data_dir: impl AsRef<Path>,
        chain_id: ChainId,
        bootstrap: AdminBootstrap,
    ) -> Result<Self, ApiError> {
        let db = sled::open(data_dir).map_err(|e| ApiError::Internal(e.to_string()))?;
        let catalog = BadgeCatalog::with_store(
            BadgeStore::open_in(&db).map_err(|e| ApiError::Internal(e.to_string()))?,
        );
        let grants = GrantRegistry::with_store(
            GrantStore::open_in(&db).map_err(|e| ApiError::Internal(e.to_string()))?,
            chain_id,
        );
        let scorers = ScoreSet::with_store(
            ScorerStore::open_in(&db).map_err(|e| ApiError::Internal(e.to_string()))?,
        );
        let ledger = ReviewLedger::with_store(
            LedgerStore::open_in(&db).map_err(|e| ApiError::Internal(e.to_string()))?,
            bootstrap,
        )
        .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(Self {
            catalog,
            grants,
            scorers,
            ledger,
        })
    }

    pub fn create_badge(&self, body: &[u8]) -> Result<CreateBadgeResponseV1, ApiError> {
        let req: CreateBadgeRequestV1 = parse(body)?;
        let badge_id = self.record("badge", self.catalog.create(&req.badge))?;
        Ok(CreateBadgeResponseV1 {
            schema_version: 1,
            badge_id,
        })
    }

    pub fn get_badge(&self, id_hex: &str) -> Result<BadgeV1, ApiError> {
        let badge_id = parse_hex32(id_hex)?;
        self.catalog
            .get(badge_id)?
            .ok_or_else(|| ApiError::NotFound(format!("badge not found: {badge_id}")))
    }

    pub fn register_grant(&self, body: &[u8]) -> Result<RegisterGrantResponseV1, ApiError> {
        let req: RegisterGrantRequestV1 = parse(body)?;
        let subject_id = self.record("grant", self.grants.register(&req.grant, &req.manager))?;
        Ok(RegisterGrantResponseV1 {
            schema_version: 1,
            subject_id,
        })
    }

    pub fn get_grant(&self, id_hex: &str) -> Result<GrantV1, ApiError> {
        Ok(self.grants.get_grant(parse_hex32(id_hex)?)?)
    }

    pub fn update_grant(&self, id_hex: &str, body: &[u8]) -> Result<(), ApiError> {
        let req: UpdateGrantRequestV1 = parse(body)?;
        self.record(
            "grant",
            self.grants.update(parse_hex32(id_hex)?, &req.grant, &req.caller),
        )
    }

    pub fn remove_grant(&self, id_hex: &str, body: &[u8]) -> Result<(), ApiError> {
        let req: CallerRequestV1 = parse(body)?;
        self.record("grant", self.grants.remove(parse_hex32(id_hex)?, &req.caller))
    }

    pub fn transfer_grant_manager(&self, id_hex: &str, body: &[u8]) -> Result<(), ApiError> {
        let req: TransferManagerRequestV1 = parse(body)?;
        self.record(
            "grant",
            self.grants
                .transfer_manager(parse_hex32(id_hex)?, &req.new_manager, &req.caller),
        )
    }

    pub fn register_scorer(&self, body: &[u8]) -> Result<RegisterScorerResponseV1, ApiError> {
        let req: RegisterScorerRequestV1 = parse(body)?;
        let scorer_id = self.record(
            "scorer",
            self.scorers.register_scorer(
                req.manager,
                req.resolver,
                &req.badge_ids,
                &req.badge_scores,
                req.decimals,
                req.metadata_uri,
            ),
        )?;
        Ok(RegisterScorerResponseV1 {
            schema_version: 1,
            scorer_id,
        })
    }

    pub fn add_scorer_badge(&self, id: &str, body: &[u8]) -> Result<(), ApiError> {
        let req: AddScorerBadgeRequestV1 = parse(body)?;
        self.record(
            "scorer",
            self.scorers
                .add_badge(parse_scorer_id(id)?, req.badge_id, req.score, &req.caller),
        )
    }

    pub fn remove_scorer_badge(
        &self,
        id: &str,
        badge_hex: &str,
        body: &[u8],
    ) -> Result<(), ApiError> {
        let req: CallerRequestV1 = parse(body)?;
        self.record(
            "scorer",
            self.scorers
                .remove_badge(parse_scorer_id(id)?, parse_hex32(badge_hex)?, &req.caller),
        )
    }

    pub fn grant_account_badge(&self, id: &str, account: &str, body: &[u8]) -> Result<(), ApiError> {
        let req: AccountBadgeRequestV1 = parse(body)?;
        self.record(
            "scorer",
            self.scorers.grant_badge(
                parse_scorer_id(id)?,
                &AccountId::new(account),
                req.badge_id,
                &req.caller,
            ),
        )
    }

    pub fn revoke_account_badge(
        &self,
        id: &str,
        account: &str,
        body: &[u8],
    ) -> Result<(), ApiError> {
        let req: AccountBadgeRequestV1 = parse(body)?;
        self.record(
            "scorer",
            self.scorers.revoke_badge(
                parse_scorer_id(id)?,
                &AccountId::new(account),
                req.badge_id,
                &req.caller,
            ),
        )
    }

    pub fn legacy_score(&self, id: &str, account: &str) -> Result<LegacyScore, ApiError> {
        Ok(self
            .scorers
            .legacy_score_of(&AccountId::new(account), parse_scorer_id(id)?)?)
    }

    pub fn submit_review(&self, body: &[u8]) -> Result<SubmitReviewResponseV1, ApiError> {
        let req: SubmitReviewRequestV1 = parse(body)?;
        let result = self.ledger.submit_review(
            &self.scorers,
            &req.caller,
            req.subject_id,
            req.tx_ref,
            &ProgramKey::new(req.program_key),
            &req.badge_ids,
            &req.scores,
            req.timestamp,
        );
        match result {
            Ok(aggregate) => {
                metrics::record_review("applied");
                Ok(SubmitReviewResponseV1 {
                    schema_version: 1,
                    aggregate,
                })
            }
            Err(e) => {
                metrics::record_review("rejected");
                Err(e.into())
            }
        }
    }

    pub fn get_stories(&self, subject_hex: &str) -> Result<Vec<StoryV1>, ApiError> {
        Ok(self.ledger.get_stories(parse_hex32(subject_hex)?)?)
    }

    pub fn program_score(&self, key: &str) -> Result<ProgramScoreResponseV1, ApiError> {
        let program = ProgramKey::new(key);
        let average = self.ledger.get_average_score(&program)?;
        let (total, valid) = self.ledger.get_review_counts(&program)?;
        Ok(ProgramScoreResponseV1 {
            schema_version: 1,
            total_review_count: total,
            valid_review_count: valid,
            running_average: average.to_string(),
        })
    }

    pub fn score_of(&self, body: &[u8]) -> Result<ScoreOfResponseV1, ApiError> {
        let req: ScoreOfRequestV1 = parse(body)?;
        let payload = hex::decode(&req.payload_hex)
            .map_err(|e| ApiError::BadRequest(format!("invalid payload hex: {e}")))?;
        let (success, score) = self.ledger.score_of(&payload);
        Ok(ScoreOfResponseV1 {
            schema_version: 1,
            success,
            score: score.to_string(),
        })
    }

    fn record<T, E>(&self, registry: &str, r: Result<T, E>) -> Result<T, ApiError>
    where
        ApiError: From<E>,
    {
        match r {
            Ok(v) => {
                metrics::record_action(registry, "applied");
                Ok(v)
            }
            Err(e) => {
                metrics::record_action(registry, "rejected");
                Err(ApiError::from(e))
            }
        }
    }
}

fn parse<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn parse_hex32(s: &str) -> Result<Hex32, ApiError> {
    Hex32::from_hex(s).map_err(ApiError::BadRequest)
}

fn parse_scorer_id(s: &str) -> Result<ScorerId, ApiError> {
    s.parse::<u64>()
        .map(ScorerId)
        .map_err(|e| ApiError::BadRequest(format!("invalid scorer id: {e}")))
}
