#![forbid(unsafe_code)]

use crate::grant::GrantV1;
use score_core::limits::{validate_bounded, validate_bounded_opt};
use score_core::ValidationLimits;

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid field: {0}")]
    Invalid(String),
    #[error("disbursement arrays have mismatched lengths")]
    LengthMismatch,
}

impl From<score_core::limits::LimitError> for ValidationError {
    fn from(e: score_core::limits::LimitError) -> Self {
        ValidationError::Invalid(e.to_string())
    }
}

pub fn validate_grant_v1(g: &GrantV1) -> Result<(), ValidationError> {
    validate_grant_v1_with_limits(g, &ValidationLimits::default())
}

pub fn validate_grant_v1_with_limits(
    g: &GrantV1,
    limits: &ValidationLimits,
) -> Result<(), ValidationError> {
    validate_bounded("grantee", &g.grantee.0, limits.max_account_bytes)?;
    validate_bounded(
        "program_label",
        &g.program_label,
        limits.label_max_len.min(limits.max_string_bytes),
    )?;
    validate_bounded(
        "project_label",
        &g.project_label,
        limits.label_max_len.min(limits.max_string_bytes),
    )?;
    if g.external_links.len() > limits.max_array_len {
        return Err(ValidationError::Invalid(format!(
            "external_links exceeds max entries {}",
            limits.max_array_len
        )));
    }
    for link in &g.external_links {
        validate_bounded_opt("external_link", link, limits.max_string_bytes)?;
    }
    if !g.disbursement.is_uniform() {
        return Err(ValidationError::LengthMismatch);
    }
    if g.end_date < g.start_date {
        return Err(ValidationError::Invalid(
            "end_date precedes start_date".to_string(),
        ));
    }
    Ok(())
}
