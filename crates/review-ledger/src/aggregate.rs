#![forbid(unsafe_code)]

//! The incremental-average-under-revision fold.
//!
//! All arithmetic is unsigned `u128`, checked, with ceiling division. The
//! fold keeps only the count and the ceiling-rounded mean of the latest
//! contribution per subject, never the contributions themselves.

use score_core::arith::{ceil_div, checked_add, checked_mul, checked_sub, ArithError};
use score_core::ScaledU128;
use serde::{Deserialize, Serialize};

/// Running aggregate for one program key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramAggregateV1 {
    /// Every story ever submitted for this program, revisions included.
    pub total_review_count: u64,
    /// Distinct subjects currently contributing their latest story.
    pub valid_review_count: u64,
    /// Ceiling-rounded mean of the latest story average per subject.
    pub running_average: ScaledU128,
}

/// Fold one story average into the aggregate.
///
/// `prior_contribution` is the average of the subject's most recent story
/// previously folded into this program, `None` when this subject has never
/// reviewed it. A subject reviewing several programs is a new contributor
/// to each of them.
pub fn fold_story(
    aggregate: &ProgramAggregateV1,
    story_average: ScaledU128,
    prior_contribution: Option<ScaledU128>,
) -> Result<ProgramAggregateV1, ArithError> {
    let valid = u128::from(aggregate.valid_review_count);
    let avg = aggregate.running_average.0;
    let story = story_average.0;

    let (new_avg, new_valid) = match prior_contribution {
        // Case A: first contribution to this program.
        _ if valid == 0 => (story, 1),
        // Case B: new contributor joins existing contributors.
        None => {
            let widened = checked_mul(avg, valid, "running average widening")?;
            let summed = checked_add(widened, story, "running average fold")?;
            (ceil_div(summed, valid + 1)?, valid + 1)
        }
        // Case C: the sole contributor revises; the new story overwrites.
        Some(_) if valid == 1 => (story, 1),
        // Case D: general revision at constant contributor count. Back out
        // the subject's previous contribution, then fold in the new one.
        Some(prior_avg) => {
            let widened = checked_mul(avg, valid, "running average widening")?;
            // Holds because the ceiling-rounded mean times the count is never
            // below the sum of contributions.
            let without = checked_sub(widened, prior_avg.0, "running average back-out")?;
            let prior = ceil_div(without, valid - 1)?;
            let rebuilt = checked_mul(prior, valid - 1, "running average rebuild")?;
            let summed = checked_add(rebuilt, story, "running average fold")?;
            (ceil_div(summed, valid)?, valid)
        }
    };

    Ok(ProgramAggregateV1 {
        total_review_count: aggregate.total_review_count.saturating_add(1),
        valid_review_count: u64::try_from(new_valid).unwrap_or(u64::MAX),
        running_average: ScaledU128(new_avg),
    })
}
