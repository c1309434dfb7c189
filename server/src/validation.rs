use chrono::Utc;
use shared::{ScoringConfig, UserRole};
use tracing::instrument;

use crate::db::types::{PullRequestRecord, PullRequestRow, UserTotalsRecord};
use crate::db::DB;
use crate::error::{Error, Result};

/// What applying a validation decision to a pull request amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationPlan {
    /// Confirm the pull request with these points.
    Validate { points: u32 },
    /// The same decision was already applied; nothing changes.
    AlreadyValidated,
    /// A negative decision on an unvalidated pull request; acknowledged,
    /// no state change.
    Declined,
}

/// Pure decision step of the workflow. Validation is one-way: a negative
/// decision on an already-validated pull request is a conflict, and a repeat
/// positive decision is a no-op rather than a double count.
pub fn plan(pr: &PullRequestRow, decision: bool, scoring: &ScoringConfig) -> Result<ValidationPlan> {
    match (pr.is_validated, decision) {
        (true, true) => Ok(ValidationPlan::AlreadyValidated),
        (true, false) => Err(Error::Conflict(format!(
            "pull request {} is validated and cannot be reverted",
            pr.id
        ))),
        (false, false) => Ok(ValidationPlan::Declined),
        (false, true) => {
            let points = match pr.points {
                Some(points) => points as u32,
                None => scoring.score(pr.status(), pr.additions as u32, pr.deletions as u32),
            };
            Ok(ValidationPlan::Validate { points })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub pull_request: PullRequestRecord,
    pub user_totals: UserTotalsRecord,
    pub newly_validated: bool,
}

/// Runs the validation state transition. The pull request update and the
/// owner's totals recompute happen in one transaction, sequenced so the
/// recompute reads the just-written validation state; readers observe either
/// both effects or neither.
#[instrument(skip(db, scoring))]
pub async fn validate_pull_request(
    db: &DB,
    scoring: &ScoringConfig,
    pr_id: i32,
    validator_id: i32,
    decision: bool,
) -> Result<ValidationOutcome> {
    let validator = db
        .get_user(validator_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {validator_id}")))?;
    let can_validate = validator
        .role
        .parse::<UserRole>()
        .map(|role| role.can_validate())
        .unwrap_or(false);
    if !can_validate {
        return Err(Error::Forbidden(format!(
            "user {validator_id} is not a mentor or admin"
        )));
    }

    let mut tx = db.begin().await?;
    let pr = DB::pull_request_for_update(&mut tx, pr_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("pull request {pr_id}")))?;

    match plan(&pr, decision, scoring)? {
        ValidationPlan::Validate { points } => {
            DB::apply_validation(&mut tx, pr_id, validator_id, points as i32, Utc::now().naive_utc())
                .await?;
            let user_totals = DB::recompute_user_totals(&mut tx, pr.user_id).await?;
            tx.commit().await?;

            let pull_request = db
                .get_pull_request(pr_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("pull request {pr_id}")))?;
            Ok(ValidationOutcome {
                pull_request,
                user_totals,
                newly_validated: true,
            })
        }
        ValidationPlan::AlreadyValidated | ValidationPlan::Declined => {
            drop(tx);
            let pull_request = db
                .get_pull_request(pr_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("pull request {pr_id}")))?;
            let owner = db
                .get_user(pr.user_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("user {}", pr.user_id)))?;
            Ok(ValidationOutcome {
                pull_request,
                user_totals: UserTotalsRecord::from(&owner),
                newly_validated: false,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(status: &str, points: Option<i32>, is_validated: bool) -> PullRequestRow {
        PullRequestRow {
            id: 1,
            user_id: 7,
            status: status.to_string(),
            points,
            is_validated,
            additions: 500,
            deletions: 10,
        }
    }

    #[test]
    fn unvalidated_merged_pr_gets_scored() {
        let scoring = ScoringConfig::embedded();
        let plan = plan(&pr("merged", None, false), true, &scoring).unwrap();
        let expected = scoring.score(shared::PrStatus::Merged, 500, 10);
        assert_eq!(plan, ValidationPlan::Validate { points: expected });
    }

    #[test]
    fn precomputed_points_are_kept() {
        let scoring = ScoringConfig::embedded();
        let plan = plan(&pr("merged", Some(7), false), true, &scoring).unwrap();
        assert_eq!(plan, ValidationPlan::Validate { points: 7 });
    }

    #[test]
    fn closed_pr_validates_to_zero_points() {
        let scoring = ScoringConfig::embedded();
        let plan = plan(&pr("closed", None, false), true, &scoring).unwrap();
        assert_eq!(plan, ValidationPlan::Validate { points: 0 });
    }

    #[test]
    fn repeat_validation_is_a_no_op() {
        let scoring = ScoringConfig::embedded();
        let plan = plan(&pr("merged", Some(50), true), true, &scoring).unwrap();
        assert_eq!(plan, ValidationPlan::AlreadyValidated);
    }

    #[test]
    fn un_validation_is_a_conflict() {
        let scoring = ScoringConfig::embedded();
        let result = plan(&pr("merged", Some(50), true), false, &scoring);
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn declining_an_unvalidated_pr_changes_nothing() {
        let scoring = ScoringConfig::embedded();
        let plan = plan(&pr("merged", None, false), false, &scoring).unwrap();
        assert_eq!(plan, ValidationPlan::Declined);
    }
}
