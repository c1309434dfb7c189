use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use shared::{PrStatus, UserScore};

/// A pull request row joined with its owner, project and (when present)
/// validator display fields.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub id: i32,
    pub github_number: i32,
    pub title: String,
    pub url: Option<String>,
    pub status: String,
    pub points: Option<i32>,
    pub is_validated: bool,
    pub validated_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub merged_at: Option<NaiveDateTime>,
    pub additions: i32,
    pub deletions: i32,
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub user_github_username: String,
    pub project_id: i32,
    pub project_name: String,
    pub project_repo_url: String,
    pub validator_name: Option<String>,
    pub validator_email: Option<String>,
}

/// Minimal row the validation workflow locks and inspects.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PullRequestRow {
    pub id: i32,
    pub user_id: i32,
    pub status: String,
    pub points: Option<i32>,
    pub is_validated: bool,
    pub additions: i32,
    pub deletions: i32,
}

impl PullRequestRow {
    pub fn status(&self) -> PrStatus {
        // The schema constrains the column to the three known values.
        self.status.parse().unwrap_or(PrStatus::Open)
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub github_username: String,
    pub role: String,
    pub total_prs: i32,
    pub merged_prs: i32,
    pub total_points: i32,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: i32,
    pub name: String,
    pub github_repo_url: String,
}

/// Whole-filtered-set aggregates. Sums are exact BIGINT sums; `total_points`
/// only counts validated rows.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PrStatsRecord {
    pub total: i64,
    pub total_points: i64,
    pub total_additions: i64,
    pub total_deletions: i64,
    pub merged_count: i64,
    pub open_count: i64,
}

/// Refreshed materialized totals returned by a user re-aggregation.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct UserTotalsRecord {
    pub total_prs: i32,
    pub merged_prs: i32,
    pub total_points: i32,
}

impl From<&UserRecord> for UserTotalsRecord {
    fn from(user: &UserRecord) -> Self {
        Self {
            total_prs: user.total_prs,
            merged_prs: user.merged_prs,
            total_points: user.total_points,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserScoreRecord {
    pub user_id: i32,
    pub login: String,
    pub name: String,
    pub points: i64,
    pub merged_prs: i64,
    pub first_merged_at: Option<NaiveDateTime>,
}

impl From<UserScoreRecord> for UserScore {
    fn from(record: UserScoreRecord) -> Self {
        Self {
            user_id: record.user_id,
            login: record.login,
            name: record.name,
            points: record.points,
            merged_prs: record.merged_prs,
            first_merged_at: record.first_merged_at,
        }
    }
}
