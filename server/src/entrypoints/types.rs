use chrono::NaiveDateTime;
use orbit_board_server::db::types::{
    PrStatsRecord, PullRequestRecord, UserTotalsRecord,
};
use orbit_board_server::sync::SyncOutcome;
use orbit_board_server::validation::ValidationOutcome;
use serde::{Deserialize, Serialize};
use shared::RankedEntry;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, Default, ToSchema)]
#[aliases(PaginatedPullRequestResponse = PaginatedResponse<PullRequestResponse>, PaginatedLeaderboardResponse = PaginatedResponse<LeaderboardResponse>)]
pub struct PaginatedResponse<T: Serialize> {
    pub records: Vec<T>,
    pub page: u64,
    pub total_pages: u64,
    pub limit: u64,
    pub total_records: u64,
    /// Aggregates over the whole filtered set, not just this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsResponse>,
    /// Confirmed points of the listed user, present on per-user listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_points: Option<i64>,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(records: Vec<T>, page: u64, limit: u64, total_records: u64) -> Self {
        let extra_page = if total_records % limit == 0 { 0 } else { 1 };
        let total_pages = (total_records / limit) + extra_page;
        Self {
            records,
            page,
            total_pages,
            limit,
            total_records,
            stats: None,
            total_points: None,
        }
    }

    pub fn with_stats(mut self, stats: StatsResponse) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_total_points(mut self, total_points: i64) -> Self {
        self.total_points = Some(total_points);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub github_username: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectSummary {
    pub id: i32,
    pub name: String,
    pub github_repo_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidatorSummary {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidationInfo {
    pub is_validated: bool,
    pub validated_by: Option<ValidatorSummary>,
    pub validated_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GithubData {
    pub created_at: NaiveDateTime,
    pub merged_at: Option<NaiveDateTime>,
    pub additions: i32,
    pub deletions: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PullRequestResponse {
    pub id: i32,
    pub number: i32,
    pub title: String,
    pub url: Option<String>,
    pub status: String,
    /// Raw (possibly pending) points; only counted in totals once validated.
    pub points: Option<i32>,
    pub user: UserSummary,
    pub project: ProjectSummary,
    pub validation: ValidationInfo,
    pub github_data: GithubData,
}

impl From<PullRequestRecord> for PullRequestResponse {
    fn from(record: PullRequestRecord) -> Self {
        let validated_by = match (record.validator_name, record.validator_email) {
            (Some(name), Some(email)) => Some(ValidatorSummary { name, email }),
            _ => None,
        };
        Self {
            id: record.id,
            number: record.github_number,
            title: record.title,
            url: record.url,
            status: record.status,
            points: record.points,
            user: UserSummary {
                id: record.user_id,
                name: record.user_name,
                email: record.user_email,
                github_username: record.user_github_username,
            },
            project: ProjectSummary {
                id: record.project_id,
                name: record.project_name,
                github_repo_url: record.project_repo_url,
            },
            validation: ValidationInfo {
                is_validated: record.is_validated,
                validated_by,
                validated_at: record.validated_at,
            },
            github_data: GithubData {
                created_at: record.created_at,
                merged_at: record.merged_at,
                additions: record.additions,
                deletions: record.deletions,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, ToSchema)]
pub struct StatsResponse {
    pub total_points: i64,
    pub total_additions: i64,
    pub total_deletions: i64,
    pub merged_count: i64,
    pub open_count: i64,
}

impl From<PrStatsRecord> for StatsResponse {
    fn from(record: PrStatsRecord) -> Self {
        Self {
            total_points: record.total_points,
            total_additions: record.total_additions,
            total_deletions: record.total_deletions,
            merged_count: record.merged_count,
            open_count: record.open_count,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardResponse {
    pub place: u32,
    pub user_id: i32,
    pub name: String,
    pub github_username: String,
    pub points: i64,
    pub merged_prs: i64,
}

impl From<RankedEntry> for LeaderboardResponse {
    fn from(entry: RankedEntry) -> Self {
        Self {
            place: entry.place,
            user_id: entry.user_id,
            name: entry.name,
            github_username: entry.login,
            points: entry.points,
            merged_prs: entry.merged_prs,
        }
    }
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct ValidateRequest {
    pub validator_id: i32,
    pub decision: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UserTotalsResponse {
    pub total_prs: i32,
    pub merged_prs: i32,
    pub total_points: i32,
}

impl From<UserTotalsRecord> for UserTotalsResponse {
    fn from(record: UserTotalsRecord) -> Self {
        Self {
            total_prs: record.total_prs,
            merged_prs: record.merged_prs,
            total_points: record.total_points,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ValidationResponse {
    pub newly_validated: bool,
    pub pull_request: PullRequestResponse,
    pub user_totals: UserTotalsResponse,
}

impl From<ValidationOutcome> for ValidationResponse {
    fn from(outcome: ValidationOutcome) -> Self {
        Self {
            newly_validated: outcome.newly_validated,
            pull_request: outcome.pull_request.into(),
            user_totals: outcome.user_totals.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SyncResponse {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
}

impl From<SyncOutcome> for SyncResponse {
    fn from(outcome: SyncOutcome) -> Self {
        Self {
            created: outcome.created,
            updated: outcome.updated,
            skipped: outcome.skipped,
        }
    }
}
