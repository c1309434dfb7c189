use chrono::NaiveDateTime;
use rocket::fairing::{self, AdHoc};
use rocket::{Build, Rocket};
use rocket_db_pools::Database;
use shared::UserScore;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

pub mod filter;
pub mod types;

use filter::PrFilter;
use types::{
    ProjectRecord, PrStatsRecord, PullRequestRecord, PullRequestRow, UserRecord, UserScoreRecord,
    UserTotalsRecord,
};

use crate::error::Result;
use crate::sync::RemotePullRequest;

#[derive(Database, Clone, Debug)]
#[database("orbit-board")]
pub struct DB(PgPool);

const PR_SELECT: &str = r#"
SELECT pr.id, pr.github_number, pr.title, pr.url, pr.status, pr.points,
       pr.is_validated, pr.validated_at, pr.created_at, pr.merged_at,
       pr.additions, pr.deletions,
       u.id AS user_id, u.name AS user_name, u.email AS user_email,
       u.github_username AS user_github_username,
       p.id AS project_id, p.name AS project_name,
       p.github_repo_url AS project_repo_url,
       v.name AS validator_name, v.email AS validator_email
FROM pull_requests pr
JOIN users u ON pr.user_id = u.id
JOIN projects p ON pr.project_id = p.id
LEFT JOIN users v ON pr.validated_by = v.id
"#;

const PR_STATS_SELECT: &str = r#"
SELECT COUNT(*) AS total,
       COALESCE(SUM(pr.points) FILTER (WHERE pr.is_validated), 0)::BIGINT AS total_points,
       COALESCE(SUM(pr.additions), 0)::BIGINT AS total_additions,
       COALESCE(SUM(pr.deletions), 0)::BIGINT AS total_deletions,
       COUNT(*) FILTER (WHERE pr.status = 'merged') AS merged_count,
       COUNT(*) FILTER (WHERE pr.status = 'open') AS open_count
FROM pull_requests pr
"#;

impl DB {
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.0.begin().await?)
    }

    /// One page of matching pull requests plus aggregates over the entire
    /// filtered set. Both reads run inside a repeatable-read transaction so
    /// the page never contradicts the stats block.
    pub async fn aggregate_pull_requests(
        &self,
        filter: &PrFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<PullRequestRecord>, PrStatsRecord)> {
        let offset = page.saturating_sub(1) * limit;

        let mut tx = self.0.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(tx.as_mut())
            .await?;

        let mut items_query = QueryBuilder::new(PR_SELECT);
        filter.push_where(&mut items_query);
        items_query
            .push(" ORDER BY pr.created_at DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);
        let items = items_query
            .build_query_as::<PullRequestRecord>()
            .fetch_all(tx.as_mut())
            .await?;

        let mut stats_query = QueryBuilder::new(PR_STATS_SELECT);
        filter.push_where(&mut stats_query);
        let stats = stats_query
            .build_query_as::<PrStatsRecord>()
            .fetch_one(tx.as_mut())
            .await?;

        tx.commit().await?;
        Ok((items, stats))
    }

    pub async fn recent_pull_requests(
        &self,
        filter: &PrFilter,
        limit: u64,
    ) -> Result<Vec<PullRequestRecord>> {
        let mut query = QueryBuilder::new(PR_SELECT);
        filter.push_where(&mut query);
        query
            .push(" ORDER BY pr.created_at DESC LIMIT ")
            .push_bind(limit as i64);
        Ok(query
            .build_query_as::<PullRequestRecord>()
            .fetch_all(&self.0)
            .await?)
    }

    pub async fn get_pull_request(&self, id: i32) -> Result<Option<PullRequestRecord>> {
        let mut query = QueryBuilder::new(PR_SELECT);
        query.push(" WHERE pr.id = ").push_bind(id);
        Ok(query
            .build_query_as::<PullRequestRecord>()
            .fetch_optional(&self.0)
            .await?)
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<UserRecord>> {
        Ok(sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, name, email, github_username, role,
                   total_prs, merged_prs, total_points
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.0)
        .await?)
    }

    pub async fn get_project(&self, id: i32) -> Result<Option<ProjectRecord>> {
        Ok(sqlx::query_as::<_, ProjectRecord>(
            r#"
            SELECT id, name, github_repo_url
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.0)
        .await?)
    }

    /// Grouped sums of confirmed contributions, one row per user with at
    /// least one validated merged pull request in the window. Ordering and
    /// place assignment happen in `shared::build_leaderboard`.
    pub async fn user_scores(&self, cutoff: Option<NaiveDateTime>) -> Result<Vec<UserScore>> {
        let mut query = QueryBuilder::new(
            r#"
            SELECT u.id AS user_id, u.github_username AS login, u.name,
                   COALESCE(SUM(pr.points), 0)::BIGINT AS points,
                   COUNT(pr.id) AS merged_prs,
                   MIN(pr.merged_at) AS first_merged_at
            FROM pull_requests pr
            JOIN users u ON pr.user_id = u.id
            WHERE pr.is_validated AND pr.status = 'merged'
            "#,
        );
        if let Some(cutoff) = cutoff {
            query.push(" AND pr.validated_at >= ").push_bind(cutoff);
        }
        query.push(" GROUP BY u.id");

        let records = query
            .build_query_as::<UserScoreRecord>()
            .fetch_all(&self.0)
            .await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    pub async fn pull_request_for_update(
        tx: &mut Transaction<'static, Postgres>,
        id: i32,
    ) -> Result<Option<PullRequestRow>> {
        Ok(sqlx::query_as::<_, PullRequestRow>(
            r#"
            SELECT id, user_id, status, points, is_validated, additions, deletions
            FROM pull_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(tx.as_mut())
        .await?)
    }

    pub async fn apply_validation(
        tx: &mut Transaction<'static, Postgres>,
        pr_id: i32,
        validator_id: i32,
        points: i32,
        validated_at: NaiveDateTime,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE pull_requests
            SET is_validated = TRUE, validated_by = $2, validated_at = $3, points = $4
            WHERE id = $1
            "#,
        )
        .bind(pr_id)
        .bind(validator_id)
        .bind(validated_at)
        .bind(points)
        .execute(tx.as_mut())
        .await?;
        Ok(())
    }

    /// Refreshes a user's cached totals from the authoritative pull request
    /// set. Always a full re-aggregation, never an increment, so concurrent
    /// validations for the same user cannot lose an update.
    pub async fn recompute_user_totals(
        tx: &mut Transaction<'static, Postgres>,
        user_id: i32,
    ) -> Result<UserTotalsRecord> {
        Ok(sqlx::query_as::<_, UserTotalsRecord>(
            r#"
            UPDATE users
            SET total_prs = agg.total_prs,
                merged_prs = agg.merged_prs,
                total_points = agg.total_points
            FROM (
                SELECT COUNT(*)::INT AS total_prs,
                       COUNT(*) FILTER (WHERE status = 'merged')::INT AS merged_prs,
                       COALESCE(SUM(points) FILTER (WHERE is_validated), 0)::INT AS total_points
                FROM pull_requests
                WHERE user_id = $1
            ) AS agg
            WHERE users.id = $1
            RETURNING users.total_prs, users.merged_prs, users.total_points
            "#,
        )
        .bind(user_id)
        .fetch_one(tx.as_mut())
        .await?)
    }

    pub async fn find_user_by_github(
        tx: &mut Transaction<'static, Postgres>,
        login: &str,
    ) -> Result<Option<i32>> {
        Ok(
            sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE github_username = $1")
                .bind(login)
                .fetch_optional(tx.as_mut())
                .await?,
        )
    }

    /// Upserts a synced pull request keyed by its stable upstream identity.
    /// Validation state and points are never touched by sync. Returns true
    /// when the row was newly created.
    pub async fn upsert_synced_pull_request(
        tx: &mut Transaction<'static, Postgres>,
        project_id: i32,
        user_id: i32,
        pr: &RemotePullRequest,
    ) -> Result<bool> {
        // First try to update the pull request
        let rec = sqlx::query(
            r#"
            UPDATE pull_requests
            SET title = $3, url = $4, status = $5, created_at = $6, merged_at = $7,
                additions = $8, deletions = $9
            WHERE project_id = $1 AND github_number = $2
            RETURNING id
            "#,
        )
        .bind(project_id)
        .bind(pr.number)
        .bind(&pr.title)
        .bind(&pr.url)
        .bind(pr.status.to_string())
        .bind(pr.created_at)
        .bind(pr.merged_at)
        .bind(pr.additions as i32)
        .bind(pr.deletions as i32)
        .fetch_optional(tx.as_mut())
        .await?;

        // If the update did not find a matching row, insert the pull request
        if rec.is_some() {
            return Ok(false);
        }
        sqlx::query(
            r#"
            INSERT INTO pull_requests
                (project_id, user_id, github_number, title, url, status,
                 created_at, merged_at, additions, deletions)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (project_id, github_number) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(pr.number)
        .bind(&pr.title)
        .bind(&pr.url)
        .bind(pr.status.to_string())
        .bind(pr.created_at)
        .bind(pr.merged_at)
        .bind(pr.additions as i32)
        .bind(pr.deletions as i32)
        .execute(tx.as_mut())
        .await?;
        Ok(true)
    }
}

async fn run_migrations(rocket: Rocket<Build>) -> fairing::Result {
    match DB::fetch(&rocket) {
        Some(db) => match sqlx::migrate!("./migrations").run(&**db).await {
            Ok(_) => Ok(rocket),
            Err(e) => {
                rocket::error!("Failed to initialize SQLx database: {}", e);
                Err(rocket)
            }
        },
        None => Err(rocket),
    }
}

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("SQLx Stage", |rocket| async {
        rocket
            .attach(DB::init())
            .attach(AdHoc::try_on_ignite("SQLx Migrations", run_migrations))
    })
}
