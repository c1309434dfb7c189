use orbit_board_server::db::filter::PrFilter;
use orbit_board_server::db::DB;
use orbit_board_server::error::{Error, Result};
use orbit_board_server::sync::{self, VcsSource};
use orbit_board_server::validation;
use rocket::serde::json::Json;
use rocket::State;
use shared::ScoringConfig;

use super::types::{
    PaginatedResponse, PullRequestResponse, SyncResponse, ValidateRequest, ValidationResponse,
};

const MAX_PAGE_SIZE: u64 = 100;

fn page_params(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    (
        page.unwrap_or(1).max(1),
        limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE),
    )
}

#[utoipa::path(context_path = "/api/v1/pull-requests", responses(
    (status = 200, description = "List pull requests with whole-set stats", body = PaginatedPullRequestResponse)
))]
#[get("/?<page>&<limit>&<status>&<user>&<project>&<is_validated>")]
pub async fn list_pull_requests(
    db: &DB,
    page: Option<u64>,
    limit: Option<u64>,
    status: Option<String>,
    user: Option<i32>,
    project: Option<i32>,
    is_validated: Option<String>,
) -> Result<Json<PaginatedResponse<PullRequestResponse>>> {
    let (page, limit) = page_params(page, limit);
    let filter = PrFilter::from_query(status.as_deref(), user, project, is_validated.as_deref())?;
    let (records, stats) = db.aggregate_pull_requests(&filter, page, limit).await?;
    Ok(Json(
        PaginatedResponse::new(
            records.into_iter().map(Into::into).collect(),
            page,
            limit,
            stats.total as u64,
        )
        .with_stats(stats.into()),
    ))
}

#[utoipa::path(context_path = "/api/v1/pull-requests", responses(
    (status = 200, description = "Most recent pull requests, no pagination metadata", body = [PullRequestResponse])
))]
#[get("/recent?<limit>&<status>&<project>")]
pub async fn recent_pull_requests(
    db: &DB,
    limit: Option<u64>,
    status: Option<String>,
    project: Option<i32>,
) -> Result<Json<Vec<PullRequestResponse>>> {
    let limit = limit.unwrap_or(10).clamp(1, MAX_PAGE_SIZE);
    let filter = PrFilter::from_query(status.as_deref(), None, project, None)?;
    let records = db.recent_pull_requests(&filter, limit).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

#[utoipa::path(context_path = "/api/v1/pull-requests", responses(
    (status = 200, description = "Single pull request with full joins", body = PullRequestResponse),
    (status = 404, description = "Unknown pull request")
))]
#[get("/<id>")]
pub async fn get_pull_request(db: &DB, id: i32) -> Result<Json<PullRequestResponse>> {
    let record = db
        .get_pull_request(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("pull request {id}")))?;
    Ok(Json(record.into()))
}

#[utoipa::path(context_path = "/api/v1/pull-requests", responses(
    (status = 200, description = "A user's pull requests plus confirmed total points", body = PaginatedPullRequestResponse),
    (status = 404, description = "Unknown user")
))]
#[get("/user/<user_id>?<page>&<limit>&<status>&<is_validated>")]
pub async fn user_pull_requests(
    db: &DB,
    user_id: i32,
    page: Option<u64>,
    limit: Option<u64>,
    status: Option<String>,
    is_validated: Option<String>,
) -> Result<Json<PaginatedResponse<PullRequestResponse>>> {
    let user = db
        .get_user(user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {user_id}")))?;
    let (page, limit) = page_params(page, limit);
    let filter = PrFilter::from_query(status.as_deref(), None, None, is_validated.as_deref())?
        .with_user(user_id);
    let (records, stats) = db.aggregate_pull_requests(&filter, page, limit).await?;
    Ok(Json(
        PaginatedResponse::new(
            records.into_iter().map(Into::into).collect(),
            page,
            limit,
            stats.total as u64,
        )
        .with_total_points(user.total_points as i64),
    ))
}

#[utoipa::path(context_path = "/api/v1/pull-requests", responses(
    (status = 200, description = "A project's pull requests plus whole-set stats", body = PaginatedPullRequestResponse),
    (status = 404, description = "Unknown project")
))]
#[get("/project/<project_id>?<page>&<limit>&<status>&<is_validated>")]
pub async fn project_pull_requests(
    db: &DB,
    project_id: i32,
    page: Option<u64>,
    limit: Option<u64>,
    status: Option<String>,
    is_validated: Option<String>,
) -> Result<Json<PaginatedResponse<PullRequestResponse>>> {
    db.get_project(project_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("project {project_id}")))?;
    let (page, limit) = page_params(page, limit);
    let filter = PrFilter::from_query(status.as_deref(), None, None, is_validated.as_deref())?
        .with_project(project_id);
    let (records, stats) = db.aggregate_pull_requests(&filter, page, limit).await?;
    Ok(Json(
        PaginatedResponse::new(
            records.into_iter().map(Into::into).collect(),
            page,
            limit,
            stats.total as u64,
        )
        .with_stats(stats.into()),
    ))
}

#[utoipa::path(context_path = "/api/v1/pull-requests", responses(
    (status = 200, description = "Validation applied (or idempotently re-acknowledged)", body = ValidationResponse),
    (status = 404, description = "Unknown pull request or validator"),
    (status = 409, description = "Attempted to revert a validation")
))]
#[put("/<id>/validate", data = "<request>")]
pub async fn validate_pull_request(
    db: &DB,
    scoring: &State<ScoringConfig>,
    id: i32,
    request: Json<ValidateRequest>,
) -> Result<Json<ValidationResponse>> {
    let outcome = validation::validate_pull_request(
        db,
        scoring.inner(),
        id,
        request.validator_id,
        request.decision,
    )
    .await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(context_path = "/api/v1/pull-requests", responses(
    (status = 200, description = "Project reconciled with its upstream repository", body = SyncResponse),
    (status = 404, description = "Unknown project"),
    (status = 502, description = "Upstream source unreachable")
))]
#[post("/sync/<project_id>")]
pub async fn sync_project(
    db: &DB,
    source: &State<Box<dyn VcsSource>>,
    project_id: i32,
) -> Result<Json<SyncResponse>> {
    let outcome = sync::sync_project(db, source.as_ref(), project_id).await?;
    Ok(Json(outcome.into()))
}
