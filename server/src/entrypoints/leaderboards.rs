use chrono::Utc;
use orbit_board_server::db::DB;
use orbit_board_server::error::{Error, Result};
use rocket::serde::json::Json;
use shared::{build_leaderboard, LeaderboardWindow};

use super::types::{LeaderboardResponse, PaginatedResponse};

#[utoipa::path(context_path = "/api/v1/leaderboard", responses(
    (status = 200, description = "Ranked contributors for the requested window", body = PaginatedLeaderboardResponse),
    (status = 400, description = "Unknown window value")
))]
#[get("/?<window>&<page>&<limit>")]
pub async fn get_leaderboard(
    db: &DB,
    window: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
) -> Result<Json<PaginatedResponse<LeaderboardResponse>>> {
    let window = window
        .as_deref()
        .unwrap_or("overall")
        .parse::<LeaderboardWindow>()
        .map_err(|_| {
            Error::InvalidFilter(format!(
                "unknown leaderboard window `{}`",
                window.as_deref().unwrap_or_default()
            ))
        })?;
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(50).clamp(1, 100);

    // Places are assigned over the full contributor set, then paged, so a
    // page boundary never shifts anyone's place.
    let ranked = build_leaderboard(db.user_scores(window.cutoff(Utc::now())).await?);
    let total = ranked.len() as u64;
    let records = ranked
        .into_iter()
        .skip((page.saturating_sub(1) * limit) as usize)
        .take(limit as usize)
        .map(Into::into)
        .collect();
    Ok(Json(PaginatedResponse::new(records, page, limit, total)))
}
