use rocket::fairing::AdHoc;
use utoipa::OpenApi;

pub mod leaderboards;
pub mod pull_requests;
pub mod types;

#[derive(OpenApi)]
#[openapi(
    paths(
        pull_requests::list_pull_requests,
        pull_requests::recent_pull_requests,
        pull_requests::get_pull_request,
        pull_requests::user_pull_requests,
        pull_requests::project_pull_requests,
        pull_requests::validate_pull_request,
        pull_requests::sync_project,
        leaderboards::get_leaderboard,
    ),
    components(schemas(
        types::PaginatedPullRequestResponse,
        types::PaginatedLeaderboardResponse,
        types::PullRequestResponse,
        types::UserSummary,
        types::ProjectSummary,
        types::ValidatorSummary,
        types::ValidationInfo,
        types::GithubData,
        types::StatsResponse,
        types::LeaderboardResponse,
        types::ValidateRequest,
        types::UserTotalsResponse,
        types::ValidationResponse,
        types::SyncResponse,
    ))
)]
pub struct ApiDoc;

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket
            .mount(
                "/api/v1/pull-requests",
                rocket::routes![
                    pull_requests::list_pull_requests,
                    pull_requests::recent_pull_requests,
                    pull_requests::get_pull_request,
                    pull_requests::user_pull_requests,
                    pull_requests::project_pull_requests,
                    pull_requests::validate_pull_request,
                    pull_requests::sync_project,
                ],
            )
            .mount(
                "/api/v1/leaderboard",
                rocket::routes![leaderboards::get_leaderboard],
            )
    })
}
