#[macro_use]
extern crate rocket;

mod entrypoints;

use std::path::Path;

use orbit_board_server::db;
use orbit_board_server::github_pull::GithubClient;
use orbit_board_server::sync::VcsSource;
use shared::ScoringConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Debug, serde::Deserialize)]
pub struct Env {
    github_token: Option<String>,
    scoring_config: Option<String>,
}

#[launch]
async fn rocket() -> _ {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().pretty());
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let env = envy::from_env::<Env>().expect("Failed to load environment variables");
    let scoring = ScoringConfig::load(env.scoring_config.as_deref().map(Path::new))
        .expect("Failed to load scoring configuration");
    let github =
        GithubClient::new(env.github_token.clone()).expect("Failed to create GitHub client");
    let cors = rocket_cors::CorsOptions::default()
        .to_cors()
        .expect("Failed to build CORS fairing");

    let span = tracing::info_span!("Starting Rocket");
    let _enter = span.enter();

    rocket::build()
        .manage(scoring)
        .manage(Box::new(github) as Box<dyn VcsSource>)
        .attach(cors)
        .attach(db::stage())
        .attach(entrypoints::stage())
        .mount(
            "/",
            SwaggerUi::new("/swagger-ui/<_..>")
                .url("/api-docs/openapi.json", entrypoints::ApiDoc::openapi()),
        )
}
