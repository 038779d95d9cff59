use rocket::{routes, Build, Rocket};

use crate::api;
use crate::config::Config;
use crate::database::DbPool;
use crate::sources::SourceConfig;

pub mod routes;

pub struct ServerState {
    pub config: Config,
    pub db_pool: DbPool,
    pub sources: Vec<SourceConfig>,
}

pub fn build_rocket(config: Config, db_pool: DbPool, sources: Vec<SourceConfig>) -> Rocket<Build> {
    let state = ServerState {
        config,
        db_pool,
        sources,
    };

    rocket::build().manage(state).mount(
        "/api",
        routes![
            routes::health::health_check,
            routes::health::index,
            api::run_scrape,
            api::get_leads,
            api::get_stats,
        ],
    )
}
