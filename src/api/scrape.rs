use std::sync::Arc;
use std::time::Duration;

use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{post, State};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::models::{Lead, SearchQuery};
use crate::pipeline::Prospector;
use crate::server::ServerState;
use crate::sources::ConfiguredSource;

// Matches the historical frontend contract: a run either returns the
// collected leads or one terminal error, never both.
const RUN_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    pub sector: String,
    pub location: String,
    pub max_results: usize,
    /// Listing source name from sources.yml; defaults to the first.
    pub source: Option<String>,
}

#[post("/scrape", data = "<request>")]
pub async fn run_scrape(
    state: &State<ServerState>,
    request: Json<ScrapeRequest>,
) -> Result<Json<Vec<Lead>>, Custom<Json<Value>>> {
    let source_config = match &request.source {
        Some(name) => state.sources.iter().find(|s| &s.name == name),
        None => state.sources.first(),
    };
    let Some(source_config) = source_config else {
        return Err(Custom(
            Status::BadRequest,
            Json(json!({"error": "No matching listing source configured"})),
        ));
    };

    let source = Arc::new(ConfiguredSource::new(source_config.clone()));
    let prospector = Prospector::assemble(state.config.clone(), state.db_pool.clone(), source)
        .map_err(|e| {
            error!("🛑 Pipeline setup failed: {}", e);
            Custom(
                Status::InternalServerError,
                Json(json!({"error": "Scraping failed", "details": e.to_string()})),
            )
        })?;

    let query = SearchQuery::new(request.sector.clone(), request.location.clone());
    match tokio::time::timeout(RUN_TIMEOUT, prospector.run(&query, request.max_results)).await {
        Ok(Ok(leads)) => Ok(Json(leads)),
        Ok(Err(e)) => {
            error!("🛑 Prospection failed: {}", e);
            Err(Custom(
                Status::InternalServerError,
                Json(json!({"error": "Scraping failed", "details": e.to_string()})),
            ))
        }
        Err(_) => Err(Custom(
            Status::InternalServerError,
            Json(json!({"error": "Scraping timed out"})),
        )),
    }
}
