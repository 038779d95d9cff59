use rocket::serde::json::Json;
use rocket::{get, State};
use serde_json::{json, Value};
use tracing::error;

use crate::database::SqliteLeadStore;
use crate::models::Lead;
use crate::server::ServerState;

#[get("/leads?<limit>")]
pub async fn get_leads(state: &State<ServerState>, limit: Option<i64>) -> Json<Vec<Lead>> {
    let store = SqliteLeadStore::new(state.db_pool.clone(), state.config.dedup.match_strategy);
    match store.recent(limit.unwrap_or(50).clamp(1, 500)).await {
        Ok(leads) => Json(leads),
        Err(e) => {
            error!("💾 Failed to load leads: {}", e);
            Json(Vec::new())
        }
    }
}

#[get("/stats")]
pub async fn get_stats(state: &State<ServerState>) -> Json<Value> {
    let store = SqliteLeadStore::new(state.db_pool.clone(), state.config.dedup.match_strategy);
    let total = store.count().await.unwrap_or(0);
    Json(json!({
        "total_leads": total,
        "sources": state.sources.iter().map(|s| s.name.clone()).collect::<Vec<_>>(),
    }))
}
