pub mod health {
    use rocket::{get, serde::json::Json};
    use serde_json::{json, Value};

    #[get("/health")]
    pub async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "service": "lead-prospector-api"
        }))
    }

    #[get("/")]
    pub async fn index() -> Json<Value> {
        Json(json!({
            "name": "Lead Prospector API",
            "version": "0.1.0",
            "description": "B2B lead discovery and enrichment pipeline",
            "endpoints": {
                "health": "/api/health",
                "scrape": "POST /api/scrape",
                "leads": "/api/leads",
                "stats": "/api/stats"
            }
        }))
    }
}
