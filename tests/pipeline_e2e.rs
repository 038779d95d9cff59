use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lead_prospector::config::Config;
use lead_prospector::database::{create_db_pool, DbPool, SqliteLeadStore};
use lead_prospector::enrich::MxLookup;
use lead_prospector::fetcher::HttpFetcher;
use lead_prospector::models::{EmailStatus, SearchQuery};
use lead_prospector::pipeline::Prospector;
use lead_prospector::sources::{AdvanceMode, ConfiguredSource, SourceConfig};

struct NoMx;

#[async_trait]
impl MxLookup for NoMx {
    async fn has_mx(&self, _domain: &str) -> bool {
        false
    }
}

fn listing_html(base: &str, ids: &[u32]) -> String {
    let links = ids
        .iter()
        .map(|id| format!(r#"<li><a href="{}/profil/cabinet-{}">Cabinet {}</a></li>"#, base, id, id))
        .collect::<Vec<_>>()
        .join("\n");
    format!("<html><body><ul>{}</ul></body></html>", links)
}

fn profile_html(id: u32) -> String {
    format!(
        r#"<html><body>
            <h1>Cabinet Martin {id}</h1>
            <p>12 rue des Lilas, 75011 Paris</p>
            <p>Tél 01 42 68 53 0{last}</p>
            <a href="mailto:contact@cabinet-{id}.test">Nous écrire</a>
        </body></html>"#,
        id = id,
        last = id % 10,
    )
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.retry.max_attempts = 1;
    config.retry.base_delay_ms = 1;
    config.retry.jitter_ms = 0;
    config.registry.enabled = false;
    config
}

fn source_for(server: &MockServer) -> SourceConfig {
    SourceConfig {
        name: "annuaire-test".to_string(),
        base_url: server.uri(),
        path_template: "/avocat/departement-75/page-{page}".to_string(),
        mode: AdvanceMode::Pagination,
        page_size: 4,
        profile_link_pattern: "/profil/".to_string(),
        empty_page_threshold: None,
    }
}

async fn mount_directory(server: &MockServer) {
    // Seven businesses across two listing pages, then the directory
    // runs dry.
    Mock::given(method("GET"))
        .and(path("/avocat/departement-75/page-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&server.uri(), &[1, 2, 3, 4])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/avocat/departement-75/page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&server.uri(), &[5, 6, 7])))
        .mount(server)
        .await;
    for id in 1..=7u32 {
        Mock::given(method("GET"))
            .and(path(format!("/profil/cabinet-{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(profile_html(id)))
            .mount(server)
            .await;
    }
    // Everything else (further listing pages) is empty, not an error.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
        .with_priority(250)
        .mount(server)
        .await;
}

async fn prospector(config: Config, server: &MockServer, db_pool: DbPool) -> Prospector {
    let source = Arc::new(ConfiguredSource::new(source_for(server)));
    let fetcher = Arc::new(HttpFetcher::new(&config.http, &config.retry).unwrap());
    let store = Arc::new(SqliteLeadStore::new(db_pool, config.dedup.match_strategy));
    Prospector::new(config, source, fetcher, store, Arc::new(NoMx), None)
}

#[tokio::test]
async fn collects_exactly_the_requested_number_of_unique_leads() {
    let server = MockServer::start().await;
    mount_directory(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("leads.db");
    let db_pool = create_db_pool(db_path.to_str().unwrap()).await.unwrap();

    let prospector = prospector(fast_config(), &server, db_pool).await;
    let leads = prospector
        .run(&SearchQuery::new("Avocat", "75"), 5)
        .await
        .unwrap();

    assert_eq!(leads.len(), 5);
    let names: HashSet<&str> = leads.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names.len(), 5, "every lead must be a distinct business");

    for lead in &leads {
        assert_eq!(lead.sector, "Avocat");
        assert_eq!(lead.city, "75");
        assert_eq!(lead.emails.len(), 1);
        // MX says no for every domain here, so a found address is
        // risky rather than valid.
        assert_eq!(lead.email_status, EmailStatus::Risky);
        assert!(lead.phone.is_some());
        assert!(lead.quality_score > 0);
    }
}

#[tokio::test]
async fn second_run_skips_already_recorded_businesses() {
    let server = MockServer::start().await;
    mount_directory(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("leads.db");
    let db_pool = create_db_pool(db_path.to_str().unwrap()).await.unwrap();
    let query = SearchQuery::new("Avocat", "75");

    // A run for three crawls four references (1.5x overshoot) and
    // in-flight workers finish and record, so four businesses end up
    // in the store.
    let first = prospector(fast_config(), &server, db_pool.clone()).await;
    let first_leads = first.run(&query, 3).await.unwrap();
    assert_eq!(first_leads.len(), 3);

    // Only three of the seven directory entries are still new, so a
    // request for ten yields three.
    let second = prospector(fast_config(), &server, db_pool).await;
    let second_leads = second.run(&query, 10).await.unwrap();
    assert_eq!(second_leads.len(), 3);

    let first_names: HashSet<String> = first_leads.iter().map(|l| l.name.clone()).collect();
    for lead in &second_leads {
        assert!(
            !first_names.contains(&lead.name),
            "{} was already collected in the first run",
            lead.name
        );
    }
}

#[tokio::test]
async fn out_of_range_max_results_is_rejected_before_any_crawl() {
    let server = MockServer::start().await;
    // No mounts: a crawl attempt would show up as a fetch failure,
    // but validation must reject first.
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("leads.db");
    let db_pool = create_db_pool(db_path.to_str().unwrap()).await.unwrap();

    let prospector = prospector(fast_config(), &server, db_pool).await;
    let query = SearchQuery::new("Avocat", "75");
    assert!(prospector.run(&query, 0).await.is_err());
    assert!(prospector.run(&query, 101).await.is_err());
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}
