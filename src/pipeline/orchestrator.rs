use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::Config;
use crate::database::LeadStore;
use crate::enrich::{MxLookup, RegistryLookup};
use crate::fetcher::PageFetcher;
use crate::models::{Lead, Result, SearchQuery};
use crate::pipeline::crawler::ListingCrawler;
use crate::pipeline::harvester::{HarvestContext, ProfileHarvester};
use crate::sources::ListingSource;

pub const MAX_RESULTS_CEILING: usize = 100;

/// Drives one prospection run: a sequential listing crawl, then a
/// bounded pool of concurrent harvest workers over the collected
/// references. Result order is whatever finishes first; callers must
/// not read discovery order into it.
pub struct Prospector {
    config: Config,
    source: Arc<dyn ListingSource>,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn LeadStore>,
    mx: Arc<dyn MxLookup>,
    registry: Option<Arc<dyn RegistryLookup>>,
}

impl Prospector {
    pub fn new(
        config: Config,
        source: Arc<dyn ListingSource>,
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn LeadStore>,
        mx: Arc<dyn MxLookup>,
        registry: Option<Arc<dyn RegistryLookup>>,
    ) -> Self {
        Self {
            config,
            source,
            fetcher,
            store,
            mx,
            registry,
        }
    }

    /// Wire up the production collaborators: HTTP fetcher, SQLite
    /// dedup store, DNS MX lookup and (when enabled) the registry
    /// client. Any constructor failure here is fatal for the run.
    pub fn assemble(
        config: Config,
        db_pool: crate::database::DbPool,
        source: Arc<dyn ListingSource>,
    ) -> Result<Self> {
        let fetcher = Arc::new(crate::fetcher::HttpFetcher::new(&config.http, &config.retry)?);
        let store = Arc::new(crate::database::SqliteLeadStore::new(
            db_pool,
            config.dedup.match_strategy,
        ));
        let mx = Arc::new(crate::enrich::DnsMxLookup::new()?);
        let registry: Option<Arc<dyn RegistryLookup>> = if config.registry.enabled {
            Some(Arc::new(crate::enrich::PappersClient::new(
                &config.registry,
                &config.http,
            )?))
        } else {
            None
        };
        Ok(Self::new(config, source, fetcher, store, mx, registry))
    }

    pub async fn run(&self, query: &SearchQuery, max_results: usize) -> Result<Vec<Lead>> {
        if max_results == 0 || max_results > MAX_RESULTS_CEILING {
            return Err(format!(
                "max_results must be between 1 and {}, got {}",
                MAX_RESULTS_CEILING, max_results
            )
            .into());
        }

        info!(
            "🚀 Prospection: {} in '{}' (max {})",
            query.sector, query.department, max_results
        );

        // Crawl more references than leads wanted; dedup and nameless
        // profiles will eat part of them.
        let overshoot_pct = self.config.crawl.reference_overshoot_pct.max(100);
        let target_refs = (max_results * overshoot_pct / 100).max(max_results);

        let crawler = ListingCrawler::new(
            self.source.as_ref(),
            self.fetcher.as_ref(),
            self.config.crawl.empty_page_threshold,
            self.config.crawl.page_ceiling_margin,
        );
        let references = crawler
            .crawl(query, target_refs, self.config.crawl.start_offset)
            .await;

        if references.is_empty() {
            info!("🏁 No candidate references found");
            return Ok(Vec::new());
        }

        let ctx = Arc::new(HarvestContext {
            query: query.clone(),
            fetcher: self.fetcher.clone(),
            store: self.store.clone(),
            mx: self.mx.clone(),
            registry: self.registry.clone(),
        });
        let harvester = Arc::new(ProfileHarvester::new());
        let pool_size = self.config.crawl.worker_pool_size.max(1);

        let mut pending: JoinSet<Option<Lead>> = JoinSet::new();
        let mut refs = references.into_iter();
        let mut leads: Vec<Lead> = Vec::new();

        loop {
            // Top up the pool while the target is unmet. Once it is
            // met, no new work is dispatched; in-flight workers run
            // to completion rather than being aborted mid-fetch.
            while pending.len() < pool_size && leads.len() < max_results {
                let Some(reference) = refs.next() else { break };
                let ctx = ctx.clone();
                let harvester = harvester.clone();
                pending.spawn(async move { harvester.harvest(&reference, &ctx).await });
            }

            let Some(joined) = pending.join_next().await else {
                break;
            };
            match joined {
                Ok(Some(lead)) => {
                    if leads.len() < max_results {
                        leads.push(lead);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("⚠️ Harvest worker panicked: {}", e),
            }
        }

        info!("🏁 Prospection done: {} leads", leads.len());
        Ok(leads)
    }
}
