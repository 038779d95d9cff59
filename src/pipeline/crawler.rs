use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::fetcher::PageFetcher;
use crate::models::{CandidateReference, SearchQuery};
use crate::sources::ListingSource;

/// Walks a listing source page by page for one sector + department
/// query and collects candidate profile references. Sequential by
/// design: reveal-style sources only make sense in page order.
pub struct ListingCrawler<'a> {
    source: &'a dyn ListingSource,
    fetcher: &'a dyn PageFetcher,
    empty_page_threshold: u32,
    page_ceiling_margin: u32,
}

impl<'a> ListingCrawler<'a> {
    pub fn new(
        source: &'a dyn ListingSource,
        fetcher: &'a dyn PageFetcher,
        empty_page_threshold: u32,
        page_ceiling_margin: u32,
    ) -> Self {
        // Sources may override the global threshold; reveal listings
        // often return sparse batches before genuinely drying up.
        let empty_page_threshold = source
            .empty_page_threshold()
            .unwrap_or(empty_page_threshold)
            .max(1);
        Self {
            source,
            fetcher,
            empty_page_threshold,
            page_ceiling_margin,
        }
    }

    /// Collect up to `target_count` unique references, starting
    /// `start_offset` references into the listing. Finite and not
    /// restartable; first stop condition wins:
    /// target reached, `empty_page_threshold` consecutive advances
    /// with zero new references, or the hard page ceiling.
    pub async fn crawl(
        &self,
        query: &SearchQuery,
        target_count: usize,
        start_offset: usize,
    ) -> Vec<CandidateReference> {
        if target_count == 0 {
            return Vec::new();
        }

        let page_size = self.source.page_size().max(1);
        let first_page = (start_offset / page_size) as u32;
        let page_ceiling = target_count.div_ceil(page_size) as u32 + self.page_ceiling_margin;

        info!(
            "🗺️  Crawling {} for '{}' in '{}' (target {}, from page {})",
            self.source.name(),
            query.sector,
            query.department,
            target_count,
            first_page + 1
        );

        let mut seen: HashSet<String> = HashSet::new();
        let mut references: Vec<CandidateReference> = Vec::new();
        let mut consecutive_empty: u32 = 0;
        let mut pages_attempted: u32 = 0;

        for page_index in first_page.. {
            if references.len() >= target_count {
                break;
            }
            if consecutive_empty >= self.empty_page_threshold {
                info!(
                    "🏁 Listing exhausted after {} empty advances",
                    consecutive_empty
                );
                break;
            }
            if pages_attempted >= page_ceiling {
                warn!("🛑 Page ceiling ({}) reached, stopping crawl", page_ceiling);
                break;
            }
            pages_attempted += 1;

            let url = self.source.page_url(query, page_index);
            // A failed advance counts like an empty one: transient
            // fetch errors must not abort the whole crawl.
            let new_count = match self.fetcher.fetch(&url).await {
                Ok(page) => {
                    let mut new_count = 0usize;
                    for reference in self.source.parse_references(&page.html) {
                        if seen.insert(reference.normalized()) {
                            references.push(reference);
                            new_count += 1;
                        }
                    }
                    new_count
                }
                Err(e) => {
                    warn!("📄 Listing page {} failed: {}", url, e);
                    0
                }
            };

            debug!(
                "📄 Page {}: {} new references ({} total)",
                page_index + 1,
                new_count,
                references.len()
            );
            if new_count == 0 {
                consecutive_empty += 1;
            } else {
                consecutive_empty = 0;
            }
        }

        references.truncate(target_count);
        info!("🗺️  Crawl done: {} candidate references", references.len());
        references
    }
}
