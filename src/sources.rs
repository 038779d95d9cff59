use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::{sector_slug, CandidateReference, SearchQuery};

/// How a listing source exposes more results: classic numbered pages,
/// or an offset-based "show more" reveal. Both advance through the
/// same crawl loop; only the URL construction differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvanceMode {
    Pagination,
    IncrementalReveal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub name: String,
    pub base_url: String,
    /// Path template. Placeholders: {slug}, {department}, {page}
    /// (1-based page number) and {offset} (0-based reference offset).
    pub path_template: String,
    pub mode: AdvanceMode,
    pub page_size: usize,
    /// Substring a profile link's href must contain to count as a
    /// candidate reference (e.g. "/profil/").
    pub profile_link_pattern: String,
    /// Override of the global consecutive-empty threshold; reveal
    /// sources tend to need a higher one than paginated ones.
    pub empty_page_threshold: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    pub sources: Vec<SourceConfig>,
}

/// A directory or map listing that can be advanced page by page for a
/// sector + department query. Implemented by YAML-configured sources
/// in production and by stubs in tests.
pub trait ListingSource: Send + Sync {
    fn name(&self) -> &str;
    fn page_size(&self) -> usize;
    fn advance_mode(&self) -> AdvanceMode;
    fn empty_page_threshold(&self) -> Option<u32> {
        None
    }
    fn page_url(&self, query: &SearchQuery, page_index: u32) -> String;
    fn parse_references(&self, html: &str) -> Vec<CandidateReference>;
}

pub struct ConfiguredSource {
    config: SourceConfig,
}

impl ConfiguredSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    pub fn into_config(self) -> SourceConfig {
        self.config
    }
}

impl ListingSource for ConfiguredSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn page_size(&self) -> usize {
        self.config.page_size
    }

    fn advance_mode(&self) -> AdvanceMode {
        self.config.mode
    }

    fn empty_page_threshold(&self) -> Option<u32> {
        self.config.empty_page_threshold
    }

    fn page_url(&self, query: &SearchQuery, page_index: u32) -> String {
        let page = page_index + 1;
        let offset = page_index as usize * self.config.page_size;
        let path = self
            .config
            .path_template
            .replace("{slug}", &sector_slug(&query.sector))
            .replace("{department}", &query.department)
            .replace("{page}", &page.to_string())
            .replace("{offset}", &offset.to_string());
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn parse_references(&self, html: &str) -> Vec<CandidateReference> {
        let document = Html::parse_document(html);
        let anchor_selector = Selector::parse("a[href]").expect("static selector");
        let base = Url::parse(&self.config.base_url).ok();

        let mut refs = Vec::new();
        for element in document.select(&anchor_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !href.contains(&self.config.profile_link_pattern) {
                continue;
            }
            let resolved = match Url::parse(href) {
                Ok(url) => Some(url.to_string()),
                Err(_) => base
                    .as_ref()
                    .and_then(|b| b.join(href).ok())
                    .map(|u| u.to_string()),
            };
            let Some(url) = resolved else { continue };

            let title = element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if title.is_empty() {
                refs.push(CandidateReference::new(url));
            } else {
                refs.push(CandidateReference::with_title(url, title));
            }
        }
        refs
    }
}

pub async fn load_sources_from_yaml(path: &str) -> crate::models::Result<Vec<ConfiguredSource>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: SourcesConfig = serde_yaml::from_str(&content)?;
    Ok(config.sources.into_iter().map(ConfiguredSource::new).collect())
}
