use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::config::{HttpConfig, RetryConfig};
use crate::models::Result;

/// A fetched, rendered page: final URL after redirects, raw markup,
/// and the visible text the markup produces.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
    pub text: String,
}

/// The page-rendering capability the pipeline consumes. The default
/// implementation is plain HTTP; swapping in a headless-browser
/// fetcher only requires another impl of this trait.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RenderedPage>;
}

/// Jittered delay applied between fetch attempts, replacing the ad hoc
/// sleeps the scraping code used to scatter around call sites.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    jitter_ms: u64,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            jitter_ms: config.jitter_ms,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub async fn wait(&self, attempt: u32) {
        let jitter = if self.jitter_ms > 0 {
            Duration::from_millis(fastrand::u64(0..self.jitter_ms))
        } else {
            Duration::ZERO
        };
        let delay = self.base_delay * (attempt + 1) + jitter;
        debug!("⏳ Backing off {}ms before retry", delay.as_millis());
        tokio::time::sleep(delay).await;
    }
}

pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    /// Client construction is the pipeline's fatal-setup path: if this
    /// fails, the whole run is aborted rather than degraded.
    pub fn new(http: &HttpConfig, retry: &RetryConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(Duration::from_secs(http.page_timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            retry: RetryPolicy::new(retry),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<RenderedPage> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(format!("HTTP {} on {}", response.status(), url).into());
        }
        let final_url = response.url().to_string();
        let html = response.text().await?;
        debug!("📄 Fetched {} bytes from {}", html.len(), final_url);
        let text = extract_visible_text(&html);
        Ok(RenderedPage {
            url: final_url,
            html,
            text,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RenderedPage> {
        let mut last_err: Option<Box<dyn std::error::Error + Send + Sync>> = None;
        for attempt in 0..self.retry.max_attempts() {
            if attempt > 0 {
                self.retry.wait(attempt - 1).await;
            }
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    warn!("🌐 Fetch attempt {} failed for {}: {}", attempt + 1, url, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| format!("fetch failed: {}", url).into()))
    }
}

/// Body text with scripts and styles dropped, whitespace collapsed.
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body_selector = Selector::parse("body").expect("static selector");

    let Some(body) = document.select(&body_selector).next() else {
        return String::new();
    };

    let mut parts: Vec<&str> = Vec::new();
    for node in body.descendants() {
        if let Some(element) = scraper::ElementRef::wrap(node) {
            if matches!(element.value().name(), "script" | "style" | "noscript") {
                continue;
            }
        }
        if let Some(text) = node.value().as_text() {
            let has_script_ancestor = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map(|e| matches!(e.name(), "script" | "style" | "noscript"))
                    .unwrap_or(false)
            });
            if !has_script_ancestor {
                parts.push(text);
            }
        }
    }

    parts
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
