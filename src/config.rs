use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub dedup: DedupConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlConfig {
    /// Concurrent profile harvesters. 3-5 keeps directory sites happy.
    pub worker_pool_size: usize,

    /// Consecutive pages yielding zero new references before the
    /// listing is considered exhausted.
    pub empty_page_threshold: u32,

    /// Extra pages allowed beyond ceil(target / page_size) before the
    /// crawler gives up regardless of yield.
    pub page_ceiling_margin: u32,

    /// Reference position to start from, to diversify repeated runs
    /// against the same sector + department.
    pub start_offset: usize,

    /// References requested per accepted lead wanted, as a percentage.
    /// 150 means "crawl 1.5x max_results, some will be rejected".
    pub reference_overshoot_pct: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    pub page_timeout_seconds: u64,
    pub registry_timeout_seconds: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub jitter_ms: u64,
}

/// How strictly the dedup store matches an incoming (name, locality)
/// pair against recorded leads. `Contains` is the permissive
/// historical behavior; `Exact` avoids false positives between
/// distinct businesses sharing a common word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Contains,
    Exact,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DedupConfig {
    pub match_strategy: MatchStrategy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    pub base_url: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    pub directory: String,
    pub pretty_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig {
                worker_pool_size: 4,
                empty_page_threshold: 2,
                page_ceiling_margin: 4,
                start_offset: 0,
                reference_overshoot_pct: 150,
            },
            http: HttpConfig {
                page_timeout_seconds: 15,
                registry_timeout_seconds: 8,
                user_agent: "Mozilla/5.0 (compatible; LeadProspector/0.1)".to_string(),
            },
            retry: RetryConfig {
                max_attempts: 2,
                base_delay_ms: 500,
                jitter_ms: 400,
            },
            dedup: DedupConfig {
                match_strategy: MatchStrategy::Contains,
            },
            registry: RegistryConfig {
                base_url: "https://api.pappers.fr/v2".to_string(),
                enabled: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            output: OutputConfig {
                directory: "out".to_string(),
                pretty_json: true,
            },
        }
    }
}

pub async fn load_config(path: &str) -> crate::models::Result<Config> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.crawl.worker_pool_size, 4);
        assert_eq!(back.dedup.match_strategy, MatchStrategy::Contains);
    }

    #[test]
    fn match_strategy_parses_lowercase() {
        let d: DedupConfig = serde_yaml::from_str("match_strategy: exact").unwrap();
        assert_eq!(d.match_strategy, MatchStrategy::Exact);
    }
}
