use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{HttpConfig, RegistryConfig};
use crate::models::{normalize_name, RegistryInfo, Result};

/// Company-registry lookup collaborator. Top-1 match by free-text
/// query; every failure mode collapses to `None`, never an error.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    async fn lookup(&self, name: &str, locality: &str) -> Option<RegistryInfo>;
}

/// Pappers-style registry client. The API token comes from the
/// PAPPERS_API_TOKEN environment variable when present; the public
/// endpoint answers small volumes without one.
pub struct PappersClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default, alias = "resultats")]
    results: Vec<CompanyResult>,
}

#[derive(Debug, Deserialize)]
struct CompanyResult {
    #[serde(default)]
    siren: Option<String>,
    #[serde(default, alias = "nom_entreprise")]
    legal_name: Option<String>,
    #[serde(default, alias = "siege")]
    head_office: Option<HeadOffice>,
    #[serde(default, alias = "dirigeants")]
    officers: Vec<Officer>,
}

#[derive(Debug, Deserialize)]
struct HeadOffice {
    #[serde(default, alias = "adresse_ligne_1")]
    address_line: Option<String>,
    #[serde(default, alias = "code_postal")]
    postal_code: Option<String>,
    #[serde(default, alias = "ville")]
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Officer {
    #[serde(default, alias = "prenom")]
    first_name: Option<String>,
    #[serde(default, alias = "nom")]
    last_name: Option<String>,
}

impl PappersClient {
    pub fn new(registry: &RegistryConfig, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(http.user_agent.clone())
            .timeout(Duration::from_secs(http.registry_timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: registry.base_url.trim_end_matches('/').to_string(),
            api_token: std::env::var("PAPPERS_API_TOKEN").ok(),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_token: None,
        }
    }

    async fn query(&self, q: &str) -> Result<SearchResponse> {
        let mut request = self
            .client
            .get(format!("{}/recherche", self.base_url))
            .query(&[("q", q), ("par_page", "1")]);
        if let Some(ref token) = self.api_token {
            request = request.query(&[("api_token", token.as_str())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(format!("registry returned HTTP {}", response.status()).into());
        }
        Ok(response.json::<SearchResponse>().await?)
    }
}

#[async_trait]
impl RegistryLookup for PappersClient {
    async fn lookup(&self, name: &str, locality: &str) -> Option<RegistryInfo> {
        // Punctuation in scraped names ("S.A.R.L. Dupré & Fils")
        // wrecks the registry's matching; the locality narrows
        // homonyms down.
        let normalized = normalize_name(name);
        if normalized.is_empty() {
            return None;
        }
        let q = if locality.is_empty() {
            normalized
        } else {
            format!("{} {}", normalized, locality)
        };

        let response = match self.query(&q).await {
            Ok(response) => response,
            Err(e) => {
                warn!("🏛️  Registry lookup failed for '{}': {}", q, e);
                return None;
            }
        };

        let top = response.results.into_iter().next()?;
        let registration_id = top.siren?;
        let legal_name = top.legal_name?;

        let registered_address = top.head_office.and_then(|office| {
            let parts: Vec<String> = [office.address_line, office.postal_code, office.city]
                .into_iter()
                .flatten()
                .filter(|p| !p.trim().is_empty())
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        });

        // First listed officer; a blank composed name counts as
        // absent, not as an empty string.
        let principal_officer = top.officers.into_iter().next().and_then(|officer| {
            let composed = [officer.first_name, officer.last_name]
                .into_iter()
                .flatten()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if composed.is_empty() {
                None
            } else {
                Some(composed)
            }
        });

        debug!(
            "🏛️  Registry match for '{}': {} ({})",
            name, legal_name, registration_id
        );

        Some(RegistryInfo {
            registration_id,
            legal_name,
            registered_address,
            principal_officer,
        })
    }
}
