use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::LeadStore;
use crate::enrich::reachability::{status_for, Reachability, ReachabilityValidator};
use crate::enrich::{email_confidence, MxLookup, RegistryLookup};
use crate::extract::{ContactExtractor, ExtractedEmail, ProfileExtractor};
use crate::fetcher::PageFetcher;
use crate::models::{
    CandidateReference, EmailCandidate, EmailKind, EmailSource, EmailStatus, Lead, SearchQuery,
    SocialLinks,
};
use crate::scoring::{quality_score, ScoreInput};

/// Shared collaborators a harvest worker needs. Everything is an
/// injected trait object; workers never reach into globals.
pub struct HarvestContext {
    pub query: SearchQuery,
    pub fetcher: Arc<dyn PageFetcher>,
    pub store: Arc<dyn LeadStore>,
    pub mx: Arc<dyn MxLookup>,
    pub registry: Option<Arc<dyn RegistryLookup>>,
}

#[derive(Debug, Clone)]
struct MergedEmail {
    address: String,
    source: EmailSource,
    kind: EmailKind,
    from_mailto: bool,
}

/// Turns one candidate reference into a finished Lead, or nothing.
/// Every enrichment step is failure-tolerant: a failed fetch or
/// lookup degrades the record instead of aborting it.
pub struct ProfileHarvester {
    profile: ProfileExtractor,
    contacts: ContactExtractor,
}

impl ProfileHarvester {
    pub fn new() -> Self {
        Self {
            profile: ProfileExtractor::new(),
            contacts: ContactExtractor::new(),
        }
    }

    pub async fn harvest(
        &self,
        reference: &CandidateReference,
        ctx: &HarvestContext,
    ) -> Option<Lead> {
        // Step 1: detail page. A reference we cannot even fetch or
        // name is not actionable.
        let detail_page = match ctx.fetcher.fetch(&reference.url).await {
            Ok(page) => page,
            Err(e) => {
                warn!("🚫 Detail page failed for {}: {}", reference.url, e);
                return None;
            }
        };
        let raw = self.profile.extract(&detail_page, reference.title.as_deref());
        let Some(name) = raw.name.clone() else {
            debug!("🚫 No business name on {}, rejecting", reference.url);
            return None;
        };

        // Step 2: dedup gate, before any further network cost. A
        // store error is treated as "not seen" so one bad query
        // cannot reject a good lead.
        match ctx.store.exists(&name, &ctx.query.department).await {
            Ok(true) => {
                debug!("♻️  '{}' already recorded for {}", name, ctx.query.department);
                return None;
            }
            Ok(false) => {}
            Err(e) => warn!("💾 Dedup check failed for '{}': {}", name, e),
        }

        // Step 3: contact extraction over detail page and, when one
        // exists, the business's own site.
        let mut findings = self.contacts.extract(&detail_page.html, &detail_page.text);
        let mut merged = merge_emails(Vec::new(), &findings.emails, EmailSource::DirectoryPage);
        let mut socials = SocialLinks::default();
        socials.merge(std::mem::take(&mut findings.socials));

        if let Some(ref website) = raw.website {
            match ctx.fetcher.fetch(website).await {
                Ok(site_page) => {
                    let mut site_findings = self.contacts.extract(&site_page.html, &site_page.text);
                    merged = merge_emails(merged, &site_findings.emails, EmailSource::BusinessWebsite);
                    socials.merge(std::mem::take(&mut site_findings.socials));
                }
                Err(e) => debug!("🌐 Website fetch failed for {}: {}", website, e),
            }
        }

        // Step 4: reachability of the best available email's domain.
        let best = pick_best(&merged);
        let reachability = match best {
            Some(email) => match email.address.split('@').nth(1) {
                Some(domain) => {
                    let validator = ReachabilityValidator::new(ctx.mx.as_ref());
                    Some((domain.to_string(), validator.validate(domain).await))
                }
                None => None,
            },
            None => None,
        };
        let email_status = status_for(reachability.as_ref().map(|(_, r)| *r));
        let emails = rank_candidates(&merged, reachability.as_ref());

        // Step 5: registry enrichment. Authoritative when it answers,
        // never blocking when it does not.
        let registry_info = match &ctx.registry {
            Some(registry) => registry.lookup(&name, &ctx.query.department).await,
            None => None,
        };

        let scraped_siren = self.contacts.first_siren(&detail_page.text);
        let (final_name, final_address, registration_id, contact_name, contact_role) =
            match &registry_info {
                Some(info) => (
                    info.legal_name.clone(),
                    info.registered_address
                        .clone()
                        .or_else(|| raw.address.clone())
                        .unwrap_or_default(),
                    Some(info.registration_id.clone()),
                    info.principal_officer.clone(),
                    info.principal_officer.as_ref().map(|_| "Dirigeant".to_string()),
                ),
                None => (
                    name.clone(),
                    raw.address.clone().unwrap_or_default(),
                    scraped_siren,
                    None,
                    None,
                ),
            };

        // Step 6: quality score over the assembled attribute set.
        let score = quality_score(&ScoreInput {
            verified_email: email_status == EmailStatus::Valid,
            any_email: !emails.is_empty(),
            personal_email: emails.iter().any(|e| e.kind == EmailKind::Personal),
            website: raw.website.is_some(),
            phone: raw.phone.is_some(),
            registry_match: registry_info.is_some(),
            officer_name: contact_name.is_some(),
            social_presence: !socials.is_empty(),
        });

        let lead = Lead {
            id: Uuid::new_v4(),
            name: final_name,
            sector: ctx.query.sector.clone(),
            address: final_address,
            city: ctx.query.department.clone(),
            postal_code: raw.postal_code.clone(),
            website: raw.website.clone(),
            phone: raw.phone.clone(),
            emails,
            contact_name,
            contact_role,
            socials,
            registration_id,
            quality_score: score,
            email_status,
            collected_at: Utc::now(),
        };

        // Step 7: write-after-accept. A persistence failure degrades
        // future dedup, not this run's output.
        if let Err(e) = ctx.store.record(&lead).await {
            warn!("💾 Failed to record lead '{}': {}", lead.name, e);
        }

        info!(
            "✅ Lead: {} (score {}, emails {}, status {})",
            lead.name,
            lead.quality_score,
            lead.emails.len(),
            lead.email_status
        );
        Some(lead)
    }
}

impl Default for ProfileHarvester {
    fn default() -> Self {
        Self::new()
    }
}

/// Union keyed by normalized address. First sighting fixes the
/// source; a later mailto sighting upgrades the provenance flag.
fn merge_emails(
    mut merged: Vec<MergedEmail>,
    extracted: &[ExtractedEmail],
    source: EmailSource,
) -> Vec<MergedEmail> {
    let mut seen: HashSet<String> = merged.iter().map(|e| e.address.clone()).collect();
    for email in extracted {
        let address = email.address.to_lowercase();
        if seen.insert(address.clone()) {
            merged.push(MergedEmail {
                kind: email.kind(),
                address,
                source,
                from_mailto: email.from_mailto,
            });
        } else if email.from_mailto {
            if let Some(existing) = merged.iter_mut().find(|e| e.address == address) {
                existing.from_mailto = true;
            }
        }
    }
    merged
}

fn pick_best(merged: &[MergedEmail]) -> Option<&MergedEmail> {
    merged.iter().max_by_key(|e| {
        (
            e.from_mailto,
            e.kind == EmailKind::Personal,
        )
    })
}

/// Confidence-ranked candidates. The verified domain's candidates
/// carry the deliverability bonus; other domains stay at the floor.
fn rank_candidates(
    merged: &[MergedEmail],
    reachability: Option<&(String, Reachability)>,
) -> Vec<EmailCandidate> {
    let mut candidates: Vec<EmailCandidate> = merged
        .iter()
        .map(|email| {
            let has_mx = reachability
                .map(|(domain, r)| {
                    r.has_mail_exchange && email.address.ends_with(&format!("@{}", domain))
                })
                .unwrap_or(false);
            EmailCandidate {
                address: email.address.clone(),
                source: email.source,
                kind: email.kind,
                confidence: email_confidence(has_mx, email.kind, email.from_mailto),
            }
        })
        .collect();
    candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::RenderedPage;
    use crate::models::{normalize_name, RegistryInfo, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapFetcher {
        pages: HashMap<String, RenderedPage>,
    }

    impl MapFetcher {
        fn new(pages: Vec<(&str, &str, &str)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(url, html, text)| {
                        (
                            url.to_string(),
                            RenderedPage {
                                url: url.to_string(),
                                html: html.to_string(),
                                text: text.to_string(),
                            },
                        )
                    })
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<RenderedPage> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| format!("no page for {}", url).into())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        keys: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl LeadStore for MemoryStore {
        async fn exists(&self, name: &str, locality: &str) -> Result<bool> {
            let key = (normalize_name(name), normalize_name(locality));
            Ok(self.keys.lock().unwrap().contains(&key))
        }
        async fn record(&self, lead: &Lead) -> Result<()> {
            self.keys
                .lock()
                .unwrap()
                .push((normalize_name(&lead.name), normalize_name(&lead.city)));
            Ok(())
        }
    }

    struct FixedMx(bool);

    #[async_trait]
    impl MxLookup for FixedMx {
        async fn has_mx(&self, _domain: &str) -> bool {
            self.0
        }
    }

    struct FixedRegistry(Option<RegistryInfo>);

    #[async_trait]
    impl RegistryLookup for FixedRegistry {
        async fn lookup(&self, _name: &str, _locality: &str) -> Option<RegistryInfo> {
            self.0.clone()
        }
    }

    fn detail_html(name: &str, website: Option<&str>) -> String {
        let site = website
            .map(|w| format!(r#"<a href="{}">Site web</a>"#, w))
            .unwrap_or_default();
        format!(
            r#"<html><body><h1>{}</h1>{}<p>Tél 01 42 68 53 00</p></body></html>"#,
            name, site
        )
    }

    fn context(
        fetcher: MapFetcher,
        store: Arc<dyn LeadStore>,
        mx: bool,
        registry: Option<RegistryInfo>,
    ) -> HarvestContext {
        HarvestContext {
            query: SearchQuery::new("Avocat", "75"),
            fetcher: Arc::new(fetcher),
            store,
            mx: Arc::new(FixedMx(mx)),
            registry: Some(Arc::new(FixedRegistry(registry))),
        }
    }

    #[tokio::test]
    async fn nameless_reference_is_rejected() {
        let fetcher = MapFetcher::new(vec![(
            "https://a.test/profil/1",
            "<html><body><p>rien</p></body></html>",
            "",
        )]);
        let ctx = context(fetcher, Arc::new(MemoryStore::default()), true, None);
        let harvester = ProfileHarvester::new();
        let lead = harvester
            .harvest(&CandidateReference::new("https://a.test/profil/1"), &ctx)
            .await;
        assert!(lead.is_none());
    }

    #[tokio::test]
    async fn already_recorded_business_yields_no_lead() {
        let store = MemoryStore::default();
        store
            .keys
            .lock()
            .unwrap()
            .push(("acme consulting".to_string(), "lyon".to_string()));

        let fetcher = MapFetcher::new(vec![(
            "https://a.test/profil/1",
            &detail_html("Acme Consulting", None),
            "",
        )]);
        let mut ctx = context(fetcher, Arc::new(store), true, None);
        ctx.query = SearchQuery::new("Avocat", "Lyon");

        let lead = ProfileHarvester::new()
            .harvest(&CandidateReference::new("https://a.test/profil/1"), &ctx)
            .await;
        assert!(lead.is_none());
    }

    #[tokio::test]
    async fn website_emails_are_merged_and_status_derived_from_mx() {
        let fetcher = MapFetcher::new(vec![
            (
                "https://a.test/profil/1",
                &detail_html("Cabinet Dupré", Some("https://dupre.test")),
                "Tél 01 42 68 53 00",
            ),
            (
                "https://dupre.test",
                r#"<html><body><a href="mailto:jean.dupre@dupre.test">Écrire</a></body></html>"#,
                "jean.dupre@dupre.test",
            ),
        ]);
        let ctx = context(fetcher, Arc::new(MemoryStore::default()), true, None);

        let lead = ProfileHarvester::new()
            .harvest(&CandidateReference::new("https://a.test/profil/1"), &ctx)
            .await
            .expect("lead");

        assert_eq!(lead.email_status, EmailStatus::Valid);
        assert_eq!(lead.emails.len(), 1);
        assert_eq!(lead.emails[0].address, "jean.dupre@dupre.test");
        assert_eq!(lead.emails[0].source, EmailSource::BusinessWebsite);
        assert_eq!(lead.emails[0].kind, EmailKind::Personal);
        assert_eq!(lead.emails[0].confidence, 100);
    }

    #[tokio::test]
    async fn no_email_means_unknown_status_and_lead_still_produced() {
        let fetcher = MapFetcher::new(vec![(
            "https://a.test/profil/1",
            &detail_html("Cabinet Sans Email", None),
            "",
        )]);
        let ctx = context(fetcher, Arc::new(MemoryStore::default()), true, None);

        let lead = ProfileHarvester::new()
            .harvest(&CandidateReference::new("https://a.test/profil/1"), &ctx)
            .await
            .expect("lead");
        assert!(lead.emails.is_empty());
        assert_eq!(lead.email_status, EmailStatus::Unknown);
    }

    #[tokio::test]
    async fn registry_data_overrides_scraped_name_and_address() {
        let fetcher = MapFetcher::new(vec![(
            "https://a.test/profil/1",
            &detail_html("Dupre", None),
            "12 rue de la Paix Paris",
        )]);
        let info = RegistryInfo {
            registration_id: "552100554".to_string(),
            legal_name: "CABINET DUPRE SARL".to_string(),
            registered_address: Some("12 RUE DE LA PAIX, 75002, PARIS".to_string()),
            principal_officer: Some("Jean Dupré".to_string()),
        };
        let ctx = context(fetcher, Arc::new(MemoryStore::default()), false, Some(info));

        let lead = ProfileHarvester::new()
            .harvest(&CandidateReference::new("https://a.test/profil/1"), &ctx)
            .await
            .expect("lead");

        assert_eq!(lead.name, "CABINET DUPRE SARL");
        assert_eq!(lead.address, "12 RUE DE LA PAIX, 75002, PARIS");
        assert_eq!(lead.registration_id.as_deref(), Some("552100554"));
        assert_eq!(lead.contact_name.as_deref(), Some("Jean Dupré"));
        assert_eq!(lead.contact_role.as_deref(), Some("Dirigeant"));
    }

    #[tokio::test]
    async fn accepted_lead_is_recorded_in_the_store() {
        let store = Arc::new(MemoryStore::default());
        let fetcher = MapFetcher::new(vec![(
            "https://a.test/profil/1",
            &detail_html("Cabinet Neuf", None),
            "",
        )]);
        let ctx = context(fetcher, store.clone(), false, None);

        ProfileHarvester::new()
            .harvest(&CandidateReference::new("https://a.test/profil/1"), &ctx)
            .await
            .expect("lead");
        assert!(store
            .keys
            .lock()
            .unwrap()
            .contains(&("cabinet neuf".to_string(), "75".to_string())));
    }
}
