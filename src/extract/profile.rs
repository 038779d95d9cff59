use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::extract::ContactExtractor;
use crate::fetcher::RenderedPage;
use crate::models::RawProfile;

// Hosts that are never the business's own website.
const NON_BUSINESS_HOSTS: &[&str] = &[
    "linkedin.com",
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "google.com",
    "youtube.com",
    "pagesjaunes.fr",
];

/// Pulls the raw profile fields (name, website, phone, address) out
/// of a directory detail page before any enrichment happens.
pub struct ProfileExtractor {
    contact: ContactExtractor,
    street_regex: Regex,
    postal_regex: Regex,
}

impl ProfileExtractor {
    pub fn new() -> Self {
        Self {
            contact: ContactExtractor::new(),
            street_regex: Regex::new(
                r"(?i)\d{1,4}\s?(?:bis|ter)?[,\s]+(?:rue|avenue|av\.|boulevard|bd|place|chemin|impasse|allée|allee|quai|cours)\s+[^,\n<]{3,60}",
            )
            .unwrap(),
            postal_regex: Regex::new(r"\b(\d{5})\b").unwrap(),
        }
    }

    pub fn extract(&self, page: &RenderedPage, title_hint: Option<&str>) -> RawProfile {
        let document = Html::parse_document(&page.html);

        RawProfile {
            name: self
                .extract_name(&document)
                .or_else(|| title_hint.map(|t| clean_display_name(t))),
            website: self.extract_website(&document, &page.url),
            phone: self.contact.first_phone(&page.text),
            address: self.extract_address(&page.text),
            postal_code: self.extract_postal_code(&page.text),
        }
    }

    fn extract_name(&self, document: &Html) -> Option<String> {
        // Detail pages put the business name in the first heading;
        // the <title> is a fallback full of suffix noise.
        let selectors = ["h1", ".fiche-nom", ".profil-nom", "h2.nom", "title"];
        for selector_str in &selectors {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            if let Some(element) = document.select(&selector).next() {
                let text = element.text().collect::<String>();
                let cleaned = clean_display_name(&text);
                if !cleaned.is_empty() && cleaned.len() < 100 {
                    return Some(cleaned);
                }
            }
        }
        None
    }

    fn extract_website(&self, document: &Html, page_url: &str) -> Option<String> {
        let anchor_selector = Selector::parse("a[href]").ok()?;
        let page_host = Url::parse(page_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));

        for element in document.select(&anchor_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !href.starts_with("http://") && !href.starts_with("https://") {
                continue;
            }
            let Ok(url) = Url::parse(href) else { continue };
            let Some(host) = url.host_str() else { continue };
            let host = host.trim_start_matches("www.");

            // Skip links back into the directory itself.
            if let Some(ref ph) = page_host {
                if host == ph.trim_start_matches("www.") {
                    continue;
                }
            }
            if NON_BUSINESS_HOSTS.iter().any(|h| host.ends_with(h)) {
                continue;
            }
            return Some(href.to_string());
        }
        None
    }

    fn extract_address(&self, text: &str) -> Option<String> {
        self.street_regex
            .find(text)
            .map(|m| m.as_str().trim().trim_end_matches(',').to_string())
    }

    fn extract_postal_code(&self, text: &str) -> Option<String> {
        self.postal_regex
            .captures(text)
            .map(|c| c[1].to_string())
    }
}

impl Default for ProfileExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the "| Annuaire" and "- Expert du patrimoine" suffixes
/// directories append to names.
fn clean_display_name(raw: &str) -> String {
    raw.split('|')
        .next()
        .unwrap_or(raw)
        .split(" - ")
        .next()
        .unwrap_or(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}
