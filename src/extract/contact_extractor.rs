use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;

use crate::models::{EmailKind, SocialLinks};

/// Role-style local parts. Anything else is assumed to belong to a
/// named individual, which outreach values more.
const GENERIC_PREFIXES: &[&str] = &[
    "contact",
    "info",
    "hello",
    "support",
    "accueil",
    "reservation",
    "cabinet",
    "direction",
    "secretariat",
    "bonjour",
];

// Operational and placeholder senders that are never a business
// contact. Local-part prefixes and exact domains are checked
// separately so that a real address on a coincidentally similar
// domain is not thrown away.
const DENY_LOCAL_PREFIXES: &[&str] = &[
    "noreply",
    "no-reply",
    "no_reply",
    "donotreply",
    "do-not-reply",
    "mailer-daemon",
    "postmaster",
    "abuse",
];

const DENY_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "email.com",
    "domain.com",
    "yourdomain.com",
    "monsite.fr",
    "mysite.com",
    "sentry.io",
    "wixpress.com",
    "sentry.wixpress.com",
    "wordpress.com",
    "godaddy.com",
];

// Filenames like "logo@2x.png" match the email pattern in raw markup.
const FILE_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".js", ".css", ".woff", ".woff2",
];

const MIN_EMAIL_LEN: usize = 6;
const MAX_EMAIL_LEN: usize = 50;

// Share widgets link to the platforms without pointing at the
// business's own profile.
const SHARE_LINK_MARKERS: &[&str] = &[
    "sharer",
    "share.php",
    "/share",
    "/intent/",
    "intent/tweet",
    "sharearticle",
    "dialog/share",
    "mini=true",
];

#[derive(Debug, Clone)]
pub struct ExtractedEmail {
    pub address: String,
    pub from_mailto: bool,
}

impl ExtractedEmail {
    pub fn kind(&self) -> EmailKind {
        let local = self.address.split('@').next().unwrap_or("");
        if GENERIC_PREFIXES.iter().any(|p| local.starts_with(p)) {
            EmailKind::Generic
        } else {
            EmailKind::Personal
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactFindings {
    pub emails: Vec<ExtractedEmail>,
    pub socials: SocialLinks,
}

pub struct ContactExtractor {
    email_regex: Regex,
    phone_regex: Regex,
    siren_regex: Regex,
}

impl ContactExtractor {
    pub fn new() -> Self {
        Self {
            email_regex: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            // French numbers: +33/0033/0 then 9 digits in pairs.
            phone_regex: Regex::new(r"(?:(?:\+|00)33|0)\s*[1-9](?:[\s.\-]*\d{2}){4}").unwrap(),
            siren_regex: Regex::new(r"\b\d{3}[ .]?\d{3}[ .]?\d{3}\b").unwrap(),
        }
    }

    /// Three disjoint strategies over the same content: mailto
    /// anchors, visible-text matches, raw-markup matches. The union is
    /// deduplicated by normalized address; a mailto hit wins over a
    /// pattern hit for the same address.
    pub fn extract(&self, html: &str, visible_text: &str) -> ContactFindings {
        let mut seen: HashSet<String> = HashSet::new();
        let mut emails: Vec<ExtractedEmail> = Vec::new();

        for address in self.mailto_addresses(html) {
            if !self.accept_email(&address) {
                continue;
            }
            if seen.insert(address.clone()) {
                emails.push(ExtractedEmail {
                    address,
                    from_mailto: true,
                });
            }
        }

        for captures in self.email_regex.find_iter(visible_text) {
            let address = captures.as_str().to_lowercase();
            if self.accept_email(&address) && seen.insert(address.clone()) {
                emails.push(ExtractedEmail {
                    address,
                    from_mailto: false,
                });
            }
        }

        // Raw markup pass catches addresses embedded in attributes
        // (data-email, obfuscation scripts) that never render as text.
        for captures in self.email_regex.find_iter(html) {
            let address = captures.as_str().to_lowercase();
            if self.accept_email(&address) && seen.insert(address.clone()) {
                emails.push(ExtractedEmail {
                    address,
                    from_mailto: false,
                });
            }
        }

        let socials = self.extract_socials(html);
        debug!(
            "✉️  Extracted {} unique emails, socials: {}",
            emails.len(),
            !socials.is_empty()
        );

        ContactFindings { emails, socials }
    }

    fn mailto_addresses(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let anchor_selector = Selector::parse("a[href]").expect("static selector");

        let mut addresses = Vec::new();
        for element in document.select(&anchor_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(rest) = href.strip_prefix("mailto:") else {
                continue;
            };
            // Strip ?subject=... and surrounding noise.
            let address = rest.split('?').next().unwrap_or("").trim().to_lowercase();
            if self.email_regex.is_match(&address) {
                addresses.push(address);
            }
        }
        addresses
    }

    fn accept_email(&self, address: &str) -> bool {
        if address.len() < MIN_EMAIL_LEN || address.len() > MAX_EMAIL_LEN {
            return false;
        }
        if FILE_EXTENSIONS.iter().any(|ext| address.ends_with(ext)) {
            return false;
        }
        let Some((local, domain)) = address.split_once('@') else {
            return false;
        };
        if DENY_LOCAL_PREFIXES.iter().any(|p| local.starts_with(p)) {
            return false;
        }
        if DENY_DOMAINS
            .iter()
            .any(|d| domain == *d || domain.ends_with(&format!(".{}", d)))
        {
            return false;
        }
        true
    }

    fn extract_socials(&self, html: &str) -> SocialLinks {
        let document = Html::parse_document(html);
        let anchor_selector = Selector::parse("a[href]").expect("static selector");

        let mut socials = SocialLinks::default();
        for element in document.select(&anchor_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let lower = href.to_lowercase();
            if SHARE_LINK_MARKERS.iter().any(|m| lower.contains(m)) {
                continue;
            }

            if socials.linkedin.is_none()
                && (lower.contains("linkedin.com/company/") || lower.contains("linkedin.com/in/"))
            {
                socials.linkedin = Some(href.to_string());
            } else if socials.facebook.is_none() && lower.contains("facebook.com/") {
                socials.facebook = Some(href.to_string());
            } else if socials.instagram.is_none() && lower.contains("instagram.com/") {
                socials.instagram = Some(href.to_string());
            } else if socials.twitter.is_none()
                && (lower.contains("twitter.com/") || lower.contains("x.com/"))
            {
                socials.twitter = Some(href.to_string());
            }
        }
        socials
    }

    pub fn first_phone(&self, text: &str) -> Option<String> {
        self.phone_regex
            .find(text)
            .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
    }

    pub fn first_siren(&self, text: &str) -> Option<String> {
        self.siren_regex
            .find(text)
            .map(|m| m.as_str().chars().filter(|c| c.is_ascii_digit()).collect())
    }
}

impl Default for ContactExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ContactExtractor {
        ContactExtractor::new()
    }

    #[test]
    fn mailto_wins_over_text_match_and_denylist_filters_noreply() {
        let html = r#"
            <body>
              <a href="mailto:sales@example-domain.test?subject=Hi">Nous écrire</a>
              <p>sales@example-domain.test ou noreply@example-domain.test</p>
            </body>
        "#;
        let text = "sales@example-domain.test ou noreply@example-domain.test";
        let findings = extractor().extract(html, text);

        let addresses: Vec<&str> = findings.emails.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(addresses, vec!["sales@example-domain.test"]);
        assert!(findings.emails[0].from_mailto);
    }

    #[test]
    fn markup_pass_catches_attribute_embedded_addresses() {
        let html = r#"<div data-email="direction@cabinet-dupre.fr">Contact</div>"#;
        let findings = extractor().extract(html, "");
        assert_eq!(findings.emails.len(), 1);
        assert_eq!(findings.emails[0].address, "direction@cabinet-dupre.fr");
        assert!(!findings.emails[0].from_mailto);
    }

    #[test]
    fn filename_false_positives_are_rejected() {
        let html = r#"<img src="logo@2x.png"> <p>photo@site.fr.jpeg</p>"#;
        let findings = extractor().extract(html, "photo@site.fr.jpeg");
        assert!(findings.emails.is_empty());
    }

    #[test]
    fn placeholder_domains_are_rejected() {
        let findings = extractor().extract("", "john@example.com admin@sub.sentry.io");
        assert!(findings.emails.is_empty());
    }

    #[test]
    fn generic_vs_personal_classification() {
        let e = |address: &str| ExtractedEmail {
            address: address.to_string(),
            from_mailto: false,
        };
        assert_eq!(e("contact@dupre.fr").kind(), EmailKind::Generic);
        assert_eq!(e("accueil@dupre.fr").kind(), EmailKind::Generic);
        assert_eq!(e("jean.dupre@dupre.fr").kind(), EmailKind::Personal);
    }

    #[test]
    fn share_links_are_not_the_business_own_profile() {
        let html = r#"
            <a href="https://www.facebook.com/sharer/sharer.php?u=https://dupre.fr">Partager</a>
            <a href="https://twitter.com/intent/tweet?url=https://dupre.fr">Tweeter</a>
            <a href="https://www.facebook.com/cabinetdupre">Notre page</a>
        "#;
        let socials = extractor().extract(html, "").socials;
        assert_eq!(
            socials.facebook.as_deref(),
            Some("https://www.facebook.com/cabinetdupre")
        );
        assert!(socials.twitter.is_none());
    }

    #[test]
    fn one_canonical_url_per_platform() {
        let html = r#"
            <a href="https://linkedin.com/company/dupre">LinkedIn</a>
            <a href="https://linkedin.com/company/other">Autre</a>
        "#;
        let socials = extractor().extract(html, "").socials;
        assert_eq!(
            socials.linkedin.as_deref(),
            Some("https://linkedin.com/company/dupre")
        );
    }

    #[test]
    fn french_phone_and_siren_recognition() {
        let ex = extractor();
        let text = "Tél : 01 42 68 53 00 — SIREN 552 100 554";
        assert_eq!(ex.first_phone(text).as_deref(), Some("01 42 68 53 00"));
        assert_eq!(ex.first_siren(text).as_deref(), Some("552100554"));
    }
}
