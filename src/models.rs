use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One prospection query: a professional sector plus a French
/// department code ("75", "69", ... or empty for the whole country).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub sector: String,
    pub department: String,
}

impl SearchQuery {
    pub fn new(sector: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            sector: sector.into(),
            department: department.into(),
        }
    }
}

// Directory URL slugs for the known sectors. Unknown labels fall back
// to a generic slugification so custom sectors still produce a query.
const SECTOR_SLUGS: &[(&str, &str)] = &[
    ("CGP", "cgp"),
    ("Avocat", "avocat"),
    ("Notaire", "notaire"),
    ("Agent d'assurance", "agent-dassurance"),
    ("Banque privée", "banque-privee"),
    ("Courtier", "courtier"),
    ("Family office", "family-office-et-mfo"),
    ("Professionnel immobilier", "professionnel-immobilier"),
    ("Société de gestion", "societe-de-gestion"),
    ("Autre", "autre"),
];

pub fn sector_labels() -> Vec<&'static str> {
    SECTOR_SLUGS.iter().map(|(name, _)| *name).collect()
}

pub fn sector_slug(label: &str) -> String {
    for (name, slug) in SECTOR_SLUGS {
        if name.eq_ignore_ascii_case(label) {
            return (*slug).to_string();
        }
    }
    slugify(label)
}

fn slugify(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_dash = true;
    for c in fold_accents(label).chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Fold the accented characters common in French business names so
/// that "Société Générale" and "societe generale" compare equal.
pub fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' | 'á' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' | 'í' => 'i',
            'ô' | 'ö' | 'ó' => 'o',
            'ù' | 'û' | 'ü' | 'ú' => 'u',
            'ç' => 'c',
            'À' | 'Â' | 'Ä' | 'Á' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'Î' | 'Ï' | 'Í' => 'I',
            'Ô' | 'Ö' | 'Ó' => 'O',
            'Ù' | 'Û' | 'Ü' | 'Ú' => 'U',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

/// Lowercased, accent-folded, punctuation-free form used for
/// deduplication keys and registry queries.
pub fn normalize_name(name: &str) -> String {
    fold_accents(name)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Locator for a not-yet-visited business profile found while
/// crawling a listing. The title is a hint only; the detail page is
/// authoritative for the business name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReference {
    pub url: String,
    pub title: Option<String>,
}

impl CandidateReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }

    pub fn with_title(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: Some(title.into()),
        }
    }

    /// Normalized locator used by the crawl-session seen set: scheme
    /// and fragment noise removed so `/profil/42` and `/profil/42/`
    /// count once.
    pub fn normalized(&self) -> String {
        let mut s = self.url.trim().to_lowercase();
        if let Some(pos) = s.find('#') {
            s.truncate(pos);
        }
        s = s
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("www.")
            .trim_end_matches('/')
            .to_string();
        s
    }
}

/// Raw fields pulled from a detail page before any enrichment.
/// Discarded once folded into a Lead or rejected.
#[derive(Debug, Clone, Default)]
pub struct RawProfile {
    pub name: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailSource {
    DirectoryPage,
    BusinessWebsite,
    Registry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailKind {
    Generic,
    Personal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailStatus {
    Valid,
    Risky,
    Invalid,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailCandidate {
    pub address: String,
    pub source: EmailSource,
    #[serde(rename = "type")]
    pub kind: EmailKind,
    pub confidence: u8,
}

/// One canonical URL per platform, share/intent links excluded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
}

impl SocialLinks {
    pub fn is_empty(&self) -> bool {
        self.linkedin.is_none()
            && self.facebook.is_none()
            && self.instagram.is_none()
            && self.twitter.is_none()
    }

    /// Keep the existing URL when both sides have one; the detail
    /// page is scanned before the website, so first write wins.
    pub fn merge(&mut self, other: SocialLinks) {
        if self.linkedin.is_none() {
            self.linkedin = other.linkedin;
        }
        if self.facebook.is_none() {
            self.facebook = other.facebook;
        }
        if self.instagram.is_none() {
            self.instagram = other.instagram;
        }
        if self.twitter.is_none() {
            self.twitter = other.twitter;
        }
    }
}

/// Canonical record from the company registry. Never fabricated: a
/// failed or empty lookup yields no RegistryInfo at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryInfo {
    pub registration_id: String,
    pub legal_name: String,
    pub registered_address: Option<String>,
    pub principal_officer: Option<String>,
}

/// One collected business record. Assembled exactly once by the
/// harvester after all enrichment steps resolve, immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub sector: String,
    pub address: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub emails: Vec<EmailCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_role: Option<String>,
    pub socials: SocialLinks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
    pub quality_score: u8,
    pub email_status: EmailStatus,
    pub collected_at: DateTime<Utc>,
}

impl Lead {
    /// Best email first: candidates are kept sorted by confidence at
    /// assembly time.
    pub fn best_email(&self) -> Option<&EmailCandidate> {
        self.emails.first()
    }
}

impl std::fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EmailStatus::Valid => "Valid",
            EmailStatus::Risky => "Risky",
            EmailStatus::Invalid => "Invalid",
            EmailStatus::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

impl std::fmt::Display for EmailSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EmailSource::DirectoryPage => "directory-page",
            EmailSource::BusinessWebsite => "business-website",
            EmailSource::Registry => "registry",
        };
        write!(f, "{}", s)
    }
}
