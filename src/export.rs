use std::io::Write;

use chrono::Utc;
use tracing::info;

use crate::models::{Lead, Result};

pub struct LeadExporter {
    pretty_json: bool,
}

impl LeadExporter {
    pub fn new(pretty_json: bool) -> Self {
        Self { pretty_json }
    }

    /// CSV with a UTF-8 BOM so Excel opens the accented French names
    /// correctly. A lead's emails land in one field joined by
    /// semicolons.
    pub fn export_csv(&self, leads: &[Lead], filename: &str) -> Result<()> {
        if let Some(parent) = std::path::Path::new(filename).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(filename)?;

        file.write_all("\u{feff}".as_bytes())?;
        writeln!(
            file,
            "name,sector,address,city,postal_code,website,phone,emails,contact_name,contact_role,registration_id,quality_score,email_status,collected_at"
        )?;

        for lead in leads {
            let emails = lead
                .emails
                .iter()
                .map(|e| e.address.as_str())
                .collect::<Vec<_>>()
                .join(";");
            writeln!(
                file,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                csv_field(&lead.name),
                csv_field(&lead.sector),
                csv_field(&lead.address),
                csv_field(&lead.city),
                csv_field(lead.postal_code.as_deref().unwrap_or("")),
                csv_field(lead.website.as_deref().unwrap_or("")),
                csv_field(lead.phone.as_deref().unwrap_or("")),
                csv_field(&emails),
                csv_field(lead.contact_name.as_deref().unwrap_or("")),
                csv_field(lead.contact_role.as_deref().unwrap_or("")),
                csv_field(lead.registration_id.as_deref().unwrap_or("")),
                lead.quality_score,
                lead.email_status,
                lead.collected_at.to_rfc3339(),
            )?;
        }

        info!("📤 Exported {} leads to {}", leads.len(), filename);
        Ok(())
    }

    /// The leads exactly as the pipeline produced them.
    pub fn export_json(&self, leads: &[Lead], filename: &str) -> Result<()> {
        if let Some(parent) = std::path::Path::new(filename).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = if self.pretty_json {
            serde_json::to_string_pretty(leads)?
        } else {
            serde_json::to_string(leads)?
        };
        std::fs::write(filename, json)?;
        info!("📤 Exported {} leads to {}", leads.len(), filename);
        Ok(())
    }

    pub fn generate_filename(&self, directory: &str, extension: &str) -> String {
        format!(
            "{}/leads_{}.{}",
            directory.trim_end_matches('/'),
            Utc::now().format("%Y%m%d_%H%M%S"),
            extension
        )
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailCandidate, EmailKind, EmailSource, EmailStatus, SocialLinks};
    use uuid::Uuid;

    fn lead_with_two_emails() -> Lead {
        Lead {
            id: Uuid::new_v4(),
            name: "Cabinet Dupré, Associés".to_string(),
            sector: "Avocat".to_string(),
            address: "12 rue de la Paix".to_string(),
            city: "75".to_string(),
            postal_code: Some("75002".to_string()),
            website: Some("https://dupre.fr".to_string()),
            phone: Some("01 42 68 53 00".to_string()),
            emails: vec![
                EmailCandidate {
                    address: "jean.dupre@dupre.fr".to_string(),
                    source: EmailSource::BusinessWebsite,
                    kind: EmailKind::Personal,
                    confidence: 90,
                },
                EmailCandidate {
                    address: "contact@dupre.fr".to_string(),
                    source: EmailSource::DirectoryPage,
                    kind: EmailKind::Generic,
                    confidence: 80,
                },
            ],
            contact_name: None,
            contact_role: None,
            socials: SocialLinks::default(),
            registration_id: Some("552100554".to_string()),
            quality_score: 85,
            email_status: EmailStatus::Valid,
            collected_at: Utc::now(),
        }
    }

    #[test]
    fn csv_starts_with_bom_and_joins_emails_with_semicolons() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        let exporter = LeadExporter::new(false);
        exporter
            .export_csv(&[lead_with_two_emails()], path.to_str().unwrap())
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let content = String::from_utf8(bytes).unwrap();
        assert!(content.contains("jean.dupre@dupre.fr;contact@dupre.fr"));
        // The comma inside the name must not split the column.
        assert!(content.contains("\"Cabinet Dupré, Associés\""));
    }

    #[test]
    fn json_export_round_trips_leads_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.json");
        let lead = lead_with_two_emails();
        LeadExporter::new(true)
            .export_json(std::slice::from_ref(&lead), path.to_str().unwrap())
            .unwrap();

        let loaded: Vec<Lead> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, lead.name);
        assert_eq!(loaded[0].emails.len(), 2);
    }
}
