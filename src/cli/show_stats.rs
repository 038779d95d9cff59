use dialoguer::{theme::ColorfulTheme, Input, Select};

use crate::cli::cli::ProspectorApp;
use crate::database::SqliteLeadStore;
use crate::export::LeadExporter;
use crate::models::Result;

impl ProspectorApp {
    pub async fn show_stats(&self) -> Result<()> {
        let store = SqliteLeadStore::new(self.db_pool.clone(), self.config.dedup.match_strategy);
        let total = store.count().await?;

        println!("\n📊 Lead Store");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("  Total leads: {}", total);

        if total > 0 {
            let recent = store.recent(5).await?;
            println!("  Most recent:");
            for lead in &recent {
                let email = lead
                    .best_email()
                    .map(|e| e.address.as_str())
                    .unwrap_or("no email");
                println!(
                    "    • {} ({}) — {} [score {}]",
                    lead.name, lead.sector, email, lead.quality_score
                );
            }
        }

        Ok(())
    }

    pub async fn export_recent(&self) -> Result<()> {
        let store = SqliteLeadStore::new(self.db_pool.clone(), self.config.dedup.match_strategy);
        let total = store.count().await?;
        if total == 0 {
            println!("\n📭 The lead store is empty, nothing to export.");
            return Ok(());
        }

        let limit: i64 = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("How many recent leads to export?")
            .default(total.min(100))
            .interact_text()?;
        let leads = store.recent(limit.max(1)).await?;

        let formats = vec!["CSV", "JSON"];
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Export format")
            .items(&formats)
            .default(0)
            .interact()?;

        let exporter = LeadExporter::new(self.config.output.pretty_json);
        let path = if choice == 0 {
            let path = exporter.generate_filename(&self.config.output.directory, "csv");
            exporter.export_csv(&leads, &path)?;
            path
        } else {
            let path = exporter.generate_filename(&self.config.output.directory, "json");
            exporter.export_json(&leads, &path)?;
            path
        };
        println!("📤 {} leads written to {}", leads.len(), path);

        Ok(())
    }
}
