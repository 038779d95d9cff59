use std::sync::Arc;

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use tracing::info;

use crate::cli::cli::ProspectorApp;
use crate::export::LeadExporter;
use crate::models::{sector_labels, Result, SearchQuery};
use crate::pipeline::Prospector;
use crate::sources::ConfiguredSource;

impl ProspectorApp {
    pub async fn run_prospection(&self) -> Result<()> {
        println!("\n🔍 New Prospection");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if self.sources.is_empty() {
            return Err("No listing sources configured in sources.yml".into());
        }

        let labels = sector_labels();
        let sector_idx = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Business sector")
            .items(&labels)
            .default(0)
            .interact()?;
        let sector = labels[sector_idx].to_string();

        let department: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Department code (e.g. 75, 69, 13)")
            .default("75".to_string())
            .interact_text()?;

        let max_results: usize = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("How many leads (1-100)?")
            .default(20)
            .interact_text()?;

        let source_config = if self.sources.len() == 1 {
            self.sources[0].clone()
        } else {
            let names: Vec<&str> = self.sources.iter().map(|s| s.name.as_str()).collect();
            let idx = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Listing source")
                .items(&names)
                .default(0)
                .interact()?;
            self.sources[idx].clone()
        };

        let query = SearchQuery::new(sector, department);
        info!(
            "🎯 Prospecting {} in department {} via {}",
            query.sector, query.department, source_config.name
        );

        let source = Arc::new(ConfiguredSource::new(source_config));
        let prospector = Prospector::assemble(self.config.clone(), self.db_pool.clone(), source)?;
        let leads = prospector.run(&query, max_results).await?;

        println!("\n✅ Collected {} new leads", leads.len());
        for lead in &leads {
            let email = lead
                .best_email()
                .map(|e| e.address.as_str())
                .unwrap_or("no email");
            println!(
                "  • {} — {} ({}, score {})",
                lead.name, email, lead.email_status, lead.quality_score
            );
        }

        if leads.is_empty() {
            return Ok(());
        }

        let export = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Export these leads now?")
            .default(true)
            .interact()?;
        if export {
            let formats = vec!["CSV", "JSON", "Both"];
            let choice = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("Export format")
                .items(&formats)
                .default(0)
                .interact()?;

            let exporter = LeadExporter::new(self.config.output.pretty_json);
            if choice == 0 || choice == 2 {
                let path = exporter.generate_filename(&self.config.output.directory, "csv");
                exporter.export_csv(&leads, &path)?;
                println!("📤 CSV written to {}", path);
            }
            if choice == 1 || choice == 2 {
                let path = exporter.generate_filename(&self.config.output.directory, "json");
                exporter.export_json(&leads, &path)?;
                println!("📤 JSON written to {}", path);
            }
        }

        Ok(())
    }
}
