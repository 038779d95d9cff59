use dialoguer::{theme::ColorfulTheme, Select};
use tracing::{error, info};

use crate::cli::cli::{MenuAction, ProspectorApp};
use crate::models::Result;

impl ProspectorApp {
    pub async fn run(&self) -> Result<()> {
        println!("\n🚀 Welcome to Lead Prospector!");
        println!("═══════════════════════════════════════");

        // Show initial stats
        self.show_stats().await?;

        loop {
            let actions = vec![
                MenuAction::RunProspection,
                MenuAction::ShowStats,
                MenuAction::ExportRecent,
                MenuAction::StartApiServer,
                MenuAction::Exit,
            ];

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("\nSelect an action")
                .default(0)
                .items(&actions)
                .interact()?;

            match &actions[selection] {
                MenuAction::RunProspection => {
                    if let Err(e) = self.run_prospection().await {
                        error!("Prospection failed: {}", e);
                    }
                }
                MenuAction::ShowStats => {
                    if let Err(e) = self.show_stats().await {
                        error!("Failed to show stats: {}", e);
                    }
                }
                MenuAction::ExportRecent => {
                    if let Err(e) = self.export_recent().await {
                        error!("Export failed: {}", e);
                    }
                }
                MenuAction::StartApiServer => {
                    info!("Starting the API server, Ctrl+C to stop...");
                    let rocket = crate::server::build_rocket(
                        self.config.clone(),
                        self.db_pool.clone(),
                        self.sources.clone(),
                    );
                    if let Err(e) = rocket.launch().await {
                        error!("API server failed: {}", e);
                    }
                }
                MenuAction::Exit => {
                    println!("\n👋 Thanks for using Lead Prospector!");
                    break;
                }
            }
        }

        Ok(())
    }
}
