use tracing::info;

use crate::config::Config;
use crate::database::DbPool;
use crate::models::Result;
use crate::sources::{load_sources_from_yaml, SourceConfig};

#[derive(Debug, Clone)]
pub enum MenuAction {
    RunProspection,
    ShowStats,
    ExportRecent,
    StartApiServer,
    Exit,
}

impl std::fmt::Display for MenuAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuAction::RunProspection => {
                write!(f, "🔍 Run a prospection (sector + department)")
            }
            MenuAction::ShowStats => write!(f, "📊 Show lead store statistics"),
            MenuAction::ExportRecent => write!(f, "📤 Export recent leads to CSV/JSON"),
            MenuAction::StartApiServer => write!(f, "🌐 Start the API server"),
            MenuAction::Exit => write!(f, "🚪 Exit"),
        }
    }
}

pub struct ProspectorApp {
    pub config: Config,
    pub db_pool: DbPool,
    pub sources: Vec<SourceConfig>,
}

impl ProspectorApp {
    pub async fn new(config: Config, db_pool: DbPool) -> Result<Self> {
        info!("Loading listing sources from configuration...");
        let sources = load_sources_from_yaml("sources.yml")
            .await?
            .into_iter()
            .map(|s| s.into_config())
            .collect::<Vec<_>>();
        info!("Loaded {} listing sources", sources.len());

        Ok(Self {
            config,
            db_pool,
            sources,
        })
    }
}
