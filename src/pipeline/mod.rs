pub mod crawler;
pub mod harvester;
pub mod orchestrator;

pub use crawler::ListingCrawler;
pub use harvester::{HarvestContext, ProfileHarvester};
pub use orchestrator::Prospector;
