pub mod leads;
pub mod scrape;

pub use leads::{get_leads, get_stats};
pub use scrape::run_scrape;
