pub mod cli;
pub mod run;
pub mod run_prospection;
pub mod show_stats;

pub use cli::{MenuAction, ProspectorApp};
