pub mod api;
pub mod cli;
pub mod config;
pub mod database;
pub mod enrich;
pub mod export;
pub mod extract;
pub mod fetcher;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod server;
pub mod sources;
