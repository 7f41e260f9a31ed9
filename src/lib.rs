pub mod config;
pub mod crawler;
pub mod date;
pub mod error;
pub mod http_client;
pub mod markup;
pub mod models;
pub mod post;
pub mod sources;

pub use crawler::{CrawlOptions, CrawlReport, Crawler, FailurePolicy};
pub use models::{Candidate, DetailInfo, Title};
