//! TrendLens — hot-news aggregation MCP server.
//!
//! Serves crawled news snapshots to MCP clients over stdio or HTTP: query
//! tools (latest news, by date, trending watchlist words), search tools
//! (keyword/fuzzy/entity search, history search), analysis tools (topic
//! trends, cross-platform insights, sentiment, similarity, digests), and
//! management tools (config, status, on-demand crawl).

pub mod config;
pub mod crawler;
pub mod error;
pub mod mcp;
pub mod observability;
pub mod params;
pub mod services;
pub mod storage;
pub mod types;

pub use error::{Result, TrendLensError};
pub use services::ServiceRegistry;
