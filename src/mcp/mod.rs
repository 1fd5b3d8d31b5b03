//! MCP surface: the tool router, the stdio entry point, the HTTP transport,
//! and the password gate.

pub mod auth;
pub mod http;
pub mod server;

pub use auth::AuthConfig;
pub use http::run_http_server;
pub use server::{run_server, TrendLensServer};
