//! HTTP transport for the MCP server using rmcp's StreamableHttpService.
//!
//! Enables remote MCP clients to connect over HTTP instead of stdio. Every
//! route, including `/health`, sits behind the password gate from
//! [`super::auth`].

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use super::auth::AuthConfig;
use super::server::TrendLensServer;
use crate::services::ServiceRegistry;

async fn health() -> (StatusCode, axum::Json<serde_json::Value>) {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Build the gated application router.
///
/// The MCP endpoint lives at `/mcp` (POST for requests, SSE for
/// server-initiated messages); each client gets its own session.
pub fn app(registry: Arc<ServiceRegistry>, auth: AuthConfig) -> Router {
    use rmcp::transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpService,
    };

    let server = TrendLensServer::new(registry);
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    Router::new()
        .route("/health", get(health))
        .nest_service("/mcp", service)
        .layer(axum::middleware::from_fn_with_state(
            auth,
            super::auth::require_password,
        ))
}

/// Start the MCP server over HTTP on the given address.
pub async fn run_http_server(
    registry: Arc<ServiceRegistry>,
    addr: &str,
    auth: AuthConfig,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if auth.is_open() {
        tracing::warn!("no password configured, the HTTP endpoint is open");
    }
    let router = app(registry, auth);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("TrendLens MCP server listening on http://{}/mcp", addr);
    eprintln!("TrendLens MCP server listening on http://{}/mcp", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down HTTP server");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn server_can_be_cloned_for_http_factory() {
        // StreamableHttpService requires a Clone factory. Verify the full
        // construction pipeline against an empty project root.
        let tmp = TempDir::new().unwrap();
        let registry = Arc::new(ServiceRegistry::new(tmp.path()).unwrap());
        let server = TrendLensServer::new(registry);
        let _cloned = server.clone();
    }
}
