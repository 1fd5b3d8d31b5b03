use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use trendlens::mcp::{run_http_server, run_server, AuthConfig};
use trendlens::observability::init_logging;
use trendlens::ServiceRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Serve MCP on stdin/stdout (local clients).
    Stdio,
    /// Serve MCP over HTTP with the password gate.
    Http,
}

/// TrendLens — hot-news aggregation MCP server.
#[derive(Debug, Parser)]
#[command(name = "trendlens", version, about)]
struct Cli {
    /// Transport to serve MCP on.
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Bind address for the HTTP transport.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for the HTTP transport.
    #[arg(long, default_value_t = 3333)]
    port: u16,

    /// Project root containing config/config.yaml and output/.
    #[arg(long)]
    project_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let project_root = match cli.project_root {
        Some(root) => root,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let registry = match ServiceRegistry::new(&project_root) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            tracing::error!("failed to start: {}", e);
            eprintln!("failed to start: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.transport {
        Transport::Stdio => run_server(registry).await,
        Transport::Http => {
            let addr = format!("{}:{}", cli.host, cli.port);
            run_http_server(registry, &addr, AuthConfig::from_env()).await
        }
    };

    if let Err(e) = result {
        tracing::error!("server terminated with error: {}", e);
        eprintln!("server terminated with error: {e}");
        std::process::exit(1);
    }
}
