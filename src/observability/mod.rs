//! Structured logging setup and log hygiene helpers.

use regex::Regex;
use tracing_subscriber::EnvFilter;

/// Initialize structured logging with `RUST_LOG` environment variable support.
///
/// Defaults to `trendlens=info` when `RUST_LOG` is not set. Call once at
/// program startup — subsequent calls are silently ignored by
/// `tracing_subscriber`.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trendlens=info"));

    // try_init so double-init in tests doesn't panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Redact credentials before text reaches a log line.
///
/// Covers the `pwd` query parameter, the `X-MCP-Password` header, and
/// generic `password=`/`MCP_SERVER_PASSWORD=` assignments.
pub fn redact_credentials(text: &str) -> String {
    let patterns: &[(&str, &str)] = &[
        (r"(?i)([?&]pwd)=[^&\s]+", "$1=***REDACTED***"),
        (
            r"(?i)(x-mcp-password)\s*[:=]\s*\S+",
            "$1: ***REDACTED***",
        ),
        (
            r#"(?i)(password|passwd|mcp_server_password)\s*[:=]\s*['"]?([^\s'"]+)['"]?"#,
            "$1=***REDACTED***",
        ),
    ];

    let mut result = text.to_string();
    for (pattern, replacement) in patterns {
        if let Ok(re) = Regex::new(pattern) {
            result = re.replace_all(&result, *replacement).to_string();
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
