//! MCP server implementation using rmcp over stdio transport.
//!
//! Exposes the 13 TrendLens tools that an MCP client can invoke to query,
//! search, and analyze aggregated hot-news snapshots.

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{tool, tool_router, ErrorData as McpError, ServerHandler, ServiceExt};
use serde::Deserialize;

use crate::error::Result;
use crate::params::DateRangeParam;
use crate::services::analytics::{AnalysisKind, InsightKind, ReportType, TrendKnobs};
use crate::services::config_mgmt::ConfigSection;
use crate::services::data::TrendingMode;
use crate::services::search::{SearchMode, SortBy, TimePreset};
use crate::services::ServiceRegistry;

// ---------------------------------------------------------------------------
// Server struct
// ---------------------------------------------------------------------------

/// TrendLens MCP server.
///
/// Holds the shared [`ServiceRegistry`] behind an `Arc` to satisfy the
/// `Clone + Send + Sync` requirements of rmcp's `ServerHandler` trait; every
/// tool call dispatches to one of the registry's services.
#[derive(Clone)]
pub struct TrendLensServer {
    registry: Arc<ServiceRegistry>,
}

impl std::fmt::Debug for TrendLensServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrendLensServer").finish_non_exhaustive()
    }
}

impl TrendLensServer {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }
}

// Documented defaults for the contested knobs. The similarity metric is
// char-bigram Jaccard, which scores CJK text lower than sequence matching;
// clients that get too few fuzzy results should lower `threshold` explicitly.
pub(crate) const DEFAULT_SEARCH_THRESHOLD: f64 = 0.6;
pub(crate) const DEFAULT_SIMILAR_THRESHOLD: f64 = 0.6;
pub(crate) const DEFAULT_SIMILAR_LIMIT: usize = 50;
pub(crate) const DEFAULT_HISTORY_THRESHOLD: f64 = 0.4;
pub(crate) const DEFAULT_HISTORY_LIMIT: usize = 50;
pub(crate) const DEFAULT_HISTORY_PRESET: TimePreset = TimePreset::Yesterday;

/// Serialize a service result for the transport. Errors become a structured
/// envelope with stable `error` and `message` keys instead of a protocol
/// failure, so clients can always parse the payload.
fn render(result: Result<serde_json::Value>) -> String {
    let value = match result {
        Ok(v) => v,
        Err(e) => serde_json::json!({ "error": e.kind(), "message": e.to_string() }),
    };
    serde_json::to_string_pretty(&value)
        .unwrap_or_else(|e| format!("{{\"error\":\"StorageError\",\"message\":\"{e}\"}}"))
}

// ---------------------------------------------------------------------------
// Tool parameter structs (rmcp 0.14 uses Parameters<T>)
// ---------------------------------------------------------------------------

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct LatestNewsParams {
    #[schemars(description = "Platform IDs to include (default: all configured platforms)")]
    pub platforms: Option<Vec<String>>,
    #[schemars(description = "Maximum items to return (default 50, max 1000)")]
    pub limit: Option<usize>,
    #[schemars(description = "Include item URLs in the output (default false)")]
    pub include_url: Option<bool>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct TrendingTopicsParams {
    #[schemars(description = "How many watchlist words to return (default 10)")]
    pub top_n: Option<usize>,
    #[schemars(description = "'current' counts the latest crawl batch, 'daily' everything captured today (default 'current')")]
    pub mode: Option<TrendingMode>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct NewsByDateParams {
    #[schemars(description = "Date to query: 'today', 'yesterday', 'N days ago', 昨天/前天/N天前, or YYYY-MM-DD (default today)")]
    pub date_query: Option<String>,
    #[schemars(description = "Platform IDs to include (default: all configured platforms)")]
    pub platforms: Option<Vec<String>>,
    #[schemars(description = "Maximum items to return (default 50, max 1000)")]
    pub limit: Option<usize>,
    #[schemars(description = "Include item URLs in the output (default false)")]
    pub include_url: Option<bool>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct TopicTrendParams {
    #[schemars(description = "Topic text to track in news titles")]
    pub topic: String,
    #[schemars(description = "'trend', 'lifecycle', 'viral', or 'predict' (default 'trend')")]
    pub analysis_type: Option<AnalysisKind>,
    #[schemars(description = "Date window for 'trend'/'lifecycle' (default: last 7 days)")]
    pub date_range: Option<DateRangeParam>,
    #[schemars(description = "Series bucket size echoed in 'trend' output (default 'day')")]
    pub granularity: Option<String>,
    #[schemars(description = "Surge ratio treated as viral for 'viral' (default 3.0)")]
    pub threshold: Option<f64>,
    #[schemars(description = "Observation window in hours for 'viral' (default 24)")]
    pub time_window: Option<u32>,
    #[schemars(description = "Projection horizon in hours for 'predict' (default 6)")]
    pub lookahead_hours: Option<u32>,
    #[schemars(description = "Minimum confidence for a reliable prediction (default 0.7)")]
    pub confidence_threshold: Option<f64>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct DataInsightsParams {
    #[schemars(description = "'platform_compare', 'platform_activity', or 'keyword_cooccur' (default 'platform_compare')")]
    pub insight_type: Option<InsightKind>,
    #[schemars(description = "Topic filter for 'platform_compare' (optional)")]
    pub topic: Option<String>,
    #[schemars(description = "Date window to analyze (default: last 7 days)")]
    pub date_range: Option<DateRangeParam>,
    #[schemars(description = "Minimum pair frequency for 'keyword_cooccur' (default 3)")]
    pub min_frequency: Option<usize>,
    #[schemars(description = "Maximum rows to return (default 20)")]
    pub top_n: Option<usize>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct SentimentParams {
    #[schemars(description = "Only analyze titles mentioning this topic (optional)")]
    pub topic: Option<String>,
    #[schemars(description = "Platform IDs to include (default: all configured platforms)")]
    pub platforms: Option<Vec<String>>,
    #[schemars(description = "Date window to analyze (default: today)")]
    pub date_range: Option<DateRangeParam>,
    #[schemars(description = "Maximum items to classify (default 50, max 100)")]
    pub limit: Option<usize>,
    #[schemars(description = "Sort by hotness weight instead of title (default true)")]
    pub sort_by_weight: Option<bool>,
    #[schemars(description = "Include item URLs in the output (default false)")]
    pub include_url: Option<bool>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct SimilarNewsParams {
    #[schemars(description = "Title to find similar items for")]
    pub reference_title: String,
    #[schemars(description = "Minimum similarity in [0,1] (default 0.6)")]
    pub threshold: Option<f64>,
    #[schemars(description = "Maximum items to return (default 50, max 100)")]
    pub limit: Option<usize>,
    #[schemars(description = "Include item URLs in the output (default false)")]
    pub include_url: Option<bool>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct SummaryReportParams {
    #[schemars(description = "'daily' or 'weekly' (default 'daily')")]
    pub report_type: Option<ReportType>,
    #[schemars(description = "Explicit date window (default: today for daily, last 7 days for weekly)")]
    pub date_range: Option<DateRangeParam>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct SearchNewsParams {
    #[schemars(description = "Search query")]
    pub query: String,
    #[schemars(description = "'keyword' (all tokens must match), 'fuzzy' (similarity), or 'entity' (verbatim phrase); default 'keyword'")]
    pub search_mode: Option<SearchMode>,
    #[schemars(description = "Date window to search (default: today)")]
    pub date_range: Option<DateRangeParam>,
    #[schemars(description = "Platform IDs to include (default: all configured platforms)")]
    pub platforms: Option<Vec<String>>,
    #[schemars(description = "Maximum results (default 50, max 1000)")]
    pub limit: Option<usize>,
    #[schemars(description = "'relevance', 'weight', or 'date' (default 'relevance')")]
    pub sort_by: Option<SortBy>,
    #[schemars(description = "Similarity floor for 'fuzzy' mode (default 0.6)")]
    pub threshold: Option<f64>,
    #[schemars(description = "Include item URLs in the output (default false)")]
    pub include_url: Option<bool>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct RelatedHistoryParams {
    #[schemars(description = "Seed text whose related coverage to find")]
    pub reference_text: String,
    #[schemars(description = "'yesterday', 'last_week', 'last_month', or 'custom' (default 'yesterday')")]
    pub time_preset: Option<TimePreset>,
    #[schemars(description = "Range start, required when time_preset is 'custom'")]
    pub start_date: Option<String>,
    #[schemars(description = "Range end, required when time_preset is 'custom'")]
    pub end_date: Option<String>,
    #[schemars(description = "Relevance floor in [0,1] (default 0.4)")]
    pub threshold: Option<f64>,
    #[schemars(description = "Maximum results (default 50, max 100)")]
    pub limit: Option<usize>,
    #[schemars(description = "Include item URLs in the output (default false)")]
    pub include_url: Option<bool>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct CurrentConfigParams {
    #[schemars(description = "'all', 'crawler', 'push', 'keywords', or 'weights' (default 'all')")]
    pub section: Option<ConfigSection>,
}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct SystemStatusParams {}

#[derive(Deserialize, schemars::JsonSchema)]
pub(crate) struct TriggerCrawlParams {
    #[schemars(description = "Platform IDs to crawl (default: all configured platforms)")]
    pub platforms: Option<Vec<String>>,
    #[schemars(description = "Persist the collected items as a new snapshot batch (default false)")]
    pub save_to_local: Option<bool>,
    #[schemars(description = "Include item URLs in the returned data (default false)")]
    pub include_url: Option<bool>,
}

// ---------------------------------------------------------------------------
// Tool implementations
// ---------------------------------------------------------------------------

#[tool_router]
impl TrendLensServer {
    // 1. get_latest_news — most recent crawl batch
    #[tool(
        name = "get_latest_news",
        description = "Get the most recent batch of hot news, optionally filtered by platform. Every item is tagged with its source platform."
    )]
    async fn get_latest_news(&self, Parameters(p): Parameters<LatestNewsParams>) -> String {
        render(self.registry.data.get_latest_news(
            p.platforms,
            p.limit.unwrap_or(50),
            p.include_url.unwrap_or(false),
        ))
    }

    // 2. get_trending_topics — watchlist word frequency
    #[tool(
        name = "get_trending_topics",
        description = "Count how often the configured watchlist words appear in news titles, with a per-platform breakdown. Counts the user's watchlist, not automatic topic extraction."
    )]
    async fn get_trending_topics(&self, Parameters(p): Parameters<TrendingTopicsParams>) -> String {
        render(
            self.registry
                .data
                .get_trending_topics(p.top_n.unwrap_or(10), p.mode.unwrap_or(TrendingMode::Current)),
        )
    }

    // 3. get_news_by_date — natural-language date lookup
    #[tool(
        name = "get_news_by_date",
        description = "Get all news captured on a specific day. Accepts natural-language dates in English and Chinese ('yesterday', '3 days ago', 前天) as well as YYYY-MM-DD."
    )]
    async fn get_news_by_date(&self, Parameters(p): Parameters<NewsByDateParams>) -> String {
        render(self.registry.data.get_news_by_date(
            p.date_query,
            p.platforms,
            p.limit.unwrap_or(50),
            p.include_url.unwrap_or(false),
        ))
    }

    // 4. analyze_topic_trend — unified trend analysis
    #[tool(
        name = "analyze_topic_trend",
        description = "Analyze a topic over time: daily trend curve ('trend'), lifecycle phase ('lifecycle'), surge detection ('viral'), or short-term projection ('predict')."
    )]
    async fn analyze_topic_trend(&self, Parameters(p): Parameters<TopicTrendParams>) -> String {
        let defaults = TrendKnobs::default();
        let knobs = TrendKnobs {
            date_range: p.date_range,
            granularity: p.granularity.unwrap_or(defaults.granularity),
            threshold: p.threshold.unwrap_or(defaults.threshold),
            time_window_hours: p.time_window.unwrap_or(defaults.time_window_hours),
            lookahead_hours: p.lookahead_hours.unwrap_or(defaults.lookahead_hours),
            confidence_threshold: p
                .confidence_threshold
                .unwrap_or(defaults.confidence_threshold),
        };
        render(self.registry.analytics.analyze_topic_trend(
            &p.topic,
            p.analysis_type.unwrap_or(AnalysisKind::Trend),
            &knobs,
        ))
    }

    // 5. analyze_data_insights — cross-platform statistics
    #[tool(
        name = "analyze_data_insights",
        description = "Cross-platform statistics: coverage comparison ('platform_compare'), per-platform activity ('platform_activity'), or keyword co-occurrence pairs ('keyword_cooccur')."
    )]
    async fn analyze_data_insights(&self, Parameters(p): Parameters<DataInsightsParams>) -> String {
        render(self.registry.analytics.analyze_data_insights(
            p.insight_type.unwrap_or(InsightKind::PlatformCompare),
            p.topic,
            p.date_range.as_ref(),
            p.min_frequency.unwrap_or(3),
            p.top_n.unwrap_or(20),
        ))
    }

    // 6. analyze_sentiment — lexicon-based classification
    #[tool(
        name = "analyze_sentiment",
        description = "Classify news titles as positive, negative, or neutral using a built-in lexicon, with an aggregate distribution. Duplicate titles across platforms are collapsed."
    )]
    async fn analyze_sentiment(&self, Parameters(p): Parameters<SentimentParams>) -> String {
        render(self.registry.analytics.analyze_sentiment(
            p.topic,
            p.platforms,
            p.date_range.as_ref(),
            p.limit.unwrap_or(50),
            p.sort_by_weight.unwrap_or(true),
            p.include_url.unwrap_or(false),
        ))
    }

    // 7. find_similar_news — similarity over the latest batch
    #[tool(
        name = "find_similar_news",
        description = "Find items in the latest crawl batch whose titles are similar to a reference title, ranked by similarity score."
    )]
    async fn find_similar_news(&self, Parameters(p): Parameters<SimilarNewsParams>) -> String {
        render(self.registry.analytics.find_similar_news(
            &p.reference_title,
            p.threshold.unwrap_or(DEFAULT_SIMILAR_THRESHOLD),
            p.limit.unwrap_or(DEFAULT_SIMILAR_LIMIT),
            p.include_url.unwrap_or(false),
        ))
    }

    // 8. generate_summary_report — markdown digest
    #[tool(
        name = "generate_summary_report",
        description = "Generate a daily or weekly digest: per-platform counts, watchlist hits, and the hottest items, as structured data plus rendered markdown."
    )]
    async fn generate_summary_report(
        &self,
        Parameters(p): Parameters<SummaryReportParams>,
    ) -> String {
        render(self.registry.analytics.generate_summary_report(
            p.report_type.unwrap_or(ReportType::Daily),
            p.date_range.as_ref(),
        ))
    }

    // 9. search_news — unified search
    #[tool(
        name = "search_news",
        description = "Search news titles by keyword (all tokens must match), fuzzy similarity, or verbatim entity phrase, sorted by relevance, hotness weight, or date."
    )]
    async fn search_news(&self, Parameters(p): Parameters<SearchNewsParams>) -> String {
        render(self.registry.search.search_news(
            &p.query,
            p.search_mode.unwrap_or(SearchMode::Keyword),
            p.date_range.as_ref(),
            p.platforms,
            p.limit.unwrap_or(50),
            p.sort_by.unwrap_or(SortBy::Relevance),
            p.threshold.unwrap_or(DEFAULT_SEARCH_THRESHOLD),
            p.include_url.unwrap_or(false),
        ))
    }

    // 10. search_related_news_history — seed-based history search
    #[tool(
        name = "search_related_news_history",
        description = "Find historical coverage related to a seed text over a preset or custom time window, with a per-day time distribution."
    )]
    async fn search_related_news_history(
        &self,
        Parameters(p): Parameters<RelatedHistoryParams>,
    ) -> String {
        render(self.registry.search.search_related_news_history(
            &p.reference_text,
            p.time_preset.unwrap_or(DEFAULT_HISTORY_PRESET),
            p.start_date.as_deref(),
            p.end_date.as_deref(),
            p.threshold.unwrap_or(DEFAULT_HISTORY_THRESHOLD),
            p.limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
            p.include_url.unwrap_or(false),
        ))
    }

    // 11. get_current_config — effective configuration
    #[tool(
        name = "get_current_config",
        description = "Return the effective server configuration, either in full or a single section (crawler, push, keywords, weights)."
    )]
    async fn get_current_config(&self, Parameters(p): Parameters<CurrentConfigParams>) -> String {
        render(
            self.registry
                .config
                .get_current_config(p.section.unwrap_or(ConfigSection::All)),
        )
    }

    // 12. get_system_status — health snapshot
    #[tool(
        name = "get_system_status",
        description = "Service health: version, configured platforms, and snapshot storage statistics."
    )]
    async fn get_system_status(&self, Parameters(_p): Parameters<SystemStatusParams>) -> String {
        render(self.registry.system.get_system_status())
    }

    // 13. trigger_crawl — on-demand collection
    #[tool(
        name = "trigger_crawl",
        description = "Crawl the requested platforms now and return the collected items. Per-platform failures are reported in failed_platforms without aborting the run; set save_to_local to persist the items as a new snapshot batch."
    )]
    async fn trigger_crawl(&self, Parameters(p): Parameters<TriggerCrawlParams>) -> String {
        render(self.registry.system.trigger_crawl(
            p.platforms,
            p.save_to_local.unwrap_or(false),
            p.include_url.unwrap_or(false),
        ))
    }
}

// ---------------------------------------------------------------------------
// ServerHandler impl
// ---------------------------------------------------------------------------

impl ServerHandler for TrendLensServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "TrendLens — hot-news aggregation MCP server. Query crawled snapshots with \
                 get_latest_news / get_news_by_date / search_news, analyze them with \
                 analyze_topic_trend / analyze_data_insights / analyze_sentiment, and \
                 manage the service with get_system_status / trigger_crawl."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = std::result::Result<ListToolsResult, McpError>> + Send + '_
    {
        std::future::ready(Ok(ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: Self::tool_router().list_all(),
        }))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        // Unknown tools get a structured error payload, not a protocol error.
        let known = Self::tool_router()
            .list_all()
            .iter()
            .any(|t| t.name == request.name);
        if !known {
            return Ok(CallToolResult::error(vec![rmcp::model::Content::text(
                serde_json::json!({
                    "error": "ValidationError",
                    "message": format!("unknown tool '{}'", request.name),
                })
                .to_string(),
            )]));
        }
        let tool_context = rmcp::handler::server::tool::ToolCallContext::new(self, request, context);
        Self::tool_router().call(tool_context).await
    }
}

// ---------------------------------------------------------------------------
// Public entry point: run the MCP server over stdio
// ---------------------------------------------------------------------------

/// Start the MCP server on stdin/stdout. Stdio clients own the process, so
/// the password gate does not apply here.
///
/// Blocks until the client disconnects.
pub async fn run_server(
    registry: Arc<ServiceRegistry>,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let server = TrendLensServer::new(registry);
    let transport = rmcp::transport::io::stdio();
    let running = server.serve(transport).await.inspect_err(|e| {
        tracing::error!("MCP server error: {}", e);
    })?;
    let _ = running.waiting().await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
