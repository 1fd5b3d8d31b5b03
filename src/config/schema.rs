//! Configuration data structures for TrendLens.
//!
//! Defines the YAML config format: the platform catalog, crawler and push
//! settings, the user's watchlist words, and ranking weights. Loaded from
//! `config/config.yaml` under the project root with serde defaults for every
//! section, so a partial file is always valid.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for TrendLens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendLensConfig {
    /// Config format version (currently "1.0").
    #[serde(default = "default_version")]
    pub version: String,

    /// News platforms this deployment aggregates.
    #[serde(default = "default_platforms")]
    pub platforms: Vec<PlatformConfig>,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub push: PushConfig,

    #[serde(default)]
    pub keywords: KeywordsConfig,

    #[serde(default)]
    pub weights: WeightsConfig,
}

impl Default for TrendLensConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            platforms: default_platforms(),
            crawler: CrawlerConfig::default(),
            push: PushConfig::default(),
            keywords: KeywordsConfig::default(),
            weights: WeightsConfig::default(),
        }
    }
}

impl TrendLensConfig {
    /// IDs of every configured platform, in catalog order.
    pub fn platform_ids(&self) -> Vec<String> {
        self.platforms.iter().map(|p| p.id.clone()).collect()
    }

    /// Look up a platform's catalog entry by ID.
    pub fn platform(&self, id: &str) -> Option<&PlatformConfig> {
        self.platforms.iter().find(|p| p.id == id)
    }

    /// Display name for a platform ID, falling back to the ID itself.
    pub fn platform_name(&self, id: &str) -> String {
        self.platform(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_platforms() -> Vec<PlatformConfig> {
    [
        ("zhihu", "知乎"),
        ("weibo", "微博"),
        ("douyin", "抖音"),
        ("baidu", "百度热搜"),
        ("toutiao", "今日头条"),
    ]
    .into_iter()
    .map(|(id, name)| PlatformConfig {
        id: id.to_string(),
        name: name.to_string(),
    })
    .collect()
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// One entry in the platform catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Stable short identifier used in tool arguments.
    pub id: String,
    /// Display name shown in results so clients can recognize the source.
    pub name: String,
}

/// Crawl scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    #[serde(default = "default_true")]
    pub enable_crawler: bool,
    /// Delay between per-platform requests, in milliseconds.
    #[serde(default = "default_request_interval")]
    pub request_interval_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            enable_crawler: true,
            request_interval_ms: default_request_interval(),
        }
    }
}

/// Notification push settings. Carried in config for parity with the
/// deployment file; the server itself only reports them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default)]
    pub enable_notification: bool,
    #[serde(default = "default_batch_size")]
    pub message_batch_size: usize,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enable_notification: false,
            message_batch_size: default_batch_size(),
        }
    }
}

/// The user's watchlist: words whose frequency `get_trending_topics` counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordsConfig {
    #[serde(default)]
    pub frequency_words: Vec<String>,
}

/// Ranking weights for the combined hotness score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_rank_weight")]
    pub rank_weight: f64,
    #[serde(default = "default_frequency_weight")]
    pub frequency_weight: f64,
    #[serde(default = "default_hotness_weight")]
    pub hotness_weight: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            rank_weight: default_rank_weight(),
            frequency_weight: default_frequency_weight(),
            hotness_weight: default_hotness_weight(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_request_interval() -> u64 {
    1000
}

fn default_batch_size() -> usize {
    4000
}

fn default_rank_weight() -> f64 {
    0.6
}

fn default_frequency_weight() -> f64 {
    0.3
}

fn default_hotness_weight() -> f64 {
    0.1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
