//! Data query service: latest news, news by date, watchlist frequency.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::config::schema::TrendLensConfig;
use crate::error::Result;
use crate::params::{clamp_limit, parse_date_token, resolve_platforms, Clock};
use crate::services::text::contains_ci;
use crate::storage::SnapshotStore;
use crate::types::NewsItem;

/// Declared ceiling for `get_latest_news` / `get_news_by_date`.
pub const NEWS_MAX_LIMIT: usize = 1000;

/// Which slice of the day `get_trending_topics` counts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrendingMode {
    /// The most recent crawl batch only (default).
    Current,
    /// Everything captured today, merged across batches.
    Daily,
}

pub struct DataQueryService {
    store: SnapshotStore,
    config: Arc<TrendLensConfig>,
    clock: Arc<dyn Clock>,
}

impl DataQueryService {
    pub fn new(store: SnapshotStore, config: Arc<TrendLensConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    fn filter_by_platforms(items: Vec<NewsItem>, platforms: &[String]) -> Vec<NewsItem> {
        items
            .into_iter()
            .filter(|i| platforms.iter().any(|p| p == &i.platform))
            .collect()
    }

    /// The most recent crawl batch, filtered and trimmed.
    pub fn get_latest_news(
        &self,
        platforms: Option<Vec<String>>,
        limit: usize,
        include_url: bool,
    ) -> Result<serde_json::Value> {
        let platforms = resolve_platforms(platforms, &self.config);
        let limit = clamp_limit(limit, NEWS_MAX_LIMIT);
        let (date, batch) = self.store.latest_batch()?;
        let mut items = Self::filter_by_platforms(batch, &platforms);
        items.truncate(limit);

        Ok(serde_json::json!({
            "date": date.map(|d| d.format("%Y-%m-%d").to_string()),
            "platforms": platforms,
            "total": items.len(),
            "items": items.iter().map(|i| i.to_json(include_url)).collect::<Vec<_>>(),
        }))
    }

    /// News for a specific day. `date_query` accepts natural language or an
    /// explicit date; absent means today.
    pub fn get_news_by_date(
        &self,
        date_query: Option<String>,
        platforms: Option<Vec<String>>,
        limit: usize,
        include_url: bool,
    ) -> Result<serde_json::Value> {
        let query = date_query.unwrap_or_default();
        let date = parse_date_token(&query, "date_query", self.clock.as_ref())?;
        let platforms = resolve_platforms(platforms, &self.config);
        let limit = clamp_limit(limit, NEWS_MAX_LIMIT);

        let mut items = Self::filter_by_platforms(self.store.items_for_date(date)?, &platforms);
        items.truncate(limit);

        Ok(serde_json::json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "platforms": platforms,
            "total": items.len(),
            "items": items.iter().map(|i| i.to_json(include_url)).collect::<Vec<_>>(),
        }))
    }

    /// Frequency counts of the configured watchlist words in news titles.
    ///
    /// This is not automatic hot-topic extraction: it counts the words the
    /// user put in `keywords.frequency_words`.
    pub fn get_trending_topics(
        &self,
        top_n: usize,
        mode: TrendingMode,
    ) -> Result<serde_json::Value> {
        let words = &self.config.keywords.frequency_words;
        let (scope, items) = match mode {
            TrendingMode::Current => {
                let (date, batch) = self.store.latest_batch()?;
                (
                    serde_json::json!({
                        "mode": "current",
                        "date": date.map(|d| d.format("%Y-%m-%d").to_string()),
                    }),
                    batch,
                )
            }
            TrendingMode::Daily => {
                let today = self.clock.today();
                (
                    serde_json::json!({
                        "mode": "daily",
                        "date": today.format("%Y-%m-%d").to_string(),
                    }),
                    self.store.items_for_date(today)?,
                )
            }
        };

        let mut counts: Vec<serde_json::Value> = words
            .iter()
            .filter_map(|word| {
                let mut count = 0usize;
                let mut platforms: HashMap<&str, usize> = HashMap::new();
                for item in &items {
                    if contains_ci(&item.title, word) {
                        count += 1;
                        *platforms.entry(item.platform.as_str()).or_default() += 1;
                    }
                }
                if count == 0 {
                    return None;
                }
                let mut by_platform: Vec<_> = platforms.into_iter().collect();
                by_platform.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
                Some(serde_json::json!({
                    "word": word,
                    "count": count,
                    "platforms": by_platform.iter().map(|(p, c)| serde_json::json!({
                        "platform": p, "count": c,
                    })).collect::<Vec<_>>(),
                }))
            })
            .collect();
        counts.sort_by(|a, b| {
            b["count"]
                .as_u64()
                .cmp(&a["count"].as_u64())
                .then_with(|| a["word"].as_str().cmp(&b["word"].as_str()))
        });
        counts.truncate(top_n);

        Ok(serde_json::json!({
            "scope": scope,
            "watchlist_size": words.len(),
            "topics": counts,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
