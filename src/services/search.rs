//! Search service: unified news search and seed-based history search.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::config::schema::TrendLensConfig;
use crate::error::{Result, TrendLensError};
use crate::params::{clamp_limit, parse_date_token, resolve_date_range, resolve_platforms, Clock, DateRangeParam};
use crate::services::text::{contains_ci, keyword_overlap, similarity, tokenize};
use crate::storage::SnapshotStore;
use crate::types::{DateRange, NewsItem};

/// Declared ceiling for `search_news`.
pub const SEARCH_MAX_LIMIT: usize = 1000;
/// Declared ceiling for `search_related_news_history`.
pub const HISTORY_MAX_LIMIT: usize = 100;

/// Matching strategy for `search_news`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Every query token must appear in the title (default).
    Keyword,
    /// Bigram similarity against the whole title, filtered by `threshold`.
    Fuzzy,
    /// The query must appear verbatim (case-insensitive) — for names of
    /// people, places, and organizations.
    Entity,
}

/// Result ordering for `search_news`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Relevance,
    Weight,
    Date,
}

/// Time window presets for `search_related_news_history`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimePreset {
    Yesterday,
    LastWeek,
    LastMonth,
    /// Requires explicit `start_date` and `end_date`.
    Custom,
}

struct ScoredItem {
    item: NewsItem,
    date: NaiveDate,
    score: f64,
}

pub struct SearchService {
    store: SnapshotStore,
    config: Arc<TrendLensConfig>,
    clock: Arc<dyn Clock>,
}

impl SearchService {
    pub fn new(store: SnapshotStore, config: Arc<TrendLensConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    /// Unified search. Default window is today only; relevance scoring is
    /// bigram similarity regardless of mode so that sort orders are stable.
    #[allow(clippy::too_many_arguments)]
    pub fn search_news(
        &self,
        query: &str,
        mode: SearchMode,
        date_range: Option<&DateRangeParam>,
        platforms: Option<Vec<String>>,
        limit: usize,
        sort_by: SortBy,
        threshold: f64,
        include_url: bool,
    ) -> Result<serde_json::Value> {
        if query.trim().is_empty() {
            return Err(TrendLensError::validation("query", "must not be empty"));
        }
        let range = resolve_date_range(date_range, 1, self.clock.as_ref())?;
        let platforms = resolve_platforms(platforms, &self.config);
        let limit = clamp_limit(limit, SEARCH_MAX_LIMIT);
        let query_tokens = tokenize(query);

        let mut matches: Vec<ScoredItem> = Vec::new();
        for (date, items) in self.store.items_in_range(&range)? {
            for item in items {
                if !platforms.iter().any(|p| p == &item.platform) {
                    continue;
                }
                let matched = match mode {
                    SearchMode::Keyword => {
                        !query_tokens.is_empty()
                            && query_tokens.iter().all(|t| contains_ci(&item.title, t))
                    }
                    SearchMode::Fuzzy => similarity(query, &item.title) >= threshold,
                    SearchMode::Entity => contains_ci(&item.title, query.trim()),
                };
                if matched {
                    let score = similarity(query, &item.title);
                    matches.push(ScoredItem { item, date, score });
                }
            }
        }

        match sort_by {
            SortBy::Relevance => {
                matches.sort_by(|a, b| b.score.total_cmp(&a.score));
            }
            SortBy::Weight => {
                matches.sort_by(|a, b| b.item.weight().total_cmp(&a.item.weight()));
            }
            SortBy::Date => {
                matches.sort_by(|a, b| b.date.cmp(&a.date));
            }
        }
        matches.truncate(limit);

        Ok(serde_json::json!({
            "query": query,
            "date_range": range.to_json(),
            "total": matches.len(),
            "results": matches.iter().map(|m| {
                let mut v = m.item.to_json(include_url);
                v["date"] = serde_json::json!(m.date.format("%Y-%m-%d").to_string());
                v["score"] = serde_json::json!((m.score * 1000.0).round() / 1000.0);
                v
            }).collect::<Vec<_>>(),
        }))
    }

    fn preset_range(
        &self,
        preset: TimePreset,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<DateRange> {
        let today = self.clock.today();
        match preset {
            TimePreset::Yesterday => Ok(DateRange::single(today - Duration::days(1))),
            TimePreset::LastWeek => Ok(DateRange::new(today - Duration::days(6), today)),
            TimePreset::LastMonth => Ok(DateRange::new(today - Duration::days(29), today)),
            TimePreset::Custom => {
                let start = start_date.ok_or_else(|| {
                    TrendLensError::validation("start_date", "required when time_preset is 'custom'")
                })?;
                let end = end_date.ok_or_else(|| {
                    TrendLensError::validation("end_date", "required when time_preset is 'custom'")
                })?;
                Ok(DateRange::new(
                    parse_date_token(start, "start_date", self.clock.as_ref())?,
                    parse_date_token(end, "end_date", self.clock.as_ref())?,
                ))
            }
        }
    }

    /// Seed-based history search: combined relevance is 70% keyword overlap
    /// plus 30% text similarity against the reference title.
    #[allow(clippy::too_many_arguments)]
    pub fn search_related_news_history(
        &self,
        reference_text: &str,
        preset: TimePreset,
        start_date: Option<&str>,
        end_date: Option<&str>,
        threshold: f64,
        limit: usize,
        include_url: bool,
    ) -> Result<serde_json::Value> {
        if reference_text.trim().is_empty() {
            return Err(TrendLensError::validation(
                "reference_text",
                "must not be empty",
            ));
        }
        let range = self.preset_range(preset, start_date, end_date)?;
        let limit = clamp_limit(limit, HISTORY_MAX_LIMIT);

        let mut matches: Vec<ScoredItem> = Vec::new();
        let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for (date, items) in self.store.items_in_range(&range)? {
            for item in items {
                let score = 0.7 * keyword_overlap(reference_text, &item.title)
                    + 0.3 * similarity(reference_text, &item.title);
                if score >= threshold {
                    *per_day.entry(date).or_default() += 1;
                    matches.push(ScoredItem { item, date, score });
                }
            }
        }
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(limit);

        Ok(serde_json::json!({
            "reference_text": reference_text,
            "date_range": range.to_json(),
            "total": matches.len(),
            "time_distribution": per_day.iter().map(|(d, c)| serde_json::json!({
                "date": d.format("%Y-%m-%d").to_string(), "count": c,
            })).collect::<Vec<_>>(),
            "results": matches.iter().map(|m| {
                let mut v = m.item.to_json(include_url);
                v["date"] = serde_json::json!(m.date.format("%Y-%m-%d").to_string());
                v["relevance"] = serde_json::json!((m.score * 1000.0).round() / 1000.0);
                v
            }).collect::<Vec<_>>(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
