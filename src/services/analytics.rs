//! Analytics service: topic trends, data insights, sentiment, similarity,
//! and summary reports.
//!
//! The unified tools (`analyze_topic_trend`, `analyze_data_insights`) accept
//! a mode discriminant on the wire, but internally each mode becomes a
//! variant of a tagged enum carrying only the parameters relevant to it, and
//! the dispatcher matches on the variant.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::config::schema::TrendLensConfig;
use crate::error::Result;
use crate::params::{clamp_limit, resolve_date_range, resolve_platforms, Clock, DateRangeParam};
use crate::services::text::{contains_ci, similarity, tokenize};
use crate::storage::SnapshotStore;
use crate::types::{DateRange, NewsItem};

/// Declared ceiling for `analyze_sentiment` and `find_similar_news`.
pub const ANALYTICS_MAX_LIMIT: usize = 100;

const DEFAULT_TREND_DAYS: u32 = 7;

// ---------------------------------------------------------------------------
// Wire discriminants and internal tagged unions
// ---------------------------------------------------------------------------

/// `analysis_type` values accepted by `analyze_topic_trend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Trend,
    Lifecycle,
    Viral,
    Predict,
}

/// One analysis mode with only the parameters it actually uses.
#[derive(Debug)]
enum TopicAnalysis {
    Trend { range: DateRange, granularity: String },
    Lifecycle { range: DateRange },
    Viral { threshold: f64, time_window_hours: u32 },
    Predict { lookahead_hours: u32, confidence_threshold: f64 },
}

/// Knobs shared by the `analyze_topic_trend` wire shape. Which of them are
/// read depends on the analysis variant.
#[derive(Debug, Clone)]
pub struct TrendKnobs {
    pub date_range: Option<DateRangeParam>,
    /// Bucket size echoed in trend series output. Snapshot data is
    /// aggregated per day, so the series is daily regardless.
    pub granularity: String,
    pub threshold: f64,
    pub time_window_hours: u32,
    pub lookahead_hours: u32,
    pub confidence_threshold: f64,
}

impl Default for TrendKnobs {
    fn default() -> Self {
        Self {
            date_range: None,
            granularity: "day".to_string(),
            threshold: 3.0,
            time_window_hours: 24,
            lookahead_hours: 6,
            confidence_threshold: 0.7,
        }
    }
}

/// `insight_type` values accepted by `analyze_data_insights`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    PlatformCompare,
    PlatformActivity,
    KeywordCooccur,
}

#[derive(Debug)]
enum DataInsight {
    PlatformCompare { topic: Option<String>, range: DateRange },
    PlatformActivity { range: DateRange },
    KeywordCooccur { min_frequency: usize, top_n: usize, range: DateRange },
}

/// `report_type` values accepted by `generate_summary_report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Daily,
    Weekly,
}

// ---------------------------------------------------------------------------
// Sentiment lexicon
// ---------------------------------------------------------------------------

const POSITIVE_WORDS: &[&str] = &[
    "突破", "增长", "成功", "利好", "创新高", "上涨", "大涨", "喜讯", "丰收", "夺冠",
    "record", "growth", "success", "win", "surge", "rally", "breakthrough",
];

const NEGATIVE_WORDS: &[&str] = &[
    "下跌", "暴跌", "事故", "遇难", "失败", "危机", "亏损", "裁员", "召回", "爆炸",
    "crash", "crisis", "loss", "death", "failure", "layoff", "plunge",
];

fn classify_sentiment(title: &str) -> &'static str {
    let pos = POSITIVE_WORDS.iter().filter(|w| contains_ci(title, w)).count();
    let neg = NEGATIVE_WORDS.iter().filter(|w| contains_ci(title, w)).count();
    match pos.cmp(&neg) {
        std::cmp::Ordering::Greater => "positive",
        std::cmp::Ordering::Less => "negative",
        std::cmp::Ordering::Equal => "neutral",
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct AnalyticsService {
    store: SnapshotStore,
    config: Arc<TrendLensConfig>,
    clock: Arc<dyn Clock>,
}

impl AnalyticsService {
    pub fn new(store: SnapshotStore, config: Arc<TrendLensConfig>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    /// Count titles mentioning `topic` for each day of `range`.
    fn daily_mentions(&self, topic: &str, range: &DateRange) -> Result<BTreeMap<NaiveDate, usize>> {
        let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for (date, items) in self.store.items_in_range(range)? {
            let n = items.iter().filter(|i| contains_ci(&i.title, topic)).count();
            counts.insert(date, n);
        }
        Ok(counts)
    }

    // -- analyze_topic_trend ------------------------------------------------

    pub fn analyze_topic_trend(
        &self,
        topic: &str,
        kind: AnalysisKind,
        knobs: &TrendKnobs,
    ) -> Result<serde_json::Value> {
        // Build the variant carrying only what this mode needs.
        let analysis = match kind {
            AnalysisKind::Trend => TopicAnalysis::Trend {
                range: resolve_date_range(
                    knobs.date_range.as_ref(),
                    DEFAULT_TREND_DAYS,
                    self.clock.as_ref(),
                )?,
                granularity: knobs.granularity.clone(),
            },
            AnalysisKind::Lifecycle => TopicAnalysis::Lifecycle {
                range: resolve_date_range(
                    knobs.date_range.as_ref(),
                    DEFAULT_TREND_DAYS,
                    self.clock.as_ref(),
                )?,
            },
            AnalysisKind::Viral => TopicAnalysis::Viral {
                threshold: knobs.threshold,
                time_window_hours: knobs.time_window_hours,
            },
            AnalysisKind::Predict => TopicAnalysis::Predict {
                lookahead_hours: knobs.lookahead_hours,
                confidence_threshold: knobs.confidence_threshold,
            },
        };

        match analysis {
            TopicAnalysis::Trend { range, granularity } => self.trend(topic, range, &granularity),
            TopicAnalysis::Lifecycle { range } => self.lifecycle(topic, range),
            TopicAnalysis::Viral {
                threshold,
                time_window_hours,
            } => self.viral(topic, threshold, time_window_hours),
            TopicAnalysis::Predict {
                lookahead_hours,
                confidence_threshold,
            } => self.predict(topic, lookahead_hours, confidence_threshold),
        }
    }

    fn trend(&self, topic: &str, range: DateRange, granularity: &str) -> Result<serde_json::Value> {
        let counts = self.daily_mentions(topic, &range)?;
        let total: usize = counts.values().sum();
        let peak = counts
            .iter()
            .max_by_key(|(_, &c)| c)
            .filter(|(_, &c)| c > 0)
            .map(|(d, c)| serde_json::json!({
                "date": d.format("%Y-%m-%d").to_string(), "mentions": c,
            }));

        // Direction: compare the first and second half of the series.
        let series: Vec<usize> = counts.values().copied().collect();
        let direction = if series.len() < 2 || total == 0 {
            "flat"
        } else {
            let mid = series.len() / 2;
            let first: usize = series[..mid].iter().sum();
            let second: usize = series[mid..].iter().sum();
            match second.cmp(&first) {
                std::cmp::Ordering::Greater => "rising",
                std::cmp::Ordering::Less => "falling",
                std::cmp::Ordering::Equal => "flat",
            }
        };

        Ok(serde_json::json!({
            "analysis_type": "trend",
            "topic": topic,
            "date_range": range.to_json(),
            "granularity": granularity,
            "total_mentions": total,
            "peak": peak,
            "direction": direction,
            "series": counts.iter().map(|(d, c)| serde_json::json!({
                "date": d.format("%Y-%m-%d").to_string(), "mentions": c,
            })).collect::<Vec<_>>(),
        }))
    }

    fn lifecycle(&self, topic: &str, range: DateRange) -> Result<serde_json::Value> {
        let counts = self.daily_mentions(topic, &range)?;
        let active: Vec<(&NaiveDate, &usize)> = counts.iter().filter(|(_, &c)| c > 0).collect();
        let total: usize = counts.values().sum();

        let phase = match active.last() {
            None => "dormant",
            Some((last_day, _)) => {
                let quiet_tail = (range.end - **last_day).num_days();
                if quiet_tail >= 2 {
                    "fading"
                } else if active.len() <= 2 {
                    "emerging"
                } else {
                    "active"
                }
            }
        };

        Ok(serde_json::json!({
            "analysis_type": "lifecycle",
            "topic": topic,
            "date_range": range.to_json(),
            "first_seen": active.first().map(|(d, _)| d.format("%Y-%m-%d").to_string()),
            "last_seen": active.last().map(|(d, _)| d.format("%Y-%m-%d").to_string()),
            "active_days": active.len(),
            "total_mentions": total,
            "phase": phase,
        }))
    }

    fn viral(&self, topic: &str, threshold: f64, time_window_hours: u32) -> Result<serde_json::Value> {
        // Data is aggregated per day, so the window is rounded up to days.
        let window_days = ((time_window_hours as i64 + 23) / 24).max(1);
        let today = self.clock.today();
        let recent = DateRange::new(today - Duration::days(window_days - 1), today);
        let previous = DateRange::new(
            today - Duration::days(2 * window_days - 1),
            today - Duration::days(window_days),
        );

        let recent_count: usize = self.daily_mentions(topic, &recent)?.values().sum();
        let previous_count: usize = self.daily_mentions(topic, &previous)?.values().sum();
        let ratio = recent_count as f64 / previous_count.max(1) as f64;

        Ok(serde_json::json!({
            "analysis_type": "viral",
            "topic": topic,
            "time_window_hours": time_window_hours,
            "recent_mentions": recent_count,
            "previous_mentions": previous_count,
            "surge_ratio": (ratio * 100.0).round() / 100.0,
            "threshold": threshold,
            "is_viral": ratio >= threshold && recent_count > 0,
        }))
    }

    fn predict(
        &self,
        topic: &str,
        lookahead_hours: u32,
        confidence_threshold: f64,
    ) -> Result<serde_json::Value> {
        let today = self.clock.today();
        let window = DateRange::new(today - Duration::days(2), today);
        let counts = self.daily_mentions(topic, &window)?;

        // Momentum over the observed series; simple linear continuation.
        let series: Vec<f64> = window
            .iter_days()
            .map(|d| counts.get(&d).copied().unwrap_or(0) as f64)
            .collect();
        let deltas: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
        let momentum = if deltas.is_empty() {
            0.0
        } else {
            deltas.iter().sum::<f64>() / deltas.len() as f64
        };
        let last = *series.last().unwrap_or(&0.0);
        let predicted = (last + momentum * lookahead_hours as f64 / 24.0).max(0.0);

        // Confidence reflects how much of the window has data at all.
        let days_with_data = counts.len() as f64;
        let confidence = (days_with_data / window.days() as f64).min(1.0);

        Ok(serde_json::json!({
            "analysis_type": "predict",
            "topic": topic,
            "lookahead_hours": lookahead_hours,
            "current_mentions": last as usize,
            "momentum_per_day": (momentum * 100.0).round() / 100.0,
            "predicted_mentions": predicted.round() as u64,
            "confidence": (confidence * 100.0).round() / 100.0,
            "confidence_threshold": confidence_threshold,
            "reliable": confidence >= confidence_threshold,
        }))
    }

    // -- analyze_data_insights ----------------------------------------------

    pub fn analyze_data_insights(
        &self,
        kind: InsightKind,
        topic: Option<String>,
        date_range: Option<&DateRangeParam>,
        min_frequency: usize,
        top_n: usize,
    ) -> Result<serde_json::Value> {
        let range = resolve_date_range(date_range, DEFAULT_TREND_DAYS, self.clock.as_ref())?;
        let insight = match kind {
            InsightKind::PlatformCompare => DataInsight::PlatformCompare { topic, range },
            InsightKind::PlatformActivity => DataInsight::PlatformActivity { range },
            InsightKind::KeywordCooccur => DataInsight::KeywordCooccur {
                min_frequency,
                top_n,
                range,
            },
        };

        match insight {
            DataInsight::PlatformCompare { topic, range } => self.platform_compare(topic, range),
            DataInsight::PlatformActivity { range } => self.platform_activity(range),
            DataInsight::KeywordCooccur {
                min_frequency,
                top_n,
                range,
            } => self.keyword_cooccur(min_frequency, top_n, range),
        }
    }

    fn platform_compare(&self, topic: Option<String>, range: DateRange) -> Result<serde_json::Value> {
        let mut per_platform: HashMap<String, usize> = HashMap::new();
        let mut total = 0usize;
        for (_, items) in self.store.items_in_range(&range)? {
            for item in items {
                if let Some(ref t) = topic {
                    if !contains_ci(&item.title, t) {
                        continue;
                    }
                }
                *per_platform.entry(item.platform).or_default() += 1;
                total += 1;
            }
        }
        let mut rows: Vec<_> = per_platform.into_iter().collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        Ok(serde_json::json!({
            "insight_type": "platform_compare",
            "topic": topic,
            "date_range": range.to_json(),
            "total_items": total,
            "platforms": rows.iter().map(|(p, c)| serde_json::json!({
                "platform": p,
                "platform_name": self.config.platform_name(p),
                "count": c,
                "share": if total == 0 { 0.0 } else {
                    ((*c as f64 / total as f64) * 1000.0).round() / 1000.0
                },
            })).collect::<Vec<_>>(),
        }))
    }

    fn platform_activity(&self, range: DateRange) -> Result<serde_json::Value> {
        struct Activity {
            total: usize,
            days: usize,
        }
        let mut per_platform: HashMap<String, Activity> = HashMap::new();
        for (_, items) in self.store.items_in_range(&range)? {
            let mut seen_today: HashMap<String, usize> = HashMap::new();
            for item in items {
                *seen_today.entry(item.platform).or_default() += 1;
            }
            for (platform, count) in seen_today {
                let entry = per_platform.entry(platform).or_insert(Activity {
                    total: 0,
                    days: 0,
                });
                entry.total += count;
                entry.days += 1;
            }
        }
        let mut rows: Vec<_> = per_platform.into_iter().collect();
        rows.sort_by(|a, b| b.1.total.cmp(&a.1.total).then(a.0.cmp(&b.0)));

        Ok(serde_json::json!({
            "insight_type": "platform_activity",
            "date_range": range.to_json(),
            "platforms": rows.iter().map(|(p, a)| serde_json::json!({
                "platform": p,
                "platform_name": self.config.platform_name(p),
                "total_items": a.total,
                "active_days": a.days,
                "avg_items_per_day": ((a.total as f64 / a.days.max(1) as f64) * 10.0).round() / 10.0,
            })).collect::<Vec<_>>(),
        }))
    }

    fn keyword_cooccur(
        &self,
        min_frequency: usize,
        top_n: usize,
        range: DateRange,
    ) -> Result<serde_json::Value> {
        let mut pair_counts: HashMap<(String, String), usize> = HashMap::new();
        for (_, items) in self.store.items_in_range(&range)? {
            for item in items {
                // Only multi-char tokens carry signal for co-occurrence.
                let mut tokens: Vec<String> = tokenize(&item.title)
                    .into_iter()
                    .filter(|t| t.chars().count() >= 2)
                    .collect();
                tokens.sort();
                tokens.dedup();
                for i in 0..tokens.len() {
                    for j in (i + 1)..tokens.len() {
                        *pair_counts
                            .entry((tokens[i].clone(), tokens[j].clone()))
                            .or_default() += 1;
                    }
                }
            }
        }
        let mut rows: Vec<_> = pair_counts
            .into_iter()
            .filter(|(_, c)| *c >= min_frequency)
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        rows.truncate(top_n);

        Ok(serde_json::json!({
            "insight_type": "keyword_cooccur",
            "date_range": range.to_json(),
            "min_frequency": min_frequency,
            "pairs": rows.iter().map(|((a, b), c)| serde_json::json!({
                "words": [a, b], "count": c,
            })).collect::<Vec<_>>(),
        }))
    }

    // -- analyze_sentiment --------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub fn analyze_sentiment(
        &self,
        topic: Option<String>,
        platforms: Option<Vec<String>>,
        date_range: Option<&DateRangeParam>,
        limit: usize,
        sort_by_weight: bool,
        include_url: bool,
    ) -> Result<serde_json::Value> {
        let range = resolve_date_range(date_range, 1, self.clock.as_ref())?;
        let platforms = resolve_platforms(platforms, &self.config);
        let limit = clamp_limit(limit, ANALYTICS_MAX_LIMIT);

        // Deduplicate by title across platforms: keep the best-ranked copy.
        let mut by_title: HashMap<String, NewsItem> = HashMap::new();
        for (_, items) in self.store.items_in_range(&range)? {
            for item in items {
                if !platforms.iter().any(|p| p == &item.platform) {
                    continue;
                }
                if let Some(ref t) = topic {
                    if !contains_ci(&item.title, t) {
                        continue;
                    }
                }
                match by_title.get(&item.title) {
                    Some(existing) if existing.weight() >= item.weight() => {}
                    _ => {
                        by_title.insert(item.title.clone(), item);
                    }
                }
            }
        }

        let mut items: Vec<NewsItem> = by_title.into_values().collect();
        if sort_by_weight {
            items.sort_by(|a, b| b.weight().total_cmp(&a.weight()));
        } else {
            items.sort_by(|a, b| a.title.cmp(&b.title));
        }
        items.truncate(limit);

        let mut positive = 0usize;
        let mut negative = 0usize;
        let mut neutral = 0usize;
        let rendered: Vec<serde_json::Value> = items
            .iter()
            .map(|item| {
                let sentiment = classify_sentiment(&item.title);
                match sentiment {
                    "positive" => positive += 1,
                    "negative" => negative += 1,
                    _ => neutral += 1,
                }
                let mut v = item.to_json(include_url);
                v["sentiment"] = serde_json::json!(sentiment);
                v
            })
            .collect();
        let total = rendered.len();

        Ok(serde_json::json!({
            "topic": topic,
            "date_range": range.to_json(),
            "total": total,
            "sentiment_distribution": {
                "positive": positive,
                "negative": negative,
                "neutral": neutral,
            },
            "items": rendered,
        }))
    }

    // -- find_similar_news --------------------------------------------------

    pub fn find_similar_news(
        &self,
        reference_title: &str,
        threshold: f64,
        limit: usize,
        include_url: bool,
    ) -> Result<serde_json::Value> {
        let limit = clamp_limit(limit, ANALYTICS_MAX_LIMIT);
        let (date, batch) = self.store.latest_batch()?;

        let mut scored: Vec<(f64, NewsItem)> = batch
            .into_iter()
            .filter_map(|item| {
                let score = similarity(reference_title, &item.title);
                (score >= threshold).then_some((score, item))
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(limit);

        Ok(serde_json::json!({
            "reference_title": reference_title,
            "date": date.map(|d| d.format("%Y-%m-%d").to_string()),
            "threshold": threshold,
            "total": scored.len(),
            "results": scored.iter().map(|(score, item)| {
                let mut v = item.to_json(include_url);
                v["similarity"] = serde_json::json!((score * 1000.0).round() / 1000.0);
                v
            }).collect::<Vec<_>>(),
        }))
    }

    // -- generate_summary_report ---------------------------------------------

    pub fn generate_summary_report(
        &self,
        report_type: ReportType,
        date_range: Option<&DateRangeParam>,
    ) -> Result<serde_json::Value> {
        let default_days = match report_type {
            ReportType::Daily => 1,
            ReportType::Weekly => 7,
        };
        let range = resolve_date_range(date_range, default_days, self.clock.as_ref())?;

        let mut per_platform: BTreeMap<String, usize> = BTreeMap::new();
        let mut all_items: Vec<NewsItem> = Vec::new();
        for (_, items) in self.store.items_in_range(&range)? {
            for item in items {
                *per_platform.entry(item.platform.clone()).or_default() += 1;
                all_items.push(item);
            }
        }
        let total = all_items.len();

        let mut word_hits: Vec<(String, usize)> = self
            .config
            .keywords
            .frequency_words
            .iter()
            .filter_map(|word| {
                let n = all_items
                    .iter()
                    .filter(|i| contains_ci(&i.title, word))
                    .count();
                (n > 0).then(|| (word.clone(), n))
            })
            .collect();
        word_hits.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        all_items.sort_by(|a, b| b.weight().total_cmp(&a.weight()));
        let top_items: Vec<&NewsItem> = all_items.iter().take(10).collect();

        let kind = match report_type {
            ReportType::Daily => "daily",
            ReportType::Weekly => "weekly",
        };
        let mut md = String::new();
        md.push_str(&format!(
            "# {} 热点摘要 ({} — {})\n\n",
            if kind == "daily" { "每日" } else { "每周" },
            range.start.format("%Y-%m-%d"),
            range.end.format("%Y-%m-%d"),
        ));
        md.push_str(&format!("共收录 {total} 条新闻。\n\n## 平台分布\n\n"));
        for (platform, count) in &per_platform {
            md.push_str(&format!(
                "- {} ({platform}): {count}\n",
                self.config.platform_name(platform)
            ));
        }
        if !word_hits.is_empty() {
            md.push_str("\n## 关注词命中\n\n");
            for (word, count) in &word_hits {
                md.push_str(&format!("- {word}: {count}\n"));
            }
        }
        if !top_items.is_empty() {
            md.push_str("\n## 热度 TOP\n\n");
            for (i, item) in top_items.iter().enumerate() {
                md.push_str(&format!(
                    "{}. [{}] {}\n",
                    i + 1,
                    item.platform_name,
                    item.title
                ));
            }
        }

        Ok(serde_json::json!({
            "report_type": kind,
            "date_range": range.to_json(),
            "statistics": {
                "total_items": total,
                "platforms": per_platform,
                "watchlist_hits": word_hits.iter().map(|(w, c)| serde_json::json!({
                    "word": w, "count": c,
                })).collect::<Vec<_>>(),
            },
            "markdown": md,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
