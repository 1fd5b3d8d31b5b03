//! Core data types shared across storage, services, and the MCP layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single news item from one platform's hot list.
///
/// This is the unit stored in snapshot files and returned by every data tool.
/// `rank` is the item's position on the platform's own board (1 = top).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Stable platform identifier (e.g. "zhihu", "weibo").
    pub platform: String,
    /// Human-readable platform name (e.g. "知乎", "微博").
    pub platform_name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    /// Capture time within the day, "HH:MM".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl NewsItem {
    /// Hotness weight derived from board rank. Top-ranked items score
    /// highest; unranked items get a small constant.
    pub fn weight(&self) -> f64 {
        match self.rank {
            Some(0) | None => 1.0,
            Some(r) => 100.0 / r as f64,
        }
    }

    /// Serialize to a JSON object, dropping the URL unless requested.
    pub fn to_json(&self, include_url: bool) -> serde_json::Value {
        let mut v = serde_json::json!({
            "platform": self.platform,
            "platform_name": self.platform_name,
            "title": self.title,
        });
        if let Some(rank) = self.rank {
            v["rank"] = serde_json::json!(rank);
        }
        if let Some(ref ts) = self.timestamp {
            v["timestamp"] = serde_json::json!(ts);
        }
        if include_url {
            if let Some(ref url) = self.url {
                v["url"] = serde_json::json!(url);
            }
        }
        v
    }
}

/// An inclusive calendar date range with the invariant `start <= end`.
///
/// Construct through [`DateRange::new`] (which restores the invariant by
/// swapping) or the normalizer in [`crate::params`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if they arrive inverted.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// A single-day range.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of calendar days covered (at least 1).
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterate the days of the range in order.
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        let days = self.days() as u64;
        (0..days).map(move |i| start + chrono::Duration::days(i as i64))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "start": self.start.format("%Y-%m-%d").to_string(),
            "end": self.end.format("%Y-%m-%d").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn inverted_range_is_swapped() {
        let r = DateRange::new(d("2025-01-07"), d("2025-01-01"));
        assert_eq!(r.start, d("2025-01-01"));
        assert_eq!(r.end, d("2025-01-07"));
        assert_eq!(r.days(), 7);
    }

    #[test]
    fn single_day_range() {
        let r = DateRange::single(d("2025-03-10"));
        assert_eq!(r.days(), 1);
        assert!(r.contains(d("2025-03-10")));
        assert!(!r.contains(d("2025-03-11")));
    }

    #[test]
    fn iter_days_covers_every_date() {
        let r = DateRange::new(d("2025-01-01"), d("2025-01-03"));
        let days: Vec<_> = r.iter_days().collect();
        assert_eq!(days, vec![d("2025-01-01"), d("2025-01-02"), d("2025-01-03")]);
    }

    #[test]
    fn item_weight_prefers_top_rank() {
        let mut item = NewsItem {
            platform: "zhihu".into(),
            platform_name: "知乎".into(),
            title: "t".into(),
            url: None,
            rank: Some(1),
            timestamp: None,
        };
        let top = item.weight();
        item.rank = Some(50);
        assert!(top > item.weight());
        item.rank = None;
        assert_eq!(item.weight(), 1.0);
    }

    #[test]
    fn to_json_omits_url_by_default() {
        let item = NewsItem {
            platform: "weibo".into(),
            platform_name: "微博".into(),
            title: "今日热搜".into(),
            url: Some("https://example.com/1".into()),
            rank: Some(3),
            timestamp: Some("08:30".into()),
        };
        let without = item.to_json(false);
        assert!(without.get("url").is_none());
        let with = item.to_json(true);
        assert_eq!(with["url"], "https://example.com/1");
        assert_eq!(with["title"], "今日热搜");
    }
}
