//! Shared parameter normalization applied before a call reaches a service.
//!
//! Covers the argument conventions nearly every tool shares:
//! - platform lists (absent means "all configured platforms"),
//! - `{start, end}` date-range objects,
//! - natural-language date tokens ("today", "yesterday", "3 days ago",
//!   and the localized 今天/昨天/前天/N天前 forms),
//! - the swap policy for inverted ranges.
//!
//! The current date is taken from an injected [`Clock`] so that date
//! resolution is deterministic in tests.

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::Deserialize;

use crate::config::schema::TrendLensConfig;
use crate::error::{Result, TrendLensError};
use crate::types::DateRange;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "today". Injected everywhere a relative date token is resolved.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    /// Current wall-clock time as "HH:MM", used to stamp crawl batches.
    fn now_hhmm(&self) -> String {
        chrono::Local::now().format("%H:%M").to_string()
    }
}

/// Wall-clock implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Clock pinned to a fixed date, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }

    fn now_hhmm(&self) -> String {
        "12:00".to_string()
    }
}

// ---------------------------------------------------------------------------
// Date parsing
// ---------------------------------------------------------------------------

/// Parse a single date token: natural language, localized, or explicit.
///
/// Accepted forms: "today"/"今天", "yesterday"/"昨天",
/// "day before yesterday"/"前天", "N days ago"/"N天前",
/// "YYYY-MM-DD", "YYYY/MM/DD". Anything else is a `ValidationError`
/// naming the offending parameter.
pub fn parse_date_token(token: &str, param: &str, clock: &dyn Clock) -> Result<NaiveDate> {
    let t = token.trim();
    let today = clock.today();

    match t.to_lowercase().as_str() {
        "" | "today" | "今天" => return Ok(today),
        "yesterday" | "昨天" => return Ok(today - Duration::days(1)),
        "day before yesterday" | "前天" => return Ok(today - Duration::days(2)),
        _ => {}
    }

    // "3 days ago" / "3天前"
    if let Ok(days_ago) = Regex::new(r"^(\d+)\s*(?:days?\s+ago|天前)$") {
        if let Some(caps) = days_ago.captures(&t.to_lowercase()) {
            let n: i64 = caps[1].parse().map_err(|_| {
                TrendLensError::validation(param, format!("bad day count in '{t}'"))
            })?;
            return Ok(today - Duration::days(n));
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(t, fmt) {
            return Ok(date);
        }
    }

    Err(TrendLensError::validation(
        param,
        format!("unrecognized date '{t}' (expected YYYY-MM-DD, YYYY/MM/DD, or a relative token like 'yesterday')"),
    ))
}

// ---------------------------------------------------------------------------
// Date ranges
// ---------------------------------------------------------------------------

/// Wire shape of the `date_range` argument: `{"start": ..., "end": ...}`.
/// Each bound accepts the same tokens as [`parse_date_token`].
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct DateRangeParam {
    #[schemars(description = "Range start, e.g. '2025-01-01' or 'yesterday'")]
    pub start: String,
    #[schemars(description = "Range end, e.g. '2025-01-07' or 'today'")]
    pub end: String,
}

/// Resolve an optional date-range argument.
///
/// Absent ranges default to the `default_days` window ending today. Inverted
/// ranges are recovered by swapping (never rejected), so callers always see
/// `start <= end`.
pub fn resolve_date_range(
    range: Option<&DateRangeParam>,
    default_days: u32,
    clock: &dyn Clock,
) -> Result<DateRange> {
    match range {
        Some(r) => {
            let start = parse_date_token(&r.start, "date_range.start", clock)?;
            let end = parse_date_token(&r.end, "date_range.end", clock)?;
            Ok(DateRange::new(start, end))
        }
        None => {
            let today = clock.today();
            let days = default_days.max(1) as i64;
            Ok(DateRange::new(today - Duration::days(days - 1), today))
        }
    }
}

// ---------------------------------------------------------------------------
// Platform lists and limits
// ---------------------------------------------------------------------------

/// Resolve an optional platform list against the deployment config.
///
/// Absent means every configured platform. A present list is used verbatim —
/// unknown platform IDs are the downstream service's concern, not this
/// layer's.
pub fn resolve_platforms(
    requested: Option<Vec<String>>,
    config: &TrendLensConfig,
) -> Vec<String> {
    match requested {
        Some(list) if !list.is_empty() => list,
        _ => config.platform_ids(),
    }
}

/// Clamp a requested result count to a tool's declared ceiling.
///
/// The gateway passes `limit` through unchanged; each service applies its own
/// ceiling with this helper at the point of use.
pub fn clamp_limit(requested: usize, ceiling: usize) -> usize {
    requested.min(ceiling)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock(d("2025-06-15"))
    }

    // -- parse_date_token ---------------------------------------------------

    #[test]
    fn today_and_localized_today() {
        let c = clock();
        assert_eq!(parse_date_token("today", "q", &c).unwrap(), d("2025-06-15"));
        assert_eq!(parse_date_token("今天", "q", &c).unwrap(), d("2025-06-15"));
        assert_eq!(parse_date_token("", "q", &c).unwrap(), d("2025-06-15"));
    }

    #[test]
    fn yesterday_is_exactly_one_day_back() {
        let c = clock();
        assert_eq!(
            parse_date_token("yesterday", "q", &c).unwrap(),
            d("2025-06-14")
        );
        assert_eq!(parse_date_token("昨天", "q", &c).unwrap(), d("2025-06-14"));
    }

    #[test]
    fn day_before_yesterday() {
        let c = clock();
        assert_eq!(parse_date_token("前天", "q", &c).unwrap(), d("2025-06-13"));
        assert_eq!(
            parse_date_token("day before yesterday", "q", &c).unwrap(),
            d("2025-06-13")
        );
    }

    #[test]
    fn n_days_ago_in_both_languages() {
        let c = clock();
        assert_eq!(
            parse_date_token("3 days ago", "q", &c).unwrap(),
            d("2025-06-12")
        );
        assert_eq!(
            parse_date_token("1 day ago", "q", &c).unwrap(),
            d("2025-06-14")
        );
        assert_eq!(parse_date_token("10天前", "q", &c).unwrap(), d("2025-06-05"));
    }

    #[test]
    fn explicit_dates_with_both_separators() {
        let c = clock();
        assert_eq!(
            parse_date_token("2024-01-15", "q", &c).unwrap(),
            d("2024-01-15")
        );
        assert_eq!(
            parse_date_token("2024/01/15", "q", &c).unwrap(),
            d("2024-01-15")
        );
    }

    #[test]
    fn garbage_token_is_a_validation_error_naming_the_param() {
        let c = clock();
        let err = parse_date_token("not-a-date", "date_query", &c).unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert!(err.to_string().contains("date_query"));
    }

    // -- resolve_date_range -------------------------------------------------

    #[test]
    fn absent_range_defaults_to_window_ending_today() {
        let c = clock();
        let r = resolve_date_range(None, 7, &c).unwrap();
        assert_eq!(r.start, d("2025-06-09"));
        assert_eq!(r.end, d("2025-06-15"));
        assert_eq!(r.days(), 7);
    }

    #[test]
    fn explicit_range_parses_both_bounds() {
        let c = clock();
        let p = DateRangeParam {
            start: "2025-01-01".into(),
            end: "2025-01-07".into(),
        };
        let r = resolve_date_range(Some(&p), 7, &c).unwrap();
        assert_eq!(r.start, d("2025-01-01"));
        assert_eq!(r.end, d("2025-01-07"));
    }

    #[test]
    fn inverted_range_is_swapped_not_rejected() {
        let c = clock();
        let p = DateRangeParam {
            start: "2025-01-07".into(),
            end: "2025-01-01".into(),
        };
        let r = resolve_date_range(Some(&p), 7, &c).unwrap();
        assert_eq!(r.start, d("2025-01-01"));
        assert_eq!(r.end, d("2025-01-07"));
    }

    #[test]
    fn range_bounds_accept_relative_tokens() {
        let c = clock();
        let p = DateRangeParam {
            start: "3 days ago".into(),
            end: "today".into(),
        };
        let r = resolve_date_range(Some(&p), 7, &c).unwrap();
        assert_eq!(r.start, d("2025-06-12"));
        assert_eq!(r.end, d("2025-06-15"));
    }

    #[test]
    fn malformed_bound_is_rejected() {
        let c = clock();
        let p = DateRangeParam {
            start: "2025-13-45".into(),
            end: "today".into(),
        };
        let err = resolve_date_range(Some(&p), 7, &c).unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert!(err.to_string().contains("date_range.start"));
    }

    // -- resolve_platforms / clamp_limit ------------------------------------

    #[test]
    fn absent_platforms_fall_back_to_config() {
        let config = TrendLensConfig::default();
        let resolved = resolve_platforms(None, &config);
        assert_eq!(resolved, config.platform_ids());
        assert!(!resolved.is_empty());
    }

    #[test]
    fn explicit_platforms_pass_through_verbatim() {
        let config = TrendLensConfig::default();
        let resolved = resolve_platforms(
            Some(vec!["zhihu".into(), "made-up-platform".into()]),
            &config,
        );
        // No validation at this layer: unknown IDs survive.
        assert_eq!(resolved, vec!["zhihu", "made-up-platform"]);
    }

    #[test]
    fn empty_platform_list_means_all() {
        let config = TrendLensConfig::default();
        assert_eq!(resolve_platforms(Some(vec![]), &config), config.platform_ids());
    }

    #[test]
    fn limits_clamp_at_the_ceiling() {
        assert_eq!(clamp_limit(50, 1000), 50);
        assert_eq!(clamp_limit(5000, 1000), 1000);
        assert_eq!(clamp_limit(100, 100), 100);
    }
}
