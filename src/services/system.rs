//! System status and crawl triggering.

use std::sync::Arc;

use crate::config::schema::TrendLensConfig;
use crate::crawler::NewsFetcher;
use crate::error::Result;
use crate::params::Clock;
use crate::storage::SnapshotStore;
use crate::types::NewsItem;

pub struct SystemService {
    store: SnapshotStore,
    config: Arc<TrendLensConfig>,
    fetcher: Arc<dyn NewsFetcher>,
    clock: Arc<dyn Clock>,
}

impl SystemService {
    pub fn new(
        store: SnapshotStore,
        config: Arc<TrendLensConfig>,
        fetcher: Arc<dyn NewsFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            config,
            fetcher,
            clock,
        }
    }

    /// Health snapshot: version, configured platforms, storage counts.
    pub fn get_system_status(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "status": "ok",
            "date": self.clock.today().format("%Y-%m-%d").to_string(),
            "config": {
                "platforms": self.config.platform_ids(),
                "crawler_enabled": self.config.crawler.enable_crawler,
                "watchlist_size": self.config.keywords.frequency_words.len(),
            },
            "storage": self.store.stats()?,
        }))
    }

    /// Run a crawl over the requested platforms (default: all configured).
    ///
    /// Per-platform failures never abort the run: they land in
    /// `failed_platforms` and the successful items are still collected,
    /// returned under `data`, and optionally saved as a new snapshot batch.
    pub fn trigger_crawl(
        &self,
        platforms: Option<Vec<String>>,
        save_to_local: bool,
        include_url: bool,
    ) -> Result<serde_json::Value> {
        let requested = match platforms {
            Some(ids) if !ids.is_empty() => ids,
            _ => self.config.platform_ids(),
        };

        let mut collected: Vec<NewsItem> = Vec::new();
        let mut succeeded: Vec<String> = Vec::new();
        let mut failed: Vec<serde_json::Value> = Vec::new();
        for id in &requested {
            let Some(platform) = self.config.platform(id) else {
                failed.push(serde_json::json!({
                    "platform": id,
                    "error": format!("platform '{id}' is not configured"),
                }));
                continue;
            };
            match self.fetcher.fetch(platform) {
                Ok(items) => {
                    succeeded.push(id.clone());
                    collected.extend(items);
                }
                Err(e) => failed.push(serde_json::json!({
                    "platform": id,
                    "error": e.to_string(),
                })),
            }
        }

        let saved_to = if save_to_local && !collected.is_empty() {
            let path = self
                .store
                .save_batch(self.clock.today(), &self.clock.now_hhmm(), &collected)?;
            Some(path.display().to_string())
        } else {
            None
        };

        Ok(serde_json::json!({
            "requested_platforms": requested,
            "succeeded_platforms": succeeded,
            "failed_platforms": failed,
            "total_items": collected.len(),
            "data": collected.iter().map(|i| i.to_json(include_url)).collect::<Vec<_>>(),
            "snapshot_saved": saved_to.is_some(),
            "snapshot_path": saved_to,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PlatformConfig;
    use crate::error::TrendLensError;
    use crate::params::FixedClock;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Fetcher that succeeds for one platform and fails for the rest.
    struct OnlyPlatform(&'static str);

    impl NewsFetcher for OnlyPlatform {
        fn fetch(&self, platform: &PlatformConfig) -> Result<Vec<NewsItem>> {
            if platform.id == self.0 {
                Ok(vec![NewsItem {
                    platform: platform.id.clone(),
                    platform_name: platform.name.clone(),
                    title: format!("{} headline", platform.id),
                    url: Some(format!("https://example.com/{}", platform.id)),
                    rank: Some(1),
                    timestamp: None,
                }])
            } else {
                Err(TrendLensError::Downstream(format!(
                    "source '{}' unreachable",
                    platform.id
                )))
            }
        }
    }

    fn service(tmp: &TempDir, fetcher: Arc<dyn NewsFetcher>) -> SystemService {
        SystemService::new(
            SnapshotStore::new(tmp.path()),
            Arc::new(TrendLensConfig::default()),
            fetcher,
            Arc::new(FixedClock(d("2025-06-15"))),
        )
    }

    #[test]
    fn status_reports_config_and_storage() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, Arc::new(OnlyPlatform("zhihu")));
        let status = svc.get_system_status().unwrap();
        assert_eq!(status["status"], "ok");
        assert_eq!(status["date"], "2025-06-15");
        assert_eq!(status["config"]["platforms"].as_array().unwrap().len(), 5);
        assert_eq!(status["storage"]["dates_with_data"], 0);
    }

    #[test]
    fn crawl_partitions_failures_per_platform() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, Arc::new(OnlyPlatform("zhihu")));
        let result = svc
            .trigger_crawl(Some(vec!["zhihu".into(), "weibo".into()]), false, false)
            .unwrap();
        assert_eq!(result["succeeded_platforms"], serde_json::json!(["zhihu"]));
        let failed = result["failed_platforms"].as_array().unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0]["platform"], "weibo");
        assert!(failed[0]["error"].as_str().unwrap().contains("unreachable"));
        assert_eq!(result["total_items"], 1);
        assert_eq!(result["snapshot_saved"], false);
    }

    #[test]
    fn crawl_flags_unconfigured_platform() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, Arc::new(OnlyPlatform("zhihu")));
        let result = svc
            .trigger_crawl(Some(vec!["nosuch".into()]), false, false)
            .unwrap();
        let failed = result["failed_platforms"].as_array().unwrap();
        assert_eq!(failed[0]["platform"], "nosuch");
        assert!(failed[0]["error"]
            .as_str()
            .unwrap()
            .contains("not configured"));
    }

    #[test]
    fn crawl_saves_snapshot_under_clock_date() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, Arc::new(OnlyPlatform("zhihu")));
        let result = svc
            .trigger_crawl(Some(vec!["zhihu".into()]), true, false)
            .unwrap();
        assert_eq!(result["snapshot_saved"], true);
        let path = result["snapshot_path"].as_str().unwrap();
        assert!(path.contains("2025-06-15"));
        let store = SnapshotStore::new(tmp.path());
        let (date, items) = store.latest_batch().unwrap();
        assert_eq!(date, Some(d("2025-06-15")));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn crawl_defaults_to_all_configured_platforms() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, Arc::new(OnlyPlatform("zhihu")));
        let result = svc.trigger_crawl(None, false, false).unwrap();
        assert_eq!(
            result["requested_platforms"].as_array().unwrap().len(),
            5
        );
        assert_eq!(result["failed_platforms"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn crawl_returns_collected_items_and_gates_urls() {
        let tmp = TempDir::new().unwrap();
        let svc = service(&tmp, Arc::new(OnlyPlatform("zhihu")));

        let without = svc
            .trigger_crawl(Some(vec!["zhihu".into()]), false, false)
            .unwrap();
        let data = without["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["title"], "zhihu headline");
        assert!(data[0].get("url").is_none());
        // Items are returned even when nothing is persisted.
        assert_eq!(without["snapshot_saved"], false);

        let with = svc
            .trigger_crawl(Some(vec!["zhihu".into()]), false, true)
            .unwrap();
        assert_eq!(
            with["data"][0]["url"],
            "https://example.com/zhihu"
        );
    }
}
