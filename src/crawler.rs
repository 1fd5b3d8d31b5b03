//! Crawler call contract.
//!
//! The gateway never talks to platform sources directly; `trigger_crawl`
//! goes through [`NewsFetcher`], which maps one platform to its current hot
//! list or an error. Per-platform failures are partitionable: the system
//! service collects them into `failed_platforms` instead of failing the
//! whole call.

use crate::config::schema::PlatformConfig;
use crate::error::{Result, TrendLensError};
use crate::storage::SnapshotStore;
use crate::types::NewsItem;

/// One platform in, one batch of items (or a failure) out.
pub trait NewsFetcher: Send + Sync {
    fn fetch(&self, platform: &PlatformConfig) -> Result<Vec<NewsItem>>;
}

/// Default fetcher: serves each platform's slice of the most recent local
/// snapshot. Keeps `trigger_crawl` exercisable without network access; a
/// live HTTP fetcher plugs in behind the same trait.
pub struct SnapshotFetcher {
    store: SnapshotStore,
}

impl SnapshotFetcher {
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }
}

impl NewsFetcher for SnapshotFetcher {
    fn fetch(&self, platform: &PlatformConfig) -> Result<Vec<NewsItem>> {
        let (_, batch) = self.store.latest_batch()?;
        let items: Vec<NewsItem> = batch
            .into_iter()
            .filter(|i| i.platform == platform.id)
            .collect();
        if items.is_empty() {
            return Err(TrendLensError::Downstream(format!(
                "no data available for platform '{}'",
                platform.id
            )));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn platform(id: &str) -> PlatformConfig {
        PlatformConfig {
            id: id.to_string(),
            name: id.to_uppercase(),
        }
    }

    #[test]
    fn fetch_returns_only_the_requested_platform() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path());
        let date = chrono::NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let items = vec![
            NewsItem {
                platform: "zhihu".into(),
                platform_name: "知乎".into(),
                title: "a".into(),
                url: None,
                rank: Some(1),
                timestamp: None,
            },
            NewsItem {
                platform: "weibo".into(),
                platform_name: "微博".into(),
                title: "b".into(),
                url: None,
                rank: Some(1),
                timestamp: None,
            },
        ];
        store.save_batch(date, "0900", &items).unwrap();

        let fetcher = SnapshotFetcher::new(store);
        let fetched = fetcher.fetch(&platform("zhihu")).unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].platform, "zhihu");
    }

    #[test]
    fn fetch_fails_downstream_for_platform_without_data() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path());
        let fetcher = SnapshotFetcher::new(store);
        let err = fetcher.fetch(&platform("douyin")).unwrap_err();
        assert_eq!(err.kind(), "DownstreamError");
        assert!(err.to_string().contains("douyin"));
    }
}
