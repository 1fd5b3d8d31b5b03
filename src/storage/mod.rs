//! File-backed snapshot storage for crawled news batches.
//!
//! Layout under the project root:
//!
//! ```text
//! output/
//!   2025-06-14/
//!     0830.json      # one crawl batch: a JSON array of NewsItem
//!     1230.json
//!   2025-06-15/
//!     0900.json
//! ```
//!
//! "Latest batch" means the lexicographically last file of the most recent
//! date directory — file names are zero-padded HHMM so that ordering is
//! chronological.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{Result, TrendLensError};
use crate::types::{DateRange, NewsItem};

const DATE_DIR_FORMAT: &str = "%Y-%m-%d";

/// Read/write access to the on-disk snapshot tree.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    output_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(project_root: &Path) -> Self {
        Self {
            output_dir: project_root.join("output"),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn date_dir(&self, date: NaiveDate) -> PathBuf {
        self.output_dir.join(date.format(DATE_DIR_FORMAT).to_string())
    }

    /// All dates that have at least one snapshot, sorted ascending.
    pub fn list_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut dates = Vec::new();
        let entries = match std::fs::read_dir(&self.output_dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(dates),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Ok(date) = NaiveDate::parse_from_str(&name, DATE_DIR_FORMAT) {
                dates.push(date);
            }
        }
        dates.sort();
        Ok(dates)
    }

    /// Batch file paths for a date, sorted by capture time.
    fn batch_files(&self, date: NaiveDate) -> Result<Vec<PathBuf>> {
        let dir = self.date_dir(date);
        let mut files = Vec::new();
        let entries = match std::fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_batch(path: &Path) -> Result<Vec<NewsItem>> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| TrendLensError::Storage(format!("{}: {e}", path.display())))
    }

    /// The most recent crawl batch, with its date. Empty store yields an
    /// empty batch rather than an error — "no data yet" is a normal state.
    pub fn latest_batch(&self) -> Result<(Option<NaiveDate>, Vec<NewsItem>)> {
        for date in self.list_dates()?.into_iter().rev() {
            if let Some(path) = self.batch_files(date)?.into_iter().next_back() {
                return Ok((Some(date), Self::read_batch(&path)?));
            }
        }
        Ok((None, Vec::new()))
    }

    /// Every item captured on a date, merged across batches.
    ///
    /// Duplicate (platform, title) pairs from successive batches are
    /// collapsed, keeping the best (lowest) rank seen during the day.
    pub fn items_for_date(&self, date: NaiveDate) -> Result<Vec<NewsItem>> {
        let mut seen: HashMap<(String, String), usize> = HashMap::new();
        let mut items: Vec<NewsItem> = Vec::new();
        for path in self.batch_files(date)? {
            for item in Self::read_batch(&path)? {
                let key = (item.platform.clone(), item.title.clone());
                match seen.get(&key) {
                    Some(&idx) => {
                        let best = &mut items[idx];
                        if item.rank.unwrap_or(u32::MAX) < best.rank.unwrap_or(u32::MAX) {
                            *best = item;
                        }
                    }
                    None => {
                        seen.insert(key, items.len());
                        items.push(item);
                    }
                }
            }
        }
        Ok(items)
    }

    /// Items for every day of a range that has data, in date order.
    pub fn items_in_range(&self, range: &DateRange) -> Result<Vec<(NaiveDate, Vec<NewsItem>)>> {
        let mut out = Vec::new();
        for date in self.list_dates()? {
            if range.contains(date) {
                let items = self.items_for_date(date)?;
                if !items.is_empty() {
                    out.push((date, items));
                }
            }
        }
        Ok(out)
    }

    /// Persist a crawl batch under today's directory. Returns the file path.
    pub fn save_batch(
        &self,
        date: NaiveDate,
        hhmm: &str,
        items: &[NewsItem],
    ) -> Result<PathBuf> {
        let dir = self.date_dir(date);
        std::fs::create_dir_all(&dir)?;
        let file = dir.join(format!("{}.json", hhmm.replace(':', "")));
        let body = serde_json::to_string_pretty(items)?;
        std::fs::write(&file, body)?;
        Ok(file)
    }

    /// Storage statistics for the system status tool.
    pub fn stats(&self) -> Result<serde_json::Value> {
        let dates = self.list_dates()?;
        let mut batch_count = 0usize;
        for &date in &dates {
            batch_count += self.batch_files(date)?.len();
        }
        let (latest_date, latest) = self.latest_batch()?;
        Ok(serde_json::json!({
            "dates_with_data": dates.len(),
            "total_batches": batch_count,
            "latest_date": latest_date.map(|d| d.format(DATE_DIR_FORMAT).to_string()),
            "latest_batch_items": latest.len(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn item(platform: &str, title: &str, rank: u32) -> NewsItem {
        NewsItem {
            platform: platform.to_string(),
            platform_name: platform.to_uppercase(),
            title: title.to_string(),
            url: Some(format!("https://example.com/{title}")),
            rank: Some(rank),
            timestamp: None,
        }
    }

    fn store_with(batches: &[(&str, &str, Vec<NewsItem>)]) -> (TempDir, SnapshotStore) {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path());
        for (date, hhmm, items) in batches {
            store.save_batch(d(date), hhmm, items).unwrap();
        }
        (tmp, store)
    }

    #[test]
    fn empty_store_has_no_dates_and_empty_latest() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path());
        assert!(store.list_dates().unwrap().is_empty());
        let (date, items) = store.latest_batch().unwrap();
        assert!(date.is_none());
        assert!(items.is_empty());
    }

    #[test]
    fn latest_batch_is_last_file_of_last_date() {
        let (_tmp, store) = store_with(&[
            ("2025-06-14", "0900", vec![item("zhihu", "old", 1)]),
            ("2025-06-15", "0830", vec![item("zhihu", "morning", 1)]),
            ("2025-06-15", "1230", vec![item("zhihu", "noon", 1)]),
        ]);
        let (date, items) = store.latest_batch().unwrap();
        assert_eq!(date, Some(d("2025-06-15")));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "noon");
    }

    #[test]
    fn items_for_date_merges_batches_keeping_best_rank() {
        let (_tmp, store) = store_with(&[
            ("2025-06-15", "0830", vec![item("zhihu", "story", 7), item("weibo", "other", 2)]),
            ("2025-06-15", "1230", vec![item("zhihu", "story", 3)]),
        ]);
        let items = store.items_for_date(d("2025-06-15")).unwrap();
        assert_eq!(items.len(), 2);
        let story = items.iter().find(|i| i.title == "story").unwrap();
        assert_eq!(story.rank, Some(3));
    }

    #[test]
    fn items_in_range_skips_days_outside() {
        let (_tmp, store) = store_with(&[
            ("2025-06-10", "0900", vec![item("zhihu", "a", 1)]),
            ("2025-06-12", "0900", vec![item("zhihu", "b", 1)]),
            ("2025-06-15", "0900", vec![item("zhihu", "c", 1)]),
        ]);
        let range = DateRange::new(d("2025-06-11"), d("2025-06-14"));
        let days = store.items_in_range(&range).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].0, d("2025-06-12"));
    }

    #[test]
    fn stats_reports_counts() {
        let (_tmp, store) = store_with(&[
            ("2025-06-14", "0900", vec![item("zhihu", "a", 1)]),
            ("2025-06-15", "0900", vec![item("zhihu", "b", 1), item("weibo", "c", 1)]),
        ]);
        let stats = store.stats().unwrap();
        assert_eq!(stats["dates_with_data"], 2);
        assert_eq!(stats["total_batches"], 2);
        assert_eq!(stats["latest_batch_items"], 2);
        assert_eq!(stats["latest_date"], "2025-06-15");
    }

    #[test]
    fn corrupt_batch_file_is_a_storage_error() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path());
        let dir = tmp.path().join("output").join("2025-06-15");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("0900.json"), "not json").unwrap();
        let err = store.latest_batch().unwrap_err();
        assert_eq!(err.kind(), "StorageError");
    }
}
