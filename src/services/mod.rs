//! Service layer behind the MCP tools.
//!
//! [`ServiceRegistry`] is built once at startup with every dependency passed
//! in explicitly (config, snapshot store, fetcher, clock) and shared behind
//! an `Arc`. Tools never reach for globals.

pub mod analytics;
pub mod config_mgmt;
pub mod data;
pub mod search;
pub mod system;
pub mod text;

use std::path::Path;
use std::sync::Arc;

use crate::config::loader::load_config;
use crate::config::schema::TrendLensConfig;
use crate::crawler::{NewsFetcher, SnapshotFetcher};
use crate::error::Result;
use crate::params::{Clock, SystemClock};
use crate::storage::SnapshotStore;

use analytics::AnalyticsService;
use config_mgmt::ConfigService;
use data::DataQueryService;
use search::SearchService;
use system::SystemService;

/// Every service the gateway dispatches to, built once and shared.
pub struct ServiceRegistry {
    pub data: DataQueryService,
    pub analytics: AnalyticsService,
    pub search: SearchService,
    pub config: ConfigService,
    pub system: SystemService,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry").finish_non_exhaustive()
    }
}

impl ServiceRegistry {
    /// Standard construction: load config from the project root, serve
    /// snapshots from `<root>/output`, wall-clock time. Config errors are
    /// fatal here so the process refuses to start half-configured.
    pub fn new(project_root: &Path) -> Result<Self> {
        let config = Arc::new(load_config(project_root)?);
        let store = SnapshotStore::new(project_root);
        let fetcher = Arc::new(SnapshotFetcher::new(store.clone()));
        Ok(Self::with_parts(config, store, fetcher, Arc::new(SystemClock)))
    }

    /// Construction with every dependency injected. Tests use this with a
    /// fixed clock and scripted fetchers.
    pub fn with_parts(
        config: Arc<TrendLensConfig>,
        store: SnapshotStore,
        fetcher: Arc<dyn NewsFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            data: DataQueryService::new(store.clone(), config.clone(), clock.clone()),
            analytics: AnalyticsService::new(store.clone(), config.clone(), clock.clone()),
            search: SearchService::new(store.clone(), config.clone(), clock.clone()),
            config: ConfigService::new(config.clone()),
            system: SystemService::new(store, config, fetcher, clock),
        }
    }
}
