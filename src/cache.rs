//! Derived-view cache
//!
//! Holds the result sets the dashboard has already read, keyed by view, with
//! LRU eviction and a time-to-live. Entries are dropped on expiry or when the
//! derived tables are rebuilt.

use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::{VIEW_CACHE_CAPACITY, VIEW_CACHE_TTL};
use crate::error::Result;
use crate::store::{DerivedView, HealthStore};
use crate::types::{CorrelationBucket, DailySummary, PersonalRecords, WorkoutRecommendation};

/// Contents of one derived view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", content = "rows", rename_all = "snake_case")]
pub enum ViewData {
    DailySummary(Vec<DailySummary>),
    Correlations(Vec<CorrelationBucket>),
    WorkoutRecommendations(Vec<WorkoutRecommendation>),
    PersonalRecords(PersonalRecords),
}

impl ViewData {
    pub fn view(&self) -> DerivedView {
        match self {
            ViewData::DailySummary(_) => DerivedView::DailySummary,
            ViewData::Correlations(_) => DerivedView::Correlations,
            ViewData::WorkoutRecommendations(_) => DerivedView::WorkoutRecommendations,
            ViewData::PersonalRecords(_) => DerivedView::PersonalRecords,
        }
    }

    /// Read `view` from the store
    pub fn load(store: &HealthStore, view: DerivedView) -> Result<Self> {
        Ok(match view {
            DerivedView::DailySummary => ViewData::DailySummary(store.daily_summary()?),
            DerivedView::Correlations => ViewData::Correlations(store.correlations()?),
            DerivedView::WorkoutRecommendations => {
                ViewData::WorkoutRecommendations(store.workout_recommendations()?)
            }
            DerivedView::PersonalRecords => ViewData::PersonalRecords(store.personal_records()?),
        })
    }

    pub fn row_count(&self) -> usize {
        match self {
            ViewData::DailySummary(rows) => rows.len(),
            ViewData::Correlations(rows) => rows.len(),
            ViewData::WorkoutRecommendations(rows) => rows.len(),
            ViewData::PersonalRecords(rows) => rows.len(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: ViewData,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: ViewData, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// LRU cache of derived views with a fixed time-to-live
pub struct ViewCache {
    entries: LruCache<DerivedView, CacheEntry>,
    ttl: Duration,
}

impl ViewCache {
    const MIN_CAPACITY: NonZeroUsize = NonZeroUsize::MIN;

    /// A zero capacity is raised to one entry
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(Self::MIN_CAPACITY);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached data for `view`, or `None` if absent or expired
    pub fn get(&mut self, view: DerivedView) -> Option<&ViewData> {
        let expired = self.entries.peek(&view)?.is_expired();
        if expired {
            self.entries.pop(&view);
            debug!(%view, "view cache entry expired");
            return None;
        }
        self.entries.get(&view).map(|entry| &entry.data)
    }

    pub fn insert(&mut self, data: ViewData) {
        let view = data.view();
        self.entries.put(view, CacheEntry::new(data, self.ttl));
    }

    /// Cached data for `view`, loading and caching it on a miss
    pub fn get_or_load<F>(&mut self, view: DerivedView, load: F) -> Result<ViewData>
    where
        F: FnOnce() -> Result<ViewData>,
    {
        if let Some(data) = self.get(view) {
            debug!(%view, "view cache hit");
            return Ok(data.clone());
        }

        debug!(%view, "view cache miss");
        let data = load()?;
        self.insert(data.clone());
        Ok(data)
    }

    pub fn invalidate(&mut self, view: DerivedView) {
        self.entries.pop(&view);
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new(VIEW_CACHE_CAPACITY, VIEW_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use crate::pipeline::refresh_views;
    use crate::test_support::flat_series;
    use std::cell::Cell;

    fn loaded_store() -> HealthStore {
        let mut store = HealthStore::open_in_memory().unwrap();
        store.replace_raw_records(&flat_series(10, 9_000)).unwrap();
        refresh_views(&mut store).unwrap();
        store
    }

    #[test]
    fn test_hit_skips_loader() {
        let store = loaded_store();
        let mut cache = ViewCache::default();
        let loads = Cell::new(0);

        for _ in 0..3 {
            let data = cache
                .get_or_load(DerivedView::DailySummary, || {
                    loads.set(loads.get() + 1);
                    ViewData::load(&store, DerivedView::DailySummary)
                })
                .unwrap();
            assert_eq!(data.row_count(), 10);
        }

        assert_eq!(loads.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entries_reload() {
        let store = loaded_store();
        let mut cache = ViewCache::new(4, Duration::ZERO);
        let loads = Cell::new(0);

        for _ in 0..2 {
            cache
                .get_or_load(DerivedView::Correlations, || {
                    loads.set(loads.get() + 1);
                    ViewData::load(&store, DerivedView::Correlations)
                })
                .unwrap();
        }

        assert_eq!(loads.get(), 2);
    }

    #[test]
    fn test_invalidate() {
        let store = loaded_store();
        let mut cache = ViewCache::default();
        for view in DerivedView::ALL {
            cache.insert(ViewData::load(&store, view).unwrap());
        }
        assert_eq!(cache.len(), 4);

        cache.invalidate(DerivedView::PersonalRecords);
        assert!(cache.get(DerivedView::PersonalRecords).is_none());
        assert!(cache.get(DerivedView::DailySummary).is_some());

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_holds_one_entry() {
        let store = loaded_store();
        let mut cache = ViewCache::new(0, VIEW_CACHE_TTL);
        cache.insert(ViewData::load(&store, DerivedView::DailySummary).unwrap());
        cache.insert(ViewData::load(&store, DerivedView::Correlations).unwrap());

        assert_eq!(cache.len(), 1);
        assert!(cache.get(DerivedView::Correlations).is_some());
    }

    #[test]
    fn test_load_errors_are_not_cached() {
        let store = HealthStore::open_in_memory().unwrap();
        let mut cache = ViewCache::default();

        let result = cache.get_or_load(DerivedView::DailySummary, || {
            ViewData::load(&store, DerivedView::DailySummary)
        });

        assert!(matches!(result, Err(AnalyticsError::MissingView(_))));
        assert!(cache.is_empty());
    }
}
