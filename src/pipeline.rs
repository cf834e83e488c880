//! Pipeline orchestration
//!
//! Ties the stages together: raw records in the store are read, every derived
//! view is rebuilt from scratch, and the results replace the derived tables.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::derive::{
    build_correlations, build_daily_summary, build_personal_records,
    build_workout_recommendations,
};
use crate::error::Result;
use crate::store::HealthStore;
use crate::types::{
    CorrelationBucket, DailyRecord, DailySummary, PersonalRecords, WorkoutRecommendation,
};

/// The four derived result sets computed from one snapshot of the raw table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedViews {
    pub daily_summary: Vec<DailySummary>,
    pub correlations: Vec<CorrelationBucket>,
    pub workout_recommendations: Vec<WorkoutRecommendation>,
    pub personal_records: PersonalRecords,
}

/// Compute every derived view from raw records.
///
/// Pure and deterministic: the same records always give the same views.
pub fn derive_views(records: &[DailyRecord]) -> DerivedViews {
    // Stage 1: daily summary, the base for correlations and recommendations
    let daily_summary = build_daily_summary(records);

    // Stage 2: aggregations over the summary
    let correlations = build_correlations(&daily_summary);
    let workout_recommendations = build_workout_recommendations(&daily_summary);

    // Stage 3: records straight from raw
    let personal_records = build_personal_records(records);

    DerivedViews {
        daily_summary,
        correlations,
        workout_recommendations,
        personal_records,
    }
}

/// Rebuild the derived tables from the raw table currently in the store
pub fn refresh_views(store: &mut HealthStore) -> Result<DerivedViews> {
    let records = store.raw_records()?;
    let views = derive_views(&records);
    store.replace_views(&views)?;

    info!(
        raw_rows = records.len(),
        summary_rows = views.daily_summary.len(),
        correlation_buckets = views.correlations.len(),
        personal_records = views.personal_records.len(),
        "refreshed derived views"
    );

    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::flat_series;

    #[test]
    fn test_derive_views_is_deterministic() {
        let records = flat_series(21, 9_500);
        assert_eq!(derive_views(&records), derive_views(&records));
    }

    #[test]
    fn test_derive_views_shapes() {
        let views = derive_views(&flat_series(21, 9_500));

        assert_eq!(views.daily_summary.len(), 21);
        assert_eq!(views.workout_recommendations.len(), 7);
        assert_eq!(views.personal_records.len(), 3);
        assert!(!views.correlations.is_empty());
    }

    #[test]
    fn test_refresh_views_round_trips_through_store() {
        let mut store = HealthStore::open_in_memory().unwrap();
        store.replace_raw_records(&flat_series(14, 10_000)).unwrap();

        let views = refresh_views(&mut store).unwrap();

        assert_eq!(store.daily_summary().unwrap(), views.daily_summary);
        assert_eq!(store.personal_records().unwrap(), views.personal_records);
    }
}
