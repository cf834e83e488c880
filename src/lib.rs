//! Health Analytics - personal health-metrics pipeline
//!
//! Turns daily health records into derived analytics through a deterministic
//! pipeline: synthetic generation → CSV → embedded store → derived views →
//! dashboard.
//!
//! ## Modules
//!
//! - **Generator / Loader**: seeded synthetic data, CSV round trip, raw table replacement
//! - **Derive**: daily summary, correlations, workout recommendations, personal records
//! - **Dashboard**: cached view access, text rendering and JSON snapshots

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod derive;
pub mod error;
pub mod generator;
pub mod loader;
pub mod pipeline;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_support;

pub use cache::{ViewCache, ViewData};
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use error::{AnalyticsError, Result, ValidationError};
pub use generator::{GenerationSummary, GeneratorConfig, HealthDataGenerator};
pub use loader::{load_file, load_records, LoadReport};
pub use pipeline::{derive_views, refresh_views, DerivedViews};
pub use store::{DerivedView, HealthStore, RawStats};
pub use types::{
    CorrelationBucket, DailyRecord, DailySummary, DayOfWeek, PersonalRecord, PersonalRecords,
    RecommendationLabel, TrackedMetric, WorkoutRecommendation, WorkoutType,
};

/// Crate version embedded in dashboard snapshots
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for dashboard snapshots
pub const PRODUCER_NAME: &str = "health-analytics";
