//! Fixed settings
//!
//! Paths, goals and windows are compiled in. The CLI only overrides paths and
//! generator inputs; analytic thresholds are not externally configurable.

use std::time::Duration;

/// Default location of the generated flat file
pub const DEFAULT_DATA_PATH: &str = "data/health_metrics.csv";

/// Default location of the single-file analytical store
pub const DEFAULT_DB_PATH: &str = "health_analytics/health_analytics.db";

/// Daily step goal; steps attainment saturates here
pub const DAILY_STEPS_GOAL: u32 = 10_000;

/// Nightly sleep goal in hours; sleep attainment saturates here
pub const SLEEP_GOAL_HOURS: f64 = 8.0;

/// Sleep at or above this is shown as good on the dashboard
pub const GOOD_SLEEP_HOURS: f64 = 7.5;

/// Target line drawn on the health score chart
pub const HEALTH_SCORE_TARGET: f64 = 7.0;

/// Trailing records in each rolling average, current day included
pub const ROLLING_WINDOW_DAYS: usize = 7;

/// Lookback for dashboard trend charts
pub const TREND_LOOKBACK_DAYS: i64 = 90;

/// Window for the "this week" summary
pub const WEEK_WINDOW_DAYS: i64 = 7;

/// How long a derived view stays cached at the dashboard boundary
pub const VIEW_CACHE_TTL: Duration = Duration::from_secs(600);

/// Upper bound on cached view entries
pub const VIEW_CACHE_CAPACITY: usize = 16;
