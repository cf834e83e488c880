//! Derived views over the raw table
//!
//! Every view is a pure function of the raw daily records and is recomputed in
//! full on each refresh:
//!
//! Raw records → Daily summary → Correlations / Workout recommendations
//! Raw records → Personal records

pub mod correlations;
pub mod recommendations;
pub mod records;
pub mod rolling;
pub mod summary;

pub use correlations::build_correlations;
pub use recommendations::build_workout_recommendations;
pub use records::build_personal_records;
pub use summary::{build_daily_summary, HealthScore};

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
