//! Performance analysis
//!
//! Metrics, yearly breakdowns and equity-curve sampling over simulated
//! trajectories.

mod equity;
mod metrics;

pub use equity::{sample_equity_curve, EquityCurve};
pub use metrics::{compute_metrics, compute_yearly, StrategyMetrics, YearlyRecord};
