//! Equity curves
//!
//! Downsamples a portfolio-value series to a bounded number of points,
//! expressed as cumulative percentage return from the initial capital.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calc::round_to;

/// Target number of points after sampling
const MAX_POINTS: usize = 500;

/// A sampled equity curve ready for plotting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    /// ISO dates of the sampled points
    pub dates: Vec<String>,
    /// Cumulative return at each point, percent
    pub values: Vec<f64>,
}

/// Sample `values` down to at most ~`MAX_POINTS` points
pub fn sample_equity_curve(
    values: &[f64],
    dates: &[NaiveDate],
    initial_capital: f64,
) -> EquityCurve {
    let stride = (dates.len() / MAX_POINTS).max(1);
    let mut out = EquityCurve {
        dates: Vec::new(),
        values: Vec::new(),
    };

    for i in (0..dates.len()).step_by(stride) {
        let value = values[i.min(values.len() - 1)];
        out.dates.push(dates[i].format("%Y-%m-%d").to_string());
        out.values
            .push(round_to((value / initial_capital - 1.0) * 100.0, 2));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..n).map(|i| start + chrono::Days::new(i as u64)).collect()
    }

    #[test]
    fn test_short_series_keeps_every_point() {
        let values = vec![100_000.0, 101_000.0, 102_000.0];
        let curve = sample_equity_curve(&values, &make_dates(3), 100_000.0);
        assert_eq!(curve.dates.len(), 3);
        assert_eq!(curve.values, vec![0.0, 1.0, 2.0]);
        assert_eq!(curve.dates[0], "2020-01-01");
    }

    #[test]
    fn test_long_series_is_bounded() {
        let n = 2_600;
        let values = vec![100_000.0; n];
        let curve = sample_equity_curve(&values, &make_dates(n), 100_000.0);
        // stride 5 keeps 520 points for 2600 days
        assert!(curve.dates.len() <= 520);
        assert!(curve.dates.len() >= 500);
    }

    #[test]
    fn test_values_are_cumulative_returns() {
        let values = vec![100_000.0, 150_000.0];
        let curve = sample_equity_curve(&values, &make_dates(2), 100_000.0);
        assert_eq!(curve.values[1], 50.0);
    }
}
