//! Market data inputs
//!
//! Daily candles loaded from CSV or JSON files, and the aligned
//! feature/price/volume/date arrays consumed by the simulator. Array
//! alignment is validated once up front; the rest of the crate assumes
//! validated input.

use chrono::{Datelike, NaiveDate};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use crate::error::{Result, TraderError};

/// A single daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Load candles from a CSV file with a `date,open,high,low,close,volume` header
pub fn load_candles<P: AsRef<Path>>(path: P) -> Result<Vec<Candle>> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::Reader::from_reader(file);

    let mut candles = Vec::new();
    for row in reader.deserialize() {
        let candle: Candle = row?;
        candles.push(candle);
    }
    candles.sort_by_key(|c| c.date);
    Ok(candles)
}

/// Load candles from a JSON array file
pub fn load_candles_json<P: AsRef<Path>>(path: P) -> Result<Vec<Candle>> {
    let file = File::open(path.as_ref())?;
    let mut candles: Vec<Candle> = serde_json::from_reader(file)?;
    candles.sort_by_key(|c| c.date);
    Ok(candles)
}

/// Normalized feature matrix plus the aligned price/volume/date arrays
///
/// One row per trading day. The feature matrix is treated as an opaque
/// observation by the simulator; only the analytics care about dates and
/// only the rule-based strategies care about raw prices and volumes.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub features: Array2<f64>,
    pub feature_names: Vec<String>,
    pub prices: Vec<f64>,
    pub volumes: Vec<f64>,
    pub dates: Vec<NaiveDate>,
}

impl MarketData {
    /// Number of time steps
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// True when there are no time steps
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Width of one observation
    pub fn feature_dim(&self) -> usize {
        self.features.ncols()
    }

    /// Observation at step `t` as an owned vector
    pub fn observation(&self, t: usize) -> Vec<f64> {
        self.features.row(t).to_vec()
    }

    /// Distinct calendar years present in the date array, ascending
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.dates.iter().map(|d| d.year()).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Check the alignment preconditions once, before any simulation
    pub fn validate(&self) -> Result<()> {
        let n = self.prices.len();
        if n == 0 {
            return Err(TraderError::InvalidData("empty price series".into()));
        }
        if self.features.nrows() != n || self.volumes.len() != n || self.dates.len() != n {
            return Err(TraderError::InvalidData(format!(
                "misaligned arrays: {} features, {} prices, {} volumes, {} dates",
                self.features.nrows(),
                n,
                self.volumes.len(),
                self.dates.len()
            )));
        }
        if self.features.ncols() != self.feature_names.len() {
            return Err(TraderError::InvalidData(format!(
                "{} feature columns but {} feature names",
                self.features.ncols(),
                self.feature_names.len()
            )));
        }
        if self.prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(TraderError::InvalidData(
                "prices must be positive and finite".into(),
            ));
        }
        if self.volumes.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(TraderError::InvalidData(
                "volumes must be non-negative and finite".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::io::Write;

    fn sample_data(n: usize) -> MarketData {
        MarketData {
            features: Array2::zeros((n, 2)),
            feature_names: vec!["a".into(), "b".into()],
            prices: vec![100.0; n],
            volumes: vec![1_000.0; n],
            dates: (0..n)
                .map(|i| NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Days::new(i as u64))
                .collect(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample_data(10).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_misalignment() {
        let mut data = sample_data(10);
        data.volumes.pop();
        assert!(matches!(
            data.validate(),
            Err(TraderError::InvalidData(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let data = sample_data(0);
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_prices() {
        let mut data = sample_data(5);
        data.prices[2] = -1.0;
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_load_candles_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candles.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "date,open,high,low,close,volume").unwrap();
        writeln!(f, "2020-01-03,101.0,103.0,100.0,102.0,1200").unwrap();
        writeln!(f, "2020-01-02,100.0,102.0,99.0,101.0,1000").unwrap();

        let candles = load_candles(&path).unwrap();
        assert_eq!(candles.len(), 2);
        // sorted by date
        assert_eq!(candles[0].date, NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(candles[1].close, 102.0);
    }

    #[test]
    fn test_observation_row() {
        let mut data = sample_data(3);
        data.features[[1, 0]] = 0.5;
        assert_eq!(data.observation(1), vec![0.5, 0.0]);
    }
}
