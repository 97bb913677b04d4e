//! Results report
//!
//! Collects every strategy's metrics, yearly records and equity curves into
//! one serializable document for downstream consumers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::analytics::{EquityCurve, StrategyMetrics, YearlyRecord};
use crate::error::Result;

/// How the reported model was produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingInfo {
    /// Training episodes run
    pub episodes: usize,
    /// Feature columns the agent observed
    pub features: Vec<String>,
    /// Rows in the historical series
    pub data_points: usize,
    /// ISO timestamp of the run
    pub trained_at: String,
}

/// Full backtest output across all strategies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Headline metrics of the learned policy
    pub summary: StrategyMetrics,
    pub training: TrainingInfo,
    /// Per-year records across all strategies
    pub yearly: Vec<YearlyRecord>,
    /// Equity curve per strategy key
    pub equity_curves: BTreeMap<String, EquityCurve>,
    /// Aggregate metrics per strategy key
    pub strategy_metrics: BTreeMap<String, StrategyMetrics>,
}

impl BacktestReport {
    /// Write the report as pretty-printed JSON
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metrics() -> StrategyMetrics {
        StrategyMetrics {
            total_return: 12.34,
            win_rate: 55.0,
            sharpe_ratio: 1.1,
            max_drawdown: -8.2,
            total_trades: 14,
            profit_factor: 1.6,
        }
    }

    #[test]
    fn test_report_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("backtest.json");

        let mut strategy_metrics = BTreeMap::new();
        strategy_metrics.insert("dqn".to_string(), sample_metrics());

        let report = BacktestReport {
            summary: sample_metrics(),
            training: TrainingInfo {
                episodes: 50,
                features: vec!["rsi".into()],
                data_points: 1_000,
                trained_at: "2024-01-01T00:00:00Z".into(),
            },
            yearly: Vec::new(),
            equity_curves: BTreeMap::new(),
            strategy_metrics,
        };
        report.write_json(&path).unwrap();

        let restored: BacktestReport =
            serde_json::from_reader(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(restored.summary, sample_metrics());
        assert_eq!(restored.training.episodes, 50);
        assert!(restored.strategy_metrics.contains_key("dqn"));
    }
}
