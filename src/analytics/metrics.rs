//! Performance metrics
//!
//! Reduces a portfolio-value series and trade ledger to the standard
//! summary numbers, overall and per calendar year.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calc::{mean, round_to, std_dev};
use crate::env::{Trade, TradeSide};

/// Trading days per year, for annualizing the Sharpe ratio
const TRADING_DAYS: f64 = 252.0;

/// Ceiling applied to the profit factor so downstream consumers never see
/// an unbounded value
const PROFIT_FACTOR_CAP: f64 = 99.99;

/// Years with fewer observations than this are skipped in the breakdown
const MIN_YEAR_OBSERVATIONS: usize = 5;

/// Aggregate performance of one simulated trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetrics {
    /// Total return over the series, percent
    pub total_return: f64,
    /// Share of completed round trips that closed higher, percent
    pub win_rate: f64,
    /// Annualized daily-return Sharpe ratio
    pub sharpe_ratio: f64,
    /// Worst peak-to-trough decline, negative percent
    pub max_drawdown: f64,
    /// Completed round trips
    pub total_trades: usize,
    /// Summed gains over summed losses, capped
    pub profit_factor: f64,
}

/// One year of one strategy's performance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyRecord {
    pub year: i32,
    pub strategy: String,
    /// Return within the year, percent
    pub return_pct: f64,
    /// Completed round trips within the year
    pub trades: usize,
    pub win_rate: f64,
    pub sharpe: f64,
    pub max_dd: f64,
    pub profit_factor: f64,
}

/// Per-step simple returns with non-finite entries filtered out
fn simple_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .filter(|r| r.is_finite())
        .collect()
}

/// Pair consecutive BUY/SELL ledger entries into round trips
///
/// Returns (wins, completed round trips). A trailing BUY with no matching
/// SELL is excluded from both counts; that asymmetry is part of the
/// reported numbers, not an error.
fn pair_trades(trades: &[Trade]) -> (usize, usize) {
    let mut wins = 0;
    let mut total = 0;
    let mut i = 0;
    while i + 1 < trades.len() {
        if trades[i].side == TradeSide::Buy && trades[i + 1].side == TradeSide::Sell {
            if trades[i + 1].price > trades[i].price {
                wins += 1;
            }
            total += 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    (wins, total)
}

/// Annualized Sharpe ratio, 0.0 on empty or zero-variance returns
fn sharpe_ratio(returns: &[f64]) -> f64 {
    let std = std_dev(returns);
    if returns.is_empty() || std == 0.0 {
        return 0.0;
    }
    mean(returns) / std * TRADING_DAYS.sqrt()
}

/// Worst decline from a running peak, as a negative percentage
fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;
    for &v in values {
        peak = peak.max(v);
        let drawdown = (v - peak) / peak * 100.0;
        worst = worst.min(drawdown);
    }
    worst
}

/// Summed gains over summed losses, capped at the sentinel ceiling
fn profit_factor(returns: &[f64]) -> f64 {
    let gains: f64 = returns.iter().filter(|r| **r > 0.0).sum();
    let losses: f64 = returns.iter().filter(|r| **r < 0.0).sum::<f64>().abs();
    if losses > 0.0 {
        (gains / losses).min(PROFIT_FACTOR_CAP)
    } else {
        PROFIT_FACTOR_CAP
    }
}

/// Compute the aggregate metrics for one trajectory
pub fn compute_metrics(values: &[f64], trades: &[Trade]) -> StrategyMetrics {
    let returns = simple_returns(values);
    let total_return = (values[values.len() - 1] / values[0] - 1.0) * 100.0;

    let (wins, total) = pair_trades(trades);
    let win_rate = if total > 0 {
        wins as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    StrategyMetrics {
        total_return: round_to(total_return, 2),
        win_rate: round_to(win_rate, 1),
        sharpe_ratio: round_to(sharpe_ratio(&returns), 2),
        max_drawdown: round_to(max_drawdown(values), 1),
        total_trades: total,
        profit_factor: round_to(profit_factor(&returns), 2),
    }
}

/// Recompute the metrics independently within each calendar year
///
/// Years with fewer than `MIN_YEAR_OBSERVATIONS` steps are skipped. Trades
/// belong to the year of the date at their step index.
pub fn compute_yearly(
    values: &[f64],
    trades: &[Trade],
    dates: &[NaiveDate],
    strategy: &str,
) -> Vec<YearlyRecord> {
    let n = dates.len().min(values.len());
    if n == 0 {
        return Vec::new();
    }

    let mut years: Vec<i32> = dates[..n].iter().map(|d| d.year()).collect();
    years.sort_unstable();
    years.dedup();

    let mut records = Vec::new();
    for year in years {
        let indices: Vec<usize> = (0..n).filter(|&i| dates[i].year() == year).collect();
        if indices.len() < MIN_YEAR_OBSERVATIONS {
            continue;
        }

        let year_values: Vec<f64> = indices.iter().map(|&i| values[i]).collect();
        let year_returns = simple_returns(&year_values);
        let return_pct = (year_values[year_values.len() - 1] / year_values[0] - 1.0) * 100.0;

        let year_trades: Vec<Trade> = trades
            .iter()
            .filter(|t| dates[t.step.min(n - 1)].year() == year)
            .copied()
            .collect();
        let (wins, total) = pair_trades(&year_trades);
        let win_rate = if total > 0 {
            wins as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        records.push(YearlyRecord {
            year,
            strategy: strategy.to_string(),
            return_pct: round_to(return_pct, 1),
            trades: total,
            win_rate: round_to(win_rate, 1),
            sharpe: round_to(sharpe_ratio(&year_returns), 2),
            max_dd: round_to(max_drawdown(&year_values), 1),
            profit_factor: round_to(profit_factor(&year_returns), 2),
        });
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(side: TradeSide, step: usize, price: f64) -> Trade {
        Trade { side, step, price }
    }

    #[test]
    fn test_round_trip_drawdown_scenario() {
        let values = [100_000.0, 101_000.0, 99_000.0, 100_000.0];
        let metrics = compute_metrics(&values, &[]);
        assert_eq!(metrics.total_return, 0.0);
        // peak 101000 to trough 99000
        let raw = max_drawdown(&values);
        assert!((raw - (-1.9801980198019802)).abs() < 1e-9);
        assert_eq!(metrics.max_drawdown, -2.0);
    }

    #[test]
    fn test_win_rate_pairing() {
        let trades = [
            trade(TradeSide::Buy, 0, 100.0),
            trade(TradeSide::Sell, 5, 110.0),
            trade(TradeSide::Buy, 8, 105.0),
            trade(TradeSide::Sell, 12, 95.0),
        ];
        let metrics = compute_metrics(&[100_000.0, 100_500.0], &trades);
        assert_eq!(metrics.total_trades, 2);
        assert_eq!(metrics.win_rate, 50.0);
    }

    #[test]
    fn test_trailing_buy_is_excluded() {
        let trades = [
            trade(TradeSide::Buy, 0, 100.0),
            trade(TradeSide::Sell, 5, 110.0),
            trade(TradeSide::Buy, 8, 105.0),
        ];
        let (wins, total) = pair_trades(&trades);
        assert_eq!((wins, total), (1, 1));
    }

    #[test]
    fn test_win_rate_no_trades() {
        let metrics = compute_metrics(&[100.0, 101.0], &[]);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.total_trades, 0);
    }

    #[test]
    fn test_sharpe_zero_variance() {
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01]), 0.0);
        assert_eq!(sharpe_ratio(&[]), 0.0);
    }

    #[test]
    fn test_sharpe_annualization() {
        let returns = [0.01, -0.005, 0.02, 0.0, 0.003];
        let expected = mean(&returns) / std_dev(&returns) * 252f64.sqrt();
        assert!((sharpe_ratio(&returns) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_profit_factor_cap_without_losses() {
        assert_eq!(profit_factor(&[0.01, 0.02]), 99.99);
        assert_eq!(profit_factor(&[]), 99.99);
    }

    #[test]
    fn test_profit_factor_ratio() {
        let pf = profit_factor(&[0.03, -0.01, 0.01, -0.01]);
        assert!((pf - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_returns_filtered() {
        // a zero value would produce an infinite return for the next step
        let returns = simple_returns(&[100.0, 0.0, 50.0]);
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0], -1.0);
    }

    #[test]
    fn test_yearly_groups_and_skips_sparse_years() {
        let start_2020 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut dates: Vec<NaiveDate> = (0..10)
            .map(|i| start_2020 + chrono::Days::new(i))
            .collect();
        // only 3 observations in 2021: below the minimum, skipped
        let start_2021 = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        dates.extend((0..3).map(|i| start_2021 + chrono::Days::new(i)));

        let values: Vec<f64> = (0..13).map(|i| 100_000.0 + i as f64 * 100.0).collect();
        let records = compute_yearly(&values, &[], &dates, "test");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year, 2020);
        assert_eq!(records[0].strategy, "test");
    }

    #[test]
    fn test_yearly_trade_assignment() {
        let start_2020 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut dates: Vec<NaiveDate> = (0..10)
            .map(|i| start_2020 + chrono::Days::new(i))
            .collect();
        let start_2021 = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        dates.extend((0..10).map(|i| start_2021 + chrono::Days::new(i)));

        let values: Vec<f64> = (0..20).map(|_| 100_000.0).collect();
        let trades = [
            trade(TradeSide::Buy, 1, 100.0),
            trade(TradeSide::Sell, 3, 105.0),
            trade(TradeSide::Buy, 12, 100.0),
            trade(TradeSide::Sell, 14, 90.0),
        ];
        let records = compute_yearly(&values, &trades, &dates, "test");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].year, 2020);
        assert_eq!(records[0].trades, 1);
        assert_eq!(records[0].win_rate, 100.0);
        assert_eq!(records[1].year, 2021);
        assert_eq!(records[1].trades, 1);
        assert_eq!(records[1].win_rate, 0.0);
    }

    #[test]
    fn test_yearly_ascending_order() {
        let mut dates = Vec::new();
        for year in [2019, 2020, 2021] {
            let start = NaiveDate::from_ymd_opt(year, 1, 1).unwrap();
            dates.extend((0..8).map(|i| start + chrono::Days::new(i)));
        }
        let values = vec![100_000.0; dates.len()];
        let records = compute_yearly(&values, &[], &dates, "test");
        let years: Vec<i32> = records.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
    }
}
