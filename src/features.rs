//! Feature engineering
//!
//! Technical indicators computed from raw candles, assembled into the
//! normalized feature matrix the agent observes. Normalization is min-max
//! fitted over the ENTIRE series, training and evaluation ranges together.
//! That introduces lookahead bias into every backtest; it is kept as the
//! reference behavior of this pipeline rather than silently corrected.

use ndarray::Array2;

use crate::calc::least_squares_slope;
use crate::data::{Candle, MarketData};
use crate::error::{Result, TraderError};

/// Guard added to denominators that can reach zero
const DIV_EPS: f64 = 1e-10;

/// Feature columns, in matrix order
pub const FEATURE_NAMES: [&str; 14] = [
    "sma_10",
    "sma_30",
    "sma_50",
    "rsi",
    "macd",
    "macd_signal",
    "bb_pct",
    "atr",
    "vol_ratio",
    "return_1d",
    "return_5d",
    "return_10d",
    "lr_slope_20",
    "lr_slope_50",
];

/// Rows consumed by the longest indicator warm-up (SMA 50)
const WARMUP: usize = 49;

/// Build the normalized feature matrix and aligned arrays from candles
///
/// The first `WARMUP` rows are dropped because at least one indicator is
/// undefined there; prices, volumes and dates are trimmed to match.
pub fn engineer(candles: &[Candle]) -> Result<MarketData> {
    if candles.len() <= WARMUP {
        return Err(TraderError::InsufficientData {
            have: candles.len(),
            need: WARMUP + 1,
        });
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

    let columns: [Vec<f64>; 14] = [
        rolling_mean(&closes, 10),
        rolling_mean(&closes, 30),
        rolling_mean(&closes, 50),
        rsi(&closes, 14),
        macd_line(&closes),
        macd_signal(&closes),
        bollinger_pct(&closes, 20),
        atr(candles, 14),
        volume_ratio(&volumes, 20),
        pct_change(&closes, 1),
        pct_change(&closes, 5),
        pct_change(&closes, 10),
        rolling_slope(&closes, 20),
        rolling_slope(&closes, 50),
    ];

    let rows = candles.len() - WARMUP;
    let mut features = Array2::zeros((rows, FEATURE_NAMES.len()));
    for (col_idx, column) in columns.iter().enumerate() {
        for row in 0..rows {
            features[[row, col_idx]] = column[WARMUP + row];
        }
    }
    normalize_min_max(&mut features);

    let data = MarketData {
        features,
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        prices: closes[WARMUP..].to_vec(),
        volumes: volumes[WARMUP..].to_vec(),
        dates: candles[WARMUP..].iter().map(|c| c.date).collect(),
    };
    data.validate()?;
    Ok(data)
}

/// Scale each column to [0, 1] over the whole series
fn normalize_min_max(features: &mut Array2<f64>) {
    for mut column in features.columns_mut() {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in column.iter() {
            min = min.min(v);
            max = max.max(v);
        }
        let range = if max - min > 0.0 { max - min } else { 1.0 };
        column.mapv_inplace(|v| (v - min) / range);
    }
}

/// Simple moving average; positions before the window fills hold 0.0
/// (those rows fall inside the warm-up cut)
fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out[i] = sum / window as f64;
        }
    }
    out
}

/// Rolling sample standard deviation
fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    if window < 2 {
        return out;
    }
    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        let m = slice.iter().sum::<f64>() / window as f64;
        let var =
            slice.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (window - 1) as f64;
        out[i] = var.sqrt();
    }
    out
}

/// Exponential moving average with smoothing 2 / (span + 1)
fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    if values.is_empty() {
        return out;
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    out[0] = values[0];
    for i in 1..values.len() {
        out[i] = alpha * values[i] + (1.0 - alpha) * out[i - 1];
    }
    out
}

/// Relative strength index over rolling mean gain/loss
fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        gains[i] = delta.max(0.0);
        losses[i] = (-delta).max(0.0);
    }
    // deltas start at index 1, so the first defined value is at `period`
    let avg_gain = rolling_mean(&gains[1..], period);
    let avg_loss = rolling_mean(&losses[1..], period);

    let mut out = vec![0.0; n];
    for i in period..n {
        let rs = avg_gain[i - 1] / (avg_loss[i - 1] + DIV_EPS);
        out[i] = 100.0 - 100.0 / (1.0 + rs);
    }
    out
}

/// MACD line: EMA(12) - EMA(26)
fn macd_line(closes: &[f64]) -> Vec<f64> {
    let fast = ema(closes, 12);
    let slow = ema(closes, 26);
    fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect()
}

/// Signal line: EMA(9) of the MACD line
fn macd_signal(closes: &[f64]) -> Vec<f64> {
    ema(&macd_line(closes), 9)
}

/// Percent position of the close within its Bollinger band (20, 2 sigma)
fn bollinger_pct(closes: &[f64], window: usize) -> Vec<f64> {
    let sma = rolling_mean(closes, window);
    let std = rolling_std(closes, window);
    let mut out = vec![0.0; closes.len()];
    for i in (window - 1)..closes.len() {
        let upper = sma[i] + 2.0 * std[i];
        let lower = sma[i] - 2.0 * std[i];
        out[i] = (closes[i] - lower) / (upper - lower + DIV_EPS);
    }
    out
}

/// Average true range over `period` bars
fn atr(candles: &[Candle], period: usize) -> Vec<f64> {
    let n = candles.len();
    let mut true_range = vec![0.0; n];
    for i in 0..n {
        let hl = candles[i].high - candles[i].low;
        true_range[i] = if i == 0 {
            hl
        } else {
            let prev_close = candles[i - 1].close;
            hl.max((candles[i].high - prev_close).abs())
                .max((candles[i].low - prev_close).abs())
        };
    }
    rolling_mean(&true_range, period)
}

/// Volume relative to its trailing mean
fn volume_ratio(volumes: &[f64], window: usize) -> Vec<f64> {
    let avg = rolling_mean(volumes, window);
    let mut out = vec![0.0; volumes.len()];
    for i in (window - 1)..volumes.len() {
        out[i] = volumes[i] / (avg[i] + DIV_EPS);
    }
    out
}

/// Fractional change over `periods` steps
fn pct_change(values: &[f64], periods: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    for i in periods..values.len() {
        out[i] = (values[i] - values[i - periods]) / values[i - periods];
    }
    out
}

/// Rolling least-squares slope, 0.0 before the window fills
fn rolling_slope(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    for i in (window - 1)..values.len() {
        out[i] = least_squares_slope(&values[i + 1 - window..=i]);
    }
    out
}
