//! Regression-slope strategy
//!
//! Fits least-squares trend lines over two horizons and trades when both
//! agree. A short-horizon dip against a still-positive long trend is treated
//! as a pullback and re-entered.

use super::{Action, DecisionContext, Strategy};
use crate::calc::{least_squares_slope, mean};

/// Dual-horizon trend-slope rule
///
/// Slopes are normalized by the window's mean price, giving percent per
/// step, so thresholds are comparable across price levels.
#[derive(Debug, Clone)]
pub struct DualSlope {
    /// Steps of history required before trading (long window minus one)
    pub warmup: usize,
    /// Short regression horizon
    pub short_window: usize,
    /// Entry threshold on the short slope, percent per step
    pub entry_slope: f64,
    /// Exit threshold on the short slope, percent per step
    pub exit_slope: f64,
    /// Pullback threshold for the mean-reversion re-entry
    pub pullback_slope: f64,
    /// Long-slope floor for the mean-reversion re-entry
    pub pullback_long_slope: f64,
}

impl Default for DualSlope {
    fn default() -> Self {
        Self {
            warmup: 50,
            short_window: 20,
            entry_slope: 0.05,
            exit_slope: -0.05,
            pullback_slope: -0.1,
            pullback_long_slope: 0.02,
        }
    }
}

impl DualSlope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for DualSlope {
    fn name(&self) -> &str {
        "Linear Regression"
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Action {
        let i = ctx.step;
        if i < self.warmup {
            return Action::Hold;
        }

        // long horizon spans the full trailing window including today
        let closes = &ctx.prices[i - self.warmup..=i];
        let short = least_squares_slope(&closes[closes.len() - self.short_window..]);
        let long = least_squares_slope(closes);

        let avg_price = mean(closes);
        let short_norm = short / avg_price * 100.0;
        let long_norm = long / avg_price * 100.0;

        if short_norm > self.entry_slope && long_norm > 0.0 && !ctx.has_position {
            Action::Buy
        } else if short_norm < self.exit_slope && long_norm < 0.0 && ctx.has_position {
            Action::Sell
        } else if short_norm < self.pullback_slope
            && long_norm > self.pullback_long_slope
            && !ctx.has_position
        {
            Action::Buy
        } else {
            Action::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(step: usize, prices: &'a [f64], has_position: bool) -> DecisionContext<'a> {
        DecisionContext {
            step,
            prices,
            volumes: &[],
            observation: &[],
            has_position,
        }
    }

    #[test]
    fn test_holds_during_warmup() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let mut strategy = DualSlope::new();
        assert_eq!(strategy.decide(&context(49, &prices, false)), Action::Hold);
    }

    #[test]
    fn test_enters_uptrend() {
        // steady rise of 0.5 per step: short and long slopes both ~0.4%/step
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let mut strategy = DualSlope::new();
        assert_eq!(strategy.decide(&context(55, &prices, false)), Action::Buy);
    }

    #[test]
    fn test_no_reentry_with_open_position() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let mut strategy = DualSlope::new();
        assert_eq!(strategy.decide(&context(55, &prices, true)), Action::Hold);
    }

    #[test]
    fn test_exits_downtrend() {
        let prices: Vec<f64> = (0..60).map(|i| 200.0 - i as f64 * 0.5).collect();
        let mut strategy = DualSlope::new();
        assert_eq!(strategy.decide(&context(55, &prices, true)), Action::Sell);
        // no position, nothing to close and the pullback gate needs a
        // positive long trend
        assert_eq!(strategy.decide(&context(55, &prices, false)), Action::Hold);
    }

    #[test]
    fn test_pullback_reentry_against_long_uptrend() {
        // long rise of 0.5 per step, then a sharp dip over the last 20 steps
        let mut prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let n = prices.len();
        for (k, p) in prices[n - 20..].iter_mut().enumerate() {
            *p = 120.0 - k as f64 * 0.4;
        }
        let mut strategy = DualSlope::new();
        let ctx = context(59, &prices, false);
        assert_eq!(strategy.decide(&ctx), Action::Buy);
    }
}
