//! Momentum strategy
//!
//! Buys short-term dips below the trailing VWAP that come with rising ticks
//! and above-average volume; exits once price stretches above VWAP or the
//! tick momentum turns negative.

use super::{Action, DecisionContext, Strategy};
use crate::calc::mean;

/// Guard added to denominators that can reach zero
const DIV_EPS: f64 = 1e-10;

/// VWAP-deviation momentum rule
#[derive(Debug, Clone)]
pub struct MomentumVwap {
    /// Trailing window for VWAP and volume statistics
    pub window: usize,
    /// Window for the tick-momentum sum
    pub momentum_window: usize,
    /// Entry threshold on VWAP deviation, in percent
    pub entry_deviation: f64,
    /// Exit threshold on VWAP deviation, in percent
    pub exit_deviation: f64,
    /// Minimum volume ratio required to enter
    pub min_volume_ratio: f64,
}

impl Default for MomentumVwap {
    fn default() -> Self {
        Self {
            window: 30,
            momentum_window: 10,
            entry_deviation: -0.2,
            exit_deviation: 0.2,
            min_volume_ratio: 1.2,
        }
    }
}

impl MomentumVwap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for MomentumVwap {
    fn name(&self) -> &str {
        "HFT Momentum"
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Action {
        let i = ctx.step;
        if i < self.window {
            return Action::Hold;
        }

        let window_prices = &ctx.prices[i - self.window..i];
        let window_volumes = &ctx.volumes[i - self.window..i];

        let traded: f64 = window_prices
            .iter()
            .zip(window_volumes.iter())
            .map(|(p, v)| p * v)
            .sum();
        let vwap = traded / (window_volumes.iter().sum::<f64>() + DIV_EPS);
        let deviation = (ctx.prices[i] - vwap) / vwap * 100.0;

        let avg_volume = mean(&ctx.volumes[i - self.window..i - 1]);
        let volume_ratio = ctx.volumes[i] / (avg_volume + DIV_EPS);

        // sum of first differences over the trailing tick window
        let tick_momentum: f64 = ctx.prices[i - self.momentum_window..=i]
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .sum();

        if deviation < self.entry_deviation
            && tick_momentum > 0.0
            && volume_ratio > self.min_volume_ratio
            && !ctx.has_position
        {
            Action::Buy
        } else if (deviation > self.exit_deviation || tick_momentum < 0.0) && ctx.has_position {
            Action::Sell
        } else {
            Action::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(
        step: usize,
        prices: &'a [f64],
        volumes: &'a [f64],
        has_position: bool,
        observation: &'a [f64],
    ) -> DecisionContext<'a> {
        DecisionContext {
            step,
            prices,
            volumes,
            observation,
            has_position,
        }
    }

    /// Prices well above the current level early in the window pull VWAP up,
    /// while the last ten ticks rise, so deviation < -0.2 and momentum > 0.
    fn dip_with_momentum() -> (Vec<f64>, Vec<f64>) {
        let mut prices = vec![105.0; 41];
        for (k, p) in prices[30..40].iter_mut().enumerate() {
            *p = 99.0 + k as f64 * 0.1;
        }
        prices[40] = 100.0;
        let mut volumes = vec![1_000.0; 41];
        volumes[40] = 2_000.0;
        (prices, volumes)
    }

    #[test]
    fn test_holds_during_warmup() {
        let prices = vec![100.0; 40];
        let volumes = vec![1_000.0; 40];
        let mut strategy = MomentumVwap::new();
        let ctx = context(29, &prices, &volumes, false, &[]);
        assert_eq!(strategy.decide(&ctx), Action::Hold);
    }

    #[test]
    fn test_enters_on_dip_with_momentum_and_volume() {
        let (prices, volumes) = dip_with_momentum();
        let mut strategy = MomentumVwap::new();
        let ctx = context(40, &prices, &volumes, false, &[]);
        assert_eq!(strategy.decide(&ctx), Action::Buy);
    }

    #[test]
    fn test_no_entry_while_position_open() {
        let (prices, volumes) = dip_with_momentum();
        let mut strategy = MomentumVwap::new();
        // same signal, but the position is already open and momentum is
        // positive with deviation negative, so nothing triggers
        let ctx = context(40, &prices, &volumes, true, &[]);
        assert_eq!(strategy.decide(&ctx), Action::Hold);
    }

    #[test]
    fn test_exits_on_positive_deviation() {
        // flat cheap window, current price stretched far above VWAP
        let mut prices = vec![95.0; 41];
        for (k, p) in prices[30..40].iter_mut().enumerate() {
            *p = 99.0 + k as f64 * 0.1;
        }
        prices[40] = 100.0;
        let volumes = vec![1_000.0; 41];
        let mut strategy = MomentumVwap::new();
        let ctx = context(40, &prices, &volumes, true, &[]);
        assert_eq!(strategy.decide(&ctx), Action::Sell);
    }

    #[test]
    fn test_exits_on_negative_momentum() {
        let mut prices = vec![100.0; 41];
        // falling ticks
        for (k, p) in prices[30..=40].iter_mut().enumerate() {
            *p = 101.0 - k as f64 * 0.2;
        }
        let volumes = vec![1_000.0; 41];
        let mut strategy = MomentumVwap::new();
        let ctx = context(40, &prices, &volumes, true, &[]);
        assert_eq!(strategy.decide(&ctx), Action::Sell);
    }

    #[test]
    fn test_low_volume_blocks_entry() {
        let (prices, mut volumes) = dip_with_momentum();
        volumes[40] = 1_000.0; // ratio ~1.0, below the 1.2 gate
        let mut strategy = MomentumVwap::new();
        let ctx = context(40, &prices, &volumes, false, &[]);
        assert_eq!(strategy.decide(&ctx), Action::Hold);
    }
}
