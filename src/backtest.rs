//! Backtest driver
//!
//! One simulation loop shared by every strategy: the strategy picks an
//! action per step, the simulator applies the bookkeeping. Strategies never
//! touch capital or positions directly.

use tracing::debug;

use crate::data::MarketData;
use crate::env::{MarketSimulator, Trade};
use crate::strategy::{DecisionContext, Strategy};

/// The value series and trade ledger produced by one simulated run
#[derive(Debug, Clone)]
pub struct Trajectory {
    /// Portfolio value per step, starting at the initial capital
    pub values: Vec<f64>,
    /// Executed trades in order
    pub trades: Vec<Trade>,
}

/// Drive `strategy` through the full historical series once
pub fn run_backtest(
    strategy: &mut dyn Strategy,
    data: &MarketData,
    initial_capital: f64,
) -> Trajectory {
    let mut sim = MarketSimulator::new(data, initial_capital);
    let mut observation = sim.reset();

    loop {
        let ctx = DecisionContext {
            step: sim.step_index(),
            prices: &data.prices,
            volumes: &data.volumes,
            observation: &observation,
            has_position: sim.position() > 0,
        };
        let action = strategy.decide(&ctx);
        let outcome = sim.step(action);
        observation = outcome.observation;
        if outcome.done {
            break;
        }
    }

    debug!(
        strategy = strategy.name(),
        trades = sim.trades().len(),
        final_value = *sim.portfolio_values().last().unwrap_or(&initial_capital),
        "backtest complete"
    );

    Trajectory {
        values: sim.portfolio_values().to_vec(),
        trades: sim.trades().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{Action, MomentumVwap};
    use chrono::NaiveDate;
    use ndarray::Array2;

    /// Buys on the first step, sells a fixed number of steps later
    struct BuyThenSell {
        sell_at: usize,
    }

    impl Strategy for BuyThenSell {
        fn name(&self) -> &str {
            "buy-then-sell"
        }

        fn decide(&mut self, ctx: &DecisionContext<'_>) -> Action {
            if ctx.step == 0 {
                Action::Buy
            } else if ctx.step == self.sell_at {
                Action::Sell
            } else {
                Action::Hold
            }
        }
    }

    fn trending_data(n: usize) -> MarketData {
        MarketData {
            features: Array2::zeros((n, 2)),
            feature_names: vec!["a".into(), "b".into()],
            prices: (0..n).map(|i| 100.0 + i as f64).collect(),
            volumes: vec![1_000.0; n],
            dates: (0..n)
                .map(|i| NaiveDate::from_ymd_opt(2022, 1, 1).unwrap() + chrono::Days::new(i as u64))
                .collect(),
        }
    }

    #[test]
    fn test_series_length_and_start() {
        let data = trending_data(30);
        let mut strategy = BuyThenSell { sell_at: 10 };
        let trajectory = run_backtest(&mut strategy, &data, 100_000.0);
        assert_eq!(trajectory.values.len(), 30);
        assert_eq!(trajectory.values[0], 100_000.0);
        assert_eq!(trajectory.trades.len(), 2);
    }

    #[test]
    fn test_ledger_alternates() {
        let data = trending_data(30);
        let mut strategy = BuyThenSell { sell_at: 5 };
        let trajectory = run_backtest(&mut strategy, &data, 50_000.0);
        for pair in trajectory.trades.chunks(2) {
            assert_eq!(pair[0].side, crate::env::TradeSide::Buy);
            if pair.len() == 2 {
                assert_eq!(pair[1].side, crate::env::TradeSide::Sell);
            }
        }
    }

    #[test]
    fn test_warmup_strategy_stays_flat() {
        // momentum strategy cannot trade before its 30-step window
        let data = trending_data(40);
        let mut strategy = MomentumVwap::new();
        let trajectory = run_backtest(&mut strategy, &data, 100_000.0);
        for value in &trajectory.values[..30] {
            assert_eq!(*value, 100_000.0);
        }
    }

    #[test]
    fn test_profit_on_rising_prices() {
        let data = trending_data(20);
        let mut strategy = BuyThenSell { sell_at: 10 };
        let trajectory = run_backtest(&mut strategy, &data, 100_000.0);
        // bought at 100, sold at 110, 950 shares
        let expected = 100_000.0 + 950.0 * 10.0;
        assert_eq!(*trajectory.values.last().unwrap(), expected);
    }
}
