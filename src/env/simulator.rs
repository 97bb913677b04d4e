//! Market simulator
//!
//! A gym-like step/reset environment over a historical daily series. One
//! long position at a time, no shorting; buys are sized to 95% of available
//! cash so rounding can never spend more than the capital on hand.

use serde::{Deserialize, Serialize};

use crate::data::MarketData;
use crate::strategy::Action;

/// Fraction of capital deployed on a buy
const BUY_SIZING: f64 = 0.95;

/// Side of an executed trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// One executed trade in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: TradeSide,
    /// Step index at execution time
    pub step: usize,
    /// Execution price
    pub price: f64,
}

/// Result of taking a step in the environment
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Observation after the step
    pub observation: Vec<f64>,
    /// Percentage change of portfolio value over this step
    pub reward: f64,
    /// Whether the series is exhausted
    pub done: bool,
}

/// Deterministic single-asset trading environment
///
/// Holds the portfolio state for one trajectory: cash, share count, the
/// append-only trade ledger and the per-step portfolio value series.
pub struct MarketSimulator<'a> {
    data: &'a MarketData,
    initial_capital: f64,
    step_idx: usize,
    capital: f64,
    position: u64,
    portfolio_values: Vec<f64>,
    trades: Vec<Trade>,
}

impl<'a> MarketSimulator<'a> {
    /// Create a simulator over validated market data
    pub fn new(data: &'a MarketData, initial_capital: f64) -> Self {
        let mut sim = Self {
            data,
            initial_capital,
            step_idx: 0,
            capital: initial_capital,
            position: 0,
            portfolio_values: Vec::with_capacity(data.len()),
            trades: Vec::new(),
        };
        sim.reset();
        sim
    }

    /// Restore the starting state and return the first observation
    ///
    /// Callable repeatedly; every episode starts from an identical state.
    pub fn reset(&mut self) -> Vec<f64> {
        self.step_idx = 0;
        self.capital = self.initial_capital;
        self.position = 0;
        self.portfolio_values.clear();
        self.portfolio_values.push(self.initial_capital);
        self.trades.clear();
        self.data.observation(0)
    }

    /// Advance one time step under `action`
    ///
    /// A BUY with an open position or a SELL with none executes nothing;
    /// only the step counter moves.
    pub fn step(&mut self, action: Action) -> StepOutcome {
        let price = self.data.prices[self.step_idx];

        match action {
            Action::Buy if self.position == 0 => {
                let shares = (self.capital * BUY_SIZING / price).floor() as u64;
                if shares > 0 {
                    self.position = shares;
                    self.capital -= shares as f64 * price;
                    self.trades.push(Trade {
                        side: TradeSide::Buy,
                        step: self.step_idx,
                        price,
                    });
                }
            }
            Action::Sell if self.position > 0 => {
                self.capital += self.position as f64 * price;
                self.trades.push(Trade {
                    side: TradeSide::Sell,
                    step: self.step_idx,
                    price,
                });
                self.position = 0;
            }
            _ => {}
        }

        let value = self.capital + self.position as f64 * price;
        let prev_value = *self
            .portfolio_values
            .last()
            .unwrap_or(&self.initial_capital);
        let reward = (value - prev_value) / prev_value * 100.0;
        self.portfolio_values.push(value);

        self.step_idx += 1;
        let last = self.data.len() - 1;
        let done = self.step_idx >= last;
        let observation = self.data.observation(self.step_idx.min(last));

        StepOutcome {
            observation,
            reward,
            done,
        }
    }

    /// Current step index
    pub fn step_index(&self) -> usize {
        self.step_idx
    }

    /// Cash on hand
    pub fn capital(&self) -> f64 {
        self.capital
    }

    /// Shares held
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Portfolio value per recorded step, starting at the initial capital
    pub fn portfolio_values(&self) -> &[f64] {
        &self.portfolio_values
    }

    /// Executed trades in order
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }
}
