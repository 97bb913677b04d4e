//! DQN trading backtester
//!
//! Simulates single-asset, long-only trading over a historical daily
//! series, trains a DQN policy to choose among Hold/Buy/Sell, and
//! benchmarks it against two deterministic rule-based strategies. Every
//! trajectory is reduced to summary metrics, a yearly breakdown and a
//! sampled equity curve.
//!
//! # Components
//!
//! - **Environment**: deterministic step/reset market simulator with
//!   capital and position bookkeeping
//! - **Agent**: replay memory, feed-forward Q-network, epsilon-greedy
//!   exploration and Polyak target updates
//! - **Strategies**: the learned policy plus VWAP-momentum and
//!   regression-slope rules behind one `Strategy` trait
//! - **Analytics**: return, win rate, Sharpe, drawdown and profit factor,
//!   overall and per calendar year

pub mod agent;
pub mod analytics;
pub mod backtest;
pub mod calc;
pub mod config;
pub mod data;
pub mod env;
pub mod error;
pub mod features;
pub mod report;
pub mod strategy;
pub mod training;

pub use agent::{DqnAgent, ReplayMemory, Transition};
pub use analytics::{compute_metrics, compute_yearly, StrategyMetrics, YearlyRecord};
pub use backtest::{run_backtest, Trajectory};
pub use config::AppConfig;
pub use data::{load_candles, Candle, MarketData};
pub use env::{MarketSimulator, Trade, TradeSide};
pub use error::{Result, TraderError};
pub use report::BacktestReport;
pub use strategy::{Action, DualSlope, LearnedPolicy, MomentumVwap, Strategy};
pub use training::train_agent;
