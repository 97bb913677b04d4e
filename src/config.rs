//! Configuration
//!
//! Configuration structs for the simulator, agent and training loop.
//! Values come from a TOML file plus `DQN_TRADER__*` environment overrides;
//! every field has a default so an empty configuration is runnable.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backtest and simulation settings
    pub backtest: BacktestConfig,
    /// Agent hyperparameters
    pub agent: AgentConfig,
    /// Training loop settings
    pub training: TrainingConfig,
}

impl AppConfig {
    /// Load configuration from an optional TOML file with environment
    /// variable overrides (`DQN_TRADER__AGENT__GAMMA=0.95` style)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let cfg = builder
            .add_source(Environment::with_prefix("DQN_TRADER").separator("__"))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}

/// Simulation settings shared by all strategy drivers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting cash for every simulated trajectory
    pub initial_capital: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
        }
    }
}

/// DQN agent hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Optimizer learning rate
    pub learning_rate: f64,
    /// Discount factor (gamma)
    pub gamma: f64,
    /// Soft-update rate for the target network (tau)
    pub tau: f64,
    /// Initial exploration rate
    pub epsilon_start: f64,
    /// Exploration floor
    pub epsilon_min: f64,
    /// Multiplicative exploration decay per gradient step
    pub epsilon_decay: f64,
    /// Mini-batch size sampled from replay memory
    pub batch_size: usize,
    /// Replay memory capacity
    pub replay_capacity: usize,
    /// Dropout rate between the first two hidden layers
    pub dropout: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            gamma: 0.99,
            tau: 0.005,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            batch_size: 64,
            replay_capacity: 10_000,
            dropout: 0.1,
        }
    }
}

/// Training loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of training episodes
    pub episodes: usize,
    /// Seed for the agent's random source
    pub seed: u64,
    /// Log progress every N episodes
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 50,
            seed: 42,
            log_every: 10,
        }
    }
}
