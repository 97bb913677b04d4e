//! DQN agent
//!
//! Policy and target Q-networks with epsilon-greedy action selection,
//! replay-memory training and Polyak-averaged target updates.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

use crate::config::AgentConfig;
use crate::error::{Result, TraderError};
use crate::strategy::{Action, NUM_ACTIONS};

use super::network::{Adam, QNetwork};
use super::replay::{ReplayMemory, Transition};

/// Gradient-norm ceiling applied before every optimizer step
const MAX_GRAD_NORM: f64 = 1.0;

/// Deep Q-learning agent
pub struct DqnAgent {
    /// Network being optimized
    policy: QNetwork,
    /// Slowly tracking copy used for bootstrap targets
    target: QNetwork,
    /// Optimizer bound to the policy parameters only
    optimizer: Adam,
    memory: ReplayMemory,
    config: AgentConfig,
    epsilon: f64,
    train_steps: usize,
    rng: StdRng,
}

impl DqnAgent {
    /// Create an agent for `state_dim`-wide observations
    ///
    /// The target network starts as an exact copy of the policy network.
    pub fn new(state_dim: usize, config: AgentConfig, mut rng: StdRng) -> Self {
        let policy = QNetwork::new(state_dim, config.dropout, &mut rng);
        let target = policy.clone();
        let optimizer = Adam::new(&policy, config.learning_rate);
        let memory = ReplayMemory::new(config.replay_capacity);
        let epsilon = config.epsilon_start;

        Self {
            policy,
            target,
            optimizer,
            memory,
            config,
            epsilon,
            train_steps: 0,
            rng,
        }
    }

    /// Epsilon-greedy action selection
    ///
    /// During training a uniform draw below epsilon picks a random action;
    /// otherwise, and always in evaluation, the policy's argmax is used.
    pub fn select_action(&mut self, state: &[f64], training: bool) -> Action {
        if training && self.rng.gen::<f64>() < self.epsilon {
            let index = self.rng.gen_range(0..NUM_ACTIONS);
            return Action::from_index(index).unwrap_or(Action::Hold);
        }
        self.greedy_action(state)
    }

    /// Deterministic argmax over the policy's action scores
    pub fn greedy_action(&self, state: &[f64]) -> Action {
        let scores = self.policy.predict(state);
        let index = scores
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        Action::from_index(index).unwrap_or(Action::Hold)
    }

    /// Store a transition in replay memory
    pub fn remember(&mut self, transition: Transition) {
        self.memory.push(transition);
    }

    /// One gradient step over a sampled mini-batch
    ///
    /// Returns 0.0 without updating anything while the memory holds fewer
    /// transitions than the batch size; that is the expected warm-up state.
    pub fn train_step(&mut self) -> f64 {
        let batch_size = self.config.batch_size;
        let Ok(batch) = self.memory.sample(batch_size, &mut self.rng) else {
            return 0.0;
        };

        // Q(s, a) from the policy network, with dropout active
        let (q_values, cache) = self.policy.forward_train(&batch.states, &mut self.rng);

        // bootstrap targets from the frozen target network; terminal
        // transitions receive no bootstrap term
        let next_q = self.target.predict_batch(&batch.next_states);
        let mut targets = vec![0.0; batch_size];
        for i in 0..batch_size {
            let max_next = next_q
                .row(i)
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            targets[i] = if batch.dones[i] {
                batch.rewards[i]
            } else {
                batch.rewards[i] + self.config.gamma * max_next
            };
        }

        // mean-squared error over the taken actions only
        let mut loss = 0.0;
        let mut grad_output = ndarray::Array2::zeros((batch_size, NUM_ACTIONS));
        for i in 0..batch_size {
            let action = batch.actions[i];
            let diff = q_values[[i, action]] - targets[i];
            loss += diff * diff;
            grad_output[[i, action]] = 2.0 * diff / batch_size as f64;
        }
        loss /= batch_size as f64;

        let mut grads = self.policy.backward(&cache, &grad_output);
        grads.clip_norm(MAX_GRAD_NORM);
        self.optimizer.step(&mut self.policy, &grads);

        self.target.soft_update(&self.policy, self.config.tau);
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        self.train_steps += 1;

        loss
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of gradient steps taken
    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    /// Stored transitions
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Squared parameter distance between target and policy networks
    pub fn target_distance(&self) -> f64 {
        self.target.parameter_distance(&self.policy)
    }

    /// Save policy and target parameters to a JSON checkpoint
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let checkpoint = Checkpoint {
            policy: self.policy.clone(),
            target: self.target.clone(),
            config: self.config.clone(),
            epsilon: self.epsilon,
            train_steps: self.train_steps,
        };
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer(file, &checkpoint)?;
        Ok(())
    }

    /// Restore an agent from a JSON checkpoint with a fresh replay memory
    pub fn load<P: AsRef<Path>>(path: P, rng: StdRng) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref()).map_err(|e| {
            TraderError::Checkpoint(format!("{}: {e}", path.as_ref().display()))
        })?;
        let checkpoint: Checkpoint = serde_json::from_reader(file)?;

        let optimizer = Adam::new(&checkpoint.policy, checkpoint.config.learning_rate);
        let memory = ReplayMemory::new(checkpoint.config.replay_capacity);

        Ok(Self {
            policy: checkpoint.policy,
            target: checkpoint.target,
            optimizer,
            memory,
            epsilon: checkpoint.epsilon,
            train_steps: checkpoint.train_steps,
            config: checkpoint.config,
            rng,
        })
    }
}

/// Serialized agent state
#[derive(Serialize, Deserialize)]
struct Checkpoint {
    policy: QNetwork,
    target: QNetwork,
    config: AgentConfig,
    epsilon: f64,
    train_steps: usize,
}
