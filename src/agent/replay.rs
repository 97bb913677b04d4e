//! Replay memory
//!
//! Fixed-capacity experience store for off-policy learning. Implemented as
//! an arena with a wrapping write cursor: once full, each push overwrites
//! the oldest slot, so the length never exceeds the configured capacity.

use ndarray::Array2;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraderError};
use crate::strategy::Action;

/// A single transition in the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    /// State features before the action
    pub state: Vec<f64>,
    /// Action taken
    pub action: Action,
    /// Reward received
    pub reward: f64,
    /// State features after the action
    pub next_state: Vec<f64>,
    /// Whether the episode terminated
    pub done: bool,
}

impl Transition {
    /// Create a new transition
    pub fn new(state: Vec<f64>, action: Action, reward: f64, next_state: Vec<f64>, done: bool) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// A sampled mini-batch decomposed into parallel arrays
#[derive(Debug, Clone)]
pub struct TransitionBatch {
    /// States stacked row-wise, `[batch, state_dim]`
    pub states: Array2<f64>,
    /// Action index per sample
    pub actions: Vec<usize>,
    /// Reward per sample
    pub rewards: Vec<f64>,
    /// Next states stacked row-wise
    pub next_states: Array2<f64>,
    /// Terminal flag per sample
    pub dones: Vec<bool>,
}

/// Ring-buffer replay memory with uniform random sampling
#[derive(Debug)]
pub struct ReplayMemory {
    slots: Vec<Transition>,
    capacity: usize,
    cursor: usize,
}

impl ReplayMemory {
    /// Create a memory holding at most `capacity` transitions
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// Append a transition, evicting the oldest when full
    pub fn push(&mut self, transition: Transition) {
        if self.slots.len() < self.capacity {
            self.slots.push(transition);
        } else {
            self.slots[self.cursor] = transition;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// Current number of stored transitions
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the memory holds no transitions
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sample `batch_size` transitions uniformly without replacement
    ///
    /// Fails when fewer than `batch_size` transitions are stored; the
    /// learner guards on `len()` and skips the update instead of erroring.
    pub fn sample(&self, batch_size: usize, rng: &mut StdRng) -> Result<TransitionBatch> {
        if self.slots.len() < batch_size {
            return Err(TraderError::InsufficientSamples {
                have: self.slots.len(),
                need: batch_size,
            });
        }

        let indices = rand::seq::index::sample(rng, self.slots.len(), batch_size);
        let state_dim = self.slots[0].state.len();

        let mut states = Array2::zeros((batch_size, state_dim));
        let mut next_states = Array2::zeros((batch_size, state_dim));
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Vec::with_capacity(batch_size);
        let mut dones = Vec::with_capacity(batch_size);

        for (row, idx) in indices.into_iter().enumerate() {
            let t = &self.slots[idx];
            for (col, &v) in t.state.iter().enumerate() {
                states[[row, col]] = v;
            }
            for (col, &v) in t.next_state.iter().enumerate() {
                next_states[[row, col]] = v;
            }
            actions.push(t.action.to_index());
            rewards.push(t.reward);
            dones.push(t.done);
        }

        Ok(TransitionBatch {
            states,
            actions,
            rewards,
            next_states,
            dones,
        })
    }
}
