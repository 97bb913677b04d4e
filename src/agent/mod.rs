//! Q-learning agent
//!
//! Replay memory, the feed-forward Q-network and the DQN agent that ties
//! them together.

mod dqn;
mod network;
mod replay;

pub use dqn::DqnAgent;
pub use network::{Adam, QNetwork, HIDDEN_DIMS};
pub use replay::{ReplayMemory, Transition, TransitionBatch};
