//! Learned policy strategy
//!
//! Wraps a trained agent so it can be driven through the same simulation
//! loop as the rule-based strategies. Exploration is disabled; every
//! decision is the policy network's argmax over the current observation.

use super::{Action, DecisionContext, Strategy};
use crate::agent::DqnAgent;

/// Greedy replay of a trained DQN policy
pub struct LearnedPolicy {
    agent: DqnAgent,
}

impl LearnedPolicy {
    /// Take ownership of a trained agent for evaluation
    pub fn new(agent: DqnAgent) -> Self {
        Self { agent }
    }

    /// Give the agent back, e.g. for checkpointing after evaluation
    pub fn into_agent(self) -> DqnAgent {
        self.agent
    }
}

impl Strategy for LearnedPolicy {
    fn name(&self) -> &str {
        "DQN Agent"
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Action {
        self.agent.greedy_action(ctx.observation)
    }
}
