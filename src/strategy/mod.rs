//! Trading strategies
//!
//! One `Strategy` trait with three variants: the learned DQN policy, a
//! VWAP-deviation momentum rule and a dual-horizon regression-slope rule.
//! All three share the simulator's bookkeeping; only the decision differs.

mod learned;
mod momentum;
mod regression;

pub use learned::LearnedPolicy;
pub use momentum::MomentumVwap;
pub use regression::DualSlope;

use serde::{Deserialize, Serialize};

/// Number of discrete actions
pub const NUM_ACTIONS: usize = 3;

/// Discrete action space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// Do nothing
    Hold = 0,
    /// Open a long position with 95% of capital
    Buy = 1,
    /// Close the open position
    Sell = 2,
}

impl Action {
    /// Convert from action index
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Hold),
            1 => Some(Self::Buy),
            2 => Some(Self::Sell),
            _ => None,
        }
    }

    /// Convert to action index
    pub fn to_index(self) -> usize {
        self as usize
    }

    /// All actions in index order
    pub fn all() -> &'static [Action] {
        &[Self::Hold, Self::Buy, Self::Sell]
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::Hold
    }
}

/// Everything a strategy may look at when deciding the next action
///
/// Slices cover the whole series; strategies read trailing windows ending
/// at `step` and must not look ahead of it.
pub struct DecisionContext<'a> {
    /// Current step index
    pub step: usize,
    /// Full price series
    pub prices: &'a [f64],
    /// Full volume series
    pub volumes: &'a [f64],
    /// Normalized feature row for the current step
    pub observation: &'a [f64],
    /// Whether a long position is currently open
    pub has_position: bool,
}

/// A decision rule driven through the shared simulation loop
pub trait Strategy {
    /// Strategy label used in reports
    fn name(&self) -> &str;

    /// Choose the action for the current step
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Action;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_roundtrip() {
        for action in Action::all() {
            assert_eq!(Action::from_index(action.to_index()), Some(*action));
        }
        assert_eq!(Action::from_index(3), None);
    }
}
