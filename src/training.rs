//! Training loop
//!
//! Runs the agent through repeated episodes over the same historical
//! series, feeding transitions into replay memory and taking one gradient
//! step per environment step.

use tracing::info;

use crate::agent::{DqnAgent, Transition};
use crate::config::TrainingConfig;
use crate::data::MarketData;
use crate::env::MarketSimulator;

/// Per-episode training statistics
#[derive(Debug, Clone)]
pub struct EpisodeSummary {
    /// Episode number, starting at 1
    pub episode: usize,
    /// Sum of step rewards
    pub total_reward: f64,
    /// Mean gradient-step loss over the episode
    pub mean_loss: f64,
    /// Portfolio value at the end of the episode
    pub final_value: f64,
    /// Episode return over the initial capital, percent
    pub return_pct: f64,
    /// Exploration rate after the episode
    pub epsilon: f64,
    /// Steps taken
    pub steps: usize,
}

/// Train `agent` for the configured number of episodes
pub fn train_agent(
    agent: &mut DqnAgent,
    data: &MarketData,
    config: &TrainingConfig,
    initial_capital: f64,
) -> Vec<EpisodeSummary> {
    let mut env = MarketSimulator::new(data, initial_capital);
    let mut summaries = Vec::with_capacity(config.episodes);

    for episode in 0..config.episodes {
        let mut state = env.reset();
        let mut total_reward = 0.0;
        let mut total_loss = 0.0;
        let mut steps = 0usize;

        loop {
            let action = agent.select_action(&state, true);
            let outcome = env.step(action);

            agent.remember(Transition::new(
                state,
                action,
                outcome.reward,
                outcome.observation.clone(),
                outcome.done,
            ));
            total_loss += agent.train_step();
            total_reward += outcome.reward;
            steps += 1;

            state = outcome.observation;
            if outcome.done {
                break;
            }
        }

        let final_value = *env
            .portfolio_values()
            .last()
            .unwrap_or(&initial_capital);
        let summary = EpisodeSummary {
            episode: episode + 1,
            total_reward,
            mean_loss: total_loss / steps as f64,
            final_value,
            return_pct: (final_value / initial_capital - 1.0) * 100.0,
            epsilon: agent.epsilon(),
            steps,
        };

        if (episode + 1) % config.log_every == 0 {
            info!(
                "episode {}/{} | return {:+.1}% | epsilon {:.3} | loss {:.4}",
                summary.episode,
                config.episodes,
                summary.return_pct,
                summary.epsilon,
                summary.mean_loss
            );
        }

        summaries.push(summary);
    }

    summaries
}
