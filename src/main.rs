use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dqn_trader::agent::DqnAgent;
use dqn_trader::analytics::{compute_metrics, compute_yearly, sample_equity_curve};
use dqn_trader::backtest::run_backtest;
use dqn_trader::config::AppConfig;
use dqn_trader::data::{load_candles, MarketData};
use dqn_trader::features;
use dqn_trader::report::{BacktestReport, TrainingInfo};
use dqn_trader::strategy::{DualSlope, LearnedPolicy, MomentumVwap, Strategy};
use dqn_trader::training::train_agent;

#[derive(Parser)]
#[command(name = "dqn-trader", about = "DQN trading backtester", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the agent, then benchmark all strategies
    Run {
        /// CSV file of daily candles (date,open,high,low,close,volume)
        #[arg(long)]
        data: PathBuf,
        /// Optional TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the configured episode count
        #[arg(long)]
        episodes: Option<usize>,
        /// Override the configured random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Where to write the JSON report
        #[arg(long, default_value = "backtest.json")]
        out: PathBuf,
        /// Save the trained policy checkpoint here
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },
    /// Replay a saved policy through the simulator without training
    Backtest {
        /// CSV file of daily candles
        #[arg(long)]
        data: PathBuf,
        /// Trained policy checkpoint
        #[arg(long)]
        checkpoint: PathBuf,
        /// Optional TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Where to write the JSON report
        #[arg(long, default_value = "backtest.json")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            config,
            episodes,
            seed,
            out,
            checkpoint,
        } => run_pipeline(data, config, episodes, seed, out, checkpoint),
        Commands::Backtest {
            data,
            checkpoint,
            config,
            out,
        } => replay_checkpoint(data, checkpoint, config, out),
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn load_market_data(path: &PathBuf) -> anyhow::Result<MarketData> {
    let candles = load_candles(path)?;
    info!("loaded {} candles from {}", candles.len(), path.display());
    let market = features::engineer(&candles)?;
    info!(
        "engineered {} features over {} trading days",
        market.feature_dim(),
        market.len()
    );
    Ok(market)
}

fn run_pipeline(
    data: PathBuf,
    config: Option<PathBuf>,
    episodes: Option<usize>,
    seed: Option<u64>,
    out: PathBuf,
    checkpoint: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut cfg = AppConfig::load(config.as_deref())?;
    if let Some(episodes) = episodes {
        cfg.training.episodes = episodes;
    }
    if let Some(seed) = seed {
        cfg.training.seed = seed;
    }

    let market = load_market_data(&data)?;
    let initial_capital = cfg.backtest.initial_capital;

    info!(
        "training DQN agent for {} episodes over {} steps",
        cfg.training.episodes,
        market.len()
    );
    let rng = StdRng::seed_from_u64(cfg.training.seed);
    let mut agent = DqnAgent::new(market.feature_dim(), cfg.agent.clone(), rng);
    train_agent(&mut agent, &market, &cfg.training, initial_capital);

    if let Some(path) = &checkpoint {
        agent.save(path)?;
        info!("checkpoint saved to {}", path.display());
    }

    let report = benchmark_all(agent, &market, initial_capital, cfg.training.episodes);
    report.write_json(&out)?;
    info!("report written to {}", out.display());
    Ok(())
}

fn replay_checkpoint(
    data: PathBuf,
    checkpoint: PathBuf,
    config: Option<PathBuf>,
    out: PathBuf,
) -> anyhow::Result<()> {
    let cfg = AppConfig::load(config.as_deref())?;
    let market = load_market_data(&data)?;

    let rng = StdRng::seed_from_u64(cfg.training.seed);
    let agent = DqnAgent::load(&checkpoint, rng)?;
    info!("loaded checkpoint from {}", checkpoint.display());

    let report = benchmark_all(agent, &market, cfg.backtest.initial_capital, 0);
    report.write_json(&out)?;
    info!("report written to {}", out.display());
    Ok(())
}

/// Run the learned policy and both rule-based strategies, then assemble the
/// full report
fn benchmark_all(
    agent: DqnAgent,
    market: &MarketData,
    initial_capital: f64,
    episodes: usize,
) -> BacktestReport {
    let mut learned = LearnedPolicy::new(agent);
    let mut momentum = MomentumVwap::new();
    let mut regression = DualSlope::new();

    let mut yearly = Vec::new();
    let mut equity_curves = BTreeMap::new();
    let mut strategy_metrics = BTreeMap::new();
    let mut summary = None;

    let drivers: [(&str, &mut dyn Strategy); 3] = [
        ("dqn", &mut learned),
        ("momentum", &mut momentum),
        ("regression", &mut regression),
    ];

    for (key, strategy) in drivers {
        let name = strategy.name().to_string();
        let trajectory = run_backtest(strategy, market, initial_capital);
        let metrics = compute_metrics(&trajectory.values, &trajectory.trades);
        info!(
            "{name}: {:+.1}% return, {:.0}% win rate, Sharpe {:.2}",
            metrics.total_return, metrics.win_rate, metrics.sharpe_ratio
        );

        yearly.extend(compute_yearly(
            &trajectory.values,
            &trajectory.trades,
            &market.dates,
            &name,
        ));
        equity_curves.insert(
            key.to_string(),
            sample_equity_curve(&trajectory.values, &market.dates, initial_capital),
        );
        if key == "dqn" {
            summary = Some(metrics.clone());
        }
        strategy_metrics.insert(key.to_string(), metrics);
    }

    BacktestReport {
        summary: summary.unwrap_or_else(|| strategy_metrics["dqn"].clone()),
        training: TrainingInfo {
            episodes,
            features: market.feature_names.clone(),
            data_points: market.len(),
            trained_at: chrono::Utc::now().to_rfc3339(),
        },
        yearly,
        equity_curves,
        strategy_metrics,
    }
}
