// src/main.rs
//
// Research-harness CLI entrypoint for mathesis.
//
// Drives the learning engine with a deterministic synthetic experience
// stream:
// - --experiences count, --strategy selection, --seed for the stream RNG
//   and the engine RNG,
// - concise run header on stderr,
// - final analytics snapshot as pretty JSON on stdout.

use clap::{ArgAction, Parser, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use mathesis::config::LearningConfig;
use mathesis::engine::LearningEngine;
use mathesis::types::{Context, ExperienceInput, Outcome, StrategyKind};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum StrategyArg {
    Gradient,
    Bayesian,
}

#[derive(Debug, Parser)]
#[command(
    name = "mathesis",
    about = "mathesis online learning engine (research harness)",
    version
)]
struct Args {
    /// Number of synthetic experiences to run.
    #[arg(long, default_value_t = 500)]
    experiences: u64,

    /// Active strategy for the run (default gradient).
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Deterministic seed for the synthetic stream and the engine RNG.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Gradient base learning rate.
    #[arg(long, default_value_t = 0.01)]
    learning_rate: f64,

    /// Verbosity: -v prints per-experience reports.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

const ACTIONS: [&str; 4] = ["expand", "hold", "rebalance", "retreat"];

fn main() {
    let args = Args::parse();

    let strategy = match args.strategy.unwrap_or(StrategyArg::Gradient) {
        StrategyArg::Gradient => StrategyKind::Gradient,
        StrategyArg::Bayesian => StrategyKind::Bayesian,
    };

    let mut cfg = LearningConfig::with_learning_rate(args.learning_rate);
    cfg.engine.seed = args.seed;
    cfg.engine.initial_strategy = strategy;

    eprintln!(
        "mathesis run: experiences={} strategy={} seed={} cfg_version={}",
        args.experiences,
        strategy.as_str(),
        args.seed,
        cfg.version
    );

    let mut engine = LearningEngine::new(cfg);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    // Synthetic timebase: deterministic, seed-offset, one second per
    // experience.
    let t0: i64 = 1_700_000_000_000 + (args.seed as i64) * 1_000;

    let mut performance = 0.5_f64;
    let mut failures = 0u64;

    for i in 0..args.experiences {
        // Drifting performance signal with bounded noise.
        performance = (performance + rng.gen_range(-0.05..=0.05)).clamp(0.0, 1.0);
        let reward = performance * 2.0 - 1.0;
        let action = ACTIONS[rng.gen_range(0..ACTIONS.len())];

        let mut context = Context::default();
        context
            .parameters
            .insert("learning_rate".to_string(), 0.001 + performance * 0.05);
        context
            .parameters
            .insert("confidence_threshold".to_string(), 0.5 + performance * 0.4);

        let mut outcome = Outcome::default();
        outcome.performance = Some(performance);
        outcome
            .gradients
            .insert("learning_rate".to_string(), rng.gen_range(-1.0..=1.0));
        outcome.episode_done = (i + 1) % 50 == 0;

        let input = ExperienceInput {
            timestamp: Some(t0 + i as i64 * 1_000),
            context,
            action_taken: action.to_string(),
            outcome,
            reward,
            confidence: Some(0.4 + performance * 0.5),
            ..Default::default()
        };

        match engine.process_experience(input) {
            Ok(report) => {
                if args.verbose > 0 {
                    eprintln!(
                        "iter={} improvement={:+.4} policy_strength={:.4}",
                        report.learning_iteration,
                        report.performance_improvement,
                        report.rl_policy_strength
                    );
                }
            }
            Err(err) => {
                failures += 1;
                eprintln!("experience failed: {}", err);
            }
        }
    }

    if failures > 0 {
        eprintln!("failures={}", failures);
    }

    if args.verbose > 1 {
        let proposal = engine.propose_parameters();
        eprintln!("next proposal: {:?}", proposal);
    }

    let analytics = engine.analytics();
    match serde_json::to_string_pretty(&analytics) {
        Ok(s) => println!("{}", s),
        Err(err) => eprintln!("analytics serialization failed: {}", err),
    }
}
