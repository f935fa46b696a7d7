// src/config.rs
//
// Central configuration for the mathesis learning engine.
// Single source of truth for the gradient strategy, the Bayesian
// parameter space, the tabular RL agent, and the engine's bounded
// history / analytics windows.

use std::collections::BTreeMap;

use crate::types::StrategyKind;

/// Human-readable config / release version.
pub const CONFIG_VERSION: &str = "mathesis-0.1";

/// Aggregate configuration.
///
/// Construct via `Default` and override fields, or use
/// [`LearningConfig::with_learning_rate`] to seed the gradient base rate
/// (the one construction knob of the service contract).
#[derive(Debug, Clone)]
pub struct LearningConfig {
    /// Human-readable config / release version.
    pub version: &'static str,
    /// Gradient strategy (momentum + adaptive learning rate).
    pub gradient: GradientConfig,
    /// Bayesian strategy (bounded parameter space search).
    pub bayesian: BayesianConfig,
    /// Tabular Q-learning agent.
    pub rl: RlAgentConfig,
    /// Orchestrator: history, analytics window, strategy selection, seed.
    pub engine: EngineConfig,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            gradient: GradientConfig::default(),
            bayesian: BayesianConfig::default(),
            rl: RlAgentConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl LearningConfig {
    /// Default config with the gradient base learning rate overridden.
    ///
    /// Non-finite or non-positive rates keep the default (malformed
    /// configuration defaults rather than fails).
    pub fn with_learning_rate(learning_rate: f64) -> Self {
        let mut cfg = Self::default();
        if learning_rate.is_finite() && learning_rate > 0.0 {
            cfg.gradient.base_learning_rate = learning_rate;
        }
        cfg
    }
}

/// Momentum gradient strategy configuration.
#[derive(Debug, Clone)]
pub struct GradientConfig {
    /// Seed learning rate. The adaptive rate never exceeds 2x this.
    pub base_learning_rate: f64,
    /// Momentum coefficient in [0, 1].
    pub momentum: f64,
    /// Multiplicative step-up applied when performance improves (> 1).
    pub adaptive_factor: f64,
    /// Multiplicative decay applied otherwise, in (0, 1).
    pub decay_factor: f64,
    /// Rolling performance window length.
    pub performance_window: usize,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            base_learning_rate: 0.01,
            momentum: 0.9,
            adaptive_factor: 1.1,
            decay_factor: 0.95,
            performance_window: 50,
        }
    }
}

/// Bayesian strategy configuration.
#[derive(Debug, Clone)]
pub struct BayesianConfig {
    /// Bounded search space: name -> (min, max).
    ///
    /// Declared at construction and immutable thereafter; proposals only
    /// ever contain names from this space.
    pub parameter_space: BTreeMap<String, (f64, f64)>,
    /// Below this many observations, proposals sample uniformly (cold
    /// start / pure exploration).
    pub cold_start_min_observations: usize,
    /// Gaussian proposal noise as a fraction of each parameter's range.
    pub perturbation_frac: f64,
}

impl Default for BayesianConfig {
    fn default() -> Self {
        let mut parameter_space = BTreeMap::new();
        parameter_space.insert("learning_rate".to_string(), (0.001, 0.1));
        parameter_space.insert("confidence_threshold".to_string(), (0.5, 0.95));
        Self {
            parameter_space,
            cold_start_min_observations: 3,
            perturbation_frac: 0.1,
        }
    }
}

/// Tabular Q-learning agent configuration.
#[derive(Debug, Clone)]
pub struct RlAgentConfig {
    /// Number of discretized state rows. Contexts hash into this range;
    /// different contexts may alias to the same row.
    pub state_space_size: usize,
    /// Number of action columns. Action labels hash into this range.
    pub action_space_size: usize,
    /// TD step size.
    pub learning_rate: f64,
    /// Discount factor. Convergence guarantees need [0, 1); not enforced
    /// here (caller responsibility).
    pub discount_factor: f64,
    /// Initial exploration rate in [0, 1].
    pub epsilon: f64,
    /// Per-update epsilon decay in (0, 1).
    pub epsilon_decay: f64,
    /// Epsilon never decays below this.
    pub epsilon_floor: f64,
    /// Transition ring-buffer capacity.
    pub buffer_capacity: usize,
}

impl Default for RlAgentConfig {
    fn default() -> Self {
        Self {
            state_space_size: 1000,
            action_space_size: 10,
            learning_rate: 0.1,
            discount_factor: 0.95,
            epsilon: 0.1,
            epsilon_decay: 0.995,
            epsilon_floor: 0.01,
            buffer_capacity: 10_000,
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bounded experience history capacity (oldest evicted past this).
    pub history_capacity: usize,
    /// Analytics are computed over this many most-recent experiences.
    pub analytics_window: usize,
    /// Strategy active at construction.
    pub initial_strategy: StrategyKind,
    /// Seed for the engine RNG (exploration + proposals). Same seed and
    /// experience stream produce identical behavior.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10_000,
            analytics_window: 100,
            initial_strategy: StrategyKind::Gradient,
            seed: 42,
        }
    }
}
