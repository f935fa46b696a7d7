// src/engine.rs
//
// mathesis learning engine (orchestrator):
//
//  - owns the bounded experience history and rolling performance metrics,
//  - routes each experience to the active strategy (gradient or bayesian),
//  - independently feeds the tabular RL agent, with failures isolated to
//    a side-channel warning,
//  - tracks the learning iteration counter and last observed performance,
//  - exposes read-only analytics over the recent window.
//
// Single-writer model: every mutation of a `process_experience` call
// (history append -> metric append -> strategy update -> RL update ->
// iteration increment) runs as one synchronous unit under `&mut self`;
// concurrent callers must serialize access to an instance.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use serde_json::json;

use crate::bayesian::BayesianStrategy;
use crate::config::LearningConfig;
use crate::gradient::GradientStrategy;
use crate::history::BoundedHistory;
use crate::metrics::{MetricPoint, OnlineStats, StatsSummary};
use crate::rl::{QLearningAgent, RlError};
use crate::strategy::{Feedback, StrategyError, StrategyState, StrategyUpdate};
use crate::telemetry::TelemetrySink;
use crate::types::{
    Context, Experience, ExperienceInput, ParameterMap, StrategyKind, TimestampMs,
};

/// Result summary of one successfully processed experience.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnReport {
    /// Iteration count after this experience (the first success reports 1).
    pub learning_iteration: u64,
    /// This experience's performance minus the previous call's.
    pub performance_improvement: f64,
    /// Strategy that handled the update.
    pub strategy: StrategyKind,
    /// Reported strategy internals (read-only).
    pub strategy_update: StrategyUpdate,
    pub rl_policy_strength: f64,
    /// Set when the isolated RL update failed. Never fails the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rl_warning: Option<String>,
    pub confidence: f64,
    pub timestamp_ms: TimestampMs,
}

/// Failures of the engine's public operations.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The active strategy rejected the update.
    ///
    /// History/metric entries appended before the dispatch are retained
    /// (documented at-least-once partial apply); the iteration counter
    /// does not advance.
    Strategy {
        strategy: StrategyKind,
        source: StrategyError,
    },
    /// Unrecognized request action at the service boundary.
    UnknownAction { action: String },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Strategy { strategy, source } => {
                write!(f, "{} strategy update failed: {}", strategy.as_str(), source)
            }
            // Exact wire contract string; the action itself stays in the
            // variant for programmatic use.
            EngineError::UnknownAction { .. } => write!(f, "Unknown action"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Strategy { source, .. } => Some(source),
            EngineError::UnknownAction { .. } => None,
        }
    }
}

/// Rolling analytics snapshot. Pure read, no mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub total_experiences: usize,
    pub learning_iteration: u64,
    pub active_strategy: StrategyKind,
    /// Population stats over the recent window's performance values.
    pub performance_trend: StatsSummary,
    /// Population stats over the recent window's confidence values.
    pub confidence_trend: StatsSummary,
    pub rl_policy_strength: f64,
    pub rl_epsilon: f64,
    pub rl_buffer_len: usize,
}

pub struct LearningEngine {
    cfg: LearningConfig,
    gradient: GradientStrategy,
    bayesian: BayesianStrategy,
    rl_agent: QLearningAgent,
    active_strategy: StrategyKind,
    history: BoundedHistory<Experience>,
    // Append-only per-name metric series ("overall" today).
    performance_metrics: BTreeMap<String, Vec<MetricPoint>>,
    learning_iteration: u64,
    last_performance: f64,
    rng: ChaCha8Rng,
    telemetry: TelemetrySink,
}

impl LearningEngine {
    /// Construct an engine from an explicit configuration.
    ///
    /// No global state: callers own the instance, and drop it to tear it
    /// down. Telemetry is read from the environment (see `telemetry.rs`).
    pub fn new(cfg: LearningConfig) -> Self {
        let gradient = GradientStrategy::new(&cfg.gradient);
        let bayesian = BayesianStrategy::new(&cfg.bayesian);
        let rl_agent = QLearningAgent::new(&cfg.rl);
        let rng = ChaCha8Rng::seed_from_u64(cfg.engine.seed);
        let history = BoundedHistory::new(cfg.engine.history_capacity);

        Self {
            gradient,
            bayesian,
            rl_agent,
            active_strategy: cfg.engine.initial_strategy,
            history,
            performance_metrics: BTreeMap::new(),
            learning_iteration: 0,
            last_performance: 0.0,
            rng,
            telemetry: TelemetrySink::from_env(),
            cfg,
        }
    }

    pub fn config(&self) -> &LearningConfig {
        &self.cfg
    }

    /// Successfully processed experiences so far.
    pub fn learning_iteration(&self) -> u64 {
        self.learning_iteration
    }

    pub fn last_performance(&self) -> f64 {
        self.last_performance
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Iterate retained experiences, oldest first.
    pub fn experiences(&self) -> impl Iterator<Item = &Experience> {
        self.history.iter()
    }

    pub fn active_strategy(&self) -> StrategyKind {
        self.active_strategy
    }

    /// Switch the active strategy. Both strategies' states persist across
    /// switches; only routing changes.
    pub fn set_active_strategy(&mut self, kind: StrategyKind) {
        self.active_strategy = kind;
    }

    pub fn rl_agent(&self) -> &QLearningAgent {
        &self.rl_agent
    }

    /// Appended points of a named metric series (empty if unknown).
    pub fn performance_metric(&self, name: &str) -> &[MetricPoint] {
        self.performance_metrics
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Process one experience through the full learning pipeline.
    ///
    /// A strategy failure aborts the call without rolling back the
    /// history/metric appends that preceded it, and without advancing
    /// the iteration counter. An RL failure is isolated: recorded in the
    /// report and telemetry, and the call still succeeds.
    pub fn process_experience(
        &mut self,
        input: ExperienceInput,
    ) -> Result<LearnReport, EngineError> {
        let experience = Experience::from_input(input);
        let timestamp = experience.timestamp;
        let confidence = experience.confidence;
        let performance = experience.outcome.performance_or_default();

        // 1) Bounded history (oldest evicted past capacity).
        self.history.push(experience.clone());

        // 2) Rolling performance metric.
        self.performance_metrics
            .entry("overall".to_string())
            .or_default()
            .push(MetricPoint {
                value: performance,
                timestamp_ms: timestamp,
            });

        // 3) Active strategy update on a state/feedback view of the
        //    experience.
        let state = StrategyState {
            parameters: experience.context.parameters.clone(),
            performance,
        };
        let feedback = Feedback {
            performance,
            reward: experience.reward,
            gradients: experience.outcome.gradients.clone(),
            confidence,
        };
        let strategy = self.active_strategy;
        let strategy_update = match strategy {
            StrategyKind::Gradient => self
                .gradient
                .update(&state, &feedback)
                .map(StrategyUpdate::Gradient),
            StrategyKind::Bayesian => self
                .bayesian
                .update(&state, &feedback)
                .map(StrategyUpdate::Bayesian),
        }
        .map_err(|source| EngineError::Strategy { strategy, source })?;

        // 4) Performance improvement vs the previous call.
        let performance_improvement = performance - self.last_performance;
        self.last_performance = performance;

        // 5) RL agent update, isolated: a failure here must not block
        //    the rest of the pipeline.
        let rl_warning = match self.update_rl_agent(&experience) {
            Ok(()) => None,
            Err(err) => {
                let detail = err.to_string();
                self.telemetry.log_json(&json!({
                    "kind": "warning",
                    "warning": "rl_update_failed",
                    "detail": detail,
                    "timestamp_ms": timestamp,
                }));
                Some(detail)
            }
        };

        // 6) The iteration counter advances only after every step ran.
        self.learning_iteration += 1;

        let report = LearnReport {
            learning_iteration: self.learning_iteration,
            performance_improvement,
            strategy,
            strategy_update,
            rl_policy_strength: self.rl_agent.policy_strength(),
            rl_warning,
            confidence,
            timestamp_ms: timestamp,
        };

        self.telemetry.log_json(&json!({
            "kind": "experience",
            "iteration": report.learning_iteration,
            "strategy": strategy.as_str(),
            "performance": performance,
            "performance_improvement": performance_improvement,
            "reward": experience.reward,
            "confidence": confidence,
            "rl_policy_strength": report.rl_policy_strength,
            "timestamp_ms": timestamp,
        }));

        Ok(report)
    }

    fn update_rl_agent(&mut self, experience: &Experience) -> Result<(), RlError> {
        let empty = Context::default();
        let next_context = experience.outcome.next_state.as_ref().unwrap_or(&empty);

        let state = self.rl_agent.state_index(&experience.context);
        let action = self.rl_agent.action_index(&experience.action_taken);
        let next_state = self.rl_agent.state_index(next_context);

        self.rl_agent.update(
            state,
            action,
            experience.reward,
            next_state,
            experience.outcome.episode_done,
        )
    }

    /// Epsilon-greedy action index for a context, drawn from the engine's
    /// seeded RNG.
    pub fn select_action(&mut self, context: &Context) -> usize {
        self.rl_agent.select_action(context, &mut self.rng)
    }

    /// Next parameter set proposed by the active strategy.
    pub fn propose_parameters(&mut self) -> ParameterMap {
        match self.active_strategy {
            StrategyKind::Gradient => self.gradient.propose_next_parameters(),
            StrategyKind::Bayesian => self.bayesian.propose_next_parameters(&mut self.rng),
        }
    }

    /// Rolling analytics over the most recent window. Pure read.
    pub fn analytics(&self) -> AnalyticsSnapshot {
        let window = self.cfg.engine.analytics_window;
        let mut perf = OnlineStats::default();
        let mut conf = OnlineStats::default();
        for exp in self.history.recent(window) {
            perf.add(exp.outcome.performance_or_default());
            conf.add(exp.confidence);
        }

        AnalyticsSnapshot {
            total_experiences: self.history.len(),
            learning_iteration: self.learning_iteration,
            active_strategy: self.active_strategy,
            performance_trend: perf.summary(),
            confidence_trend: conf.summary(),
            rl_policy_strength: self.rl_agent.policy_strength(),
            rl_epsilon: self.rl_agent.epsilon(),
            rl_buffer_len: self.rl_agent.buffer_len(),
        }
    }
}
