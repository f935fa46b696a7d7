// src/gradient.rs
//
// Momentum gradient strategy with an adaptive learning rate.
//
// A two-point trend over the rolling performance window substitutes for
// a line search: improving performance scales the learning rate up
// (capped at 2x the base rate), anything else decays it. Velocities are
// classical momentum: v = momentum * v + learning_rate * gradient.

use serde::{Deserialize, Serialize};

use crate::config::GradientConfig;
use crate::history::BoundedHistory;
use crate::strategy::{Feedback, StrategyError, StrategyState};
use crate::types::ParameterMap;

/// Reported result of one gradient update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientUpdate {
    pub learning_rate: f64,
    pub velocity: ParameterMap,
    pub momentum: f64,
}

#[derive(Debug, Clone)]
pub struct GradientStrategy {
    learning_rate: f64,
    base_learning_rate: f64,
    momentum: f64,
    adaptive_factor: f64,
    decay_factor: f64,
    velocity: ParameterMap,
    performance_history: BoundedHistory<f64>,
}

impl GradientStrategy {
    pub fn new(cfg: &GradientConfig) -> Self {
        Self {
            learning_rate: cfg.base_learning_rate,
            base_learning_rate: cfg.base_learning_rate,
            momentum: cfg.momentum,
            adaptive_factor: cfg.adaptive_factor,
            decay_factor: cfg.decay_factor,
            velocity: ParameterMap::new(),
            performance_history: BoundedHistory::new(cfg.performance_window),
        }
    }

    /// Current adaptive learning rate. Never exceeds 2x the base rate and
    /// is only ever adjusted by `update`, never set directly.
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Per-parameter momentum velocities accumulated so far.
    pub fn velocity(&self) -> &ParameterMap {
        &self.velocity
    }

    /// Apply one feedback sample.
    ///
    /// The learning rate moves only relative to the previous window
    /// entry; the very first sample leaves it unchanged. Gradient keys
    /// absent from the feedback are simply skipped (no velocity entry is
    /// created for them), as are non-finite gradient values.
    pub fn update(
        &mut self,
        _state: &StrategyState,
        feedback: &Feedback,
    ) -> Result<GradientUpdate, StrategyError> {
        let performance = feedback.performance;
        if !performance.is_finite() {
            return Err(StrategyError::NonFinitePerformance { performance });
        }

        let prev = self.performance_history.back().copied();
        self.performance_history.push(performance);

        if let Some(prev) = prev {
            if performance > prev {
                self.learning_rate = (self.learning_rate * self.adaptive_factor)
                    .min(self.base_learning_rate * 2.0);
            } else {
                self.learning_rate *= self.decay_factor;
            }
        }

        for (name, gradient) in &feedback.gradients {
            if !gradient.is_finite() {
                continue;
            }
            let v = self.velocity.entry(name.clone()).or_insert(0.0);
            *v = self.momentum * *v + self.learning_rate * gradient;
        }

        Ok(GradientUpdate {
            learning_rate: self.learning_rate,
            velocity: self.velocity.clone(),
            momentum: self.momentum,
        })
    }

    /// Parameters the strategy would run with next.
    ///
    /// Velocities and momentum travel in [`GradientUpdate`]; the proposal
    /// carries only the tunable rate.
    pub fn propose_next_parameters(&self) -> ParameterMap {
        let mut params = ParameterMap::new();
        params.insert("learning_rate".to_string(), self.learning_rate);
        params
    }
}
