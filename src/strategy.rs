// src/strategy.rs
//
// Shared strategy interfaces: the state/feedback views the engine builds
// from an experience, the per-strategy update summaries, and strategy
// errors.
//
// The strategy set is closed. Dispatch is an explicit match on
// `StrategyKind`; both strategy values live in the engine and persist
// across switches.

use serde::{Deserialize, Serialize};

use crate::bayesian::BayesianUpdate;
use crate::gradient::GradientUpdate;
use crate::types::ParameterMap;

/// View of the current system state handed to a strategy update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyState {
    /// Parameters in effect when the experience was produced.
    pub parameters: ParameterMap,
    /// Observed performance for those parameters.
    pub performance: f64,
}

/// Feedback extracted from an experience outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub performance: f64,
    pub reward: f64,
    pub gradients: ParameterMap,
    pub confidence: f64,
}

/// Per-strategy update summary.
///
/// Reporting only: callers never mutate strategy state through this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum StrategyUpdate {
    Gradient(GradientUpdate),
    Bayesian(BayesianUpdate),
}

/// Errors surfaced by a strategy update.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyError {
    /// The feedback performance value was NaN or infinite.
    NonFinitePerformance { performance: f64 },
}

impl std::fmt::Display for StrategyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyError::NonFinitePerformance { performance } => {
                write!(f, "non-finite feedback performance: {}", performance)
            }
        }
    }
}

impl std::error::Error for StrategyError {}
