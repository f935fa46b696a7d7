// src/types.rs
//
// Common shared types for the mathesis learning engine.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Millisecond timestamp since Unix epoch.
pub type TimestampMs = i64;

/// Wall-clock now in milliseconds. Clamps to 0 if the system clock is
/// before the Unix epoch.
pub fn now_ms() -> TimestampMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as TimestampMs)
        .unwrap_or(0)
}

/// Named scalar parameters (gradients, proposed hyperparameters, ...).
///
/// `BTreeMap` keeps iteration deterministic: stable state hashing, stable
/// telemetry output.
pub type ParameterMap = BTreeMap<String, f64>;

/// Which optimization strategy the engine routes experiences to.
///
/// The strategy set is closed; selection is enum dispatch, not string
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Gradient,
    Bayesian,
}

impl StrategyKind {
    /// Stable lowercase name (used in logs/telemetry and service payloads).
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Gradient => "gradient",
            StrategyKind::Bayesian => "bayesian",
        }
    }

    /// Parse a strategy name (case-insensitive). Returns None if unrecognized.
    pub fn parse(s: &str) -> Option<StrategyKind> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gradient" | "grad" | "g" => Some(StrategyKind::Gradient),
            "bayesian" | "bayes" | "b" => Some(StrategyKind::Bayesian),
            _ => None,
        }
    }
}

/// Context an experience was observed in.
///
/// Known fields are typed; unknown fields pass through `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Named scalar parameters in effect when the action was taken.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: ParameterMap,
    /// Open-ended auxiliary fields, preserved as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Observed outcome of an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Scalar performance signal. Missing reads as 0.0 downstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<f64>,
    /// Named gradient estimates consumed by the gradient strategy.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub gradients: ParameterMap,
    /// Context the system transitioned into, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_state: Option<Context>,
    /// Whether this outcome terminates an episode.
    #[serde(default)]
    pub episode_done: bool,
    /// Open-ended auxiliary fields, preserved as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Outcome {
    /// Performance with the documented 0.0 default for missing values.
    pub fn performance_or_default(&self) -> f64 {
        self.performance.unwrap_or(0.0)
    }
}

/// Raw experience payload as submitted by callers.
///
/// Every field is optional; missing fields take the documented defaults
/// when the immutable [`Experience`] is constructed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceInput {
    pub timestamp: Option<TimestampMs>,
    pub context: Context,
    pub action_taken: String,
    pub outcome: Outcome,
    pub reward: f64,
    pub confidence: Option<f64>,
    pub metadata: BTreeMap<String, Value>,
}

/// One recorded learning event.
///
/// Immutable once constructed; owned exclusively by the engine's bounded
/// history and simply dropped on eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub timestamp: TimestampMs,
    pub context: Context,
    pub action_taken: String,
    pub outcome: Outcome,
    pub reward: f64,
    /// Caller confidence in the outcome, clamped into [0, 1].
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl Experience {
    /// Build an experience from a raw input.
    ///
    /// Defaults: `timestamp` = now, `confidence` = 0.5 (also for
    /// non-finite values), confidence clamped into [0, 1]. Malformed
    /// fields default rather than fail.
    pub fn from_input(input: ExperienceInput) -> Self {
        let timestamp = input.timestamp.unwrap_or_else(now_ms);
        let confidence = match input.confidence {
            Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
            _ => 0.5,
        };
        Self {
            timestamp,
            context: input.context,
            action_taken: input.action_taken,
            outcome: input.outcome,
            reward: input.reward,
            confidence,
            metadata: input.metadata,
        }
    }
}
