//! Mathesis: an online, multi-strategy learning engine.
//!
//! The engine ingests discrete experience records (context, action,
//! outcome, reward) and continuously updates three competing learners:
//!
//! - a momentum gradient optimizer with an adaptive learning rate
//!   ([`gradient::GradientStrategy`]),
//! - a best-so-far Bayesian hyperparameter search over a bounded space
//!   ([`bayesian::BayesianStrategy`]),
//! - a tabular Q-learning agent over hashed context states
//!   ([`rl::QLearningAgent`]),
//!
//! while tracking rolling performance analytics.
//!
//! [`engine::LearningEngine`] orchestrates: each submitted experience is
//! appended to a bounded history, folded into the rolling metrics,
//! routed to the active strategy, and independently fed to the RL agent
//! (whose failures are isolated to a side-channel warning). The engine
//! is a single-writer, in-memory component: all work is synchronous and
//! CPU-bound, and `&mut self` serializes access. All state is
//! process-lifetime only; persistence, HTTP transport, and the
//! surrounding statistics/simulation services are the caller's concern.
//!
//! [`service::LearningService`] wraps the engine in the language-agnostic
//! `{"action": ...}` request/response contract. The binary
//! (`src/main.rs`) is a thin research harness that drives the engine
//! with deterministic synthetic experiences.

pub mod bayesian;
pub mod config;
pub mod engine;
pub mod gradient;
pub mod history;
pub mod metrics;
pub mod rl;
pub mod service;
pub mod strategy;
pub mod telemetry;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use bayesian::{BayesianStrategy, BayesianUpdate};
pub use config::{
    BayesianConfig, EngineConfig, GradientConfig, LearningConfig, RlAgentConfig, CONFIG_VERSION,
};
pub use engine::{AnalyticsSnapshot, EngineError, LearnReport, LearningEngine};
pub use gradient::{GradientStrategy, GradientUpdate};
pub use history::BoundedHistory;
pub use metrics::{MetricPoint, OnlineStats, StatsSummary};
pub use rl::{QLearningAgent, RlError, Transition};
pub use service::LearningService;
pub use strategy::{Feedback, StrategyError, StrategyState, StrategyUpdate};
pub use telemetry::TelemetrySink;
pub use types::{
    Context, Experience, ExperienceInput, Outcome, ParameterMap, StrategyKind, TimestampMs,
};
