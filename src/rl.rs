// src/rl.rs
//
// Tabular Q-learning agent over hashed context states.
//
// Contexts are reduced to a bounded state index by a stable FNV-1a
// digest of their sorted key/value pairs; different contexts may alias
// to the same table row, an accepted dimensionality-reduction trade-off.
// Exploration is epsilon-greedy with per-update epsilon decay, floored.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::RlAgentConfig;
use crate::history::BoundedHistory;
use crate::types::Context;

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

fn fnv1a64_extend(mut h: u64, bytes: &[u8]) -> u64 {
    for b in bytes {
        h ^= *b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// FNV-1a 64-bit digest. Stable across runs and platforms.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    fnv1a64_extend(FNV_OFFSET, bytes)
}

/// One recorded Q-update transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: usize,
    pub action: usize,
    pub reward: f64,
    pub next_state: usize,
    pub done: bool,
}

/// Errors from an RL update.
///
/// Isolated at the engine boundary: logged and surfaced as warnings,
/// never as request failures.
#[derive(Debug, Clone, PartialEq)]
pub enum RlError {
    NonFiniteReward { reward: f64 },
    ActionOutOfRange { action: usize, action_space_size: usize },
    StateOutOfRange { state: usize, state_space_size: usize },
}

impl std::fmt::Display for RlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RlError::NonFiniteReward { reward } => {
                write!(f, "non-finite reward: {}", reward)
            }
            RlError::ActionOutOfRange {
                action,
                action_space_size,
            } => {
                write!(
                    f,
                    "action {} out of range (action space {})",
                    action, action_space_size
                )
            }
            RlError::StateOutOfRange {
                state,
                state_space_size,
            } => {
                write!(
                    f,
                    "state {} out of range (state space {})",
                    state, state_space_size
                )
            }
        }
    }
}

impl std::error::Error for RlError {}

#[derive(Debug, Clone)]
pub struct QLearningAgent {
    state_space_size: usize,
    action_space_size: usize,
    learning_rate: f64,
    discount_factor: f64,
    epsilon: f64,
    epsilon_decay: f64,
    epsilon_floor: f64,
    // Dense [state_space_size x action_space_size], row-major.
    q_table: Vec<f64>,
    experience_buffer: BoundedHistory<Transition>,
}

impl QLearningAgent {
    pub fn new(cfg: &RlAgentConfig) -> Self {
        let state_space_size = cfg.state_space_size.max(1);
        let action_space_size = cfg.action_space_size.max(1);
        Self {
            state_space_size,
            action_space_size,
            learning_rate: cfg.learning_rate,
            discount_factor: cfg.discount_factor,
            epsilon: cfg.epsilon.clamp(0.0, 1.0),
            epsilon_decay: cfg.epsilon_decay,
            epsilon_floor: cfg.epsilon_floor,
            q_table: vec![0.0; state_space_size * action_space_size],
            experience_buffer: BoundedHistory::new(cfg.buffer_capacity),
        }
    }

    /// Current exploration rate. Non-increasing across updates except for
    /// the floor.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn state_space_size(&self) -> usize {
        self.state_space_size
    }

    pub fn action_space_size(&self) -> usize {
        self.action_space_size
    }

    /// Number of recorded transitions (bounded by the buffer capacity).
    pub fn buffer_len(&self) -> usize {
        self.experience_buffer.len()
    }

    /// Iterate recorded transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.experience_buffer.iter()
    }

    /// Stable, order-independent state index for a context.
    ///
    /// Sorted key/value pairs (`parameters` first, then the auxiliary
    /// map as canonical JSON) are FNV-1a hashed and reduced modulo the
    /// state space size. Reproducible across runs and implementations.
    pub fn state_index(&self, context: &Context) -> usize {
        (hash_context(context) % self.state_space_size as u64) as usize
    }

    /// Stable action index for an action label.
    pub fn action_index(&self, action: &str) -> usize {
        (fnv1a64(action.as_bytes()) % self.action_space_size as u64) as usize
    }

    pub fn q_value(&self, state: usize, action: usize) -> f64 {
        self.q_table
            .get(state * self.action_space_size + action)
            .copied()
            .unwrap_or(0.0)
    }

    fn row(&self, state: usize) -> &[f64] {
        let start = state * self.action_space_size;
        &self.q_table[start..start + self.action_space_size]
    }

    fn max_q(&self, state: usize) -> f64 {
        // Rows are never empty (action space >= 1).
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Epsilon-greedy action selection.
    ///
    /// With probability epsilon a uniformly random action; otherwise the
    /// maximal column of the state's row, ties broken by the lowest
    /// action index.
    pub fn select_action(&self, context: &Context, rng: &mut ChaCha8Rng) -> usize {
        if rng.gen::<f64>() < self.epsilon {
            return rng.gen_range(0..self.action_space_size);
        }
        let row = self.row(self.state_index(context));
        let mut best = 0;
        for (idx, q) in row.iter().enumerate().skip(1) {
            if *q > row[best] {
                best = idx;
            }
        }
        best
    }

    /// One-step Q-learning update, then epsilon decay (floored).
    ///
    /// `done` short-circuits the target to the bare reward; otherwise
    /// target = reward + discount * max(Q[next_state]).
    pub fn update(
        &mut self,
        state: usize,
        action: usize,
        reward: f64,
        next_state: usize,
        done: bool,
    ) -> Result<(), RlError> {
        if !reward.is_finite() {
            return Err(RlError::NonFiniteReward { reward });
        }
        if action >= self.action_space_size {
            return Err(RlError::ActionOutOfRange {
                action,
                action_space_size: self.action_space_size,
            });
        }
        if state >= self.state_space_size {
            return Err(RlError::StateOutOfRange {
                state,
                state_space_size: self.state_space_size,
            });
        }
        if next_state >= self.state_space_size {
            return Err(RlError::StateOutOfRange {
                state: next_state,
                state_space_size: self.state_space_size,
            });
        }

        let target = if done {
            reward
        } else {
            reward + self.discount_factor * self.max_q(next_state)
        };

        let idx = state * self.action_space_size + action;
        self.q_table[idx] += self.learning_rate * (target - self.q_table[idx]);

        self.experience_buffer.push(Transition {
            state,
            action,
            reward,
            next_state,
            done,
        });

        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_floor);
        Ok(())
    }

    /// Coarse confidence proxy in [0, 1]: Q-table population variance
    /// over its maximum, clamped. Exactly 0.0 when the maximum is
    /// exactly 0 (untouched table), and 0.0 for an all-negative table.
    pub fn policy_strength(&self) -> f64 {
        let n = self.q_table.len() as f64;
        let mean = self.q_table.iter().sum::<f64>() / n;
        let variance = self
            .q_table
            .iter()
            .map(|q| {
                let d = q - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let max_q = self
            .q_table
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        if max_q == 0.0 {
            0.0
        } else {
            (variance / max_q).clamp(0.0, 1.0)
        }
    }
}

/// Order-independent digest of a context's sorted key/value pairs.
///
/// Parameters hash as key bytes + IEEE-754 bit patterns; auxiliary
/// values hash as canonical JSON (serde_json orders object keys). A
/// 0xff separator delimits chunks.
fn hash_context(context: &Context) -> u64 {
    let mut h = FNV_OFFSET;
    for (key, value) in &context.parameters {
        h = fnv1a64_extend(h, key.as_bytes());
        h = fnv1a64_extend(h, &[0xff]);
        h = fnv1a64_extend(h, &value.to_bits().to_le_bytes());
        h = fnv1a64_extend(h, &[0xff]);
    }
    for (key, value) in &context.extra {
        h = fnv1a64_extend(h, key.as_bytes());
        h = fnv1a64_extend(h, &[0xff]);
        let canonical = serde_json::to_string(value).unwrap_or_default();
        h = fnv1a64_extend(h, canonical.as_bytes());
        h = fnv1a64_extend(h, &[0xff]);
    }
    h
}
