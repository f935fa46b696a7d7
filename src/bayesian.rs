// src/bayesian.rs
//
// Best-so-far Bayesian hyperparameter search over a bounded parameter
// space.
//
// Deliberately not a posterior-GP computation: proposals either sample
// the space uniformly (cold start) or perturb the best-known parameters
// with Gaussian noise scaled to a fraction of each bound's range,
// clamped back into bounds (UCB-flavored local search around the current
// optimum).

use std::collections::BTreeMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::config::BayesianConfig;
use crate::strategy::{Feedback, StrategyError, StrategyState};
use crate::types::ParameterMap;

/// Reported result of one Bayesian update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianUpdate {
    pub best_score: f64,
    pub best_params: Option<ParameterMap>,
    pub observations_count: usize,
}

#[derive(Debug, Clone)]
pub struct BayesianStrategy {
    parameter_space: BTreeMap<String, (f64, f64)>,
    cold_start_min_observations: usize,
    perturbation_frac: f64,
    // Observations and parameter history grow for the process lifetime.
    // Acceptable for session scope; a resource concern for long-running
    // deployments.
    observations: Vec<f64>,
    parameter_history: Vec<ParameterMap>,
    best_params: Option<ParameterMap>,
    best_score: f64,
}

impl BayesianStrategy {
    pub fn new(cfg: &BayesianConfig) -> Self {
        Self {
            parameter_space: cfg.parameter_space.clone(),
            cold_start_min_observations: cfg.cold_start_min_observations,
            perturbation_frac: cfg.perturbation_frac,
            observations: Vec::new(),
            parameter_history: Vec::new(),
            best_params: None,
            best_score: f64::NEG_INFINITY,
        }
    }

    /// Best performance observed so far (-inf before the first update).
    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    pub fn best_params(&self) -> Option<&ParameterMap> {
        self.best_params.as_ref()
    }

    pub fn observations_count(&self) -> usize {
        self.observations.len()
    }

    /// Record an observed (parameters, performance) pair.
    ///
    /// Best score/params change only on a strictly greater performance;
    /// ties keep the earlier optimum.
    pub fn update(
        &mut self,
        state: &StrategyState,
        feedback: &Feedback,
    ) -> Result<BayesianUpdate, StrategyError> {
        let performance = feedback.performance;
        if !performance.is_finite() {
            return Err(StrategyError::NonFinitePerformance { performance });
        }

        self.observations.push(performance);
        self.parameter_history.push(state.parameters.clone());

        if performance > self.best_score {
            self.best_score = performance;
            self.best_params = Some(state.parameters.clone());
        }

        Ok(BayesianUpdate {
            best_score: self.best_score,
            best_params: self.best_params.clone(),
            observations_count: self.observations.len(),
        })
    }

    /// Propose the next parameter set to try.
    ///
    /// Fewer than `cold_start_min_observations` observations (or no best
    /// yet) sample uniformly within each declared bound; otherwise the
    /// best-known parameters are perturbed. Proposals only ever contain
    /// names from the declared space, and every value lies within its
    /// bounds.
    pub fn propose_next_parameters(&self, rng: &mut ChaCha8Rng) -> ParameterMap {
        match &self.best_params {
            Some(best) if self.observations.len() >= self.cold_start_min_observations => {
                self.perturb_best(best, rng)
            }
            _ => self.sample_uniform(rng),
        }
    }

    /// Cold start: uniform draw within each declared bound.
    fn sample_uniform(&self, rng: &mut ChaCha8Rng) -> ParameterMap {
        let mut params = ParameterMap::new();
        for (name, &(min_val, max_val)) in &self.parameter_space {
            let value = if max_val > min_val {
                rng.gen_range(min_val..=max_val)
            } else {
                // Degenerate range: the only admissible value.
                min_val
            };
            params.insert(name.clone(), value);
        }
        params
    }

    /// Gaussian perturbation of the best-known parameters, sigma scaled
    /// to `perturbation_frac` of each parameter's range, clamped into
    /// bounds.
    fn perturb_best(&self, best: &ParameterMap, rng: &mut ChaCha8Rng) -> ParameterMap {
        let mut params = ParameterMap::new();
        for (name, &(min_val, max_val)) in &self.parameter_space {
            let center = best
                .get(name)
                .copied()
                .unwrap_or_else(|| 0.5 * (min_val + max_val));
            let noise_scale = (max_val - min_val) * self.perturbation_frac;
            let noise = match Normal::new(0.0, noise_scale) {
                Ok(dist) if noise_scale > 0.0 && noise_scale.is_finite() => dist.sample(rng),
                _ => 0.0,
            };
            params.insert(name.clone(), (center + noise).clamp(min_val, max_val));
        }
        params
    }
}
