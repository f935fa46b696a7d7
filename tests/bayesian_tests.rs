use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use mathesis::bayesian::BayesianStrategy;
use mathesis::config::BayesianConfig;
use mathesis::strategy::{Feedback, StrategyState};

fn state_with(params: &[(&str, f64)]) -> StrategyState {
    let mut state = StrategyState::default();
    for (name, v) in params {
        state.parameters.insert((*name).to_string(), *v);
    }
    state
}

fn feedback(performance: f64) -> Feedback {
    Feedback {
        performance,
        ..Feedback::default()
    }
}

#[test]
fn best_score_is_monotonically_non_decreasing() {
    let mut strat = BayesianStrategy::new(&BayesianConfig::default());

    let mut running_max = f64::NEG_INFINITY;
    for (i, perf) in [0.3, 0.1, 0.5, 0.2, 0.5, -1.0].iter().enumerate() {
        let state = state_with(&[("learning_rate", 0.01 + i as f64 * 0.001)]);
        let update = strat.update(&state, &feedback(*perf)).unwrap();
        running_max = running_max.max(*perf);
        assert_eq!(update.best_score, running_max);
        assert_eq!(update.observations_count, i + 1);
    }
}

#[test]
fn ties_keep_the_earlier_optimum() {
    let mut strat = BayesianStrategy::new(&BayesianConfig::default());

    strat
        .update(&state_with(&[("learning_rate", 0.011)]), &feedback(0.5))
        .unwrap();
    let update = strat
        .update(&state_with(&[("learning_rate", 0.099)]), &feedback(0.5))
        .unwrap();

    // Equal performance does not replace best_params.
    let best = update.best_params.expect("best params after updates");
    assert!((best["learning_rate"] - 0.011).abs() < 1e-15);
}

#[test]
fn cold_start_proposals_sample_within_bounds() {
    let cfg = BayesianConfig::default();
    let mut strat = BayesianStrategy::new(&cfg);
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    // Two observations: still below the cold-start threshold.
    strat
        .update(&state_with(&[("learning_rate", 0.02)]), &feedback(0.4))
        .unwrap();
    strat
        .update(&state_with(&[("learning_rate", 0.03)]), &feedback(0.6))
        .unwrap();
    assert_eq!(strat.observations_count(), 2);

    for _ in 0..200 {
        let params = strat.propose_next_parameters(&mut rng);
        for (name, &(min_val, max_val)) in &cfg.parameter_space {
            let v = params[name];
            assert!(
                v >= min_val && v <= max_val,
                "{} = {} escaped [{}, {}]",
                name,
                v,
                min_val,
                max_val
            );
        }
    }
}

#[test]
fn perturbation_proposals_stay_within_bounds() {
    let cfg = BayesianConfig::default();
    let mut strat = BayesianStrategy::new(&cfg);
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    // Push the best towards a bound edge to exercise clamping.
    strat
        .update(&state_with(&[("learning_rate", 0.001)]), &feedback(0.1))
        .unwrap();
    strat
        .update(&state_with(&[("learning_rate", 0.002)]), &feedback(0.2))
        .unwrap();
    strat
        .update(
            &state_with(&[("learning_rate", 0.099), ("confidence_threshold", 0.94)]),
            &feedback(0.9),
        )
        .unwrap();
    assert_eq!(strat.observations_count(), 3);

    for _ in 0..500 {
        let params = strat.propose_next_parameters(&mut rng);
        for (name, &(min_val, max_val)) in &cfg.parameter_space {
            let v = params[name];
            assert!(
                v >= min_val && v <= max_val,
                "{} = {} escaped [{}, {}]",
                name,
                v,
                min_val,
                max_val
            );
        }
    }
}

#[test]
fn proposals_cover_exactly_the_declared_space() {
    let cfg = BayesianConfig::default();
    let strat = BayesianStrategy::new(&cfg);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let params = strat.propose_next_parameters(&mut rng);
    assert_eq!(params.len(), cfg.parameter_space.len());
    for name in cfg.parameter_space.keys() {
        assert!(params.contains_key(name));
    }
}

#[test]
fn non_finite_performance_is_rejected_without_recording() {
    let mut strat = BayesianStrategy::new(&BayesianConfig::default());

    let err = strat
        .update(&state_with(&[]), &feedback(f64::INFINITY))
        .unwrap_err();
    assert!(err.to_string().contains("non-finite"));
    assert_eq!(strat.observations_count(), 0);
    assert!(strat.best_params().is_none());
}
