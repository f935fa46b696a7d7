use mathesis::config::GradientConfig;
use mathesis::gradient::GradientStrategy;
use mathesis::strategy::{Feedback, StrategyState};

fn feedback(performance: f64, gradients: &[(&str, f64)]) -> Feedback {
    let mut fb = Feedback {
        performance,
        ..Feedback::default()
    };
    for (name, g) in gradients {
        fb.gradients.insert((*name).to_string(), *g);
    }
    fb
}

#[test]
fn learning_rate_non_decreasing_until_cap_on_improving_performance() {
    let cfg = GradientConfig::default();
    let cap = cfg.base_learning_rate * 2.0;
    let mut strat = GradientStrategy::new(&cfg);

    let mut last_lr = strat.learning_rate();
    for k in 0..40 {
        let update = strat
            .update(
                &StrategyState::default(),
                &feedback(0.1 + k as f64 * 0.01, &[]),
            )
            .unwrap();
        assert!(
            update.learning_rate >= last_lr,
            "rate decreased on improving performance: {} -> {}",
            last_lr,
            update.learning_rate
        );
        assert!(update.learning_rate <= cap);
        last_lr = update.learning_rate;
    }

    // min(rate * adaptive, 2 * base) saturates at exactly the cap.
    assert_eq!(last_lr, cap, "rate should saturate at 2x base");
}

#[test]
fn learning_rate_decays_on_worsening_performance() {
    let cfg = GradientConfig::default();
    let mut strat = GradientStrategy::new(&cfg);

    strat
        .update(&StrategyState::default(), &feedback(0.5, &[]))
        .unwrap();
    let update = strat
        .update(&StrategyState::default(), &feedback(0.4, &[]))
        .unwrap();

    let expected = cfg.base_learning_rate * cfg.decay_factor;
    assert!((update.learning_rate - expected).abs() < 1e-12);
}

#[test]
fn equal_performance_also_decays() {
    // Only a strict improvement scales the rate up.
    let cfg = GradientConfig::default();
    let mut strat = GradientStrategy::new(&cfg);

    strat
        .update(&StrategyState::default(), &feedback(0.5, &[]))
        .unwrap();
    let update = strat
        .update(&StrategyState::default(), &feedback(0.5, &[]))
        .unwrap();

    let expected = cfg.base_learning_rate * cfg.decay_factor;
    assert!((update.learning_rate - expected).abs() < 1e-12);
}

#[test]
fn first_update_leaves_learning_rate_unchanged() {
    let cfg = GradientConfig::default();
    let mut strat = GradientStrategy::new(&cfg);

    let update = strat
        .update(&StrategyState::default(), &feedback(0.9, &[]))
        .unwrap();
    assert_eq!(update.learning_rate, cfg.base_learning_rate);
}

#[test]
fn velocity_follows_momentum_rule() {
    let cfg = GradientConfig::default();
    let mut strat = GradientStrategy::new(&cfg);

    // First update: v = 0.9 * 0 + 0.01 * 1.0 = 0.01 (rate unchanged).
    let u1 = strat
        .update(&StrategyState::default(), &feedback(0.5, &[("x", 1.0)]))
        .unwrap();
    assert!((u1.velocity["x"] - 0.01).abs() < 1e-12);

    // Improvement scales the rate to 0.011:
    // v = 0.9 * 0.01 + 0.011 * 1.0 = 0.02.
    let u2 = strat
        .update(&StrategyState::default(), &feedback(0.6, &[("x", 1.0)]))
        .unwrap();
    assert!((u2.velocity["x"] - 0.02).abs() < 1e-12);
    assert_eq!(u2.momentum, cfg.momentum);
}

#[test]
fn absent_gradient_keys_create_no_velocity_entries() {
    let cfg = GradientConfig::default();
    let mut strat = GradientStrategy::new(&cfg);

    strat
        .update(&StrategyState::default(), &feedback(0.5, &[]))
        .unwrap();
    assert!(strat.velocity().is_empty());

    let update = strat
        .update(&StrategyState::default(), &feedback(0.6, &[("a", 0.5)]))
        .unwrap();
    assert!(update.velocity.contains_key("a"));
    assert!(!update.velocity.contains_key("b"));
}

#[test]
fn non_finite_gradients_are_skipped() {
    let cfg = GradientConfig::default();
    let mut strat = GradientStrategy::new(&cfg);

    let update = strat
        .update(
            &StrategyState::default(),
            &feedback(0.5, &[("bad", f64::NAN), ("good", 1.0)]),
        )
        .unwrap();
    assert!(!update.velocity.contains_key("bad"));
    assert!(update.velocity.contains_key("good"));
}

#[test]
fn non_finite_performance_is_rejected() {
    let cfg = GradientConfig::default();
    let mut strat = GradientStrategy::new(&cfg);

    let err = strat
        .update(&StrategyState::default(), &feedback(f64::NAN, &[]))
        .unwrap_err();
    assert!(err.to_string().contains("non-finite"));

    // The rejected sample must not have moved the rate.
    assert_eq!(strat.learning_rate(), cfg.base_learning_rate);
}

#[test]
fn proposal_carries_current_learning_rate() {
    let cfg = GradientConfig::default();
    let mut strat = GradientStrategy::new(&cfg);

    strat
        .update(&StrategyState::default(), &feedback(0.5, &[]))
        .unwrap();
    strat
        .update(&StrategyState::default(), &feedback(0.6, &[]))
        .unwrap();

    let params = strat.propose_next_parameters();
    assert_eq!(params.len(), 1);
    assert!((params["learning_rate"] - strat.learning_rate()).abs() < 1e-15);
}
