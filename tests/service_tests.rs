use serde_json::json;

use mathesis::config::LearningConfig;
use mathesis::service::LearningService;

#[test]
fn learn_action_returns_report_with_success() {
    let mut service = LearningService::new(LearningConfig::default());

    let response = service.handle(&json!({
        "action": "learn",
        "experience": {
            "action_taken": "buy",
            "outcome": { "performance": 0.8 },
            "reward": 1.0,
            "timestamp": 1_000
        }
    }));

    assert_eq!(response["success"], json!(true));
    assert_eq!(response["learning_iteration"], json!(1));
    assert_eq!(response["strategy"], json!("gradient"));
    assert!(response["performance_improvement"].as_f64().is_some());
    assert!(response["rl_policy_strength"].as_f64().is_some());
}

#[test]
fn missing_action_defaults_to_learn() {
    let mut service = LearningService::new(LearningConfig::default());

    let response = service.handle(&json!({
        "experience": { "action_taken": "hold", "reward": 0.0 }
    }));

    assert_eq!(response["success"], json!(true));
    assert_eq!(service.engine().learning_iteration(), 1);
}

#[test]
fn unknown_action_is_reported_not_thrown() {
    let mut service = LearningService::new(LearningConfig::default());

    let response = service.handle(&json!({ "action": "teleport" }));

    assert_eq!(response["error"], json!("Unknown action"));
    assert_eq!(response["success"], json!(false));
    assert_eq!(service.engine().learning_iteration(), 0);
}

#[test]
fn analytics_action_returns_snapshot() {
    let mut service = LearningService::new(LearningConfig::default());

    service.handle(&json!({
        "action": "learn",
        "experience": {
            "action_taken": "buy",
            "outcome": { "performance": 0.5 },
            "reward": 0.5,
            "confidence": 0.9
        }
    }));

    let response = service.handle(&json!({ "action": "analytics" }));
    assert_eq!(response["total_experiences"], json!(1));
    assert_eq!(response["learning_iteration"], json!(1));
    assert_eq!(response["active_strategy"], json!("gradient"));
    assert!((response["performance_trend"]["mean"].as_f64().unwrap() - 0.5).abs() < 1e-12);
    assert!((response["confidence_trend"]["mean"].as_f64().unwrap() - 0.9).abs() < 1e-12);
}

#[test]
fn malformed_experience_fails_without_mutation() {
    let mut service = LearningService::new(LearningConfig::default());

    let response = service.handle(&json!({
        "action": "learn",
        "experience": { "reward": "very high" }
    }));

    assert_eq!(response["success"], json!(false));
    assert!(response["error"].as_str().is_some());
    assert_eq!(service.engine().learning_iteration(), 0);
    assert_eq!(service.engine().history_len(), 0);
}

#[test]
fn missing_experience_block_learns_from_defaults() {
    let mut service = LearningService::new(LearningConfig::default());

    let response = service.handle(&json!({ "action": "learn" }));

    assert_eq!(response["success"], json!(true));
    assert_eq!(response["confidence"], json!(0.5));
}

#[test]
fn unknown_experience_fields_pass_through() {
    let mut service = LearningService::new(LearningConfig::default());

    // Fields outside the typed schema land in the open maps instead of
    // failing the request.
    let response = service.handle(&json!({
        "action": "learn",
        "experience": {
            "action_taken": "buy",
            "context": { "region": "eu-west", "parameters": { "x": 1.0 } },
            "outcome": { "performance": 0.4, "latency_ms": 12 },
            "reward": 0.1
        }
    }));

    assert_eq!(response["success"], json!(true));
    let stored = service.engine().experiences().next().unwrap();
    assert_eq!(stored.context.extra["region"], json!("eu-west"));
    assert_eq!(stored.outcome.extra["latency_ms"], json!(12));
}
