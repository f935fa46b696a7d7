// src/service.rs
//
// Request/response boundary around the learning engine.
//
// Shape (language-agnostic):
//   {"action": "learn", "experience": {...}}  -> learn result
//   {"action": "analytics"}                   -> analytics snapshot
//
// A missing action defaults to "learn". Unknown actions are reported,
// never thrown; malformed experience payloads fail the request without
// touching engine state. No operation aborts the caller.

use serde_json::{json, Value};

use crate::config::LearningConfig;
use crate::engine::{EngineError, LearningEngine};
use crate::types::ExperienceInput;

pub struct LearningService {
    engine: LearningEngine,
}

impl LearningService {
    /// Service around a freshly constructed engine.
    ///
    /// Configuration happens here and only here; per-request `config`
    /// blocks are not honored after construction.
    pub fn new(cfg: LearningConfig) -> Self {
        Self {
            engine: LearningEngine::new(cfg),
        }
    }

    pub fn engine(&self) -> &LearningEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut LearningEngine {
        &mut self.engine
    }

    /// Dispatch one request to the engine.
    pub fn handle(&mut self, request: &Value) -> Value {
        let action = request
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("learn");

        match action {
            "learn" => self.handle_learn(request),
            "analytics" => self.handle_analytics(),
            other => failure(
                &EngineError::UnknownAction {
                    action: other.to_string(),
                }
                .to_string(),
            ),
        }
    }

    fn handle_learn(&mut self, request: &Value) -> Value {
        let raw = request.get("experience").cloned().unwrap_or(json!({}));
        let input: ExperienceInput = match serde_json::from_value(raw) {
            Ok(input) => input,
            Err(err) => return failure(&err.to_string()),
        };

        match self.engine.process_experience(input) {
            Ok(report) => match serde_json::to_value(&report) {
                Ok(Value::Object(mut obj)) => {
                    obj.insert("success".to_string(), Value::Bool(true));
                    Value::Object(obj)
                }
                _ => failure("report serialization failed"),
            },
            Err(err) => failure(&err.to_string()),
        }
    }

    fn handle_analytics(&self) -> Value {
        match serde_json::to_value(self.engine.analytics()) {
            Ok(v) => v,
            Err(err) => failure(&err.to_string()),
        }
    }
}

fn failure(message: &str) -> Value {
    json!({ "error": message, "success": false })
}
