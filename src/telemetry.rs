//! telemetry.rs
//!
//! Lightweight JSONL telemetry sink for the learning engine.
//!
//! Controlled entirely via environment variables so experiments can turn
//! telemetry on/off without code changes:
//!
//! - `MATHESIS_TELEMETRY_MODE`: `"off"` (default) disables telemetry,
//!   `"jsonl"` writes JSONL to `MATHESIS_TELEMETRY_PATH`.
//! - `MATHESIS_TELEMETRY_PATH`: path to the JSONL file. Required when
//!   mode is `"jsonl"`.
//! - `MATHESIS_TELEMETRY_APPEND`: when `"1"`/`"true"`/`"yes"`, appends to
//!   existing files instead of truncating. Default is truncate.
//!
//! Write failures switch the sink off for the rest of the session rather
//! than surfacing errors into the learning pipeline.

use std::env;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

use serde_json::Value;

enum SinkState {
    Off,
    Jsonl(BufWriter<File>),
}

pub struct TelemetrySink {
    state: SinkState,
}

impl TelemetrySink {
    /// Sink configured from the environment.
    ///
    /// Any misconfiguration (missing path, unopenable file) degrades to
    /// the disabled sink.
    pub fn from_env() -> Self {
        let mode = env::var("MATHESIS_TELEMETRY_MODE").unwrap_or_default();
        if !mode.eq_ignore_ascii_case("jsonl") {
            return Self::disabled();
        }
        let Ok(path) = env::var("MATHESIS_TELEMETRY_PATH") else {
            return Self::disabled();
        };
        let append = env::var("MATHESIS_TELEMETRY_APPEND")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let file = if append {
            OpenOptions::new().create(true).append(true).open(&path)
        } else {
            File::create(&path)
        };
        match file {
            Ok(f) => Self {
                state: SinkState::Jsonl(BufWriter::new(f)),
            },
            Err(_) => Self::disabled(),
        }
    }

    /// Sink that discards everything.
    pub fn disabled() -> Self {
        Self {
            state: SinkState::Off,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, SinkState::Jsonl(_))
    }

    /// Write one JSON object as a single line.
    pub fn log_json(&mut self, record: &Value) {
        if let SinkState::Jsonl(writer) = &mut self.state {
            let ok = serde_json::to_writer(&mut *writer, record).is_ok()
                && writer.write_all(b"\n").is_ok()
                && writer.flush().is_ok();
            if !ok {
                self.state = SinkState::Off;
            }
        }
    }
}
