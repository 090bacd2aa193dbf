//! Usage monitoring. An explicitly injected collaborator rather than global
//! state: the LLM client reports every completed call, the session reports
//! every finished attempt.

use chrono::Utc;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;


pub trait UsageMonitor: Send + Sync {
    fn record_call(
        &self,
        model: &str,
        tokens_in: u64,
        tokens_out: u64,
        latency: Duration,
        cost: f64,
    );

    fn record_attempt(&self, attempt: u32, success: bool, duration: Duration);
}

/// Appends one JSON object per event to a `.jsonl` file. Append-only, one
/// line per record; a recording failure is reported on stderr and never
/// interrupts the loop.
pub struct JsonlMonitor {
    path: PathBuf,
}

impl JsonlMonitor {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn append(&self, record: serde_json::Value) {
        let result = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{record}"));
        if let Err(e) = result {
            eprintln!("warning: failed to record usage: {e}");
        }
    }
}

impl UsageMonitor for JsonlMonitor {
    fn record_call(
        &self,
        model: &str,
        tokens_in: u64,
        tokens_out: u64,
        latency: Duration,
        cost: f64,
    ) {
        self.append(json!({
            "kind": "call",
            "timestamp": Utc::now().to_rfc3339(),
            "model": model,
            "tokens_in": tokens_in,
            "tokens_out": tokens_out,
            "latency_ms": latency.as_millis() as u64,
            "cost_usd": cost,
        }));
    }

    fn record_attempt(&self, attempt: u32, success: bool, duration: Duration) {
        self.append(json!({
            "kind": "attempt",
            "timestamp": Utc::now().to_rfc3339(),
            "attempt": attempt,
            "success": success,
            "duration_ms": duration.as_millis() as u64,
        }));
    }
}

/// Discards everything. Used in tests and when monitoring is not wanted.
pub struct NullMonitor;

impl UsageMonitor for NullMonitor {
    fn record_call(&self, _: &str, _: u64, _: u64, _: Duration, _: f64) {}
    fn record_attempt(&self, _: u32, _: bool, _: Duration) {}
}

// USD per 1k tokens (input, output). Matched by prefix so dated model ids
// pick up their family's rate; unknown models fall back to a flat figure.
const MODEL_RATES: &[(&str, f64, f64)] = &[
    ("gpt-4o-mini", 0.000_15, 0.000_60),
    ("gpt-4o", 0.005, 0.015),
    ("gpt-4", 0.03, 0.06),
    ("gpt-3.5", 0.000_5, 0.001_5),
    ("claude-3-5-sonnet", 0.003, 0.015),
    ("claude-3-haiku", 0.000_25, 0.001_25),
];

const DEFAULT_RATE: (f64, f64) = (0.002, 0.006);

pub fn estimate_cost(model: &str, tokens_in: u64, tokens_out: u64) -> f64 {
    let (rate_in, rate_out) = MODEL_RATES
        .iter()
        .find(|(prefix, _, _)| model.starts_with(prefix))
        .map(|(_, i, o)| (*i, *o))
        .unwrap_or(DEFAULT_RATE);
    (tokens_in as f64 / 1000.0) * rate_in + (tokens_out as f64 / 1000.0) * rate_out
}
