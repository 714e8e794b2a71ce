//! Logging hook (spec §4.5.5 step 2, §1 "log formatting ... is external").
//!
//! The external log sink is modeled as a `LogSink` trait the `Hook` calls on
//! every `emit`, with `TracingLogSink` as the default implementation —
//! `hookbus` still ships ambient structured logging even though a
//! caller-supplied formatter is out of scope. `init_tracing` mirrors
//! `monocoque::dev_tracing::init_tracing`: best-effort, `RUST_LOG`-gated,
//! never panics if a subscriber is already installed.

use serde_json::Value;

/// Receives every `(topic, data)` pair passed to `emit`, before the
/// callback-normalization and fan-out steps (§4.5.5 step 2).
pub trait LogSink {
    fn log(&self, topic: &str, data: &Value);
}

/// Default sink: a `tracing` event at debug level per emission.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, topic: &str, data: &Value) {
        tracing::debug!(topic, %data, "emit");
    }
}

/// A sink that discards everything, for `quiet` hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn log(&self, _topic: &str, _data: &Value) {}
}

/// Installs a `tracing_subscriber::fmt` layer gated on `RUST_LOG`. Best
/// effort: a second call, or a call after some other subscriber is already
/// installed, is silently ignored rather than panicking.
pub fn init_tracing() {
    use std::env;

    if env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}
