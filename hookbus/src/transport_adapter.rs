//! Auxiliary transport adapter interface (spec §4.6, §9).
//!
//! Fixed contract consumed by the emit pipeline (§4.5.5 step 4);
//! implementations are pluggable and, beyond an in-memory test double, out
//! of scope (§1). Resolved at runtime by a string type-key rather than a
//! compile-time feature the way the teacher picks ZMQ socket types
//! (`monocoque/src/zmq/mod.rs`), since §6 describes transports as data
//! (`{type, options}`) rather than a fixed set known at compile time.

use hookbus_core::error::{HookError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// A pluggable message sink invoked in addition to the primary RPC path.
/// Single-call semantics (§9 Open Questions: "this specification requires
/// single-call") — a `Result` is Rust's natural single-call reply: exactly
/// one success-with-value or one error, never a repeated callback.
#[async_trait::async_trait(?Send)]
pub trait Transport {
    async fn message(&self, options: &Value, topic: &str, data: &Value) -> Result<Option<Value>>;
}

/// Loads `Transport` implementations by the type key named in a
/// `TransportSpec` (§6 `transports`).
#[derive(Default)]
pub struct TransportRegistry {
    drivers: HashMap<String, Rc<dyn Transport>>,
}

impl TransportRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_key: impl Into<String>, driver: Rc<dyn Transport>) {
        self.drivers.insert(type_key.into(), driver);
    }

    /// Clones the driver handle out before an `.await`, so a caller never
    /// holds a borrow of the owning `HookState` across the actual dispatch
    /// (`Rc::clone` is cheap; the alternative is suspending mid-`RefCell`
    /// borrow, which risks a `borrow_mut` panic from a re-entrant call).
    #[must_use]
    pub fn get(&self, type_key: &str) -> Option<Rc<dyn Transport>> {
        self.drivers.get(type_key).cloned()
    }

    pub async fn dispatch(
        &self,
        type_key: &str,
        options: &Value,
        topic: &str,
        data: &Value,
    ) -> Result<Option<Value>> {
        match self.drivers.get(type_key) {
            Some(driver) => driver.message(options, topic, data).await,
            None => Err(HookError::transport(format!(
                "no transport registered for type '{type_key}'"
            ))),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

/// An in-memory test double: records every call it receives instead of
/// sending anywhere. Used by integration tests exercising §4.5.5 step 4;
/// the only `Transport` implementation this crate ships (§1 Non-goals:
/// "auxiliary transport driver bodies ... are out of scope").
#[derive(Default)]
pub struct RecordingTransport {
    calls: std::cell::RefCell<Vec<(String, Value)>>,
}

impl RecordingTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.borrow().clone()
    }
}

#[async_trait::async_trait(?Send)]
impl Transport for RecordingTransport {
    async fn message(&self, _options: &Value, topic: &str, data: &Value) -> Result<Option<Value>> {
        self.calls.borrow_mut().push((topic.to_string(), data.clone()));
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_type_key_is_a_transport_error() {
        let registry = TransportRegistry::new();
        let result = futures::executor::block_on(registry.dispatch(
            "missing",
            &Value::Null,
            "a::b",
            &Value::Null,
        ));
        assert!(matches!(result, Err(HookError::Transport(_))));
    }

    #[test]
    fn recording_transport_captures_topic_and_data() {
        let recorder = RecordingTransport::new();
        futures::executor::block_on(recorder.message(&Value::Null, "worker::a::b", &serde_json::json!(1)))
            .unwrap();
        assert_eq!(recorder.calls(), vec![("worker::a::b".to_string(), serde_json::json!(1))]);
    }
}
