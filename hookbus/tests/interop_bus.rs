//! End-to-end loopback-TCP tests exercising the testable properties around
//! role fallback, name uniquification, subscription propagation, unsubscribe
//! gating, the synthesized-callback error path, and version mismatch.
//!
//! Each hook runs on its own `Hook` instance against `127.0.0.1`; a port is
//! reserved up front with `portpicker` so a would-be broker and its clients
//! agree on an address before either one starts (`compio`'s ephemeral-port
//! binding gives no way to learn the bound port back out of `Hook`, unlike
//! `monocoque_zmtp`'s sockets, which expose `local_addr()`).

use hookbus::{HookOptionsBuilder, Role};
use hookbus_core::emitter::Listener;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

async fn settle() {
    compio::time::sleep(Duration::from_millis(100)).await;
}

fn recording_listener() -> (Listener, Rc<RefCell<Vec<Value>>>) {
    let received = Rc::new(RefCell::new(Vec::new()));
    let r = Rc::clone(&received);
    let listener: Listener = Box::new(move |data: &Value, _reply| {
        r.borrow_mut().push(data.clone());
    });
    (listener, received)
}

/// The first hook to reach a port becomes the broker; the second falls back
/// to connecting as a client against the same address.
#[compio::test]
async fn role_fallback_second_hook_becomes_client() {
    let port = portpicker::pick_unused_port().expect("free port");

    let broker = hookbus::Hook::new(
        HookOptionsBuilder::new()
            .name("broker")
            .port(port)
            .build(),
    );
    broker.start().await.expect("broker starts");
    assert_eq!(broker.role(), Role::Server);

    let client = hookbus::Hook::new(
        HookOptionsBuilder::new()
            .name("client-a")
            .port(port)
            .build(),
    );
    client.start().await.expect("client falls back to connect");
    assert_eq!(client.role(), Role::Client);
}

/// A second peer requesting an already-registered name is renamed by the
/// broker rather than rejected.
#[compio::test]
async fn duplicate_name_is_uniquified_by_the_broker() {
    let port = portpicker::pick_unused_port().expect("free port");

    let broker = hookbus::Hook::new(HookOptionsBuilder::new().name("broker").port(port).build());
    broker.start().await.expect("broker starts");

    let first = hookbus::Hook::new(HookOptionsBuilder::new().name("twin").port(port).build());
    first.start().await.expect("first twin connects");
    assert_eq!(first.name(), "twin");

    let second = hookbus::Hook::new(HookOptionsBuilder::new().name("twin").port(port).build());
    second.start().await.expect("second twin connects");
    assert_ne!(second.name(), "twin", "a colliding name must be uniquified");
}

/// A subscriber's pattern propagates to the broker and reaches other peers'
/// emits; a peer with no matching listener never receives the forward.
#[compio::test]
async fn subscription_propagates_and_gates_broadcast_fanout() {
    let port = portpicker::pick_unused_port().expect("free port");

    let broker = hookbus::Hook::new(HookOptionsBuilder::new().name("broker").port(port).build());
    broker.start().await.expect("broker starts");

    let subscriber = hookbus::Hook::new(HookOptionsBuilder::new().name("subscriber").port(port).build());
    subscriber.start().await.expect("subscriber connects");

    // A forwarded event arrives tagged with its origin hook's name
    // (`publisher::orders::placed`); a subscriber uninterested in *which*
    // hook emitted it matches with a leading single-segment wildcard.
    let (listener, received) = recording_listener();
    subscriber.on("*::orders::placed", listener);
    settle().await;

    let bystander = hookbus::Hook::new(HookOptionsBuilder::new().name("bystander").port(port).build());
    bystander.start().await.expect("bystander connects");

    let publisher = hookbus::Hook::new(HookOptionsBuilder::new().name("publisher").port(port).build());
    publisher.start().await.expect("publisher connects");
    publisher
        .emit("orders::placed", json!({"id": 1}), None)
        .await
        .expect("emit succeeds");
    settle().await;

    let delivered = received.borrow();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0], json!({"id": 1}));
}

/// Once a subscriber unsubscribes, the broker stops forwarding matching
/// emits to it.
#[compio::test]
async fn unsubscribe_stops_further_forwarding() {
    let port = portpicker::pick_unused_port().expect("free port");

    let broker = hookbus::Hook::new(HookOptionsBuilder::new().name("broker").port(port).build());
    broker.start().await.expect("broker starts");

    let subscriber = hookbus::Hook::new(HookOptionsBuilder::new().name("subscriber").port(port).build());
    subscriber.start().await.expect("subscriber connects");

    let (listener, received) = recording_listener();
    let id = subscriber.on("*::alerts::raised", listener);
    settle().await;

    subscriber.off("*::alerts::raised", id);
    settle().await;

    let publisher = hookbus::Hook::new(HookOptionsBuilder::new().name("publisher").port(port).build());
    publisher.start().await.expect("publisher connects");
    publisher
        .emit("alerts::raised", json!({"level": "high"}), None)
        .await
        .expect("emit succeeds");
    settle().await;

    assert!(received.borrow().is_empty(), "unsubscribed listener must not be reached");
}

/// A topic with no reply handed to `emit` gets a synthesized reply; the
/// listener's error result surfaces on the derived `topic::error` topic.
#[compio::test]
async fn synthesized_reply_surfaces_listener_error_on_derived_topic() {
    let hook = hookbus::Hook::new(HookOptionsBuilder::new().name("solo").build());

    let (error_listener, errors) = recording_listener();
    hook.on("work::error", error_listener);

    hook.on(
        "work",
        Box::new(|_data, reply| {
            if let Some(reply) = reply {
                reply(Some(json!("boom")), None);
            }
        }),
    );

    hook.emit("work", json!({"task": 1}), None).await.expect("emit succeeds");

    let recorded = errors.borrow();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0]["error"], json!("boom"));
    assert_eq!(recorded[0]["ctx"], json!({"task": 1}));
}

/// A client whose version strictly differs from the broker's fails to
/// connect with `VersionMismatch` and is left with no broker session.
#[compio::test]
async fn strict_version_mismatch_rejects_the_connection() {
    let port = portpicker::pick_unused_port().expect("free port");

    let broker = hookbus::Hook::new(
        HookOptionsBuilder::new()
            .name("broker")
            .port(port)
            .version("2.0.0")
            .build(),
    );
    broker.start().await.expect("broker starts");

    let mismatched = hookbus::Hook::new(
        HookOptionsBuilder::new()
            .name("outdated")
            .port(port)
            .version("1.0.0")
            .build(),
    );

    let err = mismatched.start().await.expect_err("version mismatch must fail start");
    assert!(matches!(err, hookbus::HookError::VersionMismatch { .. }));
    // `connect` never reaches `commit_client` on a version mismatch, so the
    // role stays at the in-flight `Connecting` stage rather than advancing.
    assert_eq!(mismatched.role(), Role::Connecting);
}
