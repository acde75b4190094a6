//! Change events from upserts to the bus.

use std::time::Duration;

use docstore_actions::bus::{InMemoryQueue, Subscriber};
use docstore_actions::{
    actions, EventDispatcherThread, EventOrigin, EventOutbox, InMemoryDocumentStore, ServiceConfig,
    Value,
};
use serde_json::{json, Value as Json};

use crate::support::{capture_logs, SERVICE};

#[test]
fn upserts_reach_the_bus() {
    let (outbox, receiver) = EventOutbox::bounded(16);
    let queue = InMemoryQueue::new();
    let dispatcher =
        EventDispatcherThread::spawn(receiver, queue.clone(), Duration::from_millis(5));
    let service = actions::service(SERVICE, InMemoryDocumentStore::new(SERVICE), outbox);

    let created = service
        .dispatch(
            "find-one-and-update",
            json!({ "conditions": { "sku": "A1" }, "update": { "$set": { "price": 10 } } }),
        )
        .unwrap();
    service.dispatch("find-one", json!({ "sku": "A1" })).unwrap();

    let stats = dispatcher.stop();
    assert_eq!(stats.published, 1);
    assert_eq!(stats.failed, 0);

    let event = queue.new_subscriber().poll(0).unwrap().unwrap();
    assert_eq!(event.event_type, "products.update");
    let payload: Json = event.decode().unwrap();
    assert_eq!(payload, created);
}

#[test]
fn a_full_channel_never_fails_the_upsert() {
    let (outbox, receiver) = EventOutbox::bounded(1);
    let service = actions::service(SERVICE, InMemoryDocumentStore::new(SERVICE), outbox);

    let (results, logs) = capture_logs(|| {
        (0..3)
            .map(|price| {
                service.dispatch(
                    "find-one-and-update",
                    json!({ "conditions": { "sku": "A1" }, "update": { "$set": { "price": price } } }),
                )
            })
            .collect::<Vec<_>>()
    });

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(receiver.drain().len(), 1);
    assert!(logs.contains("WARN"), "logs: {logs}");
}

#[test]
fn a_disabled_outbox_still_answers() {
    let service = actions::service(
        SERVICE,
        InMemoryDocumentStore::new(SERVICE),
        EventOutbox::disabled(),
    );

    let created = service
        .dispatch(
            "find-one-and-update",
            json!({ "conditions": { "sku": "A1" }, "update": {} }),
        )
        .unwrap();
    assert_eq!(created["sku"], "A1");
}

fn config(vars: &[(&str, &str)]) -> ServiceConfig {
    ServiceConfig::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap()
}

#[test]
fn a_configured_service_stamps_its_origin_on_bus_events() {
    let config = config(&[("SERVICE_NAME", "inventory"), ("NODE_ENV", "staging")]);
    let (service, receiver) =
        actions::service_from_config(&config, InMemoryDocumentStore::new("inventory"));
    let queue = InMemoryQueue::new();
    let dispatcher = EventDispatcherThread::spawn_with_origin(
        receiver,
        queue.clone(),
        Duration::from_millis(5),
        Some(EventOrigin::from_config(&config)),
    );

    assert_eq!(service.name(), "inventory");
    service
        .dispatch(
            "find-one-and-update",
            json!({ "conditions": { "sku": "A1" }, "update": {} }),
        )
        .unwrap();
    dispatcher.stop();

    let event = queue.new_subscriber().poll(0).unwrap().unwrap();
    assert_eq!(event.event_type, "inventory.update");
    assert_eq!(event.metadata_value("namespace"), Some("orchestra-staging"));
    assert_eq!(event.metadata_value("node-id"), Some(config.node_id.as_str()));
    assert!(config.node_id.starts_with("inventory-"));
}

#[test]
fn a_configured_channel_capacity_bounds_pending_events() {
    let config = config(&[("EVENT_CHANNEL_CAPACITY", "1")]);
    let (service, receiver) =
        actions::service_from_config(&config, InMemoryDocumentStore::new("documents"));

    for sku in ["A1", "B2"] {
        service
            .dispatch(
                "find-one-and-update",
                json!({ "conditions": { "sku": sku }, "update": {} }),
            )
            .unwrap();
    }

    assert_eq!(service.name(), "documents");
    let pending = receiver.drain();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].name, "documents.update");
    assert_eq!(pending[0].payload.get("sku"), Some(&Value::from("A1")));
}
