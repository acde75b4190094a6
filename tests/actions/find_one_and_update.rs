//! `find-one-and-update` through dispatch.

use std::sync::Arc;
use std::thread;

use docstore_actions::value::document_to_json;
use docstore_actions::{InMemoryDocumentStore, UpsertOptions};
use serde_json::{json, Value as Json};

use crate::support::{
    capture_logs, doc, products, service_over, MissingIdStore, RecordingStore, StaleReturnStore,
    SERVICE,
};

fn upsert_params(sku: &str, price: i64) -> Json {
    json!({ "conditions": { "sku": sku }, "update": { "$set": { "price": price } } })
}

#[test]
fn creates_then_updates_in_place() {
    let (service, events) = products();

    let created = service
        .dispatch("find-one-and-update", upsert_params("A1", 10))
        .unwrap();
    assert_eq!(created["sku"], "A1");
    assert_eq!(created["price"], 10);
    assert!(created["_id"].is_string());
    assert!(created["createdAt"].is_string());

    let first_events = events.drain();
    assert_eq!(first_events.len(), 1);
    assert_eq!(first_events[0].name, "products.update");

    let updated = service
        .dispatch("find-one-and-update", upsert_params("A1", 12))
        .unwrap();
    assert_eq!(updated["_id"], created["_id"]);
    assert_eq!(updated["price"], 12);
    assert_eq!(service.store().len(), 1);
    assert_eq!(events.drain().len(), 1);
}

#[test]
fn result_equals_a_subsequent_read() {
    let (service, _events) = products();

    let upserted = service
        .dispatch("find-one-and-update", upsert_params("A1", 10))
        .unwrap();
    let read = service
        .dispatch("find-one", json!({ "_id": upserted["_id"] }))
        .unwrap();

    assert_eq!(upserted, read);
}

#[test]
fn result_is_the_re_read_even_when_the_upsert_returns_something_else() {
    let (service, events) = service_over(StaleReturnStore::new());

    let upserted = service
        .dispatch("find-one-and-update", upsert_params("A1", 10))
        .unwrap();
    let read = service
        .dispatch("find-one", json!({ "_id": upserted["_id"] }))
        .unwrap();

    assert_eq!(upserted, read);
    assert!(upserted.get("stale").is_none());
    assert_eq!(events.drain().len(), 1);
}

#[test]
fn event_payload_is_the_stored_document() {
    let (service, events) = products();

    let upserted = service
        .dispatch("find-one-and-update", upsert_params("A1", 10))
        .unwrap();

    let event = events.try_recv().unwrap();
    assert_eq!(event.name, "products.update");
    assert_eq!(document_to_json(&event.payload), upserted);
}

#[test]
fn upsert_and_defaults_are_forced_on() {
    let store = RecordingStore::new();
    let (service, _events) = service_over(store.clone());

    service
        .dispatch(
            "find-one-and-update",
            json!({
                "conditions": { "sku": "A1" },
                "update": { "$set": { "price": 1 } },
                "options": { "upsert": false, "setDefaultsOnInsert": false }
            }),
        )
        .unwrap();

    assert_eq!(store.recorded(), vec![UpsertOptions::default()]);
}

#[test]
fn defaults_are_applied_on_insert() {
    let store = InMemoryDocumentStore::new(SERVICE)
        .with_defaults(doc(json!({ "status": "draft", "stock": 0 })));
    let (service, _events) = service_over(store);

    let created = service
        .dispatch(
            "find-one-and-update",
            json!({ "conditions": { "sku": "A1" }, "update": { "$set": { "stock": 5 } } }),
        )
        .unwrap();

    assert_eq!(created["status"], "draft");
    assert_eq!(created["stock"], 5);
}

#[test]
fn malformed_identifier_touches_nothing() {
    let store = RecordingStore::new();
    let (service, events) = service_over(store.clone());

    let err = service
        .dispatch(
            "find-one-and-update",
            json!({ "conditions": { "_id": "xyz" }, "update": { "$set": { "a": 1 } } }),
        )
        .unwrap_err();

    assert_eq!(err.kind(), "MalformedIdentifier");
    assert!(store.recorded().is_empty());
    assert!(events.try_recv().is_none());
}

#[test]
fn missing_identifier_is_an_implementation_error() {
    let (service, events) = service_over(MissingIdStore);

    let (result, logs) =
        capture_logs(|| service.dispatch("find-one-and-update", upsert_params("A1", 10)));
    let err = result.unwrap_err();

    assert_eq!(err.kind(), "ImplementationError");
    assert_eq!(err.status_code(), 500);
    let body = err.to_body();
    assert_eq!(body["data"]["conditions"], json!({ "sku": "A1" }));
    assert_eq!(body["data"]["update"], json!({ "$set": { "price": 10 } }));
    assert_eq!(body["data"]["options"]["upsert"], true);
    assert!(logs.contains("ERROR"), "logs: {logs}");
    assert!(events.try_recv().is_none());
}

#[test]
fn options_are_strict() {
    let (service, _events) = products();

    let err = service
        .dispatch(
            "find-one-and-update",
            json!({
                "conditions": { "sku": "A1" },
                "update": {},
                "options": { "multi": true, "new": "yes" }
            }),
        )
        .unwrap_err();

    assert_eq!(err.kind(), "ValidationError");
    let details = err.to_body()["data"].clone();
    let paths: Vec<Json> = details.as_array().unwrap().iter().map(|d| d["path"].clone()).collect();
    assert!(paths.contains(&json!(["options", "new"])));
    assert!(paths.contains(&json!(["options", "multi"])));
}

#[test]
fn update_is_required() {
    let (service, _events) = products();
    let err = service
        .dispatch("find-one-and-update", json!({ "conditions": { "sku": "A1" } }))
        .unwrap_err();
    assert_eq!(err.to_body()["error"], "\"update\" is required");
}

#[test]
fn logs_identifier_only() {
    let (service, _events) = products();

    let (result, logs) = capture_logs(|| {
        service.dispatch(
            "find-one-and-update",
            json!({ "conditions": { "sku": "A1" }, "update": { "$set": { "secret": "hunter2" } } }),
        )
    });
    let created = result.unwrap();

    assert!(logs.contains(created["_id"].as_str().unwrap()));
    assert!(logs.contains("find-one-and-update"));
    assert!(!logs.contains("hunter2"));
}

#[test]
fn concurrent_upserts_on_one_key_create_one_document() {
    let (service, events) = products();
    let service = Arc::new(service);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                service
                    .dispatch(
                        "find-one-and-update",
                        json!({ "conditions": { "sku": "A1" }, "update": { "$inc": { "hits": 1 } } }),
                    )
                    .unwrap()
            })
        })
        .collect();

    let ids: Vec<Json> = handles
        .into_iter()
        .map(|h| h.join().unwrap()["_id"].clone())
        .collect();

    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(service.store().len(), 1);
    assert_eq!(events.drain().len(), 8);

    let read = service.dispatch("find-one", json!({ "sku": "A1" })).unwrap();
    assert_eq!(read["hits"], 8);
}
