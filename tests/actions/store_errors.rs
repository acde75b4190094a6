//! Store failures as seen by callers: rejected requests are the caller's
//! to fix, backend trouble is not.

use docstore_actions::microsvc::ActionRequest;
use docstore_actions::{DocumentStore, ObjectId};
use serde_json::{json, Value as Json};

use crate::support::{capture_logs, doc, products, service_over, CustomIdStore, UnavailableStore};

fn request(action: &str, params: Json) -> ActionRequest {
    ActionRequest {
        action: action.into(),
        params,
    }
}

#[test]
fn query_operators_are_rejected_as_bad_input() {
    let (service, _events) = products();

    let response = service.dispatch_request(&request("find-one", json!({ "$or": [] })));

    assert_eq!(response.status, 422);
    assert_eq!(response.body["kind"], "StoreError");
    assert!(response.body["error"].as_str().unwrap().contains("$or"));
}

#[test]
fn unsupported_update_operators_are_rejected_as_bad_input() {
    let (service, events) = products();

    let response = service.dispatch_request(&request(
        "find-one-and-update",
        json!({ "conditions": { "sku": "A1" }, "update": { "$rename": { "sku": "code" } } }),
    ));

    assert_eq!(response.status, 422);
    assert_eq!(response.body["kind"], "StoreError");
    assert!(service.store().is_empty());
    assert!(events.try_recv().is_none());
}

#[test]
fn changing_an_existing_identifier_is_rejected_as_bad_input() {
    let (service, events) = products();
    let stored = service
        .store()
        .insert(doc(json!({ "sku": "A1" })))
        .unwrap();
    let other = ObjectId::new().to_hex();

    let response = service.dispatch_request(&request(
        "find-one-and-update",
        json!({ "conditions": { "sku": "A1" }, "update": { "$set": { "_id": other } } }),
    ));

    assert_eq!(response.status, 422);
    assert_eq!(response.body["kind"], "StoreError");
    let kept = service.store().find_one(&doc(json!({ "sku": "A1" })), &Default::default());
    assert_eq!(kept.unwrap().unwrap()["_id"], stored["_id"]);
    assert!(events.try_recv().is_none());
}

#[test]
fn a_string_identifier_on_insert_is_rejected_before_anything_is_stored() {
    let (service, events) = products();

    let response = service.dispatch_request(&request(
        "find-one-and-update",
        json!({ "conditions": { "sku": "A1" }, "update": { "$set": { "_id": "custom" } } }),
    ));

    assert_eq!(response.status, 422);
    assert_eq!(response.body["kind"], "StoreError");
    assert!(service.store().is_empty());
    assert!(events.try_recv().is_none());
}

#[test]
fn an_unreadable_committed_identifier_is_an_implementation_error() {
    let (service, events) = service_over(CustomIdStore::new());

    let (response, logs) = capture_logs(|| {
        service.dispatch_request(&request(
            "find-one-and-update",
            json!({ "conditions": { "sku": "A1" }, "update": { "$set": { "price": 3 } } }),
        ))
    });

    assert_eq!(response.status, 500);
    assert_eq!(response.body["kind"], "ImplementationError");
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .starts_with("re-read of upserted document failed"));
    assert_eq!(response.body["data"]["conditions"], json!({ "sku": "A1" }));
    assert_eq!(service.store().inner.len(), 1);
    assert_eq!(events.drain().len(), 1);
    assert!(logs.contains("ERROR"), "logs: {logs}");
}

#[test]
fn backend_failures_stay_server_faults() {
    let (service, events) = service_over(UnavailableStore);

    let lookup = service.dispatch_request(&request("find-one", json!({ "sku": "A1" })));
    assert_eq!(lookup.status, 500);
    assert_eq!(lookup.body["kind"], "StoreError");

    let upsert = service.dispatch_request(&request(
        "find-one-and-update",
        json!({ "conditions": { "sku": "A1" }, "update": {} }),
    ));
    assert_eq!(upsert.status, 500);
    assert!(events.try_recv().is_none());
}
