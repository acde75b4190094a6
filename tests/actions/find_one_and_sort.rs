//! `find-one-and-sort` through dispatch.

use docstore_actions::InMemoryDocumentStore;
use serde_json::json;

use crate::support::{doc, service_over, SERVICE};

fn tied_on_updated_at() -> InMemoryDocumentStore {
    let store = InMemoryDocumentStore::new(SERVICE).without_timestamps();
    store
        .insert(doc(json!({ "sku": "A1", "v": "older", "updatedAt": 5, "createdAt": 1 })))
        .unwrap();
    store
        .insert(doc(json!({ "sku": "A1", "v": "newer", "updatedAt": 5, "createdAt": 2 })))
        .unwrap();
    store
}

#[test]
fn empty_sort_has_no_created_at_tie_break() {
    let (service, _events) = service_over(tied_on_updated_at());

    let sorted = service
        .dispatch("find-one-and-sort", json!({ "conditions": { "sku": "A1" }, "sort": {} }))
        .unwrap();
    // Ties keep insertion order.
    assert_eq!(sorted["v"], "older");

    let absent = service
        .dispatch("find-one-and-sort", json!({ "conditions": { "sku": "A1" } }))
        .unwrap();
    assert_eq!(absent["v"], "older");

    // find-one breaks the same tie on createdAt.
    let recent = service.dispatch("find-one", json!({ "sku": "A1" })).unwrap();
    assert_eq!(recent["v"], "newer");
}

#[test]
fn multi_key_sort_keeps_key_order() {
    let store = InMemoryDocumentStore::new(SERVICE).without_timestamps();
    for (rank, price, name) in [(1, 30, "a"), (2, 10, "b"), (2, 20, "c")] {
        store
            .insert(doc(json!({ "kind": "toy", "rank": rank, "price": price, "name": name })))
            .unwrap();
    }
    let (service, _events) = service_over(store);

    let result = service
        .dispatch(
            "find-one-and-sort",
            json!({ "conditions": { "kind": "toy" }, "sort": { "rank": "desc", "price": -1 } }),
        )
        .unwrap();
    assert_eq!(result["name"], "c");

    let result = service
        .dispatch(
            "find-one-and-sort",
            json!({ "conditions": { "kind": "toy" }, "sort": { "price": "ascending", "rank": 1 } }),
        )
        .unwrap();
    assert_eq!(result["name"], "b");
}

#[test]
fn no_match_returns_null() {
    let (service, _events) = service_over(tied_on_updated_at());
    let result = service
        .dispatch("find-one-and-sort", json!({ "conditions": { "sku": "Z9" } }))
        .unwrap();
    assert!(result.is_null());
}

#[test]
fn bad_direction() {
    let (service, _events) = service_over(tied_on_updated_at());

    let err = service
        .dispatch(
            "find-one-and-sort",
            json!({ "conditions": { "sku": "A1" }, "sort": { "updatedAt": "sideways" } }),
        )
        .unwrap_err();

    assert_eq!(err.kind(), "ValidationError");
    assert_eq!(err.to_body()["data"][0]["path"], json!(["sort", "updatedAt"]));
}

#[test]
fn strict_params() {
    let (service, _events) = service_over(tied_on_updated_at());

    let missing = service
        .dispatch("find-one-and-sort", json!({ "sort": { "updatedAt": -1 } }))
        .unwrap_err();
    assert_eq!(missing.to_body()["data"][0]["type"], "any.required");

    let extra = service
        .dispatch("find-one-and-sort", json!({ "conditions": {}, "limit": 1 }))
        .unwrap_err();
    assert_eq!(extra.to_body()["data"][0]["type"], "object.unknown");
    assert_eq!(extra.to_body()["error"], "\"limit\" is not allowed");
}
