//! Parameter validation as seen by callers.

use docstore_actions::microsvc::{ActionRequest, Service};
use docstore_actions::validator::{Check, ParamSchema, Validator};
use docstore_actions::{actions, ActionError, InMemoryDocumentStore};
use serde_json::json;

use crate::support::{capture_logs, products, SERVICE};

#[test]
fn every_violation_is_reported_and_logged() {
    let (service, _events) = products();

    let (result, logs) = capture_logs(|| {
        service.dispatch(
            "find-one-and-update",
            json!({ "conditions": "sku", "extra": true }),
        )
    });

    let err = match result {
        Err(ActionError::Validation(err)) => err,
        other => panic!("unexpected result: {other:?}"),
    };
    assert_eq!(err.kind, "ValidationError");
    let kinds: Vec<_> = err.details.iter().map(|d| d.kind.as_str()).collect();
    assert_eq!(kinds, vec!["object.base", "any.required", "object.unknown"]);
    assert_eq!(
        err.message,
        "\"conditions\" must be of type object. \"update\" is required. \"extra\" is not allowed"
    );

    assert!(logs.contains("ERROR"), "logs: {logs}");
    assert!(logs.contains("parameter validation failed"));
    assert!(logs.contains("any.required"));
}

#[test]
fn unknown_actions_are_not_found() {
    let (service, _events) = products();

    let response = service.dispatch_request(&ActionRequest {
        action: "delete-many".into(),
        params: json!({}),
    });

    assert_eq!(response.status, 404);
    assert_eq!(response.body["kind"], "UnknownAction");
}

#[test]
fn a_custom_validator_replaces_the_default() {
    struct PermitAll;

    impl Validator for PermitAll {
        fn compile(&self, _schema: &ParamSchema) -> Check {
            Box::new(|_params: &serde_json::Value| Ok(true))
        }
    }

    let service = actions::attach(
        Service::new(SERVICE, InMemoryDocumentStore::new(SERVICE)).with_validator(PermitAll),
    );

    // Schema would reject the extra key; the handler still decodes what it needs.
    let result = service
        .dispatch("find-one-and-sort", json!({ "conditions": { "sku": "A1" }, "hint": 1 }))
        .unwrap();
    assert!(result.is_null());
}

#[test]
fn every_action_is_registered() {
    let (service, _events) = products();
    let mut names = service.actions();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "convert-object-id",
            "find-one",
            "find-one-and-sort",
            "find-one-and-update"
        ]
    );
}
