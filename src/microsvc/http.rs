//! HTTP transport for microsvc: maps HTTP requests to action dispatch.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `POST /:action`: dispatch an action. Body = JSON params.
//! - `GET /health`: health check returning `{ "ok": true, "service": ..., "actions": [...] }`.
//!
//! Errors are returned with the status from [`ActionError::status_code`] and
//! the body from [`ActionError::to_body`].
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docstore_actions::{actions, microsvc, EventOutbox, InMemoryDocumentStore};
//!
//! let store = InMemoryDocumentStore::new("products");
//! let service = Arc::new(actions::service("products", store, EventOutbox::disabled()));
//!
//! // Get the router to compose with other axum routes
//! let app = microsvc::router(service.clone());
//!
//! // Or serve directly
//! microsvc::serve(service, "0.0.0.0:3000").await?;
//! ```
//!
//! [`ActionError::status_code`]: super::ActionError::status_code
//! [`ActionError::to_body`]: super::ActionError::to_body

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::service::Service;

/// Build an axum `Router` that dispatches actions via the given service.
pub fn router<S: Send + Sync + 'static>(service: Arc<Service<S>>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/:action", post(action_handler))
        .with_state(service)
}

/// Serve the service over HTTP at the given address (e.g. `"0.0.0.0:3000"`).
pub async fn serve<S: Send + Sync + 'static>(
    service: Arc<Service<S>>,
    addr: &str,
) -> Result<(), std::io::Error> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr, "serving actions over http");
    axum::serve(listener, app).await
}

async fn health_handler<S: Send + Sync + 'static>(
    State(service): State<Arc<Service<S>>>,
) -> impl IntoResponse {
    let mut actions = service.actions();
    actions.sort_unstable();
    Json(json!({ "ok": true, "service": service.name(), "actions": actions }))
}

async fn action_handler<S: Send + Sync + 'static>(
    State(service): State<Arc<Service<S>>>,
    Path(action): Path<String>,
    Json(params): Json<Value>,
) -> impl IntoResponse {
    match service.dispatch(&action, params) {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(e.to_body())).into_response()
        }
    }
}
