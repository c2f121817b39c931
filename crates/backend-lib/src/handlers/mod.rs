// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers. Each one validates its input, calls a service and maps the
//! result to a status code and JSON body.

pub mod auth;
pub mod notes;
pub mod users;

use axum::Json;
use serde_json::{json, Value};

/// Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
