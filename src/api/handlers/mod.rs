pub mod auth;
pub mod feeds;
pub mod posts;
pub mod users;

use axum::Json;
use serde_json::{json, Value};

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
