use axum::Json;
use serde_json::{json, Value};

// Basic liveness check
pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the SQL Chat API!" }))
}
