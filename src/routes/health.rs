use axum::response::Json;
use serde_json::json;

/// Liveness probe.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
/// - **Response**: `{"status": "pong"}` (inside the response envelope)
///
/// ```bash
/// curl http://localhost:3000/ping
/// # {"version":"1.0.0","data":{"status":"pong"}}
/// ```
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "status": "pong" }))
}
