use axum::{response::IntoResponse, Json};
use serde_json::json;

use crate::SERVICE_NAME;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}
