//! Liveness endpoints. Unauthenticated.

use axum::Json;
use chrono::Utc;
use serde_json::{Value, json};

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "MALLOPS is running",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "mallops-server",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
    }))
}
