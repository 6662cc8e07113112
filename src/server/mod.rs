mod handlers;
mod state;

use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use serde_json::{json, Value};
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::intel::{IntelError, IntelResolver};

/// Wrap an operation outcome as `{"output": ...}`.
///
/// Failures become `{"output": {"error": ..., <echoed inputs>}}`; nothing is
/// reported as a protocol-level error.
pub fn envelope<T: Serialize>(result: Result<T, IntelError>, echo: Value) -> Json<Value> {
    let output = match result.map(serde_json::to_value) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => json!({ "error": format!("Failed to encode result: {}", e) }),
        Err(e) => {
            let mut body = json!({ "error": e.to_string() });
            if let (Some(body), Value::Object(echo)) = (body.as_object_mut(), echo) {
                for (key, value) in echo {
                    body.entry(key).or_insert(value);
                }
            }
            body
        }
    };
    Json(json!({ "output": output }))
}

pub fn build_router(resolver: IntelResolver) -> Router {
    let state = Arc::new(AppState { resolver });

    Router::new()
        .route("/", get(handlers::overview))
        .route("/api/lookup", get(handlers::lookup))
        .route("/api/full", get(handlers::full))
        .route("/api/batch", post(handlers::batch))
        .route("/api/threat", get(handlers::threat))
        .route("/api/distance", get(handlers::distance))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, resolver: IntelResolver) {
    let app = build_router(resolver);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(addr = %addr, error = %e, "Cannot bind");
            std::process::exit(1);
        });

    info!(addr = %addr, "ipintel server listening");

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Server error");
            std::process::exit(1);
        });
}
