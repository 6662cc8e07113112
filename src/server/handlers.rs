use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::intel::batch::MAX_BATCH;
use crate::intel::{IntelError, ProviderId};

use super::envelope;
use super::state::AppState;

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, IntelError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| IntelError::InvalidInput(format!("Missing '{}' parameter", name)))
}

fn log_served(op: &str, input: &str, start: Instant, ok: bool) {
    info!(
        op,
        input,
        ok,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Served"
    );
}

// ─── GET / ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct ProviderInfo {
    rank: ProviderId,
    service: &'static str,
}

#[derive(Serialize)]
struct Operation {
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct Overview {
    name: &'static str,
    version: &'static str,
    description: &'static str,
    providers: Vec<ProviderInfo>,
    operations: Vec<Operation>,
}

pub async fn overview() -> Json<Value> {
    let body = Overview {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        description: env!("CARGO_PKG_DESCRIPTION"),
        providers: ProviderId::ALL
            .iter()
            .map(|p| ProviderInfo { rank: *p, service: p.service() })
            .collect(),
        operations: vec![
            Operation { method: "GET", path: "/api/lookup?ip=", description: "Single-source lookup" },
            Operation { method: "GET", path: "/api/full?ip=", description: "Reconciled lookup across all providers" },
            Operation { method: "POST", path: "/api/batch", description: "Lookup of up to 10 IPs, body {\"ips\": [...]}" },
            Operation { method: "GET", path: "/api/threat?ip=", description: "Risk score and level" },
            Operation { method: "GET", path: "/api/distance?from=&to=", description: "Great-circle distance between two IPs" },
        ],
    };
    envelope(Ok::<_, IntelError>(body), Value::Null)
}

// ─── GET /api/lookup, /api/full, /api/threat ─────────────────────

#[derive(Deserialize)]
pub struct IpQuery {
    pub ip: Option<String>,
}

pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IpQuery>,
) -> Json<Value> {
    let start = Instant::now();
    let result = match required(&params.ip, "ip") {
        Ok(ip) => state.resolver.lookup(ip).await,
        Err(e) => Err(e),
    };
    log_served("lookup", params.ip.as_deref().unwrap_or(""), start, result.is_ok());
    envelope(result, json!({ "ip": params.ip }))
}

pub async fn full(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IpQuery>,
) -> Json<Value> {
    let start = Instant::now();
    let result = match required(&params.ip, "ip") {
        Ok(ip) => state.resolver.full(ip).await,
        Err(e) => Err(e),
    };
    log_served("full", params.ip.as_deref().unwrap_or(""), start, result.is_ok());
    envelope(result, json!({ "ip": params.ip }))
}

pub async fn threat(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IpQuery>,
) -> Json<Value> {
    let start = Instant::now();
    let result = match required(&params.ip, "ip") {
        Ok(ip) => state.resolver.threat(ip).await,
        Err(e) => Err(e),
    };
    log_served("threat", params.ip.as_deref().unwrap_or(""), start, result.is_ok());
    envelope(result, json!({ "ip": params.ip }))
}

// ─── POST /api/batch ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BatchBody {
    #[serde(default)]
    pub ips: Vec<String>,
}

pub async fn batch(State(state): State<Arc<AppState>>, Json(body): Json<BatchBody>) -> Json<Value> {
    let start = Instant::now();
    let result = state.resolver.batch(&body.ips).await;
    let detail = format!("{} ips (max {})", body.ips.len(), MAX_BATCH);
    log_served("batch", &detail, start, result.is_ok());
    envelope(result, json!({ "ips": body.ips }))
}

// ─── GET /api/distance ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct DistanceQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn distance(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DistanceQuery>,
) -> Json<Value> {
    let start = Instant::now();
    let result = match (required(&params.from, "from"), required(&params.to, "to")) {
        (Ok(from), Ok(to)) => state.resolver.distance(from, to).await,
        (Err(e), _) | (_, Err(e)) => Err(e),
    };
    let input = format!(
        "{} -> {}",
        params.from.as_deref().unwrap_or(""),
        params.to.as_deref().unwrap_or("")
    );
    log_served("distance", &input, start, result.is_ok());
    envelope(result, json!({ "from": params.from, "to": params.to }))
}
