//! Batch lookups with per-item failure isolation.
//!
//! Flow: partition (valid / invalid) → one lookup per valid IP, all settled
//! concurrently → results in input order. A failing item becomes an error
//! entry; the batch itself only fails on an out-of-range size.

use super::fetch::{is_valid_ip, settle_all};
use super::types::{IntelError, LookupResult};
use serde::Serialize;
use std::future::Future;
use tracing::warn;

pub const MAX_BATCH: usize = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchItemResult {
    Resolved(LookupResult),
    Failed { ip: String, error: String },
}

impl BatchItemResult {
    pub fn ip(&self) -> &str {
        match self {
            Self::Resolved(r) => &r.ip,
            Self::Failed { ip, .. } => ip,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchCount {
    pub requested: usize,
    pub valid: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub results: Vec<BatchItemResult>,
    /// Omitted entirely when every input was well-formed.
    #[serde(rename = "invalidIPs", skip_serializing_if = "Option::is_none")]
    pub invalid_ips: Option<Vec<String>>,
    pub count: BatchCount,
}

/// Split inputs by syntax, keeping relative order within each side.
pub fn partition(ips: &[String]) -> (Vec<String>, Vec<String>) {
    ips.iter()
        .map(|ip| ip.trim().to_string())
        .partition(|ip| is_valid_ip(ip))
}

/// Run `lookup` for every valid IP and assemble the batch.
pub async fn process<F, Fut>(ips: &[String], lookup: F) -> Result<BatchResult, IntelError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<LookupResult, IntelError>>,
{
    if ips.is_empty() || ips.len() > MAX_BATCH {
        return Err(IntelError::InvalidInput(format!(
            "Batch must contain between 1 and {} IPs, got {}",
            MAX_BATCH,
            ips.len()
        )));
    }

    let (valid, invalid) = partition(ips);
    let outcomes = settle_all(valid.iter().cloned().map(&lookup)).await;

    let results = valid
        .iter()
        .zip(outcomes)
        .map(|(ip, outcome)| match outcome {
            Ok(result) => BatchItemResult::Resolved(result),
            Err(e) => {
                warn!(ip = %ip, error = %e, "Batch item failed");
                BatchItemResult::Failed { ip: ip.clone(), error: e.to_string() }
            }
        })
        .collect();

    Ok(BatchResult {
        results,
        count: BatchCount {
            requested: ips.len(),
            valid: valid.len(),
            invalid: invalid.len(),
        },
        invalid_ips: if invalid.is_empty() { None } else { Some(invalid) },
    })
}
