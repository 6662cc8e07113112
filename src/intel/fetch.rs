//! Fetch boundary: the JSON transport, IP syntax check, and the settle-all join.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

/// Transport failure for a single fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

/// Fetches a URL and decodes the body as JSON.
///
/// Implementations must fail on non-2xx statuses and when no response arrives
/// within `timeout`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_json(&self, url: &str, timeout: Duration) -> Result<Value, FetchError>;
}

/// Blocking ureq calls moved onto tokio's blocking pool.
pub struct UreqFetcher {
    user_agent: String,
}

impl UreqFetcher {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self { user_agent: user_agent.into() }
    }
}

#[async_trait]
impl Fetcher for UreqFetcher {
    async fn fetch_json(&self, url: &str, timeout: Duration) -> Result<Value, FetchError> {
        let url = url.to_string();
        let user_agent = self.user_agent.clone();

        let call = tokio::task::spawn_blocking(move || {
            let agent = ureq::AgentBuilder::new().timeout(timeout).build();
            let response = agent
                .get(&url)
                .set("User-Agent", &user_agent)
                .set("Accept", "application/json")
                .call()
                .map_err(|e| match e {
                    ureq::Error::Status(code, _) => FetchError::Status(code),
                    ureq::Error::Transport(t) => FetchError::Network(t.to_string()),
                })?;
            response
                .into_json::<Value>()
                .map_err(|e| FetchError::InvalidBody(e.to_string()))
        });

        // ureq's own timeout covers the socket; this one bounds the whole call.
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(FetchError::Network(join.to_string())),
            Err(_) => Err(FetchError::Timeout),
        }
    }
}

/// Syntax-only IP check: dotted-quad IPv4 or IPv6.
///
/// Parsing goes through [`IpAddr`], so compressed IPv6 forms such as `::1`
/// or `2001:db8::1` are accepted alongside the full eight-group notation.
pub fn is_valid_ip(candidate: &str) -> bool {
    candidate.parse::<IpAddr>().is_ok()
}

/// Drive every future to completion and collect each outcome in input order.
///
/// A failing future never cancels or delays its siblings.
pub async fn settle_all<T, E, F>(tasks: impl IntoIterator<Item = F>) -> Vec<Result<T, E>>
where
    F: Future<Output = Result<T, E>>,
{
    join_all(tasks).await
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::time::Instant;

    #[test]
    fn test_is_valid_ip() {
        assert!(is_valid_ip("8.8.8.8"));
        assert!(is_valid_ip("2001:4860:4860::8888"));
        assert!(is_valid_ip("2001:0db8:0000:0000:0000:ff00:0042:8329"));
        assert!(is_valid_ip("::1"));
        assert!(!is_valid_ip("256.1.1.1"));
        assert!(!is_valid_ip("1.2.3"));
        assert!(!is_valid_ip("example.com"));
        assert!(!is_valid_ip(""));
    }

    #[tokio::test]
    async fn test_settle_all_keeps_order_and_failures() {
        let tasks = (0..5u32).map(|i| async move {
            if i == 2 { Err(format!("task {} failed", i)) } else { Ok(i * 10) }
        });
        let results = settle_all(tasks).await;
        assert_eq!(results.len(), 5);
        assert_eq!(results[0], Ok(0));
        assert_eq!(results[2], Err("task 2 failed".to_string()));
        assert_eq!(results[4], Ok(40));
    }

    #[tokio::test]
    async fn test_settle_all_waits_for_slow_siblings() {
        let start = Instant::now();
        let mut tasks: Vec<Pin<Box<dyn Future<Output = Result<u32, &'static str>> + Send>>> = Vec::new();
        tasks.push(Box::pin(async { Err("fast failure") }));
        tasks.push(Box::pin(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(7)
        }));
        let results = settle_all(tasks).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(results, vec![Err("fast failure"), Ok(7)]);
    }

    #[tokio::test]
    async fn test_static_fetcher() {
        let fetcher = testing::StaticFetcher::new(|url| {
            if url.contains("down") {
                Err(FetchError::Status(503))
            } else {
                Ok(serde_json::json!({"ok": true}))
            }
        });
        let ok = fetcher.fetch_json("http://up/1.1.1.1", Duration::from_secs(1)).await;
        assert_eq!(ok.unwrap()["ok"], true);
        let err = fetcher.fetch_json("http://down/1.1.1.1", Duration::from_secs(1)).await;
        assert_eq!(err, Err(FetchError::Status(503)));
    }
}
