//! Runtime configuration: provider endpoints and fetch limits.
//!
//! Every field can be set by flag or environment variable.

use clap::Args;
use std::time::Duration;

pub const DEFAULT_PRIMARY_URL: &str = "http://ip-api.com/json/{ip}?fields=66846719";
pub const DEFAULT_SECONDARY_URL: &str = "https://ipinfo.io/{ip}/json";
pub const DEFAULT_TERTIARY_URL: &str = "https://ipwho.is/{ip}";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Per-fetch timeout in milliseconds.
    #[arg(long, env = "IPINTEL_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS, global = true)]
    pub timeout_ms: u64,

    /// Primary provider URL template ({ip} is substituted).
    #[arg(long, env = "IPINTEL_PRIMARY_URL", default_value = DEFAULT_PRIMARY_URL, global = true)]
    pub primary_url: String,

    /// Secondary provider URL template.
    #[arg(
        long,
        env = "IPINTEL_SECONDARY_URL",
        default_value = DEFAULT_SECONDARY_URL,
        global = true
    )]
    pub secondary_url: String,

    /// Tertiary provider URL template.
    #[arg(long, env = "IPINTEL_TERTIARY_URL", default_value = DEFAULT_TERTIARY_URL, global = true)]
    pub tertiary_url: String,

    /// User-Agent header sent to providers.
    #[arg(
        long,
        env = "IPINTEL_USER_AGENT",
        default_value = concat!("ipintel/", env!("CARGO_PKG_VERSION")),
        global = true
    )]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            primary_url: DEFAULT_PRIMARY_URL.into(),
            secondary_url: DEFAULT_SECONDARY_URL.into(),
            tertiary_url: DEFAULT_TERTIARY_URL.into(),
            user_agent: concat!("ipintel/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.primary_url.contains("{ip}"));
        assert!(config.user_agent.starts_with("ipintel/"));
    }
}
