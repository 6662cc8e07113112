//! Core types for the intelligence subsystem.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which upstream provider a record came from, in merge priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Primary,
    Secondary,
    Tertiary,
}

impl ProviderId {
    /// All providers, highest priority first.
    pub const ALL: [ProviderId; 3] = [Self::Primary, Self::Secondary, Self::Tertiary];

    /// Public service behind this rank.
    pub fn service(&self) -> &'static str {
        match self {
            Self::Primary => "ip-api.com",
            Self::Secondary => "ipinfo.io",
            Self::Tertiary => "ipwho.is",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
            Self::Tertiary => write!(f, "tertiary"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub isp: Option<String>,
    pub org: Option<String>,
    /// `"AS<number> <name>"` or a bare `"AS<number>"`.
    pub asn: Option<String>,
    pub asn_name: Option<String>,
    /// Reverse DNS (PTR) hostname.
    pub hostname: Option<String>,
    pub domain: Option<String>,
}

/// Threat-relevant flags. `None` means the source said nothing, which is
/// distinct from an explicit `Some(false)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatSignals {
    pub is_proxy_or_vpn: Option<bool>,
    pub is_hosting: Option<bool>,
    pub is_mobile: Option<bool>,
    pub is_anycast: Option<bool>,
}

/// Outcome reported by the provider itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Failure { message: Option<String> },
}

/// One provider's answer mapped onto the common shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedGeoRecord {
    pub ip: Option<String>,
    pub location: GeoLocation,
    pub network: NetworkInfo,
    pub threat_signals: ThreatSignals,
    #[serde(flatten)]
    pub status: RecordStatus,
}

impl NormalizedGeoRecord {
    /// An empty successful record; adapters fill it in field by field.
    pub fn empty() -> Self {
        Self {
            ip: None,
            location: GeoLocation::default(),
            network: NetworkInfo::default(),
            threat_signals: ThreatSignals::default(),
            status: RecordStatus::Success,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }

    /// Whether the source reported a reverse DNS name.
    pub fn has_reverse_dns(&self) -> bool {
        self.network.hostname.is_some()
    }
}

/// Threat flags as exposed to callers.
///
/// There is no independent VPN signal upstream, so `is_vpn` mirrors `is_proxy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatFlags {
    pub is_proxy: Option<bool>,
    pub is_vpn: Option<bool>,
    pub is_hosting: Option<bool>,
    pub is_mobile: Option<bool>,
    pub is_anycast: Option<bool>,
}

impl From<ThreatSignals> for ThreatFlags {
    fn from(s: ThreatSignals) -> Self {
        Self {
            is_proxy: s.is_proxy_or_vpn,
            is_vpn: s.is_proxy_or_vpn,
            is_hosting: s.is_hosting,
            is_mobile: s.is_mobile,
            is_anycast: s.is_anycast,
        }
    }
}

/// Result of a single-source lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub ip: String,
    pub source: &'static str,
    pub location: GeoLocation,
    pub network: NetworkInfo,
    pub threat: ThreatFlags,
}

impl LookupResult {
    pub fn from_record(
        queried_ip: &str,
        provider: ProviderId,
        record: NormalizedGeoRecord,
    ) -> Self {
        Self {
            ip: record.ip.unwrap_or_else(|| queried_ip.to_string()),
            source: provider.service(),
            location: record.location,
            network: record.network,
            threat: record.threat_signals.into(),
        }
    }
}

/// Errors surfaced by the public operations.
#[derive(Debug, Error)]
pub enum IntelError {
    /// Malformed input, reported before any fetch.
    #[error("{0}")]
    InvalidInput(String),

    /// A fetch threw, timed out, or returned unusable data.
    #[error("{provider} source unavailable: {reason}")]
    SourceUnavailable { provider: ProviderId, reason: String },

    /// The provider answered but reported a non-success status.
    #[error("Lookup failed: {0}")]
    LookupFailed(String),
}

impl IntelError {
    pub fn invalid_ip(ip: &str) -> Self {
        Self::InvalidInput(format!("Invalid IP address: '{}'", ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_flat() {
        let mut record = NormalizedGeoRecord::empty();
        record.status = RecordStatus::Failure { message: Some("reserved range".into()) };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["message"], "reserved range");
        assert!(json["threatSignals"]["isProxyOrVpn"].is_null());
    }

    #[test]
    fn test_vpn_mirrors_proxy() {
        let flags = ThreatFlags::from(ThreatSignals {
            is_proxy_or_vpn: Some(false),
            is_hosting: Some(true),
            is_mobile: None,
            is_anycast: None,
        });
        assert_eq!(flags.is_vpn, Some(false));
        assert_eq!(flags.is_proxy, flags.is_vpn);
        assert_eq!(flags.is_mobile, None);
    }

    #[test]
    fn test_lookup_result_falls_back_to_queried_ip() {
        let result = LookupResult::from_record("8.8.8.8", ProviderId::Primary, NormalizedGeoRecord::empty());
        assert_eq!(result.ip, "8.8.8.8");
        assert_eq!(result.source, "ip-api.com");
    }

    #[test]
    fn test_error_messages() {
        let e = IntelError::SourceUnavailable {
            provider: ProviderId::Tertiary,
            reason: "Request timed out".into(),
        };
        assert_eq!(e.to_string(), "tertiary source unavailable: Request timed out");
        assert_eq!(IntelError::invalid_ip("1.2.3").to_string(), "Invalid IP address: '1.2.3'");
    }
}
