//! Multi-source reconciliation.
//!
//! Every output field takes the first present value in provider order
//! primary → secondary → tertiary. A present `false` wins like any other value;
//! only an absent field falls through. Failed records contribute nothing.

use super::types::{GeoLocation, NetworkInfo, NormalizedGeoRecord, ThreatFlags, ThreatSignals};
use serde::Serialize;

/// How many sources were asked and how many gave a usable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Confidence {
    pub sources_queried: u32,
    pub sources_responded: u32,
}

/// The merged view over all responding sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedIntelligence {
    pub ip: Option<String>,
    pub location: GeoLocation,
    pub network: NetworkInfo,
    pub threat: ThreatFlags,
    pub confidence: Confidence,
}

impl AggregatedIntelligence {
    /// Merged signals before the proxy/VPN aliasing of [`ThreatFlags`].
    pub fn signals(&self) -> ThreatSignals {
        ThreatSignals {
            is_proxy_or_vpn: self.threat.is_proxy,
            is_hosting: self.threat.is_hosting,
            is_mobile: self.threat.is_mobile,
            is_anycast: self.threat.is_anycast,
        }
    }
}

/// First present value across the layers, in order.
fn pick<T: Clone>(
    layers: &[&NormalizedGeoRecord],
    field: impl Fn(&NormalizedGeoRecord) -> &Option<T>,
) -> Option<T> {
    layers.iter().find_map(|&record| field(record).clone())
}

/// Merge up to three provider records, given in priority order.
pub fn reconcile(records: [Option<&NormalizedGeoRecord>; 3]) -> AggregatedIntelligence {
    let layers: Vec<&NormalizedGeoRecord> = records
        .iter()
        .flatten()
        .copied()
        .filter(|r| r.is_success())
        .collect();
    let l = layers.as_slice();

    let location = GeoLocation {
        country: pick(l, |r| &r.location.country),
        country_code: pick(l, |r| &r.location.country_code),
        region: pick(l, |r| &r.location.region),
        city: pick(l, |r| &r.location.city),
        postal_code: pick(l, |r| &r.location.postal_code),
        lat: pick(l, |r| &r.location.lat),
        lon: pick(l, |r| &r.location.lon),
        timezone: pick(l, |r| &r.location.timezone),
    };

    let network = NetworkInfo {
        isp: pick(l, |r| &r.network.isp),
        org: pick(l, |r| &r.network.org),
        asn: pick(l, |r| &r.network.asn),
        asn_name: pick(l, |r| &r.network.asn_name),
        hostname: pick(l, |r| &r.network.hostname),
        domain: pick(l, |r| &r.network.domain),
    };

    let signals = ThreatSignals {
        is_proxy_or_vpn: pick(l, |r| &r.threat_signals.is_proxy_or_vpn),
        is_hosting: pick(l, |r| &r.threat_signals.is_hosting),
        is_mobile: pick(l, |r| &r.threat_signals.is_mobile),
        is_anycast: pick(l, |r| &r.threat_signals.is_anycast),
    };

    AggregatedIntelligence {
        ip: pick(l, |r| &r.ip),
        location,
        network,
        threat: signals.into(),
        confidence: Confidence {
            sources_queried: records.len() as u32,
            sources_responded: layers.len() as u32,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::types::RecordStatus;

    fn primary() -> NormalizedGeoRecord {
        let mut r = NormalizedGeoRecord::empty();
        r.ip = Some("8.8.8.8".into());
        r.location.country = Some("United States".into());
        r.location.country_code = Some("US".into());
        r.location.city = Some("Ashburn".into());
        r.location.lat = Some(39.03);
        r.location.lon = Some(-77.5);
        r.network.isp = Some("Google LLC".into());
        r.network.asn = Some("AS15169 Google LLC".into());
        r.threat_signals.is_proxy_or_vpn = Some(false);
        r.threat_signals.is_hosting = Some(true);
        r
    }

    fn secondary() -> NormalizedGeoRecord {
        let mut r = NormalizedGeoRecord::empty();
        r.ip = Some("8.8.8.8".into());
        r.location.country = Some("CA".into());
        r.location.country_code = Some("CA".into());
        r.location.city = Some("Mountain View".into());
        r.location.postal_code = Some("94043".into());
        r.location.lat = Some(37.4);
        r.location.lon = Some(-122.1);
        r.network.org = Some("AS15169 Google LLC".into());
        r.network.asn = Some("AS15169 Google LLC".into());
        r.network.hostname = Some("dns.google".into());
        r.threat_signals.is_anycast = Some(true);
        r
    }

    fn tertiary() -> NormalizedGeoRecord {
        let mut r = NormalizedGeoRecord::empty();
        r.ip = Some("8.8.8.8".into());
        r.location.country = Some("Canada".into());
        r.location.region = Some("Ontario".into());
        r.network.isp = Some("Other ISP".into());
        r.network.asn = Some("AS15169".into());
        r.network.domain = Some("google.com".into());
        r.threat_signals.is_proxy_or_vpn = Some(true);
        r.threat_signals.is_mobile = Some(true);
        r
    }

    #[test]
    fn test_no_sources() {
        let merged = reconcile([None, None, None]);
        assert_eq!(merged.confidence, Confidence { sources_queried: 3, sources_responded: 0 });
        assert_eq!(merged.location, GeoLocation::default());
        assert_eq!(merged.network, NetworkInfo::default());
        assert_eq!(merged.ip, None);
    }

    #[test]
    fn test_primary_only_is_identity() {
        let p = primary();
        let merged = reconcile([Some(&p), None, None]);
        assert_eq!(merged.confidence.sources_responded, 1);
        assert_eq!(merged.location, p.location);
        assert_eq!(merged.network, p.network);
        assert_eq!(merged.signals(), p.threat_signals);
    }

    #[test]
    fn test_secondary_only() {
        let s = secondary();
        let merged = reconcile([None, Some(&s), None]);
        assert_eq!(merged.confidence.sources_responded, 1);
        assert_eq!(merged.location, s.location);
        assert_eq!(merged.network.asn.as_deref(), Some("AS15169 Google LLC"));
        assert_eq!(merged.threat.is_proxy, None);
    }

    #[test]
    fn test_all_three_conflicting() {
        let (p, s, t) = (primary(), secondary(), tertiary());
        let merged = reconcile([Some(&p), Some(&s), Some(&t)]);
        assert_eq!(merged.confidence, Confidence { sources_queried: 3, sources_responded: 3 });

        assert_eq!(merged.location.country.as_deref(), Some("United States"));
        assert_eq!(merged.location.country_code.as_deref(), Some("US"));
        assert_eq!(merged.location.city.as_deref(), Some("Ashburn"));
        assert_eq!(merged.location.lat, Some(39.03));
        // gaps in primary fall through to the next present source
        assert_eq!(merged.location.postal_code.as_deref(), Some("94043"));
        assert_eq!(merged.location.region.as_deref(), Some("Ontario"));

        assert_eq!(merged.network.isp.as_deref(), Some("Google LLC"));
        assert_eq!(merged.network.asn.as_deref(), Some("AS15169 Google LLC"));
        assert_eq!(merged.network.hostname.as_deref(), Some("dns.google"));
        assert_eq!(merged.network.domain.as_deref(), Some("google.com"));

        // primary's explicit false beats tertiary's true
        assert_eq!(merged.threat.is_proxy, Some(false));
        assert_eq!(merged.threat.is_vpn, Some(false));
        assert_eq!(merged.threat.is_mobile, Some(true));
        assert_eq!(merged.threat.is_anycast, Some(true));
    }

    #[test]
    fn test_secondary_beats_tertiary_when_primary_absent() {
        let (s, t) = (secondary(), tertiary());
        let merged = reconcile([None, Some(&s), Some(&t)]);
        assert_eq!(merged.confidence.sources_responded, 2);
        assert_eq!(merged.location.country.as_deref(), Some("CA"));
        assert_eq!(merged.location.city.as_deref(), Some("Mountain View"));
        // secondary has no region or domain, so tertiary fills them
        assert_eq!(merged.location.region.as_deref(), Some("Ontario"));
        assert_eq!(merged.network.domain.as_deref(), Some("google.com"));
        assert_eq!(merged.network.asn.as_deref(), Some("AS15169 Google LLC"));
        assert_eq!(merged.threat.is_proxy, Some(true));
    }

    #[test]
    fn test_asn_fallback_chain() {
        let mut p = primary();
        p.network.asn = None;
        let (s, t) = (secondary(), tertiary());
        let merged = reconcile([Some(&p), Some(&s), Some(&t)]);
        assert_eq!(merged.network.asn.as_deref(), Some("AS15169 Google LLC"));

        let merged = reconcile([Some(&p), None, Some(&t)]);
        assert_eq!(merged.network.asn.as_deref(), Some("AS15169"));
    }

    #[test]
    fn test_failed_record_contributes_nothing() {
        let mut p = primary();
        p.status = RecordStatus::Failure { message: Some("quota".into()) };
        let t = tertiary();
        let merged = reconcile([Some(&p), None, Some(&t)]);
        assert_eq!(merged.confidence.sources_responded, 1);
        assert_eq!(merged.location.country.as_deref(), Some("Canada"));
        assert_eq!(merged.threat.is_proxy, Some(true));
        assert_eq!(merged.location.city, None);
    }
}
