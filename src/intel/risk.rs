//! Deterministic risk scoring from normalized threat signals.

use super::types::ThreatSignals;
use serde::Serialize;
use std::fmt;

/// Score at or above which an address is high risk.
pub const HIGH_THRESHOLD: u32 = 50;
/// Score at or above which an address is medium risk.
pub const MEDIUM_THRESHOLD: u32 = 20;

/// A named reason contributing to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    ProxyOrVpn,
    DatacenterHosting,
    MobileCarrier,
    NoReverseDns,
}

impl RiskFactor {
    pub fn weight(&self) -> u32 {
        match self {
            Self::ProxyOrVpn => 40,
            Self::DatacenterHosting => 30,
            Self::MobileCarrier => 10,
            Self::NoReverseDns => 10,
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProxyOrVpn => write!(f, "proxy_or_vpn"),
            Self::DatacenterHosting => write!(f, "datacenter_hosting"),
            Self::MobileCarrier => write!(f, "mobile_carrier"),
            Self::NoReverseDns => write!(f, "no_reverse_dns"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub score: u32,
    pub level: RiskLevel,
    /// In evaluation order.
    pub factors: Vec<RiskFactor>,
}

/// Score an address. Rules are additive and evaluated in a fixed order;
/// the sum is not clamped.
pub fn assess(signals: &ThreatSignals, has_reverse_dns: bool) -> RiskAssessment {
    let rules = [
        (signals.is_proxy_or_vpn == Some(true), RiskFactor::ProxyOrVpn),
        (signals.is_hosting == Some(true), RiskFactor::DatacenterHosting),
        (signals.is_mobile == Some(true), RiskFactor::MobileCarrier),
        (!has_reverse_dns, RiskFactor::NoReverseDns),
    ];

    let factors: Vec<RiskFactor> = rules
        .into_iter()
        .filter_map(|(fired, factor)| fired.then_some(factor))
        .collect();
    let score = factors.iter().map(RiskFactor::weight).sum();

    RiskAssessment {
        score,
        level: RiskLevel::from_score(score),
        factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(proxy: bool, hosting: bool, mobile: bool) -> ThreatSignals {
        ThreatSignals {
            is_proxy_or_vpn: Some(proxy),
            is_hosting: Some(hosting),
            is_mobile: Some(mobile),
            is_anycast: None,
        }
    }

    #[test]
    fn test_everything_fires() {
        let r = assess(&signals(true, true, true), false);
        assert_eq!(r.score, 90);
        assert_eq!(r.level, RiskLevel::High);
        assert_eq!(
            r.factors,
            vec![
                RiskFactor::ProxyOrVpn,
                RiskFactor::DatacenterHosting,
                RiskFactor::MobileCarrier,
                RiskFactor::NoReverseDns,
            ]
        );
    }

    #[test]
    fn test_clean_address() {
        let r = assess(&signals(false, false, false), true);
        assert_eq!(r.score, 0);
        assert_eq!(r.level, RiskLevel::Low);
        assert!(r.factors.is_empty());
    }

    #[test]
    fn test_no_reverse_dns_only() {
        let r = assess(&signals(false, false, false), false);
        assert_eq!(r.score, 10);
        assert_eq!(r.level, RiskLevel::Low);
        assert_eq!(r.factors, vec![RiskFactor::NoReverseDns]);
    }

    #[test]
    fn test_level_boundaries() {
        // mobile + no rDNS = 20
        let r = assess(&signals(false, false, true), false);
        assert_eq!(r.score, 20);
        assert_eq!(r.level, RiskLevel::Medium);

        // proxy + no rDNS = 50
        let r = assess(&signals(true, false, false), false);
        assert_eq!(r.score, 50);
        assert_eq!(r.level, RiskLevel::High);

        assert_eq!(RiskLevel::from_score(19), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(49), RiskLevel::Medium);
    }

    #[test]
    fn test_absent_signals_do_not_score() {
        let r = assess(&ThreatSignals::default(), true);
        assert_eq!(r.score, 0);
        assert_eq!(r.level, RiskLevel::Low);
    }

    #[test]
    fn test_monotonic_in_signals() {
        let mut previous = 0;
        let steps = [
            (signals(false, false, false), true),
            (signals(false, false, false), false),
            (signals(false, false, true), false),
            (signals(false, true, true), false),
            (signals(true, true, true), false),
        ];
        for (s, rdns) in steps {
            let r = assess(&s, rdns);
            assert!(r.score >= previous);
            assert_eq!(r.score, r.factors.iter().map(RiskFactor::weight).sum::<u32>());
            previous = r.score;
        }
        assert_eq!(previous, 90);
    }

    #[test]
    fn test_factor_names() {
        let json = serde_json::to_value(assess(&signals(true, true, false), true)).unwrap();
        assert_eq!(json["factors"], serde_json::json!(["proxy_or_vpn", "datacenter_hosting"]));
        assert_eq!(json["level"], "high");
        assert_eq!(RiskFactor::NoReverseDns.to_string(), "no_reverse_dns");
    }
}
