//! Intelligence resolver — orchestrates provider fetches for each public operation.
//!
//! Lookup:   validate → primary → normalize
//! Full:     validate → primary ∥ secondary ∥ tertiary (settle-all) → reconcile
//! Batch:    partition → lookup per valid IP (settle-all) → isolate failures
//! Threat:   lookup → risk rules
//! Distance: lookup ∥ lookup → haversine

use super::batch::{self, BatchResult};
use super::distance::{DistanceResult, LocationSummary};
use super::fetch::{is_valid_ip, settle_all, Fetcher, UreqFetcher};
use super::providers;
use super::reconcile::{reconcile, AggregatedIntelligence};
use super::risk::{self, RiskAssessment};
use super::types::{
    GeoLocation, IntelError, LookupResult, NetworkInfo, NormalizedGeoRecord, ProviderId,
    RecordStatus, ThreatFlags,
};
use crate::config::Config;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reconciled record plus the time it was assembled.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullReport {
    #[serde(flatten)]
    pub intel: AggregatedIntelligence,
    pub queried_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatReport {
    pub ip: String,
    pub risk: RiskAssessment,
    pub signals: ThreatFlags,
    pub has_reverse_dns: bool,
    pub network: NetworkInfo,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

pub struct IntelResolver {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
}

impl IntelResolver {
    pub fn new(config: Config) -> Self {
        let fetcher = Arc::new(UreqFetcher::new(config.user_agent.clone()));
        Self { config, fetcher }
    }

    /// Create a resolver with a specific transport (for testing).
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn endpoint(&self, provider: ProviderId, ip: &str) -> String {
        let template = match provider {
            ProviderId::Primary => &self.config.primary_url,
            ProviderId::Secondary => &self.config.secondary_url,
            ProviderId::Tertiary => &self.config.tertiary_url,
        };
        template.replace("{ip}", ip)
    }

    /// Fetch and normalize one provider's answer.
    ///
    /// Transport failures become `SourceUnavailable`; a provider-reported
    /// failure becomes `LookupFailed`.
    pub async fn fetch_record(
        &self,
        provider: ProviderId,
        ip: &str,
    ) -> Result<NormalizedGeoRecord, IntelError> {
        debug!(provider = %provider, ip = %ip, "Querying provider");
        let raw = self
            .fetcher
            .fetch_json(&self.endpoint(provider, ip), self.config.timeout())
            .await
            .map_err(|e| IntelError::SourceUnavailable {
                provider,
                reason: e.to_string(),
            })?;

        let record = providers::normalize(provider, &raw);
        match &record.status {
            RecordStatus::Success => {
                debug!(provider = %provider, ip = %ip, "Provider answered");
                Ok(record)
            }
            RecordStatus::Failure { message } => {
                let message = message.clone().unwrap_or_else(|| {
                    format!("{} reported failure for {}", provider.service(), ip)
                });
                Err(IntelError::LookupFailed(message))
            }
        }
    }

    fn validate(ip: &str) -> Result<&str, IntelError> {
        let ip = ip.trim();
        if is_valid_ip(ip) {
            Ok(ip)
        } else {
            Err(IntelError::invalid_ip(ip))
        }
    }

    /// Single-source lookup against the primary provider.
    pub async fn lookup(&self, ip: &str) -> Result<LookupResult, IntelError> {
        let ip = Self::validate(ip)?;
        let record = self.fetch_record(ProviderId::Primary, ip).await?;
        Ok(LookupResult::from_record(ip, ProviderId::Primary, record))
    }

    /// Query all providers concurrently and merge whatever came back.
    pub async fn full(&self, ip: &str) -> Result<FullReport, IntelError> {
        let ip = Self::validate(ip)?;

        let mut outcomes = settle_all(ProviderId::ALL.map(|p| self.fetch_record(p, ip)))
            .await
            .into_iter();
        let records: [Option<NormalizedGeoRecord>; 3] =
            ProviderId::ALL.map(|provider| match outcomes.next()? {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(provider = %provider, ip = %ip, error = %e, "Source degraded to absent");
                    None
                }
            });

        let mut intel = reconcile(records.each_ref().map(Option::as_ref));
        if intel.ip.is_none() {
            intel.ip = Some(ip.to_string());
        }
        Ok(FullReport { intel, queried_at: Utc::now() })
    }

    /// Look up 1..=10 addresses; one bad item never fails the batch.
    pub async fn batch(&self, ips: &[String]) -> Result<BatchResult, IntelError> {
        batch::process(ips, |ip| async move { self.lookup(&ip).await }).await
    }

    /// Risk assessment from the primary provider's signals.
    pub async fn threat(&self, ip: &str) -> Result<ThreatReport, IntelError> {
        let ip = Self::validate(ip)?;
        let record = self.fetch_record(ProviderId::Primary, ip).await?;
        let has_reverse_dns = record.has_reverse_dns();
        let risk = risk::assess(&record.threat_signals, has_reverse_dns);
        let GeoLocation { country, country_code, .. } = record.location;

        Ok(ThreatReport {
            ip: record.ip.unwrap_or_else(|| ip.to_string()),
            risk,
            signals: record.threat_signals.into(),
            has_reverse_dns,
            network: record.network,
            country,
            country_code,
        })
    }

    /// Great-circle distance between two addresses, each resolved independently.
    pub async fn distance(&self, from: &str, to: &str) -> Result<DistanceResult, IntelError> {
        let from = Self::validate(from)?;
        let to = Self::validate(to)?;

        // Both sides always run to completion.
        let (a, b) = futures::join!(self.lookup(from), self.lookup(to));

        let summarize = |side: &str, ip: &str, outcome: Result<LookupResult, IntelError>| {
            let lookup = outcome
                .map_err(|e| IntelError::LookupFailed(format!("{} ({}): {}", side, ip, e)))?;
            LocationSummary::from_lookup(&lookup).ok_or_else(|| {
                IntelError::LookupFailed(format!("{} ({}): no coordinates available", side, ip))
            })
        };

        let from = summarize("from", from, a)?;
        let to = summarize("to", to, b)?;
        Ok(DistanceResult::between(from, to))
    }
}
