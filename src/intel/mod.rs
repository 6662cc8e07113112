//! IP intelligence subsystem.
//!
//! Normalizes answers from three independent geolocation/threat providers,
//! reconciles them field by field, scores risk, and measures distance.

pub mod batch;
pub mod distance;
pub mod fetch;
pub mod providers;
pub mod reconcile;
pub mod resolver;
pub mod risk;
pub mod types;

pub use batch::{BatchItemResult, BatchResult};
pub use distance::{distance, DistanceResult, GreatCircle};
pub use fetch::{settle_all, FetchError, Fetcher, UreqFetcher};
pub use reconcile::{reconcile, AggregatedIntelligence, Confidence};
pub use resolver::{FullReport, IntelResolver, ThreatReport};
pub use risk::{assess, RiskAssessment, RiskLevel};
pub use types::{IntelError, LookupResult, NormalizedGeoRecord, ProviderId};
