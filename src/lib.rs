//! ipintel — what do we know about this IP address?
//!
//! Queries several independent geolocation and threat providers and produces
//! one normalized, confidence-annotated answer.

pub mod config;
pub mod intel;
pub mod server;

pub use config::Config;
pub use intel::IntelResolver;
