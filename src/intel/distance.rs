//! Great-circle distance between two resolved addresses.

use super::types::LookupResult;
use serde::Serialize;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const KM_TO_MILES: f64 = 0.621371;

/// Distance in both units, rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GreatCircle {
    pub km: f64,
    pub miles: f64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Haversine distance in km. Inputs are degrees and are not range-checked.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> GreatCircle {
    let km = haversine_km(lat1, lon1, lat2, lon2);
    GreatCircle {
        km: round2(km),
        miles: round2(km * KM_TO_MILES),
    }
}

/// One endpoint of a distance query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub ip: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl LocationSummary {
    /// `None` when the lookup carried no coordinates.
    pub fn from_lookup(lookup: &LookupResult) -> Option<Self> {
        Some(Self {
            ip: lookup.ip.clone(),
            city: lookup.location.city.clone(),
            country: lookup.location.country.clone(),
            country_code: lookup.location.country_code.clone(),
            lat: lookup.location.lat?,
            lon: lookup.location.lon?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceResult {
    pub from: LocationSummary,
    pub to: LocationSummary,
    pub distance_km: f64,
    pub distance_miles: f64,
    pub same_country: bool,
    pub same_city: bool,
}

fn same<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

impl DistanceResult {
    pub fn between(from: LocationSummary, to: LocationSummary) -> Self {
        let d = distance(from.lat, from.lon, to.lat, to.lon);
        let same_country = same(&from.country_code, &to.country_code);
        let same_city = same_country && same(&from.city, &to.city);
        Self {
            distance_km: d.km,
            distance_miles: d.miles,
            same_country,
            same_city,
            from,
            to,
        }
    }
}
