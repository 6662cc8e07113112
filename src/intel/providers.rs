//! Source adapters: ip-api.com (primary), ipinfo.io (secondary), ipwho.is (tertiary).
//!
//! Each adapter turns one provider's raw JSON into a [`NormalizedGeoRecord`].
//! Adapters never fail: a missing or wrong-typed field becomes an absent field.

use super::types::{NormalizedGeoRecord, ProviderId, RecordStatus};
use serde_json::Value;

/// Map a provider's raw response onto the common record shape.
pub fn normalize(provider: ProviderId, raw: &Value) -> NormalizedGeoRecord {
    match provider {
        ProviderId::Primary => normalize_ip_api(raw),
        ProviderId::Secondary => normalize_ipinfo(raw),
        ProviderId::Tertiary => normalize_ipwho(raw),
    }
}

// ─── Field helpers ───────────────────────────────────────────────

/// Non-empty string field. Providers send `""` for unknown values.
fn text(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numeric field, accepting numbers encoded as strings.
fn number(raw: &Value, key: &str) -> Option<f64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(raw: &Value, key: &str) -> Option<bool> {
    raw.get(key).and_then(Value::as_bool)
}

/// Split ipinfo's `"lat,lon"` into two coordinates; both or neither.
fn split_coords(loc: &str) -> Option<(f64, f64)> {
    let (lat, lon) = loc.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

/// Name part of an `"AS15169 Google LLC"` string.
fn asn_name(asn: &str) -> Option<String> {
    let (number, name) = asn.split_once(' ')?;
    if !number.starts_with("AS") {
        return None;
    }
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn failure(message: Option<String>) -> NormalizedGeoRecord {
    NormalizedGeoRecord {
        status: RecordStatus::Failure { message },
        ..NormalizedGeoRecord::empty()
    }
}

// ─── ip-api.com ──────────────────────────────────────────────────

fn normalize_ip_api(raw: &Value) -> NormalizedGeoRecord {
    if text(raw, "status").as_deref() != Some("success") {
        let mut record = failure(text(raw, "message"));
        record.ip = text(raw, "query");
        return record;
    }

    let mut record = NormalizedGeoRecord::empty();
    record.ip = text(raw, "query");

    let loc = &mut record.location;
    loc.country = text(raw, "country");
    loc.country_code = text(raw, "countryCode");
    loc.region = text(raw, "regionName").or_else(|| text(raw, "region"));
    loc.city = text(raw, "city");
    loc.postal_code = text(raw, "zip");
    loc.lat = number(raw, "lat");
    loc.lon = number(raw, "lon");
    loc.timezone = text(raw, "timezone");

    let net = &mut record.network;
    net.isp = text(raw, "isp");
    net.org = text(raw, "org");
    net.asn = text(raw, "as");
    net.asn_name = text(raw, "asname").or_else(|| net.asn.as_deref().and_then(asn_name));
    net.hostname = text(raw, "reverse");

    let threat = &mut record.threat_signals;
    threat.is_proxy_or_vpn = flag(raw, "proxy");
    threat.is_hosting = flag(raw, "hosting");
    threat.is_mobile = flag(raw, "mobile");

    record
}

// ─── ipinfo.io ───────────────────────────────────────────────────

fn normalize_ipinfo(raw: &Value) -> NormalizedGeoRecord {
    if flag(raw, "bogon") == Some(true) {
        let mut record = failure(Some("Bogon address".into()));
        record.ip = text(raw, "ip");
        return record;
    }
    if let Some(err) = raw.get("error") {
        let message = match err {
            Value::String(s) => Some(s.clone()),
            other => text(other, "message").or_else(|| text(other, "title")),
        };
        return failure(message);
    }

    let mut record = NormalizedGeoRecord::empty();
    record.ip = text(raw, "ip");

    let loc = &mut record.location;
    // ipinfo only sends the ISO code; it stands in for the country name too.
    loc.country = text(raw, "country");
    loc.country_code = loc.country.clone();
    loc.region = text(raw, "region");
    loc.city = text(raw, "city");
    loc.postal_code = text(raw, "postal");
    if let Some((lat, lon)) = text(raw, "loc").as_deref().and_then(split_coords) {
        loc.lat = Some(lat);
        loc.lon = Some(lon);
    }
    loc.timezone = text(raw, "timezone");

    let net = &mut record.network;
    // `org` carries the combined ASN string, e.g. "AS15169 Google LLC".
    net.org = text(raw, "org");
    net.asn = net.org.clone();
    net.asn_name = net.org.as_deref().and_then(asn_name);
    net.hostname = text(raw, "hostname");

    record.threat_signals.is_anycast = flag(raw, "anycast");

    record
}

// ─── ipwho.is ────────────────────────────────────────────────────

fn normalize_ipwho(raw: &Value) -> NormalizedGeoRecord {
    if flag(raw, "success") != Some(true) {
        let mut record = failure(text(raw, "message"));
        record.ip = text(raw, "ip");
        return record;
    }

    let mut record = NormalizedGeoRecord::empty();
    record.ip = text(raw, "ip");

    let loc = &mut record.location;
    loc.country = text(raw, "country");
    loc.country_code = text(raw, "country_code");
    loc.region = text(raw, "region");
    loc.city = text(raw, "city");
    loc.postal_code = text(raw, "postal");
    loc.lat = number(raw, "latitude");
    loc.lon = number(raw, "longitude");
    loc.timezone = match raw.get("timezone") {
        Some(tz @ Value::Object(_)) => text(tz, "id"),
        _ => text(raw, "timezone"),
    };

    if let Some(conn) = raw.get("connection") {
        let net = &mut record.network;
        net.isp = text(conn, "isp");
        net.org = text(conn, "org");
        net.asn = match conn.get("asn") {
            Some(Value::Number(n)) => n.as_u64().map(|n| format!("AS{}", n)),
            Some(Value::String(s)) if !s.trim().is_empty() => {
                let s = s.trim();
                if s.starts_with("AS") {
                    Some(s.to_string())
                } else {
                    Some(format!("AS{}", s))
                }
            }
            _ => None,
        };
        net.domain = text(conn, "domain");
    }

    record
}
