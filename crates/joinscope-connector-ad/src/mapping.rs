//! Computer object mapping.
//!
//! Converts LDAP search entries for `computer` objects into directory device
//! records:
//! - cn (or name) -> record name
//! - distinguishedName, dNSHostName, operatingSystem, operatingSystemVersion,
//!   description -> string attributes
//! - lastLogonTimestamp (FILETIME) -> timestamp attribute
//! - whenCreated, whenChanged (generalized time) -> timestamp attributes
//! - userAccountControl -> integer attribute plus `enabled` (bit 0x2 = disabled)

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use joinscope_core::{AttributeValue, Attributes, DeviceRecord, DeviceSource};
use ldap3::SearchEntry;
use tracing::warn;

/// userAccountControl bit for a disabled account.
pub const UAC_ACCOUNTDISABLE: i64 = 0x2;

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// Attributes requested from the directory.
pub fn computer_attributes() -> Vec<&'static str> {
    vec![
        "cn",
        "name",
        "distinguishedName",
        "dNSHostName",
        "operatingSystem",
        "operatingSystemVersion",
        "description",
        "lastLogonTimestamp",
        "whenCreated",
        "whenChanged",
        "userAccountControl",
    ]
}

/// Map a computer entry to a directory record.
///
/// Returns `None` if the entry carries no usable name.
pub fn map_computer_entry(entry: &SearchEntry) -> Option<DeviceRecord> {
    let name = first(entry, "cn")
        .or_else(|| first(entry, "name"))
        .map(str::trim)
        .filter(|n| !n.is_empty())?;

    let mut attrs = Attributes::new();
    let dn = first(entry, "distinguishedName").unwrap_or(&entry.dn);
    if !dn.is_empty() {
        attrs.set("distinguishedName", dn);
    }

    for key in [
        "dNSHostName",
        "operatingSystem",
        "operatingSystemVersion",
        "description",
    ] {
        if let Some(value) = first(entry, key).filter(|v| !v.is_empty()) {
            attrs.set(key, value);
        }
    }

    if let Some(raw) = first(entry, "lastLogonTimestamp") {
        match raw.parse::<i64>().ok().and_then(filetime_to_datetime) {
            Some(ts) => attrs.set("lastLogonTimestamp", ts),
            None => warn!(name, value = raw, "Ignoring unparseable lastLogonTimestamp"),
        }
    }

    for key in ["whenCreated", "whenChanged"] {
        if let Some(raw) = first(entry, key) {
            match parse_generalized_time(raw) {
                Some(ts) => attrs.set(key, ts),
                None => warn!(name, attribute = key, value = raw, "Ignoring unparseable timestamp"),
            }
        }
    }

    if let Some(uac) = first(entry, "userAccountControl").and_then(|v| v.parse::<i64>().ok()) {
        attrs.set("userAccountControl", uac);
        attrs.set("enabled", uac & UAC_ACCOUNTDISABLE == 0);
    }

    Some(DeviceRecord::new(DeviceSource::Directory, name).with_attributes(attrs))
}

/// Whether a mapped record belongs to a disabled computer account.
pub fn is_disabled(record: &DeviceRecord) -> bool {
    matches!(
        record.attributes.get("enabled"),
        Some(AttributeValue::Boolean(false))
    )
}

/// Convert a Windows FILETIME (100ns ticks since 1601) to UTC.
///
/// Zero means "never" and yields `None`.
pub fn filetime_to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    if ticks <= 0 {
        return None;
    }
    let secs = ticks / 10_000_000 - FILETIME_UNIX_OFFSET_SECS;
    let nanos = u32::try_from((ticks % 10_000_000) * 100).ok()?;
    DateTime::from_timestamp(secs, nanos)
}

/// Parse LDAP generalized time as AD emits it (`20240115093000.0Z`).
pub fn parse_generalized_time(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim().trim_end_matches('Z');
    let base = trimmed.split('.').next().unwrap_or(trimmed);
    NaiveDateTime::parse_from_str(base, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn first<'a>(entry: &'a SearchEntry, key: &str) -> Option<&'a str> {
    entry
        .attrs
        .get(key)
        .and_then(|values| values.first())
        .map(String::as_str)
}
