//! Layered settings loading.
//!
//! Precedence, lowest first:
//! 1. [`MemqSettings::default()`]
//! 2. the settings file, merged key by key
//! 3. environment variables
//!
//! [`MemqSettings::validate`] runs last.

use std::fmt::Display;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::{MemqSettings, GRAPH_TIMEOUT_MS_RANGE, MAX_SEMAPHORE_LIMIT};

/// `~/.memq/settings.json`.
pub fn settings_path() -> PathBuf {
    let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
    home.join(".memq").join("settings.json")
}

pub fn load_settings() -> Result<MemqSettings> {
    load_settings_from_path(&settings_path())
}

/// Load from `path`, falling back to defaults when it does not exist.
pub fn load_settings_from_path(path: &Path) -> Result<MemqSettings> {
    let mut settings = if path.exists() {
        debug!(path = %path.display(), "loading settings file");
        read_file(path)?
    } else {
        debug!(path = %path.display(), "no settings file, using defaults");
        MemqSettings::default()
    };
    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

fn read_file(path: &Path) -> Result<MemqSettings> {
    let parse_err = |source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let overlay: Value = serde_json::from_str(&raw).map_err(parse_err)?;
    if !overlay.is_object() {
        return Err(SettingsError::NotAnObject {
            path: path.to_path_buf(),
        });
    }

    let mut merged = serde_json::to_value(MemqSettings::default()).map_err(parse_err)?;
    merge_into(&mut merged, overlay);
    serde_json::from_value(merged).map_err(parse_err)
}

/// Overlay `patch` onto `base` in place.
///
/// Objects merge per key; anything else in `patch` replaces the value in
/// `base`. A `null` in `patch` leaves `base` untouched.
pub fn merge_into(base: &mut Value, patch: Value) {
    match (base, patch) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None if !value.is_null() => {
                        let _ = base_map.insert(key, value);
                    }
                    None => {}
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Environment overrides. Unparseable or out-of-range values are logged and
/// skipped.
///
/// `SEMAPHORE_LIMIT` is read for existing deployments; `MEMQ_SEMAPHORE_LIMIT`
/// wins when both are set.
pub fn apply_env_overrides(settings: &mut MemqSettings) {
    for name in ["SEMAPHORE_LIMIT", "MEMQ_SEMAPHORE_LIMIT"] {
        if let Some(v) = env_in_range(name, 1..=MAX_SEMAPHORE_LIMIT) {
            settings.queue.semaphore_limit = v;
        }
    }

    if let Some(v) = env_string("MEMQ_GROUP_ID") {
        settings.graph.group_id = v;
    }
    if let Some(v) = env_string("MEMQ_GRAPH_ENDPOINT") {
        settings.graph.endpoint = v;
    }
    if let Some(v) = env_in_range("MEMQ_GRAPH_TIMEOUT_MS", GRAPH_TIMEOUT_MS_RANGE) {
        settings.graph.timeout_ms = v;
    }

    if let Some(v) = env_string("MEMQ_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env_in_range("MEMQ_PORT", 1..=u16::MAX) {
        settings.server.port = v;
    }

    if let Some(v) = env_string("MEMQ_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(raw) = env_string("MEMQ_LOG_JSON") {
        match parse_flag(&raw) {
            Some(v) => settings.logging.json = v,
            None => warn!(key = "MEMQ_LOG_JSON", value = %raw, "not a boolean, ignoring"),
        }
    }
}

/// `true/yes/on/1` or `false/no/off/0`, any case.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `raw` as a `T` inside `range`.
pub fn parse_in_range<T>(raw: &str, range: RangeInclusive<T>) -> Option<T>
where
    T: FromStr + PartialOrd,
{
    raw.trim().parse().ok().filter(|v| range.contains(v))
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_in_range<T>(name: &str, range: RangeInclusive<T>) -> Option<T>
where
    T: FromStr + PartialOrd + Display + Clone,
{
    let raw = env_string(name)?;
    let parsed = parse_in_range(&raw, range.clone());
    if parsed.is_none() {
        warn!(
            key = name,
            value = %raw,
            "expected a number in {}..={}, ignoring",
            range.start(),
            range.end()
        );
    }
    parsed
}
