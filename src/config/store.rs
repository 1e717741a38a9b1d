//! Layered, read-only configuration tree with typed getters.
//!
//! # Responsibilities
//! - Layer an overlay document over a baseline with `figment` (overlay wins per leaf)
//! - Resolve dotted, case-insensitive key paths
//! - Coerce stored scalars into the requested type
//!
//! # Design Decisions
//! - Merged once at construction; no mutation afterwards
//! - Getters never fail: unset or unconvertible values yield the zero value
//! - `*_default` getters treat the zero value as "unset"; use [`ConfigStore::contains`]
//!   when an explicit zero must be told apart from a missing key

use std::time::Duration;

use figment::providers::Serialized;
use figment::value::{Dict, Num, Value};
use figment::Figment;

/// Merged configuration tree.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    figment: Figment,
}

impl ConfigStore {
    /// Build a store where `overlay` shadows `baseline` and `baseline`
    /// fills in every key the overlay omits.
    pub fn layered(baseline: Dict, overlay: Dict) -> Self {
        let figment = Figment::new()
            .merge(Serialized::defaults(normalize(baseline)))
            .merge(Serialized::defaults(normalize(overlay)));
        Self { figment }
    }

    /// Build a single-layer store.
    pub fn from_dict(dict: Dict) -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(normalize(dict))),
        }
    }

    /// The underlying figment, for extracting whole sections.
    pub fn figment(&self) -> &Figment {
        &self.figment
    }

    /// Whether `key` resolves to a stored value, whatever that value is.
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.lookup(key).and_then(to_int).unwrap_or(0)
    }

    pub fn get_uint(&self, key: &str) -> u64 {
        match self.lookup(key) {
            Some(Value::String(_, s)) => s.trim().parse().unwrap_or(0),
            _ => u64::try_from(self.get_int(key)).unwrap_or(0),
        }
    }

    pub fn get_u32(&self, key: &str) -> u32 {
        u32::try_from(self.get_uint(key)).unwrap_or(0)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        match self.lookup(key) {
            Some(Value::Bool(_, b)) => b,
            Some(Value::Num(_, num)) => num.to_i128().is_some_and(|n| n != 0),
            Some(Value::String(_, s)) => matches!(s.trim(), "true" | "TRUE" | "True" | "1" | "t" | "T"),
            _ => false,
        }
    }

    pub fn get_string(&self, key: &str) -> String {
        self.lookup(key).and_then(scalar_to_string).unwrap_or_default()
    }

    /// Durations are humantime strings (`"30s"`, `"1m 30s"`) or a number.
    ///
    /// A bare number, stored as an integer, a float or a numeric string, counts
    /// seconds rather than nanoseconds: `timeout = 30` is thirty seconds.
    pub fn get_duration(&self, key: &str) -> Duration {
        match self.lookup(key) {
            Some(Value::Num(_, Num::F32(f))) => Duration::try_from_secs_f32(f).unwrap_or_default(),
            Some(Value::Num(_, Num::F64(f))) => Duration::try_from_secs_f64(f).unwrap_or_default(),
            Some(Value::Num(_, num)) => num
                .to_u128()
                .and_then(|n| u64::try_from(n).ok())
                .map(Duration::from_secs)
                .unwrap_or_default(),
            Some(Value::String(_, s)) => parse_duration(&s).unwrap_or_default(),
            _ => Duration::ZERO,
        }
    }

    /// Arrays map element-wise; a plain string splits on whitespace.
    pub fn get_string_slice(&self, key: &str) -> Vec<String> {
        match self.lookup(key) {
            Some(Value::Array(_, items)) => items.into_iter().filter_map(scalar_to_string).collect(),
            Some(Value::String(_, s)) => s.split_whitespace().map(str::to_string).collect(),
            _ => Vec::new(),
        }
    }

    pub fn get_string_map(&self, key: &str) -> Dict {
        match self.lookup(key) {
            Some(Value::Dict(_, dict)) => dict,
            _ => Dict::new(),
        }
    }

    pub fn get_int_default(&self, key: &str, fallback: i64) -> i64 {
        or_fallback(self.get_int(key), fallback)
    }

    pub fn get_uint_default(&self, key: &str, fallback: u64) -> u64 {
        or_fallback(self.get_uint(key), fallback)
    }

    pub fn get_u32_default(&self, key: &str, fallback: u32) -> u32 {
        or_fallback(self.get_u32(key), fallback)
    }

    pub fn get_string_default(&self, key: &str, fallback: &str) -> String {
        or_fallback(self.get_string(key), fallback.to_string())
    }

    pub fn get_duration_default(&self, key: &str, fallback: Duration) -> Duration {
        or_fallback(self.get_duration(key), fallback)
    }

    pub fn get_string_slice_default(&self, key: &str, fallback: &[&str]) -> Vec<String> {
        or_fallback(
            self.get_string_slice(key),
            fallback.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn get_string_map_default(&self, key: &str, fallback: Dict) -> Dict {
        let map = self.get_string_map(key);
        if map.is_empty() {
            fallback
        } else {
            map
        }
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        self.figment.find_value(&key.to_lowercase()).ok()
    }
}

fn or_fallback<T: Default + PartialEq>(value: T, fallback: T) -> T {
    if value == T::default() {
        fallback
    } else {
        value
    }
}

/// Lower-case every key, recursively.
fn normalize(dict: Dict) -> Dict {
    dict.into_iter()
        .map(|(key, value)| (key.to_lowercase(), normalize_value(value)))
        .collect()
}

fn normalize_value(value: Value) -> Value {
    match value {
        Value::Dict(tag, inner) => Value::Dict(tag, normalize(inner)),
        Value::Array(tag, items) => Value::Array(tag, items.into_iter().map(normalize_value).collect()),
        other => other,
    }
}

fn to_int(value: Value) -> Option<i64> {
    match value {
        Value::Num(_, Num::F32(f)) => float_to_int(f64::from(f)),
        Value::Num(_, Num::F64(f)) => float_to_int(f),
        Value::Num(_, num) => num.to_i128().and_then(|n| i64::try_from(n).ok()),
        Value::Bool(_, b) => Some(i64::from(b)),
        Value::String(_, s) => parse_int(&s),
        _ => None,
    }
}

fn float_to_int(f: f64) -> Option<i64> {
    f.is_finite().then(|| f.trunc() as i64)
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(_, s) => Some(s),
        Value::Char(_, c) => Some(c.to_string()),
        Value::Bool(_, b) => Some(b.to_string()),
        Value::Num(_, Num::F32(f)) => Some(f.to_string()),
        Value::Num(_, Num::F64(f)) => Some(f.to_string()),
        Value::Num(_, num) => num
            .to_i128()
            .map(|n| n.to_string())
            .or_else(|| num.to_u128().map(|n| n.to_string())),
        _ => None,
    }
}

fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(float_to_int))
}

fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    match s.parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => humantime::parse_duration(s).ok(),
    }
}
