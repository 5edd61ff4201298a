//! Field codecs: named transforms from raw JSON to a field value, each paired
//! with its inverse for the structural form.
//!
//! Keeping these as named types makes the upstream-compatibility rules
//! (empty string means null, missing list means empty) visible at every field
//! declaration instead of hiding them in type defaults.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nomad_units::{Duration, Size, SizeUnit};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{DecodeError, Result};
use crate::schema::{decode, decode_list, Record};

/// A transform applied to a raw JSON value before it is stored in a field of
/// type `T`.
pub trait Codec<T> {
    /// Convert the raw value.
    fn load(raw: &Value) -> Result<T>;

    /// Convert a stored value back to the raw form `load` accepts.
    fn dump(value: &T) -> Value;
}

/// Deserialize the value as-is.
pub struct Plain;

impl<T: DeserializeOwned + Serialize> Codec<T> for Plain {
    fn load(raw: &Value) -> Result<T> {
        Ok(T::deserialize(raw)?)
    }

    fn dump(value: &T) -> Value {
        serde_json::to_value(value).unwrap_or(Value::Null)
    }
}

/// Strings where blank means absent: `""` and whitespace-only strings
/// become `None`.
pub struct StringAsNil;

impl Codec<Option<String>> for StringAsNil {
    fn load(raw: &Value) -> Result<Option<String>> {
        match raw {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            other => Err(DecodeError::unexpected("string", other)),
        }
    }

    fn dump(value: &Option<String>) -> Value {
        value.clone().map(Value::String).unwrap_or(Value::Null)
    }
}

/// Lists where `null` means empty.
pub struct NilAsArray;

impl<T: DeserializeOwned + Serialize> Codec<Vec<T>> for NilAsArray {
    fn load(raw: &Value) -> Result<Vec<T>> {
        match raw {
            Value::Null => Ok(Vec::new()),
            other => Ok(Vec::<T>::deserialize(other)?),
        }
    }

    fn dump(value: &Vec<T>) -> Value {
        serde_json::to_value(value).unwrap_or_else(|_| Value::Array(Vec::new()))
    }
}

/// A list of strings. `null` is empty, a lone string is a one-element list,
/// scalar elements are rendered to strings and null elements are dropped.
pub struct ArrayOfStrings;

impl Codec<Vec<String>> for ArrayOfStrings {
    fn load(raw: &Value) -> Result<Vec<String>> {
        match raw {
            Value::Null => Ok(Vec::new()),
            Value::String(s) => Ok(vec![s.clone()]),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Null => {}
                        Value::String(s) => out.push(s.clone()),
                        Value::Number(n) => out.push(n.to_string()),
                        Value::Bool(b) => out.push(b.to_string()),
                        other => return Err(DecodeError::unexpected("string", other)),
                    }
                }
                Ok(out)
            }
            other => Err(DecodeError::unexpected("array of strings", other)),
        }
    }

    fn dump(value: &Vec<String>) -> Value {
        Value::Array(value.iter().cloned().map(Value::String).collect())
    }
}

/// A free-form map with canonical string keys at every depth. `null` is an
/// empty map.
pub struct StringifyKeys;

impl Codec<BTreeMap<String, Value>> for StringifyKeys {
    fn load(raw: &Value) -> Result<BTreeMap<String, Value>> {
        match raw {
            Value::Null => Ok(BTreeMap::new()),
            Value::Object(object) => Ok(object
                .iter()
                .map(|(key, value)| (key.clone(), stringify_keys(value)))
                .collect()),
            other => Err(DecodeError::unexpected("object", other)),
        }
    }

    fn dump(value: &BTreeMap<String, Value>) -> Value {
        Value::Object(value.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Rebuild every object in `value`, including those nested inside arrays,
/// with canonically ordered string keys.
pub fn stringify_keys(value: &Value) -> Value {
    match value {
        Value::Object(object) => {
            let sorted: BTreeMap<String, Value> = object
                .iter()
                .map(|(key, value)| (key.clone(), stringify_keys(value)))
                .collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.iter().map(stringify_keys).collect()),
        other => other.clone(),
    }
}

/// Whole seconds since the Unix epoch.
pub struct DateAsTimestamp;

impl Codec<Option<DateTime<Utc>>> for DateAsTimestamp {
    fn load(raw: &Value) -> Result<Option<DateTime<Utc>>> {
        match raw {
            Value::Null => Ok(None),
            other => {
                let seconds = number(other)?;
                let whole = seconds.floor();
                let nanos = ((seconds - whole) * 1e9).round() as u32;
                DateTime::from_timestamp(whole as i64, nanos)
                    .map(Some)
                    .ok_or_else(|| DecodeError::Invalid(format!("timestamp {seconds} is out of range")))
            }
        }
    }

    fn dump(value: &Option<DateTime<Utc>>) -> Value {
        match value {
            Some(at) if at.timestamp_subsec_nanos() == 0 => Value::from(at.timestamp()),
            Some(at) => float(at.timestamp() as f64 + at.timestamp_subsec_nanos() as f64 / 1e9),
            None => Value::Null,
        }
    }
}

/// Nanoseconds since the Unix epoch, as used by allocation timestamps.
pub struct NanosecondsAsTimestamp;

impl Codec<Option<DateTime<Utc>>> for NanosecondsAsTimestamp {
    fn load(raw: &Value) -> Result<Option<DateTime<Utc>>> {
        match raw {
            Value::Null => Ok(None),
            Value::Number(n) => {
                let nanos = n
                    .as_i64()
                    .ok_or_else(|| DecodeError::Invalid(format!("timestamp {n} is not an integer")))?;
                Ok(Some(DateTime::from_timestamp_nanos(nanos)))
            }
            other => Err(DecodeError::unexpected("number", other)),
        }
    }

    fn dump(value: &Option<DateTime<Utc>>) -> Value {
        value
            .and_then(|at| at.timestamp_nanos_opt())
            .map(Value::from)
            .unwrap_or(Value::Null)
    }
}

/// An integer number of nanoseconds.
pub struct NanosecondsAsDuration;

impl Codec<Option<Duration>> for NanosecondsAsDuration {
    fn load(raw: &Value) -> Result<Option<Duration>> {
        match raw {
            Value::Null => Ok(None),
            other => Ok(Some(Duration::new(number(other)?))),
        }
    }

    fn dump(value: &Option<Duration>) -> Value {
        value.map(|d| float(d.nanoseconds())).unwrap_or(Value::Null)
    }
}

/// An integer number of megabytes.
pub struct SizeInMegabytes;

impl Codec<Option<Size>> for SizeInMegabytes {
    fn load(raw: &Value) -> Result<Option<Size>> {
        load_size(raw, SizeUnit::Megabyte)
    }

    fn dump(value: &Option<Size>) -> Value {
        dump_size(value, SizeUnit::Megabyte)
    }
}

/// An integer number of megabits.
pub struct SizeInMegabits;

impl Codec<Option<Size>> for SizeInMegabits {
    fn load(raw: &Value) -> Result<Option<Size>> {
        load_size(raw, SizeUnit::Megabit)
    }

    fn dump(value: &Option<Size>) -> Value {
        dump_size(value, SizeUnit::Megabit)
    }
}

fn load_size(raw: &Value, unit: SizeUnit) -> Result<Option<Size>> {
    match raw {
        Value::Null => Ok(None),
        other => Ok(Some(Size::from_unit(number(other)?, unit))),
    }
}

fn dump_size(value: &Option<Size>, unit: SizeUnit) -> Value {
    value.map(|s| float(s.in_unit(unit))).unwrap_or(Value::Null)
}

/// A nested record.
pub struct Nested;

impl<R: Record> Codec<Option<R>> for Nested {
    fn load(raw: &Value) -> Result<Option<R>> {
        decode(raw)
    }

    fn dump(value: &Option<R>) -> Value {
        value
            .as_ref()
            .map(Record::to_structural_form)
            .unwrap_or(Value::Null)
    }
}

/// A list of nested records; `null` is empty.
pub struct Records;

impl<R: Record> Codec<Vec<R>> for Records {
    fn load(raw: &Value) -> Result<Vec<R>> {
        decode_list(raw)
    }

    fn dump(value: &Vec<R>) -> Value {
        Value::Array(value.iter().map(Record::to_structural_form).collect())
    }
}

/// A map of nested records keyed by name; `null` is empty and null entries
/// are dropped.
pub struct RecordMap;

impl<R: Record> Codec<BTreeMap<String, R>> for RecordMap {
    fn load(raw: &Value) -> Result<BTreeMap<String, R>> {
        match raw {
            Value::Null => Ok(BTreeMap::new()),
            Value::Object(object) => {
                let mut out = BTreeMap::new();
                for (key, value) in object {
                    if let Some(record) = decode(value)? {
                        out.insert(key.clone(), record);
                    }
                }
                Ok(out)
            }
            other => Err(DecodeError::unexpected("object", other)),
        }
    }

    fn dump(value: &BTreeMap<String, R>) -> Value {
        Value::Object(
            value
                .iter()
                .map(|(key, record)| (key.clone(), record.to_structural_form()))
                .collect(),
        )
    }
}

fn number(raw: &Value) -> Result<f64> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| DecodeError::Invalid(format!("{n} is not representable as a float"))),
        other => Err(DecodeError::unexpected("number", other)),
    }
}

/// Whole values are written as integers so dumps look like upstream payloads.
fn float(value: f64) -> Value {
    const EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() < EXACT {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_as_nil() {
        assert_eq!(StringAsNil::load(&json!("")).unwrap(), None);
        assert_eq!(StringAsNil::load(&json!("   ")).unwrap(), None);
        assert_eq!(StringAsNil::load(&Value::Null).unwrap(), None);
        assert_eq!(StringAsNil::load(&json!("web")).unwrap(), Some("web".to_string()));
        assert!(StringAsNil::load(&json!(4)).is_err());
    }

    #[test]
    fn test_nil_as_array() {
        let empty: Vec<String> = NilAsArray::load(&Value::Null).unwrap();
        assert!(empty.is_empty());
        let ids: Vec<String> = NilAsArray::load(&json!(["a", "b"])).unwrap();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_array_of_strings() {
        assert_eq!(
            ArrayOfStrings::load(&json!(["dc1", 2, null, true])).unwrap(),
            vec!["dc1", "2", "true"]
        );
        assert_eq!(ArrayOfStrings::load(&json!("dc1")).unwrap(), vec!["dc1"]);
        assert!(ArrayOfStrings::load(&Value::Null).unwrap().is_empty());
        assert!(ArrayOfStrings::load(&json!([{"a": 1}])).is_err());
    }

    #[test]
    fn test_stringify_keys_reaches_every_depth() {
        let raw = json!({
            "b": {"z": 1, "a": [{"y": 2, "x": 3}]},
            "a": null
        });
        let map = StringifyKeys::load(&raw).unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        let nested = &map["b"]["a"][0];
        let keys: Vec<&String> = nested.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["x", "y"]);
        assert!(StringifyKeys::load(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_date_as_timestamp() {
        let at = DateAsTimestamp::load(&json!(1_495_000_000)).unwrap().unwrap();
        assert_eq!(at.timestamp(), 1_495_000_000);
        assert_eq!(DateAsTimestamp::dump(&Some(at)), json!(1_495_000_000));
        assert!(DateAsTimestamp::load(&json!("yesterday")).is_err());
    }

    #[test]
    fn test_nanoseconds_as_timestamp() {
        let at = NanosecondsAsTimestamp::load(&json!(1_495_000_000_123_456_789i64))
            .unwrap()
            .unwrap();
        assert_eq!(at.timestamp(), 1_495_000_000);
        assert_eq!(at.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn test_duration() {
        let d = NanosecondsAsDuration::load(&json!(30_000_000_000u64)).unwrap().unwrap();
        assert_eq!(d.seconds(), 30.0);
        assert_eq!(NanosecondsAsDuration::dump(&Some(d)), json!(30_000_000_000u64));
        assert!(NanosecondsAsDuration::load(&json!("30s")).is_err());
    }

    #[test]
    fn test_sizes() {
        let memory = SizeInMegabytes::load(&json!(256)).unwrap().unwrap();
        assert_eq!(memory.megabytes(), 256.0);
        assert_eq!(memory.bytes(), 256_000_000.0);
        assert_eq!(SizeInMegabytes::dump(&Some(memory)), json!(256));

        let bandwidth = SizeInMegabits::load(&json!(1000)).unwrap().unwrap();
        assert_eq!(bandwidth.megabits(), 1000.0);
        assert_eq!(bandwidth.megabytes(), 125.0);
        assert_eq!(bandwidth.to_human(), "1Gb");
    }
}
