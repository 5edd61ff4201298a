//! Path and query string assembly.

use std::borrow::Cow;

use nomad_decode::{decode, decode_list, DecodeError, Record};
use nomad_http::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Percent-encode a caller-supplied path segment.
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Append percent-encoded query pairs to `path`. Pairs without a value are
/// skipped.
pub(crate) fn with_query<'a>(
    path: &str,
    pairs: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
) -> String {
    let query: Vec<String> = pairs
        .into_iter()
        .filter_map(|(key, value)| {
            value.map(|value| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        })
        .collect();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", query.join("&"))
    }
}

/// Append `key=value` for every value. At least one value is required.
pub(crate) fn repeated(path: &str, key: &str, values: &[&str]) -> Result<String> {
    if values.is_empty() {
        return Err(Error::InvalidRequest(format!("missing {key}(es)")));
    }
    Ok(with_query(path, values.iter().map(|value| (key, Some(*value)))))
}

/// Decode a response that must hold a record.
pub(crate) fn required<R: Record>(value: &Value) -> Result<R> {
    decode(value)?.ok_or_else(|| {
        Error::Decode(DecodeError::NotAnObject {
            record: R::SCHEMA.name,
            found: "null",
        })
    })
}

/// Decode a response that may be `null`.
pub(crate) fn optional<R: Record>(value: &Value) -> Result<Option<R>> {
    Ok(decode(value)?)
}

/// Decode a list response.
pub(crate) fn list<R: Record>(value: &Value) -> Result<Vec<R>> {
    Ok(decode_list(value)?)
}

/// Deserialize a response with no record schema.
pub(crate) fn scalar<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Decode(DecodeError::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_is_encoded() {
        assert_eq!(segment("web app/1"), "web%20app%2F1");
        assert_eq!(segment("example"), "example");
    }

    #[test]
    fn test_repeated_requires_values() {
        assert_eq!(
            repeated("/v1/agent/force-leave", "node", &["a", "b c"]).unwrap(),
            "/v1/agent/force-leave?node=a&node=b%20c"
        );
        assert!(matches!(
            repeated("/v1/agent/join", "address", &[]),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/v1/jobs", [("prefix", None)]), "/v1/jobs");
        assert_eq!(
            with_query("/v1/jobs", [("prefix", Some("a&b"))]),
            "/v1/jobs?prefix=a%26b"
        );
        assert_eq!(
            with_query("/v1/agent/join", [("address", Some("1.2.3.4")), ("address", Some("5.6.7.8"))]),
            "/v1/agent/join?address=1.2.3.4&address=5.6.7.8"
        );
    }
}
