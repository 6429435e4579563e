//! Structured request query
//!
//! Hosts hand the engine the already-parsed query string: values are scalars,
//! lists of scalars, or one level of nested mapping. [`parse_query_string`]
//! builds that shape from a raw query string using bracket notation
//! (`a=1&b[]=x&c[d]=y`).

use serde::Deserialize;
use std::collections::BTreeMap;

/// Parsed query parameters keyed by top-level name
pub type Query = BTreeMap<String, QueryValue>;

/// Value of a query parameter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Scalar(String),
    List(Vec<String>),
    Map(BTreeMap<String, QueryValue>),
}

impl QueryValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        QueryValue::Scalar(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryValue::List(values.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, QueryValue)>,
        K: Into<String>,
    {
        QueryValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            QueryValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, QueryValue>> {
        match self {
            QueryValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Whether this value is a list containing `needle`
    ///
    /// Scalars and mappings are not collections and never contain anything.
    pub fn contains(&self, needle: &str) -> bool {
        match self {
            QueryValue::List(values) => values.iter().any(|v| v == needle),
            _ => false,
        }
    }

    /// Append a repeated occurrence, turning a scalar into a list
    fn push(&mut self, value: String) {
        match self {
            QueryValue::List(values) => values.push(value),
            QueryValue::Scalar(first) => {
                let first = std::mem::take(first);
                *self = QueryValue::List(vec![first, value]);
            }
            QueryValue::Map(_) => *self = QueryValue::List(vec![value]),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Scalar(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Scalar(value)
    }
}

/// Split `name[field]` into `("name", "field")` and `name[]` into `("name", "")`.
///
/// The split happens at the last `[` of a key ending in `]`.
pub(crate) fn split_bracketed(key: &str) -> Option<(&str, &str)> {
    let body = key.strip_suffix(']')?;
    let open = body.rfind('[')?;
    Some((&body[..open], &body[open + 1..]))
}

/// Parse a raw query string (with or without the leading `?`)
pub fn parse_query_string(raw: &str) -> Query {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut query = Query::new();

    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(raw_key);
        if key.is_empty() {
            continue;
        }
        insert(&mut query, &key, decode_component(raw_value));
    }

    query
}

fn insert(query: &mut Query, key: &str, value: String) {
    match split_bracketed(key) {
        Some((name, "")) => {
            query
                .entry(name.to_string())
                .or_insert_with(|| QueryValue::List(Vec::new()))
                .push(value);
        }
        Some((name, field)) => {
            let slot = query
                .entry(name.to_string())
                .or_insert_with(|| QueryValue::Map(BTreeMap::new()));
            if !matches!(slot, QueryValue::Map(_)) {
                *slot = QueryValue::Map(BTreeMap::new());
            }
            if let QueryValue::Map(nested) = slot {
                append(nested, field, value);
            }
        }
        None => append(query, key, value),
    }
}

fn append(entries: &mut BTreeMap<String, QueryValue>, key: &str, value: String) {
    match entries.get_mut(key) {
        Some(existing) => existing.push(value),
        None => {
            entries.insert(key.to_string(), QueryValue::Scalar(value));
        }
    }
}

/// Decode `+` and percent escapes; undecodable input is kept as is
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| spaced.clone())
}
