//! Filter rejection evaluation
//!
//! A filter rejection vetoes an otherwise allowed request when the query
//! contains a given key (optionally with a given value). Keys come in three
//! forms:
//!
//! - `name` matches a top-level parameter; the value must equal it
//! - `name[field]` matches a field of a nested parameter (`name[field]=v`)
//! - `name[]` matches a list parameter; the value must be one of its items
//!
//! A rejection flagged `except_owner` does not apply to the resource owner.

use crate::access_control::methods::is_owner;
use crate::access_control::query::{Query, QueryValue, split_bracketed};
use crate::config::FilterRejectionConfig;
use crate::error::ConfigError;

/// Parsed form of a rejection key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKey {
    /// `name`
    Simple(String),
    /// `name[field]`
    Nested { name: String, field: String },
    /// `name[]`
    Collection(String),
}

impl FilterKey {
    /// Parse a configured key into its simple, nested or collection form
    pub fn parse(key: &str) -> Self {
        match split_bracketed(key) {
            Some((name, "")) => FilterKey::Collection(name.to_string()),
            Some((name, field)) => FilterKey::Nested {
                name: name.to_string(),
                field: field.to_string(),
            },
            None => FilterKey::Simple(key.to_string()),
        }
    }

    /// Find the query value this key addresses, if present
    fn locate<'q>(&self, query: &'q Query) -> Option<&'q QueryValue> {
        match self {
            FilterKey::Simple(name) | FilterKey::Collection(name) => query.get(name),
            FilterKey::Nested { name, field } => query.get(name)?.as_map()?.get(field),
        }
    }
}

/// Compiled filter rejection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRejection {
    key: FilterKey,
    value: Option<String>,
    except_owner: bool,
}

impl FilterRejection {
    pub fn new(key: &str, value: Option<&str>, except_owner: bool) -> Self {
        Self {
            key: FilterKey::parse(key),
            value: value.map(str::to_string),
            except_owner,
        }
    }

    /// Compile a (catalog-merged) rejection entry
    pub fn from_config(config: &FilterRejectionConfig) -> Result<Self, ConfigError> {
        let key = config.key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: match &config.filter {
                Some(filter) => format!("key for filter '{}'", filter),
                None => "filter rejection key".to_string(),
            },
        })?;

        Ok(Self::new(
            key,
            config.value.as_deref(),
            config.except_owner.unwrap_or(false),
        ))
    }

    pub fn key(&self) -> &FilterKey {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_except_owner(&self) -> bool {
        self.except_owner
    }

    /// Whether the query matches this rejection, ignoring owner exceptions
    pub fn matches_query(&self, query: &Query) -> bool {
        let Some(found) = self.key.locate(query) else {
            return false;
        };

        match (&self.key, self.value.as_deref()) {
            (_, None) => true,
            (FilterKey::Collection(_), Some(expected)) => found.contains(expected),
            (_, Some(expected)) => found.as_scalar() == Some(expected),
        }
    }

    /// Whether this rejection vetoes the request
    pub fn fires(&self, query: &Query, owner: Option<&str>, principal: Option<&str>) -> bool {
        self.matches_query(query) && !(self.except_owner && is_owner(owner, principal))
    }
}

/// Check the query against a rule's rejections
///
/// Returns `true` when no rejection fires.
pub fn validate_filters(
    query: &Query,
    rejections: &[FilterRejection],
    owner: Option<&str>,
    principal: Option<&str>,
) -> bool {
    !rejections
        .iter()
        .any(|rejection| rejection.fires(query, owner, principal))
}
