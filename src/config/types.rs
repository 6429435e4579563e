//! Configuration types for access-controller
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables. Field names are snake_case; the
//! camelCase names used by gateway plugin configurations are accepted as
//! aliases.

use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Resource rules and the shared filter catalog
    #[serde(alias = "accessControl")]
    pub access_control: AccessControlConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Access control configuration
///
/// A request is allowed when at least one entry of `allowed_resources`
/// matches its path, permits its method, and none of the entry's filter
/// rejections fire. Entries in `rejected_filters` are shared definitions
/// that resource rejections refer to by their `filter` id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccessControlConfig {
    /// Resource rules, evaluated in order
    #[serde(alias = "allowedResources")]
    pub allowed_resources: Vec<ResourceConfig>,

    /// Named filter rejections merged into resource rules at load time
    #[serde(alias = "rejectedFilters")]
    pub rejected_filters: Vec<RejectedFilterConfig>,
}

/// A single allowed resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResourceConfig {
    /// URI template, e.g. `/users/{owner:\w+}/profile`
    #[serde(alias = "uri_template", alias = "uriTemplate")]
    pub resource: String,

    /// Methods permitted on this resource
    #[serde(default)]
    pub methods: Vec<MethodConfig>,

    /// Query filters that reject an otherwise allowed request
    #[serde(default, alias = "filtersRejection", alias = "filter_rejections")]
    pub filters_rejection: Vec<FilterRejectionConfig>,
}

/// Permitted method on a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MethodConfig {
    /// HTTP method, matched exactly
    pub method: String,

    /// Only the owner captured from the path may use this method
    #[serde(default, alias = "requireOwner")]
    pub require_owner: bool,
}

impl MethodConfig {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            require_owner: false,
        }
    }

    pub fn owner_only(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            require_owner: true,
        }
    }
}

/// Filter rejection declared on a resource
///
/// Every field is optional here because an entry referring to a catalog
/// definition through `filter` may leave the rest to the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterRejectionConfig {
    /// Catalog id this entry refers to
    #[serde(default)]
    pub filter: Option<String>,

    /// Query key: `name`, `name[field]` or `name[]`
    #[serde(default)]
    pub key: Option<String>,

    /// Value that triggers the rejection (absent = key presence is enough)
    #[serde(default)]
    pub value: Option<String>,

    /// Do not reject when the requester owns the resource
    #[serde(default, alias = "exceptOwner")]
    pub except_owner: Option<bool>,
}

impl FilterRejectionConfig {
    /// Entry rejecting `key` (optionally only when it equals `value`)
    pub fn new(key: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            filter: None,
            key: Some(key.into()),
            value: value.map(str::to_string),
            except_owner: None,
        }
    }

    /// Entry that only names a catalog definition
    pub fn reference(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
            ..Default::default()
        }
    }

    pub fn except_owner(mut self) -> Self {
        self.except_owner = Some(true);
        self
    }

    /// Overlay the fields set on a catalog definition onto this entry.
    ///
    /// Fields left unset in the catalog keep their local value.
    pub fn merged_with(&self, catalog: &RejectedFilterConfig) -> Self {
        Self {
            filter: Some(catalog.filter.clone()),
            key: catalog.key.clone().or_else(|| self.key.clone()),
            value: catalog.value.clone().or_else(|| self.value.clone()),
            except_owner: catalog.except_owner.or(self.except_owner),
        }
    }
}

/// Shared filter rejection definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RejectedFilterConfig {
    /// Id referenced by resource entries
    pub filter: String,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(default, alias = "exceptOwner")]
    pub except_owner: Option<bool>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
