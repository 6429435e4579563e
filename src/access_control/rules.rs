//! Rule set construction
//!
//! Resource rules are compiled once per configuration load. The shared
//! catalog of rejected filters is merged into each resource's local
//! rejections first; catalog fields win over local ones with the same name.

use crate::access_control::filters::FilterRejection;
use crate::access_control::patterns::UriPattern;
use crate::config::{
    AccessControlConfig, FilterRejectionConfig, MethodConfig, RejectedFilterConfig, ResourceConfig,
};
use crate::error::ConfigError;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Compiled resource rule
#[derive(Debug, Clone)]
pub struct ResourceRule {
    pattern: UriPattern,
    methods: Vec<MethodConfig>,
    rejections: Vec<FilterRejection>,
}

impl ResourceRule {
    /// Compile a resource whose rejections are already merged with the catalog
    pub fn compile(config: &ResourceConfig) -> Result<Self, ConfigError> {
        let pattern = UriPattern::compile(&config.resource)?;

        if config.methods.is_empty() {
            return Err(ConfigError::invalid(format!(
                "resource '{}' must allow at least one method",
                config.resource
            )));
        }

        for method in config.methods.iter().filter(|m| m.require_owner) {
            if !pattern.has_owner_capture() {
                warn!(
                    resource = %config.resource,
                    method = %method.method,
                    "Method requires an owner but the resource has no owner capture"
                );
            }
        }

        let rejections = config
            .filters_rejection
            .iter()
            .map(FilterRejection::from_config)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| match e {
                ConfigError::Missing { field } => ConfigError::Missing {
                    field: format!("{} in resource '{}'", field, config.resource),
                },
                other => other,
            })?;

        Ok(Self {
            pattern,
            methods: config.methods.clone(),
            rejections,
        })
    }

    pub fn pattern(&self) -> &UriPattern {
        &self.pattern
    }

    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    pub fn methods(&self) -> &[MethodConfig] {
        &self.methods
    }

    pub fn rejections(&self) -> &[FilterRejection] {
        &self.rejections
    }
}

/// Immutable, ordered set of compiled resource rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<ResourceRule>,
}

impl RuleSet {
    /// Build a rule set from access control configuration
    pub fn from_config(config: &AccessControlConfig) -> Result<Self, ConfigError> {
        RuleSetBuilder::new(config.allowed_resources.iter().cloned())
            .with_rejected_filters(config.rejected_filters.iter().cloned())
            .build()
    }

    pub fn rules(&self) -> &[ResourceRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builder merging the filter catalog into resources and compiling them
#[derive(Debug, Clone, Default)]
pub struct RuleSetBuilder {
    resources: Vec<ResourceConfig>,
    catalog: Vec<RejectedFilterConfig>,
}

impl RuleSetBuilder {
    pub fn new(resources: impl IntoIterator<Item = ResourceConfig>) -> Self {
        Self {
            resources: resources.into_iter().collect(),
            catalog: Vec::new(),
        }
    }

    pub fn resource(mut self, resource: ResourceConfig) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_rejected_filters(
        mut self,
        catalog: impl IntoIterator<Item = RejectedFilterConfig>,
    ) -> Self {
        self.catalog.extend(catalog);
        self
    }

    /// Resources with catalog definitions merged into their rejections
    ///
    /// Entries without a `filter` id, or with an id the catalog does not
    /// define, are returned unchanged.
    pub fn merged_resources(&self) -> Result<Vec<ResourceConfig>, ConfigError> {
        let mut index: HashMap<&str, &RejectedFilterConfig> = HashMap::new();
        for entry in &self.catalog {
            if index.insert(entry.filter.as_str(), entry).is_some() {
                return Err(ConfigError::invalid(format!(
                    "rejected filter '{}' is defined more than once",
                    entry.filter
                )));
            }
        }

        let merge = |local: &FilterRejectionConfig| match local
            .filter
            .as_deref()
            .and_then(|id| index.get(id))
        {
            Some(catalog) => local.merged_with(catalog),
            None => local.clone(),
        };

        Ok(self
            .resources
            .iter()
            .map(|resource| ResourceConfig {
                filters_rejection: resource.filters_rejection.iter().map(merge).collect(),
                ..resource.clone()
            })
            .collect())
    }

    /// Merge and compile every resource, failing on the first invalid one
    pub fn build(self) -> Result<RuleSet, ConfigError> {
        let rules = self
            .merged_resources()?
            .iter()
            .map(ResourceRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            rules = rules.len(),
            catalog = self.catalog.len(),
            "Built access control rule set"
        );

        Ok(RuleSet { rules })
    }
}
