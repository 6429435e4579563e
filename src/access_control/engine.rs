//! Decision engine
//!
//! Evaluates a request against the rule set. A request is allowed as soon
//! as one rule matches its path, permits its method, and none of the rule's
//! filter rejections fire. Otherwise it is denied.

use crate::access_control::filters::validate_filters;
use crate::access_control::methods::validate_method;
use crate::access_control::query::Query;
use crate::access_control::rules::{ResourceRule, RuleSet};
use crate::config::AccessControlConfig;
use crate::error::{ConfigError, Forbidden};
use serde::Deserialize;
use tracing::{debug, trace};

/// Request as seen by the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IncomingRequest {
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub query: Query,
    #[serde(default, alias = "principalId")]
    pub principal: Option<String>,
}

impl IncomingRequest {
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }
}

/// Result of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Decision::Deny)
    }

    /// Turn a denial into an opaque [`Forbidden`] error
    pub fn require(self) -> Result<(), Forbidden> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(Forbidden),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "ALLOW",
            Decision::Deny => "DENY",
        }
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless evaluator over an immutable rule set
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    rules: RuleSet,
}

impl DecisionEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Build the rule set from configuration and wrap it in an engine
    pub fn from_config(config: &AccessControlConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(RuleSet::from_config(config)?))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Evaluate an owned request
    pub fn evaluate(&self, request: &IncomingRequest) -> Decision {
        self.decide(
            &request.path,
            &request.method,
            &request.query,
            request.principal.as_deref(),
        )
    }

    /// Evaluate a request given by its parts
    pub fn decide(
        &self,
        path: &str,
        method: &str,
        query: &Query,
        principal: Option<&str>,
    ) -> Decision {
        let allowed = self
            .rules
            .rules()
            .iter()
            .any(|rule| permits(rule, path, method, query, principal));

        let decision = Decision::from(allowed);
        debug!(
            path,
            method,
            principal = ?principal,
            decision = %decision,
            "Evaluated request"
        );
        decision
    }
}

/// Whether a single rule grants the request
fn permits(
    rule: &ResourceRule,
    path: &str,
    method: &str,
    query: &Query,
    principal: Option<&str>,
) -> bool {
    let Some(matched) = rule.pattern().matches(path) else {
        return false;
    };
    let owner = matched.owner();

    if !validate_method(method, rule.methods(), owner, principal) {
        trace!(resource = rule.template(), method, "Method not permitted");
        return false;
    }

    if !rule.rejections().is_empty()
        && !validate_filters(query, rule.rejections(), owner, principal)
    {
        trace!(resource = rule.template(), "Rejected by query filter");
        return false;
    }

    trace!(resource = rule.template(), owner = ?owner, "Rule granted access");
    true
}
