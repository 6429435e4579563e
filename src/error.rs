//! Error types for access-controller
//!
//! This module defines the error hierarchy used throughout the crate.
//! Configuration problems are detected while building the rule set and are
//! reported with enough detail to fix the rules file. Request-time denials are
//! deliberately opaque.

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid resource template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }
}

/// Request rejected by the access controller.
///
/// Carries no detail about which rule or filter caused the rejection.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("forbidden")]
pub struct Forbidden;

impl Forbidden {
    /// HTTP status hosts should answer with
    pub const STATUS: u16 = 403;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_is_opaque() {
        assert_eq!(Forbidden.to_string(), "forbidden");
        assert_eq!(Forbidden::STATUS, 403);
    }

    #[test]
    fn test_config_error_constructors() {
        let err = ConfigError::template("/a/{owner:x", "unbalanced braces");
        assert!(err.to_string().contains("/a/{owner:x"));
        assert!(err.to_string().contains("unbalanced"));

        let err = ConfigError::invalid("methods must not be empty");
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
