//! Gateway Access Controller
//!
//! Request authorization for API gateways: a catalog of resource rules
//! decides whether an incoming request is allowed or forbidden.
//!
//! ## Features
//!
//! - **URI templates** with an `{owner:...}` segment identifying the resource owner
//! - **Owner-only methods** granted only when the principal owns the resource
//! - **Query filter rejections** on plain, nested (`a[b]`) and list (`a[]`) parameters
//! - **Shared filter catalog** merged into resources when the configuration loads
//! - **Flexible configuration** via TOML files and environment variables
//!
//! ## Evaluation
//!
//! ```text
//! path match → method (+ owner) → query rejections → ALLOW
//! ```
//!
//! The first resource passing every step allows the request. When none
//! does, the request is denied without revealing why.
//!
//! ## Example
//!
//! ```
//! use access_controller::access_control::{DecisionEngine, IncomingRequest};
//! use access_controller::config::load_config_from_str;
//!
//! let config = load_config_from_str(r#"
//! [[access_control.allowed_resources]]
//! resource = "/users/{owner:\\w+}/profile"
//! methods = [{ method = "GET", require_owner = true }]
//! "#).unwrap();
//!
//! let engine = DecisionEngine::from_config(&config.access_control).unwrap();
//! let request = IncomingRequest::new("/users/alice/profile", "GET").with_principal("alice");
//! assert!(engine.evaluate(&request).is_allowed());
//! ```

pub mod access_control;
pub mod config;
pub mod error;

// Re-export main types
pub use access_control::{AccessController, Decision, DecisionEngine, IncomingRequest, RuleSet};
pub use config::{AppConfig, load_config};
pub use error::{ConfigError, Forbidden};
