//! Access control module
//!
//! Decides whether an HTTP request may proceed, based on a catalog of
//! allowed resources.
//!
//! ## Access Control Model
//!
//! Each allowed resource is a URI template with a list of permitted methods
//! and an optional list of filter rejections. A request is allowed when at
//! least one resource:
//!
//! 1. **Matches the path** - the template is anchored at both ends
//! 2. **Permits the method** - methods flagged `require_owner` only pass when
//!    the `{owner:...}` segment of the path equals the requesting principal
//! 3. **Has no firing rejection** - a rejection fires when the query contains
//!    its key (and value, if given), unless it is `except_owner` and the
//!    requester owns the resource
//!
//! Requests matching no resource are denied.
//!
//! ## Example Configuration
//!
//! ```toml
//! [[access_control.rejected_filters]]
//! filter = "tokens"
//! key = "mmTokens[exists]"
//! value = "1"
//!
//! [[access_control.allowed_resources]]
//! resource = "/users/{owner:[a-z0-9]+}"
//! methods = [{ method = "GET" }, { method = "PUT", require_owner = true }]
//! filters_rejection = [{ filter = "tokens", except_owner = true }]
//! ```

pub mod controller;
pub mod engine;
pub mod filters;
pub mod methods;
pub mod patterns;
pub mod query;
pub mod rules;

pub use controller::{AccessController, HostRequest, PrincipalResolver};
pub use engine::{Decision, DecisionEngine, IncomingRequest};
pub use filters::{FilterKey, FilterRejection, validate_filters};
pub use methods::validate_method;
pub use patterns::{PathMatch, UriPattern};
pub use query::{Query, QueryValue, parse_query_string};
pub use rules::{ResourceRule, RuleSet, RuleSetBuilder};
