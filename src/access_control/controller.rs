//! Host-facing access controller
//!
//! Binds a [`DecisionEngine`] to the host's request type. The host supplies
//! a [`PrincipalResolver`] that reads the authenticated principal from its
//! request; the controller calls it once per check.

use crate::access_control::engine::{Decision, DecisionEngine, IncomingRequest};
use crate::access_control::query::Query;
use crate::error::Forbidden;
use std::sync::Arc;

/// View of a host request the controller needs
pub trait HostRequest {
    fn path(&self) -> &str;
    fn method(&self) -> &str;
    fn query(&self) -> &Query;
}

impl HostRequest for IncomingRequest {
    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn query(&self) -> &Query {
        &self.query
    }
}

/// Resolves the authenticated principal of a host request
///
/// Implemented for any `Fn(&R) -> Option<String>` closure.
pub trait PrincipalResolver<R: ?Sized>: Send + Sync {
    fn resolve(&self, request: &R) -> Option<String>;
}

impl<R: ?Sized, F> PrincipalResolver<R> for F
where
    F: Fn(&R) -> Option<String> + Send + Sync,
{
    fn resolve(&self, request: &R) -> Option<String> {
        self(request)
    }
}

/// Box type alias for principal resolvers
pub type BoxedPrincipalResolver<R> = Box<dyn PrincipalResolver<R>>;

/// Access controller for host requests of type `R`
pub struct AccessController<R: ?Sized> {
    engine: Arc<DecisionEngine>,
    resolver: BoxedPrincipalResolver<R>,
}

impl<R: HostRequest + ?Sized> AccessController<R> {
    pub fn new(engine: Arc<DecisionEngine>, resolver: impl PrincipalResolver<R> + 'static) -> Self {
        Self {
            engine,
            resolver: Box::new(resolver),
        }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Decide whether the request may proceed
    pub fn check(&self, request: &R) -> Decision {
        let principal = self.resolver.resolve(request);
        self.engine.decide(
            request.path(),
            request.method(),
            request.query(),
            principal.as_deref(),
        )
    }

    /// Check the request, returning an error if denied
    pub fn require(&self, request: &R) -> Result<(), Forbidden> {
        self.check(request).require()
    }
}

impl<R: ?Sized> std::fmt::Debug for AccessController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessController")
            .field("rules", &self.engine.rules().len())
            .finish_non_exhaustive()
    }
}
