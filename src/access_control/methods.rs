//! Method and ownership validation

use crate::config::MethodConfig;

/// Whether the requester is the owner captured from the path
///
/// Both sides must be known; an anonymous request never owns anything.
pub fn is_owner(owner: Option<&str>, principal: Option<&str>) -> bool {
    matches!((owner, principal), (Some(owner), Some(principal)) if owner == principal)
}

/// Check the request method against a rule's allowed methods
///
/// Methods compare as exact strings. An entry with `require_owner` only
/// passes for the owner of the resource.
pub fn validate_method(
    method: &str,
    allowed: &[MethodConfig],
    owner: Option<&str>,
    principal: Option<&str>,
) -> bool {
    allowed
        .iter()
        .any(|m| m.method == method && (!m.require_owner || is_owner(owner, principal)))
}
