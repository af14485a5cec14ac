//! Authorization decisions.
//!
//! Access control is a pure function of the actor's role and business
//! affiliation against the business that owns the target resource.  Keeping
//! this out of session state means every surface (HTTP handlers, admin
//! tooling, background jobs) asks the same question the same way.

use uuid::Uuid;

use crate::types::Role;

/// Whether an actor may operate on a resource owned by `resource_business`.
///
/// Super-admins reach everything.  Business-admins reach only resources of
/// the business they belong to; a business-admin without an affiliation (or
/// a deployment-level resource with no owning business) is denied.
pub fn can_access(
    actor_role: Role,
    actor_business: Option<Uuid>,
    resource_business: Option<Uuid>,
) -> bool {
    match actor_role {
        Role::SuperAdmin => true,
        Role::BusinessAdmin => match (actor_business, resource_business) {
            (Some(actor), Some(resource)) => actor == resource,
            _ => false,
        },
    }
}
