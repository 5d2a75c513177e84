// security/src/roles.rs

use models::Role;

/// Plain allow-list check: does the actor's role appear in `allowed`?
///
/// There is no superuser wildcard; endpoints that admit admins list
/// `Role::Admin` explicitly.
pub fn authorize(actor: Role, allowed: &[Role]) -> bool {
    allowed.contains(&actor)
}

/// Roles accepted by doctor-facing endpoints.
pub const DOCTOR_ACCESS: &[Role] = &[Role::Doctor, Role::Admin];

/// Roles accepted by receptionist-facing endpoints.
pub const RECEPTIONIST_ACCESS: &[Role] = &[Role::Receptionist, Role::Admin];

/// Roles accepted by admin-only endpoints.
pub const ADMIN_ACCESS: &[Role] = &[Role::Admin];
