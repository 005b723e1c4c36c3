use shared_models::auth::User;

/// Authorization decisions for appointment management.
///
/// The operator/administrator is identified by a role claim stamped on the
/// authenticated identity, never by comparing against a fixed email address.
pub trait AuthorizationPolicy: Send + Sync {
    /// Whether this identity may view every appointment and change statuses.
    fn can_manage_appointments(&self, user: &User) -> bool;
}

/// Default policy: the `admin` role claim marks the shop operator.
#[derive(Debug, Clone, Default)]
pub struct RoleBasedPolicy;

impl AuthorizationPolicy for RoleBasedPolicy {
    fn can_manage_appointments(&self, user: &User) -> bool {
        user.role.as_deref() == Some("admin")
    }
}
