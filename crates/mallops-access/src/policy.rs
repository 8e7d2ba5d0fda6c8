//! Role/action policy table.
//!
//! Every gated operation is an [`Action`]; [`allowed_roles`] names the
//! roles permitted to perform it. Membership is literal — there is no
//! role hierarchy.

use mallops_core::models::user::UserRole;

use UserRole::{MallAdmin, SuperAdmin, TenantAdmin, TenantUser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PermitCreate,
    PermitRead,
    PermitList,
    PermitUpdate,
    PermitDocument,
    /// Inspector comment/violation recording.
    PermitInspect,
    WorkflowCreate,
    WorkflowRead,
    WorkflowUpdate,
    TaskUpdate,
    NotificationCreate,
    NotificationList,
    NotificationReadStatus,
    NotificationMarkRead,
    TenantRead,
    TenantManage,
}

const ALL: &[UserRole] = &[SuperAdmin, MallAdmin, TenantAdmin, TenantUser];
const ADMINS: &[UserRole] = &[SuperAdmin, MallAdmin];
const TENANTS: &[UserRole] = &[TenantAdmin, TenantUser];

/// The roles allowed to perform an action.
pub fn allowed_roles(action: Action) -> &'static [UserRole] {
    match action {
        // Permits are tenant-submitted; everything mutating afterwards is
        // admin-driven.
        Action::PermitCreate => TENANTS,
        Action::PermitRead | Action::PermitList | Action::PermitDocument => ALL,
        Action::PermitUpdate | Action::PermitInspect => ADMINS,

        Action::WorkflowCreate | Action::WorkflowRead | Action::TaskUpdate => ALL,
        Action::WorkflowUpdate => ADMINS,

        Action::NotificationCreate | Action::NotificationReadStatus => ADMINS,
        Action::NotificationList | Action::NotificationMarkRead => ALL,

        Action::TenantRead | Action::TenantManage => ADMINS,
    }
}

/// Literal membership check.
pub fn permits(role: UserRole, action: Action) -> bool {
    allowed_roles(action).contains(&role)
}
