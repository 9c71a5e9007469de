//! Role-based access policy.
//!
//! A declarative allow-list per guarded operation. Evaluation is an
//! exact set-membership test — there is no role hierarchy and no
//! wildcard: `Admin` is only permitted where it is explicitly listed.

use serde::{Deserialize, Serialize};

/// The fixed set of ToolLink roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Warehouse,
    Cashier,
    Customer,
    Driver,
    Editor,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::Admin,
        Role::Warehouse,
        Role::Cashier,
        Role::Customer,
        Role::Driver,
        Role::Editor,
    ];

    /// Roles with organisation-wide visibility over orders and inventory.
    /// Everyone else is scoped to records they own.
    pub const STAFF: &'static [Role] = &[Role::Admin, Role::Warehouse, Role::Cashier];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Warehouse => "warehouse",
            Role::Cashier => "cashier",
            Role::Customer => "customer",
            Role::Driver => "driver",
            Role::Editor => "editor",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "warehouse" => Some(Role::Warehouse),
            "cashier" => Some(Role::Cashier),
            "customer" => Some(Role::Customer),
            "driver" => Some(Role::Driver),
            "editor" => Some(Role::Editor),
            _ => None,
        }
    }

    /// Whether this role can see records owned by other users.
    pub fn is_staff(&self) -> bool {
        Self::STAFF.contains(self)
    }
}

/// Every operation guarded by the access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    UsersList,
    UsersGet,
    UsersCreate,
    UsersUpdate,
    UsersDelete,
    UsersHardDelete,
    UsersApprove,
    OrdersList,
    OrdersGet,
    OrdersCreate,
    OrdersUpdate,
    OrdersDelete,
    OrdersStats,
    InventoryList,
    InventoryGet,
    InventoryCreate,
    InventoryUpdate,
    InventoryDelete,
    InventoryAdjust,
    NotificationsList,
    NotificationsCreate,
    NotificationsUpdate,
    NotificationsDelete,
    FeedbackList,
    FeedbackCreate,
    FeedbackResolve,
    ReportsList,
    ReportsGet,
    ReportsCreate,
    PredictionsList,
    PredictionsCreate,
    AdminDashboard,
    AuditLogsList,
    UsersBulkCreate,
    ConfigUpdate,
}

impl Permission {
    /// The allow-list for this operation.
    pub fn allowed_roles(&self) -> &'static [Role] {
        use Role::*;
        match self {
            Permission::UsersList => &[Admin, Cashier],
            Permission::UsersGet => &[Admin, Cashier],
            Permission::UsersCreate => &[Admin],
            Permission::UsersUpdate => &[Admin],
            Permission::UsersDelete => &[Admin],
            Permission::UsersHardDelete => &[Admin],
            Permission::UsersApprove => &[Admin, Cashier],

            Permission::OrdersList => Role::ALL,
            Permission::OrdersGet => Role::ALL,
            Permission::OrdersCreate => Role::ALL,
            Permission::OrdersUpdate => &[Admin, Warehouse, Cashier, Driver],
            Permission::OrdersDelete => &[Admin, Cashier],
            Permission::OrdersStats => &[Admin, Cashier],

            Permission::InventoryList => &[Admin, Warehouse, Cashier, Editor],
            Permission::InventoryGet => &[Admin, Warehouse, Cashier, Editor],
            Permission::InventoryCreate => &[Admin, Warehouse],
            Permission::InventoryUpdate => &[Admin, Warehouse],
            Permission::InventoryDelete => &[Admin, Warehouse],
            Permission::InventoryAdjust => &[Admin, Warehouse],

            Permission::NotificationsList => Role::ALL,
            Permission::NotificationsCreate => &[Admin, Editor],
            Permission::NotificationsUpdate => Role::ALL,
            Permission::NotificationsDelete => Role::ALL,

            Permission::FeedbackList => Role::ALL,
            Permission::FeedbackCreate => Role::ALL,
            Permission::FeedbackResolve => &[Admin, Editor],

            Permission::ReportsList => &[Admin, Cashier],
            Permission::ReportsGet => &[Admin, Cashier],
            Permission::ReportsCreate => &[Admin, Cashier],

            Permission::PredictionsList => &[Admin, Warehouse],
            Permission::PredictionsCreate => &[Admin, Warehouse],

            Permission::AdminDashboard => &[Admin],
            Permission::AuditLogsList => &[Admin],
            Permission::UsersBulkCreate => &[Admin],
            Permission::ConfigUpdate => &[Admin],
        }
    }
}

/// The access gate evaluated once per guarded request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    /// Exact membership test of `role` against the operation's allow-list.
    pub fn permits(&self, role: Role, permission: Permission) -> bool {
        permission.allowed_roles().contains(&role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(*role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn any_role_may_create_orders() {
        let policy = AccessPolicy;
        for role in Role::ALL {
            assert!(policy.permits(*role, Permission::OrdersCreate));
        }
    }

    #[test]
    fn only_admin_deletes_users() {
        let policy = AccessPolicy;
        assert!(policy.permits(Role::Admin, Permission::UsersDelete));
        for role in Role::ALL.iter().filter(|r| **r != Role::Admin) {
            assert!(!policy.permits(*role, Permission::UsersDelete));
        }
    }

    #[test]
    fn approval_is_admin_or_cashier() {
        let policy = AccessPolicy;
        assert!(policy.permits(Role::Admin, Permission::UsersApprove));
        assert!(policy.permits(Role::Cashier, Permission::UsersApprove));
        assert!(!policy.permits(Role::Warehouse, Permission::UsersApprove));
        assert!(!policy.permits(Role::Customer, Permission::UsersApprove));
    }

    #[test]
    fn admin_is_not_implicitly_granted() {
        // No wildcard: a permission listing only Warehouse would exclude
        // Admin. All current lists include Admin explicitly, so verify the
        // mechanism itself via set membership.
        assert!(
            Permission::InventoryAdjust
                .allowed_roles()
                .contains(&Role::Admin)
        );
        assert!(!Permission::OrdersUpdate.allowed_roles().contains(&Role::Customer));
    }

    #[test]
    fn staff_visibility_set() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Warehouse.is_staff());
        assert!(Role::Cashier.is_staff());
        assert!(!Role::Customer.is_staff());
        assert!(!Role::Driver.is_staff());
        assert!(!Role::Editor.is_staff());
    }
}
