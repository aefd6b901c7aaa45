use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier used for RBAC.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Warehouse user: prepares and approves consumption requests.
    pub const STOCK_USER: Role = Role(Cow::Borrowed("stock_user"));
    /// Inventory manager: validates, reverts and posts adjustments.
    pub const STOCK_MANAGER: Role = Role(Cow::Borrowed("stock_manager"));
    /// Company administrator.
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static role→permission policy.
///
/// Managers inherit everything a stock user can do. Unknown roles grant
/// nothing.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.iter().any(|r| r == &Role::ADMIN) {
        return vec![Permission::WILDCARD];
    }

    let mut perms = Vec::new();
    let is_manager = roles.iter().any(|r| r == &Role::STOCK_MANAGER);
    if is_manager || roles.iter().any(|r| r == &Role::STOCK_USER) {
        perms.push(Permission::CONSUMPTION_READ);
        perms.push(Permission::CONSUMPTION_WRITE);
    }
    if is_manager {
        perms.push(Permission::CONSUMPTION_VALIDATE);
        perms.push(Permission::CONSUMPTION_REVERT);
        perms.push(Permission::ADJUSTMENT_POST);
    }
    perms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gets_wildcard() {
        assert_eq!(permissions_for_roles(&[Role::ADMIN]), vec![Permission::WILDCARD]);
    }

    #[test]
    fn stock_user_cannot_validate() {
        let perms = permissions_for_roles(&[Role::STOCK_USER]);
        assert!(perms.contains(&Permission::CONSUMPTION_WRITE));
        assert!(!perms.contains(&Permission::CONSUMPTION_VALIDATE));
    }

    #[test]
    fn manager_inherits_user_permissions() {
        let perms = permissions_for_roles(&[Role::STOCK_MANAGER]);
        assert!(perms.contains(&Permission::CONSUMPTION_READ));
        assert!(perms.contains(&Permission::CONSUMPTION_VALIDATE));
        assert!(perms.contains(&Permission::ADJUSTMENT_POST));
    }

    #[test]
    fn unknown_role_grants_nothing() {
        assert!(permissions_for_roles(&[Role::new("auditor")]).is_empty());
    }
}
