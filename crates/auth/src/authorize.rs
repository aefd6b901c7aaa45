use std::collections::HashSet;

use thiserror::Error;

use matcon_core::{CompanyId, DomainError, UserId};

use crate::{CompanyMembership, Permission, PrincipalId, Role, permissions_for_roles};

/// A fully resolved principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub active_company_id: CompanyId,
    pub membership: CompanyMembership,
}

impl Principal {
    /// Resolve a principal acting in `company_id` with the given roles, using
    /// the static role policy.
    pub fn with_roles(principal_id: PrincipalId, company_id: CompanyId, roles: Vec<Role>) -> Self {
        let permissions = permissions_for_roles(&roles);
        Self {
            principal_id,
            active_company_id: company_id,
            membership: CompanyMembership {
                company_id,
                roles,
                permissions,
            },
        }
    }

    pub fn user_id(&self) -> UserId {
        self.principal_id.user_id()
    }

    pub fn company_id(&self) -> CompanyId {
        self.active_company_id
    }

    pub fn can(&self, permission: &Permission) -> bool {
        authorize(self, permission).is_ok()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("company mismatch")]
    CompanyMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::permission_denied(value.to_string())
    }
}

/// Authorize a principal within its active company.
///
/// Pure policy check: no IO, no business logic.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.active_company_id != principal.membership.company_id {
        return Err(AuthzError::CompanyMismatch);
    }

    let perms: HashSet<&str> = principal
        .membership
        .permissions
        .iter()
        .map(|p| p.as_str())
        .collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
