use matcon_auth::{PrincipalId, Role};
use matcon_core::CompanyId;

/// Company the request acts within, taken from the bearer token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CompanyContext {
    company_id: CompanyId,
}

impl CompanyContext {
    pub fn new(company_id: CompanyId) -> Self {
        Self { company_id }
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }
}

/// Authenticated identity and roles of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self { principal_id, roles }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
