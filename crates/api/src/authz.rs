//! Resolution of the request context into an authorization principal.
//!
//! Permission checks themselves happen in the services, so a refused action
//! is refused the same way whether it comes over HTTP or not.

use matcon_auth::Principal;

use crate::context::{CompanyContext, PrincipalContext};

/// Principal acting in the request's company with the token's roles.
pub fn resolve_principal(company: &CompanyContext, principal: &PrincipalContext) -> Principal {
    Principal::with_roles(
        principal.principal_id(),
        company.company_id(),
        principal.roles().to_vec(),
    )
}
