//! `matcon-auth` — authentication/authorization boundary.
//!
//! Decoupled from HTTP and storage: token validation, role→permission policy
//! and the `authorize` check used by the application service.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use permissions::Permission;
pub use principal::{CompanyMembership, PrincipalId};
pub use roles::{Role, permissions_for_roles};
