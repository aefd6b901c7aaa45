use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "stock.consumption.validate").
/// The wildcard `"*"` grants everything within the company.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Read consumption requests, lines and their moves.
    pub const CONSUMPTION_READ: Permission = Permission(Cow::Borrowed("stock.consumption.read"));
    /// Create/edit/start/approve/reject requests and edit consumed quantities.
    pub const CONSUMPTION_WRITE: Permission = Permission(Cow::Borrowed("stock.consumption.write"));
    /// Validate approved requests (creates stock moves and valuation entries).
    pub const CONSUMPTION_VALIDATE: Permission =
        Permission(Cow::Borrowed("stock.consumption.validate"));
    /// Revert posted moves of a validated request.
    pub const CONSUMPTION_REVERT: Permission = Permission(Cow::Borrowed("stock.consumption.revert"));
    /// Post deferred adjustment entries.
    pub const ADJUSTMENT_POST: Permission = Permission(Cow::Borrowed("account.adjustment.post"));
    /// Maintain products, locations, accounts and on-hand quantities.
    pub const MASTER_DATA_WRITE: Permission = Permission(Cow::Borrowed("stock.master_data.write"));
    /// Everything.
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
