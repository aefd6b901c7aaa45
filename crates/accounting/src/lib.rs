//! Accounting payloads for stock valuation.
//!
//! Journal entry drafts as produced by the valuation engine, the helpers used
//! to filter/patch them before posting, and posted journal entries. Pure domain
//! logic only: no IO, no persistence concerns.

pub mod account;
pub mod entry;
pub mod payload;

pub use account::{Account, AccountId, AccountKind, AnalyticAccountId, JournalId};
pub use entry::{
    AccountMove, AccountMoveDraft, AccountMoveId, AccountMoveState, AnalyticDistribution,
    JournalItem,
};
pub use payload::{tag_account_lines, touches_account, without_account};
