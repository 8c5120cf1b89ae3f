//! ISK/h Calculator Core
//!
//! Platform-agnostic logic for turning a pasted in-game wallet journal
//! into a compact, shareable performance token and back. This crate
//! provides the payout reference table, the wallet-log parser, and the
//! versioned token codec without any UI or network dependencies.
//!
//! Data flow: raw text -> [`wallet::parse_wallet`] (using
//! [`payout::PayoutTable`]) -> [`record::PerformanceRecord`] ->
//! [`codec::encode`] -> token in a URL, and [`codec::decode`] back.

pub mod codec;
pub mod numbers;
pub mod payout;
pub mod record;
pub mod wallet;

// Re-export commonly used types
pub use codec::{FORMAT_VERSION, TokenError, decode, encode};
pub use payout::{MAX_OVERGRID, PayoutEntry, PayoutTable, SITE_ARCHETYPES, SiteArchetype};
pub use record::PerformanceRecord;
pub use wallet::{PayoutRow, WalletBreakdown, parse_wallet, parse_wallet_breakdown};
