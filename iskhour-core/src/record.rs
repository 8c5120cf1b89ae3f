//! The aggregated performance record - the unit of token serialization.

use serde::{Deserialize, Serialize};

use crate::numbers::{round_f64_to_u64, u64_to_f64};

/// Summary of one wallet-log session, as shared through a token.
///
/// All fields are non-negative integers; `end_time >= start_time` is
/// expected and enforced by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Total ISK earned across all payout lines.
    pub isk: u64,
    /// Total loyalty points, summed over payout-table matches only.
    pub lp: u64,
    /// Count of distinct payout timestamps (sites completed).
    pub sites: u32,
    /// Unix seconds of the earliest payout.
    pub start_time: u64,
    /// Unix seconds of the latest payout.
    pub end_time: u64,
    /// Smallest gap between consecutive sites, in seconds.
    pub min_time: u64,
    /// Largest gap between consecutive sites, in seconds.
    pub max_time: u64,
    /// Largest number of characters paid out in the same second.
    pub chars: u32,
}

impl PerformanceRecord {
    /// Session length in seconds.
    #[must_use]
    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    /// Effective ISK per hour, discounted by one site's worth of time since
    /// the first payout carries no preceding site timer.
    ///
    /// `None` when the session has no measurable duration or fewer than two
    /// sites.
    #[must_use]
    pub fn isk_per_hour(&self) -> Option<u64> {
        let duration = self.duration();
        if duration == 0 || self.sites < 2 {
            return None;
        }
        let hours = u64_to_f64(duration) / 3600.0;
        let site_discount = f64::from(self.sites) / f64::from(self.sites - 1);
        Some(round_f64_to_u64(u64_to_f64(self.isk) / hours / site_discount))
    }

    /// Average gap between consecutive sites, in seconds.
    #[must_use]
    pub fn average_gap(&self) -> Option<u64> {
        if self.sites < 2 {
            return None;
        }
        Some(round_f64_to_u64(
            u64_to_f64(self.duration()) / f64::from(self.sites - 1),
        ))
    }
}
