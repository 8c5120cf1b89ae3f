//! Incursion payout reference data and the reverse payout index.
//!
//! Site payouts decay as a fleet brings extra members on grid, so every
//! `(site tier, overgrid count)` pair lands on a distinct ISK amount. That
//! uniqueness is what lets a wallet line's reward amount be mapped back to
//! the site tier and fleet size that produced it.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::numbers::{round_f64_to_u64, u64_to_f64};

/// Highest overgrid count the decay formula is tabulated for.
pub const MAX_OVERGRID: u32 = 10;

// Payout decay tuning ------------------------------------------------------
const DECAY_LINEAR: f64 = 0.0725;
const DECAY_QUADRATIC: f64 = 0.0025;

/// A site tier with its undecayed payout characteristics.
///
/// Values are fixed gameplay constants, not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SiteArchetype {
    pub label: &'static str,
    pub base_payout: u64,
    pub base_lp: u64,
    pub base_grid_size: u32,
}

/// The four highsec incursion site tiers.
pub const SITE_ARCHETYPES: [SiteArchetype; 4] = [
    SiteArchetype {
        label: "Mothership (highsec)",
        base_payout: 63_000_000,
        base_lp: 14_000,
        base_grid_size: 80,
    },
    SiteArchetype {
        label: "HQ (highsec)",
        base_payout: 31_500_000,
        base_lp: 7_000,
        base_grid_size: 40,
    },
    SiteArchetype {
        label: "AS (highsec)",
        base_payout: 18_200_000,
        base_lp: 3_500,
        base_grid_size: 20,
    },
    SiteArchetype {
        label: "VG (highsec)",
        base_payout: 10_395_000,
        base_lp: 1_400,
        base_grid_size: 10,
    },
];

/// One decayed `(site tier, overgrid count)` payout combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayoutEntry {
    /// Site tier label, e.g. "HQ (highsec)".
    pub label: &'static str,
    /// Decayed per-member ISK payout; the reverse-index key.
    pub payout: u64,
    /// Decayed per-member loyalty point yield.
    pub lp: u64,
    /// Undecayed payout of the tier.
    pub base_payout: u64,
    /// Undecayed LP yield of the tier.
    pub base_lp: u64,
    /// Total members on grid; `None` when the site was not overfilled.
    pub on_grid: Option<u32>,
}

/// Payout decay factor for a given overgrid count.
#[must_use]
pub fn decay_factor(overgrid: u32) -> f64 {
    let n = f64::from(overgrid);
    1.0 - DECAY_LINEAR * n - DECAY_QUADRATIC * n * n
}

/// Reverse index from an observed reward amount to its payout combination.
///
/// Immutable once built; safe to share across threads without locking.
#[derive(Debug, Clone)]
pub struct PayoutTable {
    by_payout: HashMap<u64, PayoutEntry>,
}

impl PayoutTable {
    /// Build the table from the archetype constants.
    ///
    /// # Panics
    ///
    /// Panics when two `(site tier, overgrid count)` combinations decay to
    /// the same integer payout. The table is keyed by payout amount, so a
    /// collision would silently corrupt LP accounting; it indicates a
    /// defect in the archetype data and aborts initialization.
    #[must_use]
    pub fn build() -> Self {
        let mut by_payout = HashMap::new();
        for archetype in &SITE_ARCHETYPES {
            for overgrid in 0..=MAX_OVERGRID {
                let factor = decay_factor(overgrid);
                let payout = round_f64_to_u64(u64_to_f64(archetype.base_payout) * factor);
                let entry = PayoutEntry {
                    label: archetype.label,
                    payout,
                    lp: round_f64_to_u64(u64_to_f64(archetype.base_lp) * factor),
                    base_payout: archetype.base_payout,
                    base_lp: archetype.base_lp,
                    on_grid: (overgrid > 0).then_some(archetype.base_grid_size + overgrid),
                };
                assert!(
                    by_payout.insert(payout, entry).is_none(),
                    "duplicate payout {payout} for {} at overgrid {overgrid}",
                    archetype.label,
                );
            }
        }
        Self { by_payout }
    }

    /// Shared table, built once per process.
    pub fn shared() -> &'static Self {
        static TABLE: OnceLock<PayoutTable> = OnceLock::new();
        TABLE.get_or_init(Self::build)
    }

    /// Look up a reward amount. A miss is normal: most wallet lines are not
    /// exact decay-formula payouts.
    #[must_use]
    pub fn lookup(&self, amount: u64) -> Option<&PayoutEntry> {
        self.by_payout.get(&amount)
    }

    /// Number of distinct payout combinations in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_payout.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_payout.is_empty()
    }

    /// All entries, in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = &PayoutEntry> {
        self.by_payout.values()
    }
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self::build()
    }
}
