//! # Combo Tier Classification
//!
//! The gamified tier badge assigned to a sale based on how many units of
//! each therapeutic bucket it contains.
//!
//! ## Decision Table, Not a Score
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Counts: (toxin units, filler units, specialty units)               │
//! │                                                                     │
//! │  ┌ checked first                                                    │
//! │  │  Master   ← toxin ≥ 2  filler ≥ 4  specialty ≥ 2                 │
//! │  │  Premium  ← toxin ≥ 2  filler ≥ 3  specialty ≥ 1                 │
//! │  │  Plus     ← toxin ≥ 2  filler ≥ 2                                │
//! │  │  Start    ← toxin ≥ 1  filler ≥ 1                                │
//! │  └ checked last                                                     │
//! │                                                                     │
//! │  First threshold satisfied wins. Failing all four: no tier.         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The evaluation order is part of the contract: classification is NOT the
//! best possible match, just the first row satisfied top-to-bottom. Rows
//! are hand-tuned by the clinic's marketing team; change thresholds in
//! [`TIER_TABLE`] only.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::category::ComboBucket;

// =============================================================================
// Combo Counts
// =============================================================================

/// Quantity-weighted unit counts per combo bucket for one sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComboCounts {
    pub toxin_units: i64,
    pub filler_units: i64,
    pub specialty_units: i64,
}

impl ComboCounts {
    /// Builds counts from `(bucket, quantity)` pairs.
    ///
    /// Items whose category maps to no bucket are skipped.
    pub fn tally<I>(items: I) -> Self
    where
        I: IntoIterator<Item = (Option<ComboBucket>, i64)>,
    {
        let mut counts = ComboCounts::default();
        for (bucket, quantity) in items {
            match bucket {
                Some(ComboBucket::Toxin) => counts.toxin_units += quantity,
                Some(ComboBucket::Filler) => counts.filler_units += quantity,
                Some(ComboBucket::Specialty) => counts.specialty_units += quantity,
                None => {}
            }
        }
        counts
    }

    /// True when every bucket satisfies `threshold`'s minimums.
    const fn satisfies(&self, threshold: &ComboCounts) -> bool {
        self.toxin_units >= threshold.toxin_units
            && self.filler_units >= threshold.filler_units
            && self.specialty_units >= threshold.specialty_units
    }
}

// =============================================================================
// Combo Tier
// =============================================================================

/// Gamified tier badge, highest to lowest.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ComboTier {
    Master,
    Premium,
    Plus,
    Start,
}

impl fmt::Display for ComboTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComboTier::Master => "Combo Master",
            ComboTier::Premium => "Combo Premium",
            ComboTier::Plus => "Combo Plus",
            ComboTier::Start => "Combo Start",
        };
        write!(f, "{}", name)
    }
}

/// Ordered `(minimum counts, tier)` rows, highest tier first.
const TIER_TABLE: &[(ComboCounts, ComboTier)] = &[
    (
        ComboCounts { toxin_units: 2, filler_units: 4, specialty_units: 2 },
        ComboTier::Master,
    ),
    (
        ComboCounts { toxin_units: 2, filler_units: 3, specialty_units: 1 },
        ComboTier::Premium,
    ),
    (
        ComboCounts { toxin_units: 2, filler_units: 2, specialty_units: 0 },
        ComboTier::Plus,
    ),
    (
        ComboCounts { toxin_units: 1, filler_units: 1, specialty_units: 0 },
        ComboTier::Start,
    ),
];

/// Classifies a sale's bucket counts into a tier.
///
/// Pure function of the three counts. Returns `None` when no row matches.
pub fn classify(counts: ComboCounts) -> Option<ComboTier> {
    TIER_TABLE
        .iter()
        .find(|(threshold, _)| counts.satisfies(threshold))
        .map(|(_, tier)| *tier)
}

// =============================================================================
// Unit Tests
// =============================================================================
