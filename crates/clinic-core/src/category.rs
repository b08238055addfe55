//! # Category Normalizer
//!
//! Maps free-text product category labels to canonical therapeutic
//! categories, and canonical categories to the three combo buckets used by
//! tier classification.
//!
//! ## Why a Lookup Table?
//! Catalog categories are typed by hand ("Toxina Botulínica", "BOTOX",
//! "preenchedor labial"...). Instead of string-splicing scattered through
//! the sale flow, the mapping is a single ordered `(keywords, category)`
//! table, auditable and testable in isolation:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  "BOTOX toxina"        ──┐                                          │
//! │  "toxina botulinica"   ──┼──► ToxinBotulinum  ──► Toxin bucket      │
//! │  "Toxina 50U"          ──┘                                          │
//! │                                                                     │
//! │  "Preenchedor labial"  ──┬──► HyaluronicFiller ─► Filler bucket     │
//! │  "Ácido Hialurônico"   ──┘                                          │
//! │                                                                     │
//! │  "Bioestimulador"      ──┐                                          │
//! │  "Skinbooster"         ──┼──► (three categories) ► Specialty bucket │
//! │  "Enzima lipolítica"   ──┘                                          │
//! │                                                                     │
//! │  anything else         ────► Other ─────────────► no bucket        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Matching is case-insensitive substring matching, first match wins, so
//! the function is total and stable: every label maps to exactly one
//! canonical category, and the same label always maps to the same one.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Canonical Categories
// =============================================================================

/// Canonical therapeutic category of a catalog product.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TherapeuticCategory {
    /// Botulinum toxin (Botox, Dysport, Xeomin...).
    ToxinBotulinum,
    /// Hyaluronic acid fillers.
    HyaluronicFiller,
    /// Collagen biostimulators (Sculptra, Radiesse...).
    Biostimulator,
    /// Skinboosters / injectable hydration.
    Skinbooster,
    /// Lipolytic enzymes.
    Lipolytic,
    /// Anything the keyword table does not recognize.
    Other,
}

/// Combo bucket a category counts toward during tier classification.
///
/// Three of the six canonical categories coalesce into `Specialty`;
/// `Other` counts toward no bucket (an unrecognized product must not
/// advance the combo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ComboBucket {
    Toxin,
    Filler,
    Specialty,
}

// =============================================================================
// Keyword Table
// =============================================================================

/// Ordered keyword table driving normalization.
///
/// Evaluated top-to-bottom; the first entry whose keyword set matches wins.
/// Keywords are lowercase and include accented and unaccented spellings of
/// the Portuguese labels seen in real catalogs, plus common brand names.
const KEYWORD_TABLE: &[(&[&str], TherapeuticCategory)] = &[
    (
        &["toxina", "botox", "botul", "dysport", "xeomin"],
        TherapeuticCategory::ToxinBotulinum,
    ),
    (
        &["preench", "hialur", "hialuronico", "filler", "juvederm", "restylane"],
        TherapeuticCategory::HyaluronicFiller,
    ),
    (
        &["bioestim", "biostim", "sculptra", "radiesse", "ellanse"],
        TherapeuticCategory::Biostimulator,
    ),
    (
        &["skinbooster", "booster", "profhilo", "hidratacao injet"],
        TherapeuticCategory::Skinbooster,
    ),
    (
        &["enzima", "lipol", "deso"],
        TherapeuticCategory::Lipolytic,
    ),
];

impl TherapeuticCategory {
    /// Normalizes an arbitrary free-text category label.
    ///
    /// Total and stable: always returns exactly one canonical category, and
    /// the same input always yields the same output. Case-insensitive.
    ///
    /// ## Example
    /// ```rust
    /// use clinic_core::category::TherapeuticCategory;
    ///
    /// assert_eq!(
    ///     TherapeuticCategory::normalize("BOTOX toxina"),
    ///     TherapeuticCategory::ToxinBotulinum
    /// );
    /// assert_eq!(
    ///     TherapeuticCategory::normalize("categoria misteriosa"),
    ///     TherapeuticCategory::Other
    /// );
    /// ```
    pub fn normalize(label: &str) -> TherapeuticCategory {
        let needle = label.trim().to_lowercase();

        for (keywords, category) in KEYWORD_TABLE {
            if keywords.iter().any(|kw| needle.contains(kw)) {
                return *category;
            }
        }

        TherapeuticCategory::Other
    }

    /// Returns the combo bucket this category counts toward, if any.
    pub const fn combo_bucket(&self) -> Option<ComboBucket> {
        match self {
            TherapeuticCategory::ToxinBotulinum => Some(ComboBucket::Toxin),
            TherapeuticCategory::HyaluronicFiller => Some(ComboBucket::Filler),
            TherapeuticCategory::Biostimulator
            | TherapeuticCategory::Skinbooster
            | TherapeuticCategory::Lipolytic => Some(ComboBucket::Specialty),
            TherapeuticCategory::Other => None,
        }
    }
}

impl fmt::Display for TherapeuticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TherapeuticCategory::ToxinBotulinum => "Toxin Botulinum",
            TherapeuticCategory::HyaluronicFiller => "Hyaluronic Filler",
            TherapeuticCategory::Biostimulator => "Biostimulator",
            TherapeuticCategory::Skinbooster => "Skinbooster",
            TherapeuticCategory::Lipolytic => "Lipolytic",
            TherapeuticCategory::Other => "Other",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_toxin_variants() {
        assert_eq!(
            TherapeuticCategory::normalize("BOTOX toxina"),
            TherapeuticCategory::ToxinBotulinum
        );
        assert_eq!(
            TherapeuticCategory::normalize("toxina botulinica"),
            TherapeuticCategory::ToxinBotulinum
        );
        assert_eq!(
            TherapeuticCategory::normalize("  Dysport 300U "),
            TherapeuticCategory::ToxinBotulinum
        );
    }

    #[test]
    fn test_normalize_filler_variants() {
        assert_eq!(
            TherapeuticCategory::normalize("Preenchedor labial"),
            TherapeuticCategory::HyaluronicFiller
        );
        assert_eq!(
            TherapeuticCategory::normalize("acido hialuronico 1ml"),
            TherapeuticCategory::HyaluronicFiller
        );
        assert_eq!(
            TherapeuticCategory::normalize("FILLER"),
            TherapeuticCategory::HyaluronicFiller
        );
    }

    #[test]
    fn test_normalize_specialty_variants() {
        assert_eq!(
            TherapeuticCategory::normalize("Bioestimulador de colageno"),
            TherapeuticCategory::Biostimulator
        );
        assert_eq!(
            TherapeuticCategory::normalize("Skinbooster facial"),
            TherapeuticCategory::Skinbooster
        );
        assert_eq!(
            TherapeuticCategory::normalize("enzima lipolitica"),
            TherapeuticCategory::Lipolytic
        );
    }

    #[test]
    fn test_normalize_is_total() {
        // Unrecognized labels fall back to Other, never panic
        assert_eq!(
            TherapeuticCategory::normalize("categoria misteriosa"),
            TherapeuticCategory::Other
        );
        assert_eq!(TherapeuticCategory::normalize(""), TherapeuticCategory::Other);
    }

    #[test]
    fn test_normalize_is_stable() {
        let label = "Toxina 50U";
        assert_eq!(
            TherapeuticCategory::normalize(label),
            TherapeuticCategory::normalize(label)
        );
    }

    #[test]
    fn test_first_match_wins() {
        // "toxina" appears before "preench" in the table, so a pathological
        // label containing both classifies as toxin
        assert_eq!(
            TherapeuticCategory::normalize("toxina + preenchedor combo"),
            TherapeuticCategory::ToxinBotulinum
        );
    }

    #[test]
    fn test_combo_buckets() {
        assert_eq!(
            TherapeuticCategory::ToxinBotulinum.combo_bucket(),
            Some(ComboBucket::Toxin)
        );
        assert_eq!(
            TherapeuticCategory::HyaluronicFiller.combo_bucket(),
            Some(ComboBucket::Filler)
        );
        assert_eq!(
            TherapeuticCategory::Biostimulator.combo_bucket(),
            Some(ComboBucket::Specialty)
        );
        assert_eq!(
            TherapeuticCategory::Skinbooster.combo_bucket(),
            Some(ComboBucket::Specialty)
        );
        assert_eq!(
            TherapeuticCategory::Lipolytic.combo_bucket(),
            Some(ComboBucket::Specialty)
        );
        assert_eq!(TherapeuticCategory::Other.combo_bucket(), None);
    }
}
