//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the derived feature schema.**
//!
//! ## Rules:
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Column names are the training dataset's headers, typos included
//! ("Recieved Support"); classifiers look features up by these names.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in derivation order
pub const FEATURE_LAYOUT: &[&str] = &[
    // === Direct answers (0-7) ===
    "Age",                                      // 0
    "Number of the latest pregnancy",           // 1
    "Education Level",                          // 2
    "Husband's education level",                // 3
    "Total children",                           // 4
    "Family type",                              // 5
    "PHQ9 Score",                               // 6
    "PHQ9 Result",                              // 7

    // === Household & pregnancy (8-14) ===
    "Number of household members",              // 8: bucketed 0/1/2
    "Disease before pregnancy",                 // 9
    "Pregnancy length",                         // 10
    "Pregnancy plan",                           // 11
    "Regular checkups",                         // 12
    "Fear of pregnancy",                        // 13
    "Diseases during pregnancy",                // 14

    // === Emotional & support (15-22) ===
    "Feeling about motherhood",                 // 15
    "Recieved Support",                         // 16
    "Need for Support",                         // 17: mirrors 16
    "Major changes or losses during pregnancy", // 18
    "Abuse",                                    // 19
    "Trust and share feelings",                 // 20
    "Feeling for regular activities",           // 21: mood proxy
    "Angry after latest child birth",           // 22: mood proxy

    // === Relationships (23-27) ===
    "Relationship with the in-laws",            // 23
    "Relationship with husband",                // 24
    "Relationship with the newborn",            // 25
    "Relationship between father and newborn",  // 26
    "Age of immediate older children",          // 27

    // === Birth & newborn (28-35) ===
    "Birth compliancy",                         // 28
    "Breastfeed",                               // 29
    "Worry about newborn",                      // 30
    "Relax/sleep when newborn is tended",       // 31: sleep proxy
    "Relax/sleep when the newborn is asleep",   // 32: sleep proxy
    "Depression before pregnancy (PHQ2)",       // 33
    "Depression during pregnancy (PHQ2)",       // 34
    "Newborn illness",                          // 35

    // === Engineered (36-53) ===
    "age_squared",                              // 36
    "age_parity_interaction",                   // 37
    "age_very_young",                           // 38
    "age_young",                                // 39
    "age_optimal",                              // 40
    "age_advanced",                             // 41
    "phq9_minimal",                             // 42
    "phq9_mild",                                // 43
    "phq9_moderate",                            // 44
    "phq9_severe",                              // 45
    "high_parity_risk",                         // 46
    "history_loss_flag",                        // 47
    "abuse_flag",                               // 48
    "depression_history_flag",                  // 49
    "social_support_index",                     // 50
    "low_support_flag",                         // 51
    "pregnancy_stress_score",                   // 52
    "cumulative_risk_score",                    // 53
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 54;

/// Features that come straight from (or are derived from) answers
pub const CORE_FEATURE_COUNT: usize = 36;

/// Column holding the household size; bucketed numerically, not via the table
pub const HOUSEHOLD_COLUMN: &str = "Number of household members";

/// Columns whose textual values go through the label encoding table
pub const CATEGORICAL_COLUMNS: &[&str] = &[
    "Education Level",
    "Husband's education level",
    "Total children",
    "Disease before pregnancy",
    "Family type",
    "Relationship with the in-laws",
    "Relationship with husband",
    "Relationship with the newborn",
    "Relationship between father and newborn",
    "Feeling about motherhood",
    "Recieved Support",
    "Need for Support",
    "Major changes or losses during pregnancy",
    "Abuse",
    "Trust and share feelings",
    "Pregnancy length",
    "Pregnancy plan",
    "Regular checkups",
    "Fear of pregnancy",
    "Diseases during pregnancy",
    "Age of immediate older children",
    "Birth compliancy",
    "Breastfeed",
    "Worry about newborn",
    "Relax/sleep when newborn is tended",
    "Relax/sleep when the newborn is asleep",
    "Angry after latest child birth",
    "Feeling for regular activities",
    "Depression before pregnancy (PHQ2)",
    "Depression during pregnancy (PHQ2)",
    "PHQ9 Result",
    "Newborn illness",
];

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over version and names, used to detect layout mismatches in
/// stored vectors and exported datasets
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

pub fn is_categorical(name: &str) -> bool {
    CATEGORICAL_COLUMNS.contains(&name)
}

/// Expected columns this layout cannot produce
pub fn unknown_columns<'a>(expected: &'a [String]) -> Vec<&'a str> {
    expected
        .iter()
        .map(String::as_str)
        .filter(|name| feature_index(name).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_feature_count_matches() {
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
        assert_eq!(FEATURE_LAYOUT.len(), CORE_FEATURE_COUNT + 18);
    }

    #[test]
    fn test_names_are_unique() {
        let unique: HashSet<_> = FEATURE_LAYOUT.iter().collect();
        assert_eq!(unique.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_categorical_columns_are_in_layout() {
        for column in CATEGORICAL_COLUMNS {
            let index = feature_index(column).expect("categorical column missing from layout");
            assert!(index < CORE_FEATURE_COUNT);
        }
        assert!(!is_categorical(HOUSEHOLD_COLUMN));
    }

    #[test]
    fn test_layout_hash_is_stable() {
        assert_eq!(compute_layout_hash(), layout_hash());
        assert_eq!(LayoutInfo::current().hash, layout_hash());
    }

    #[test]
    fn test_unknown_columns() {
        let expected = vec!["Age".to_string(), "Residence".to_string()];
        assert_eq!(unknown_columns(&expected), vec!["Residence"]);
    }
}
