//! Central Configuration Constants
//!
//! Single source of truth for numeric defaults shared by the engine and the
//! server. The server reads its environment overrides in its own config.

use crate::logic::model::RiskLevel;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "MindBloom";

// ============================================
// Derivation defaults
// ============================================

/// Age used when the answer is absent or not numeric
pub const DEFAULT_AGE: i64 = 25;

/// Pregnancy count used when the answer is absent or not numeric
pub const DEFAULT_PREGNANCIES: i64 = 1;

/// Education level used when the answer is absent
pub const DEFAULT_EDUCATION: &str = "college";

// ============================================
// Classifier defaults
// ============================================

/// Label order produced by the training-time label encoder (alphabetical).
/// Used when a classifier does not report its own class list.
pub const DEFAULT_CLASS_ORDER: [RiskLevel; 3] = [RiskLevel::High, RiskLevel::Low, RiskLevel::Medium];

/// Null placeholder handed to classifiers for empty cells
pub const NULL_PLACEHOLDER: f64 = f64::NAN;

/// Value inserted for expected columns the input does not carry
pub const MISSING_FEATURE_DEFAULT: f64 = 0.0;

// ============================================
// Attribution defaults
// ============================================

/// Number of ranked contributions returned by default
pub const DEFAULT_TOP_K: usize = 10;

/// Maximum background rows sampled from reference data
pub const DEFAULT_BACKGROUND_ROWS: usize = 100;

/// Rows in the synthetic all-zero background
pub const ZERO_BACKGROUND_ROWS: usize = 10;

/// Permutations drawn by the sampling attribution strategy
pub const DEFAULT_PERMUTATIONS: usize = 32;

/// Seed for every random draw in the attribution engine
pub const ATTRIBUTION_SEED: u64 = 42;

/// Time budget for a single sampling attribution call (milliseconds)
pub const DEFAULT_SAMPLING_BUDGET_MS: u64 = 1500;

/// Scale applied to raw values by the last-resort value proxy
pub const VALUE_PROXY_SCALE: f64 = 0.01;

// ============================================
// Feedback loop defaults
// ============================================

/// Days between a prediction and its follow-up reminder
pub const DEFAULT_FOLLOW_UP_DAYS: i64 = 42;

/// Reminder channel recorded with each follow-up
pub const DEFAULT_FOLLOW_UP_METHOD: &str = "email";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get ranked contribution count from environment or use default
pub fn get_top_k() -> usize {
    std::env::var("EXPLAIN_TOP_K")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|k: &usize| *k > 0)
        .unwrap_or(DEFAULT_TOP_K)
}

/// Get permutation count from environment or use default
pub fn get_permutations() -> usize {
    std::env::var("SAMPLING_PERMUTATIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|p: &usize| *p > 0)
        .unwrap_or(DEFAULT_PERMUTATIONS)
}

/// Get background sample size from environment or use default
pub fn get_background_rows() -> usize {
    std::env::var("BACKGROUND_SAMPLE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n: &usize| *n > 0)
        .unwrap_or(DEFAULT_BACKGROUND_ROWS)
}
