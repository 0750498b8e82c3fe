//! Engineered Features (stage 6)
//!
//! Numeric features computed from the age, parity, screening score and the
//! direct answers. Flags are 0/1, indices and scores are bounded.

use serde::{Deserialize, Serialize};

use super::derived::{is_yes, DirectFields};
use super::screening::ScreeningScore;

// Social support weights (sum to 1.0)
const SUPPORT_WEIGHT: f64 = 0.40;
const HUSBAND_WEIGHT: f64 = 0.35;
const INLAWS_WEIGHT: f64 = 0.25;

// Pregnancy stress weights (sum to 1.0)
const FEAR_WEIGHT: f64 = 0.3;
const COMPLICATIONS_WEIGHT: f64 = 0.3;
const CHANGES_WEIGHT: f64 = 0.4;

// Cumulative risk weights
const DEPRESSION_RISK: f64 = 3.0;
const ABUSE_RISK: f64 = 2.5;
const LOW_SUPPORT_RISK: f64 = 2.0;
const STRESS_RISK: f64 = 1.8;
const LOSS_RISK: f64 = 1.5;
const PARITY_RISK: f64 = 1.2;

/// Upper bound of the cumulative risk score
pub const MAX_CUMULATIVE_RISK: f64 =
    DEPRESSION_RISK + ABUSE_RISK + LOW_SUPPORT_RISK + STRESS_RISK + LOSS_RISK + PARITY_RISK;

const LOW_SUPPORT_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredFeatures {
    pub age_squared: f64,
    pub age_parity_interaction: f64,
    pub age_very_young: bool,
    pub age_young: bool,
    pub age_optimal: bool,
    pub age_advanced: bool,
    pub phq9_minimal: bool,
    pub phq9_mild: bool,
    pub phq9_moderate: bool,
    pub phq9_severe: bool,
    pub high_parity_risk: bool,
    pub history_loss_flag: bool,
    pub abuse_flag: bool,
    pub depression_history_flag: bool,
    pub social_support_index: f64,
    pub low_support_flag: bool,
    pub pregnancy_stress_score: f64,
    pub cumulative_risk_score: f64,
}

impl EngineeredFeatures {
    pub fn compute(age: i64, pregnancies: i64, score: ScreeningScore, direct: &DirectFields) -> Self {
        let phq9 = score.value();

        let social_support_index = social_support_index(
            &direct.family_support,
            &direct.relationship_husband,
            &direct.relationship_inlaws,
        );
        let pregnancy_stress_score = pregnancy_stress_score(
            is_yes(&direct.fear_pregnancy),
            is_yes(&direct.complications),
            is_yes(&direct.major_changes),
        );

        let high_parity_risk = pregnancies >= 4;
        let history_loss_flag = is_yes(&direct.pregnancy_loss);
        let abuse_flag = is_yes(&direct.abuse);
        // Fires on a moderate-or-worse score even without a reported history.
        let depression_history_flag = is_yes(&direct.depression_history) || phq9 >= 10;

        let cumulative_risk_score = flag(depression_history_flag) * DEPRESSION_RISK
            + flag(abuse_flag) * ABUSE_RISK
            + (1.0 - social_support_index) * LOW_SUPPORT_RISK
            + pregnancy_stress_score * STRESS_RISK
            + flag(history_loss_flag) * LOSS_RISK
            + flag(high_parity_risk) * PARITY_RISK;

        // Anchors are unbounded; float products cannot overflow
        let (age_f, pregnancies_f) = (age as f64, pregnancies as f64);

        Self {
            age_squared: age_f * age_f,
            age_parity_interaction: age_f * pregnancies_f,
            age_very_young: age < 21,
            age_young: (21..25).contains(&age),
            age_optimal: (25..=35).contains(&age),
            age_advanced: age > 35,
            phq9_minimal: phq9 <= 4,
            phq9_mild: (5..=9).contains(&phq9),
            phq9_moderate: (10..=14).contains(&phq9),
            phq9_severe: phq9 >= 15,
            high_parity_risk,
            history_loss_flag,
            abuse_flag,
            depression_history_flag,
            social_support_index,
            low_support_flag: direct.family_support == "low" || social_support_index < LOW_SUPPORT_THRESHOLD,
            pregnancy_stress_score,
            cumulative_risk_score,
        }
    }

    /// `(column, value)` pairs in layout order
    pub fn columns(&self) -> [(&'static str, f64); 18] {
        [
            ("age_squared", self.age_squared),
            ("age_parity_interaction", self.age_parity_interaction),
            ("age_very_young", flag(self.age_very_young)),
            ("age_young", flag(self.age_young)),
            ("age_optimal", flag(self.age_optimal)),
            ("age_advanced", flag(self.age_advanced)),
            ("phq9_minimal", flag(self.phq9_minimal)),
            ("phq9_mild", flag(self.phq9_mild)),
            ("phq9_moderate", flag(self.phq9_moderate)),
            ("phq9_severe", flag(self.phq9_severe)),
            ("high_parity_risk", flag(self.high_parity_risk)),
            ("history_loss_flag", flag(self.history_loss_flag)),
            ("abuse_flag", flag(self.abuse_flag)),
            ("depression_history_flag", flag(self.depression_history_flag)),
            ("social_support_index", self.social_support_index),
            ("low_support_flag", flag(self.low_support_flag)),
            ("pregnancy_stress_score", self.pregnancy_stress_score),
            ("cumulative_risk_score", self.cumulative_risk_score),
        ]
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn relationship_score(relationship: &str) -> f64 {
    match relationship {
        "good" | "very good" | "friendly" => 1.0,
        "neutral" => 0.5,
        _ => 0.0,
    }
}

fn support_score(support: &str) -> f64 {
    match support {
        "high" => 1.0,
        "medium" => 0.5,
        _ => 0.0,
    }
}

/// Weighted support index in [0, 1]
pub fn social_support_index(family_support: &str, husband: &str, inlaws: &str) -> f64 {
    support_score(family_support) * SUPPORT_WEIGHT
        + relationship_score(husband) * HUSBAND_WEIGHT
        + relationship_score(inlaws) * INLAWS_WEIGHT
}

/// Weighted stress score in [0, 1]
pub fn pregnancy_stress_score(fear: bool, complications: bool, major_changes: bool) -> f64 {
    flag(fear) * FEAR_WEIGHT + flag(complications) * COMPLICATIONS_WEIGHT + flag(major_changes) * CHANGES_WEIGHT
}
