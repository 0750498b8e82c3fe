//! Screening Score - PHQ-9 total and severity band (stage 2)
//!
//! The total comes from a directly supplied `phq9_score` or from the nine
//! item answers. Items accept 0-3 or the questionnaire's text descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::answers::{coerce_integer, NormalizedAnswers};

/// Highest possible total (9 items × 3)
pub const MAX_SCREENING_SCORE: u8 = 27;

/// Highest value of a single item
pub const MAX_ITEM_SCORE: u8 = 3;

pub const PHQ9_ITEM_KEYS: [&str; 9] = [
    "phq9_q1", // Little interest or pleasure
    "phq9_q2", // Feeling down, depressed
    "phq9_q3", // Sleep problems
    "phq9_q4", // Tired or little energy
    "phq9_q5", // Appetite problems
    "phq9_q6", // Feeling bad about self
    "phq9_q7", // Trouble concentrating
    "phq9_q8", // Moving/speaking slowly
    "phq9_q9", // Thoughts of self-harm
];

/// PHQ-9 total, always within 0..=27
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScreeningScore(u8);

impl ScreeningScore {
    pub fn new(score: i64) -> Self {
        Self(score.clamp(0, MAX_SCREENING_SCORE as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn band(self) -> SeverityBand {
        SeverityBand::from_score(self)
    }

    /// Emotional-state proxy shared by two mood columns
    pub fn mood_proxy(self) -> &'static str {
        match self.0 {
            15.. => "worried",
            10..=14 => "tired",
            5..=9 => "afraid",
            _ => "nan",
        }
    }

    /// Sleep proxy shared by both relax/sleep columns
    pub fn sleep_proxy(self) -> &'static str {
        if self.0 < 10 {
            "yes"
        } else {
            "no"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    Minimal,
    Mild,
    Moderate,
    ModeratelySevere,
    Severe,
}

impl SeverityBand {
    pub fn from_score(score: ScreeningScore) -> Self {
        match score.value() {
            0..=4 => SeverityBand::Minimal,
            5..=9 => SeverityBand::Mild,
            10..=14 => SeverityBand::Moderate,
            15..=19 => SeverityBand::ModeratelySevere,
            _ => SeverityBand::Severe,
        }
    }

    /// Token used by the encoding table
    pub fn as_token(self) -> &'static str {
        match self {
            SeverityBand::Minimal => "minimal",
            SeverityBand::Mild => "mild",
            SeverityBand::Moderate => "moderate",
            SeverityBand::ModeratelySevere => "moderately severe",
            SeverityBand::Severe => "severe",
        }
    }
}

/// Score of one item answer; unreadable answers count as 0
pub fn item_score(value: &Value) -> u8 {
    if let Value::String(text) = value {
        let text = text.trim().to_lowercase();
        if text.contains("not at all") || text == "0" {
            return 0;
        }
        if text.contains("several") || text == "1" {
            return 1;
        }
        if text.contains("more than half") || text == "2" {
            return 2;
        }
        if text.contains("nearly every") || text == "3" {
            return 3;
        }
    }

    coerce_integer(value)
        .map(|n| n.clamp(0, MAX_ITEM_SCORE as i64) as u8)
        .unwrap_or(0)
}

/// Direct score when supplied and numeric, otherwise the item sum
pub fn compute_score(answers: &NormalizedAnswers) -> ScreeningScore {
    if let Some(direct) = answers.raw("phq9_score").and_then(coerce_integer) {
        return ScreeningScore::new(direct);
    }

    let total: i64 = PHQ9_ITEM_KEYS
        .iter()
        .filter_map(|key| answers.raw(key))
        .map(|value| item_score(value) as i64)
        .sum();

    ScreeningScore::new(total)
}
