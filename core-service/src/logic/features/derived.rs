//! Direct and derived answers (stages 3-5)
//!
//! Direct fields read answers with their defaults. Derived fields fill the
//! training columns no question asks about, using fixed lookup rules.

use serde::{Deserialize, Serialize};

use super::answers::NormalizedAnswers;
use super::screening::{ScreeningScore, SeverityBand};
use crate::constants::DEFAULT_EDUCATION;

pub const RELATIONSHIP_OPTIONS: &[&str] = &["good", "neutral", "bad", "friendly", "poor"];
pub const SUPPORT_OPTIONS: &[&str] = &["high", "medium", "low"];
pub const MOTHERHOOD_OPTIONS: &[&str] = &["happy", "neutral", "sad"];
pub const FAMILY_TYPE_OPTIONS: &[&str] = &["nuclear", "joint"];
pub const TOTAL_CHILDREN_OPTIONS: &[&str] = &["one", "two", "more than two"];
pub const PREGNANCY_LENGTH_OPTIONS: &[&str] = &["10 months", "9 months", "less than 5 months"];

// ============================================================================
// DIRECT FIELDS (stage 3)
// ============================================================================

/// Answers read with defaults, all lowercase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectFields {
    pub education: String,
    pub husbands_education: String,
    pub total_children: String,
    pub family_type: String,
    pub pregnancy_length: String,
    pub pregnancy_plan: String,
    pub regular_checkups: String,

    pub pregnancy_loss: String,
    pub complications: String,
    pub depression_history: String,
    pub major_changes: String,
    pub fear_pregnancy: String,
    pub abuse: String,
    pub worry_newborn: String,
    pub trust_share: String,
    pub breastfeed: String,

    pub relationship_husband: String,
    pub relationship_inlaws: String,
    pub family_support: String,
    pub feeling_motherhood: String,
}

impl DirectFields {
    pub fn read(answers: &NormalizedAnswers) -> Self {
        let education = answers
            .text("education_level")
            .unwrap_or_else(|| DEFAULT_EDUCATION.to_string());
        let husbands_education = answers
            .text("husbands_education")
            .unwrap_or_else(|| education.clone());

        Self {
            husbands_education,
            total_children: answers.category("total_children", "one", TOTAL_CHILDREN_OPTIONS),
            family_type: answers.category("family_type", "nuclear", FAMILY_TYPE_OPTIONS),
            pregnancy_length: answers.category("pregnancy_length", "9 months", PREGNANCY_LENGTH_OPTIONS),
            pregnancy_plan: answers.yes_no("pregnancy_plan", "yes"),
            regular_checkups: answers.yes_no("regular_checkups", "yes"),

            pregnancy_loss: answers.yes_no("history_of_pregnancy_loss", "no"),
            complications: answers.yes_no("pregnancy_complications", "no"),
            depression_history: answers.yes_no("depression_history", "no"),
            major_changes: answers.yes_no("major_changes", "no"),
            fear_pregnancy: answers.yes_no("fear_pregnancy", "no"),
            abuse: answers.yes_no("abuse", "no"),
            worry_newborn: answers.yes_no("worry_newborn", "no"),
            trust_share: answers.yes_no("trust_share_feelings", "yes"),
            breastfeed: answers.yes_no("breastfeed", "yes"),

            relationship_husband: answers.category("relationship_husband", "good", RELATIONSHIP_OPTIONS),
            relationship_inlaws: answers.category("relationship_inlaws", "neutral", RELATIONSHIP_OPTIONS),
            family_support: answers.category("family_support", "medium", SUPPORT_OPTIONS),
            feeling_motherhood: answers.category("feeling_motherhood", "neutral", MOTHERHOOD_OPTIONS),
            education,
        }
    }
}

pub(crate) fn is_yes(value: &str) -> bool {
    value == "yes"
}

// ============================================================================
// DERIVED FIELDS (stages 4-5)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedFields {
    pub severity: SeverityBand,
    pub household_members: i64,
    pub disease_before: &'static str,
    pub diseases_during: &'static str,
    pub mood_proxy: &'static str,
    pub newborn_relationship: &'static str,
    pub father_newborn_relationship: String,
    pub older_children_age: &'static str,
    pub birth_compliancy: &'static str,
    pub sleep_proxy: &'static str,
    pub depression_before: &'static str,
    pub depression_during: &'static str,
    pub newborn_illness: &'static str,
}

impl DerivedFields {
    pub fn derive(direct: &DirectFields, pregnancies: i64, score: ScreeningScore) -> Self {
        let history = is_yes(&direct.depression_history);
        let complications = is_yes(&direct.complications);

        Self {
            severity: score.band(),
            household_members: household_members(&direct.family_type, &direct.total_children),
            disease_before: if complications { "chronic disease" } else { "nan" },
            diseases_during: if complications { "non chronic disease" } else { "nan" },
            mood_proxy: score.mood_proxy(),
            newborn_relationship: newborn_relationship(&direct.feeling_motherhood, &direct.family_support),
            father_newborn_relationship: father_newborn_relationship(&direct.relationship_husband),
            older_children_age: older_children_age(pregnancies),
            birth_compliancy: if direct.pregnancy_loss == "no" { "yes" } else { "no" },
            sleep_proxy: score.sleep_proxy(),
            depression_before: if history { "positive" } else { "negative" },
            depression_during: if history || score.value() >= 10 { "positive" } else { "negative" },
            newborn_illness: if is_yes(&direct.worry_newborn) { "yes" } else { "no" },
        }
    }
}

/// Household size estimate from family type and children
pub fn household_members(family_type: &str, total_children: &str) -> i64 {
    match (family_type, total_children) {
        ("joint", _) => 6,
        (_, "more than two") => 5,
        (_, "two") => 4,
        _ => 3,
    }
}

/// Bucket code for a household size: 2-5, 6-8, 9+
pub fn household_bucket(members: i64) -> i64 {
    match members {
        m if m <= 5 => 0,
        m if m <= 8 => 1,
        _ => 2,
    }
}

pub fn newborn_relationship(feeling_motherhood: &str, family_support: &str) -> &'static str {
    match (feeling_motherhood, family_support) {
        ("happy", "high") => "very good",
        ("sad", _) => "neutral",
        _ => "good",
    }
}

/// Husband relationship collapsed onto the newborn relationship vocabulary
pub fn father_newborn_relationship(relationship_husband: &str) -> String {
    match relationship_husband {
        "poor" => "neutral".to_string(),
        "friendly" => "good".to_string(),
        other => other.to_string(),
    }
}

pub fn older_children_age(pregnancies: i64) -> &'static str {
    match pregnancies {
        1 => "nan",
        n if n <= 3 => "1yr to 3yr",
        _ => "4yr to 6yr",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::answers::AnswerSet;

    fn direct_of(answers: AnswerSet) -> DirectFields {
        DirectFields::read(&NormalizedAnswers::from_answers(&answers))
    }

    #[test]
    fn test_defaults_when_nothing_answered() {
        let direct = direct_of(AnswerSet::new());
        assert_eq!(direct.education, "college");
        assert_eq!(direct.husbands_education, "college");
        assert_eq!(direct.relationship_husband, "good");
        assert_eq!(direct.relationship_inlaws, "neutral");
        assert_eq!(direct.family_support, "medium");
        assert_eq!(direct.trust_share, "yes");
        assert_eq!(direct.abuse, "no");
        assert_eq!(direct.pregnancy_length, "9 months");
    }

    #[test]
    fn test_husbands_education_follows_education() {
        let direct = direct_of(AnswerSet::new().with("education_level", "University"));
        assert_eq!(direct.husbands_education, "university");

        let direct = direct_of(
            AnswerSet::new()
                .with("education_level", "university")
                .with("husbands_education", "High School"),
        );
        assert_eq!(direct.husbands_education, "high school");
    }

    #[test]
    fn test_household_table() {
        assert_eq!(household_members("joint", "one"), 6);
        assert_eq!(household_members("nuclear", "more than two"), 5);
        assert_eq!(household_members("nuclear", "two"), 4);
        assert_eq!(household_members("nuclear", "one"), 3);

        assert_eq!(household_bucket(3), 0);
        assert_eq!(household_bucket(5), 0);
        assert_eq!(household_bucket(6), 1);
        assert_eq!(household_bucket(8), 1);
        assert_eq!(household_bucket(9), 2);
        assert_eq!(household_bucket(i64::MAX), 2);
        assert_eq!(household_bucket(i64::MIN), 0);
        assert_eq!(older_children_age(i64::MAX), older_children_age(10));
    }

    #[test]
    fn test_relationship_tables() {
        assert_eq!(newborn_relationship("happy", "high"), "very good");
        assert_eq!(newborn_relationship("happy", "low"), "good");
        assert_eq!(newborn_relationship("sad", "high"), "neutral");
        assert_eq!(father_newborn_relationship("poor"), "neutral");
        assert_eq!(father_newborn_relationship("friendly"), "good");
        assert_eq!(father_newborn_relationship("bad"), "bad");
    }

    #[test]
    fn test_older_children_age() {
        assert_eq!(older_children_age(1), "nan");
        assert_eq!(older_children_age(2), "1yr to 3yr");
        assert_eq!(older_children_age(3), "1yr to 3yr");
        assert_eq!(older_children_age(4), "4yr to 6yr");
    }

    #[test]
    fn test_depression_indicators() {
        let direct = direct_of(AnswerSet::new().with("depression_history", "no"));
        let low = DerivedFields::derive(&direct, 1, ScreeningScore::new(9));
        assert_eq!(low.depression_before, "negative");
        assert_eq!(low.depression_during, "negative");

        let high = DerivedFields::derive(&direct, 1, ScreeningScore::new(10));
        assert_eq!(high.depression_before, "negative");
        assert_eq!(high.depression_during, "positive");

        let history = direct_of(AnswerSet::new().with("depression_history", "yes"));
        let derived = DerivedFields::derive(&history, 1, ScreeningScore::new(0));
        assert_eq!(derived.depression_before, "positive");
        assert_eq!(derived.depression_during, "positive");
    }

    #[test]
    fn test_complications_drive_both_disease_columns() {
        let direct = direct_of(AnswerSet::new().with("pregnancy_complications", "yes"));
        let derived = DerivedFields::derive(&direct, 1, ScreeningScore::new(0));
        assert_eq!(derived.disease_before, "chronic disease");
        assert_eq!(derived.diseases_during, "non chronic disease");
    }
}
