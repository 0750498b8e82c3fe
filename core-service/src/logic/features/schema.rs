//! Question catalogue served to front ends for input validation

use serde::Serialize;

use super::derived::{FAMILY_TYPE_OPTIONS, MOTHERHOOD_OPTIONS, SUPPORT_OPTIONS, TOTAL_CHILDREN_OPTIONS};
use super::screening::PHQ9_ITEM_KEYS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Number,
    Select,
    YesNo,
    Scale,
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub key: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<&'static [&'static str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
}

impl Question {
    fn new(key: &'static str, label: &'static str, kind: QuestionKind) -> Self {
        Self {
            key,
            label,
            kind,
            options: None,
            min: None,
            max: None,
            sensitive: false,
        }
    }

    fn select(key: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        let mut q = Self::new(key, label, QuestionKind::Select);
        q.options = Some(options);
        q
    }

    fn number(key: &'static str, label: &'static str, min: u32, max: u32) -> Self {
        let mut q = Self::new(key, label, QuestionKind::Number);
        q.min = Some(min);
        q.max = Some(max);
        q
    }

    fn yes_no(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, QuestionKind::YesNo)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSchema {
    pub required: Vec<Question>,
    pub phq9: Vec<Question>,
    pub optional: Vec<Question>,
}

const PHQ9_LABELS: [&str; 9] = [
    "Little interest or pleasure in doing things?",
    "Feeling down, depressed, or hopeless?",
    "Trouble falling/staying asleep, or sleeping too much?",
    "Feeling tired or having little energy?",
    "Poor appetite or overeating?",
    "Feeling bad about yourself?",
    "Trouble concentrating?",
    "Moving/speaking slowly or being fidgety?",
    "Thoughts of self-harm?",
];

const EDUCATION_OPTIONS: &[&str] = &["primary school", "high school", "college", "university"];
const RELATIONSHIP_CHOICES: &[&str] = &["good", "neutral", "bad"];

/// Minimal question set: required, screening items, optional refinements
pub fn minimal_input_schema() -> InputSchema {
    let mut abuse = Question::yes_no("abuse", "Experience of abuse?");
    abuse.sensitive = true;

    let phq9 = PHQ9_ITEM_KEYS
        .into_iter()
        .zip(PHQ9_LABELS)
        .map(|(key, label)| {
            let mut q = Question::new(key, label, QuestionKind::Scale);
            q.min = Some(0);
            q.max = Some(3);
            q
        })
        .collect();

    InputSchema {
        required: vec![
            Question::number("age", "Age", 18, 50),
            Question::select("education_level", "Education Level", EDUCATION_OPTIONS),
            Question::number("number_of_pregnancies", "Number of Pregnancies", 1, 10),
            Question::yes_no("depression_history", "Depression before/during pregnancy?"),
            Question::select("relationship_husband", "Relationship with Husband", RELATIONSHIP_CHOICES),
            Question::select("relationship_inlaws", "Relationship with In-laws", RELATIONSHIP_CHOICES),
            Question::select("family_support", "Family Support Level", SUPPORT_OPTIONS),
            Question::select("feeling_motherhood", "Feeling about Motherhood", MOTHERHOOD_OPTIONS),
            Question::yes_no("major_changes", "Major changes/losses during pregnancy?"),
            Question::yes_no("fear_pregnancy", "Fear/anxiety about pregnancy?"),
            Question::yes_no("worry_newborn", "Worry about newborn health?"),
        ],
        phq9,
        optional: vec![
            abuse,
            Question::select("family_type", "Family Type", FAMILY_TYPE_OPTIONS),
            Question::select("total_children", "Total Children", TOTAL_CHILDREN_OPTIONS),
            Question::yes_no("breastfeed", "Currently breastfeeding?"),
            Question::yes_no("history_of_pregnancy_loss", "History of pregnancy loss?"),
            Question::yes_no("pregnancy_complications", "Complications during pregnancy?"),
            Question::yes_no("trust_share_feelings", "Can trust and share feelings with someone?"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lists_all_screening_items() {
        let schema = minimal_input_schema();
        assert_eq!(schema.phq9.len(), 9);
        assert_eq!(schema.required[0].key, "age");
    }

    #[test]
    fn test_schema_serializes_type_field() {
        let json = serde_json::to_value(minimal_input_schema()).unwrap();
        assert_eq!(json["required"][0]["type"], "number");
        assert_eq!(json["optional"][0]["sensitive"], true);
        assert!(json["required"][3].get("options").is_none());
    }
}
