//! Answer Set - Questionnaire input and its normalization
//!
//! Answers arrive as a flat JSON object with loosely typed values. The
//! normalization stage lowercases keys, coerces the numeric anchors (age,
//! pregnancy count) and offers typed accessors with defaults. Nothing here
//! fails: malformed answers fall back to their documented defaults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{DEFAULT_AGE, DEFAULT_PREGNANCIES};

/// Raw questionnaire answers. Keys are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(Map<String, Value>);

impl AnswerSet {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// `None` unless `value` is a JSON object
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Case-insensitive lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        let wanted = key.trim().to_lowercase();
        self.0
            .iter()
            .find(|(k, _)| k.trim().to_lowercase() == wanted)
            .map(|(_, v)| v)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// COERCION
// ============================================================================

/// Numeric reading of a JSON value: numbers, numeric strings. Non-finite
/// values and booleans are not numbers.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Integer reading, truncated toward zero
pub fn coerce_integer(value: &Value) -> Option<i64> {
    coerce_number(value).map(|n| n.trunc() as i64)
}

/// Lowercased, trimmed text reading. Booleans read as yes/no.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_lowercase()),
        Value::Bool(true) => Some("yes".to_string()),
        Value::Bool(false) => Some("no".to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

// ============================================================================
// NORMALIZED ANSWERS (stage 1)
// ============================================================================

/// Answers with normalized keys and the numeric anchors resolved
#[derive(Debug, Clone)]
pub struct NormalizedAnswers {
    pub age: i64,
    pub pregnancies: i64,
    values: HashMap<String, Value>,
}

impl NormalizedAnswers {
    pub fn from_answers(answers: &AnswerSet) -> Self {
        let values: HashMap<String, Value> = answers
            .as_map()
            .iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.clone()))
            .collect();

        let age = values
            .get("age")
            .and_then(coerce_integer)
            .unwrap_or(DEFAULT_AGE);
        let pregnancies = values
            .get("number_of_pregnancies")
            .and_then(coerce_integer)
            .unwrap_or(DEFAULT_PREGNANCIES);

        Self { age, pregnancies, values }
    }

    /// Raw value, `None` for absent or null
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.raw(key).and_then(coerce_number)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.raw(key).and_then(coerce_text)
    }

    /// Free text answer (yes/no questions), `default` when absent
    pub fn yes_no(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    /// Categorical answer restricted to `options`, `default` otherwise
    pub fn category(&self, key: &str, default: &str, options: &[&str]) -> String {
        match self.text(key) {
            Some(value) if options.contains(&value.as_str()) => value,
            _ => default.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let answers = AnswerSet::new().with("Age", 30).with(" Family_Support ", "high");
        assert_eq!(answers.get("age"), Some(&json!(30)));
        assert_eq!(answers.get("family_support"), Some(&json!("high")));
    }

    #[test]
    fn test_numeric_anchors_default_when_malformed() {
        let answers = AnswerSet::new().with("age", "twenty").with("number_of_pregnancies", json!(null));
        let normalized = NormalizedAnswers::from_answers(&answers);
        assert_eq!(normalized.age, DEFAULT_AGE);
        assert_eq!(normalized.pregnancies, DEFAULT_PREGNANCIES);
    }

    #[test]
    fn test_numeric_strings_and_floats_truncate() {
        let answers = AnswerSet::new().with("age", " 31 ").with("number_of_pregnancies", 2.9);
        let normalized = NormalizedAnswers::from_answers(&answers);
        assert_eq!(normalized.age, 31);
        assert_eq!(normalized.pregnancies, 2);
    }

    #[test]
    fn test_category_rejects_unknown_options() {
        let answers = AnswerSet::new()
            .with("relationship_husband", "Complicated")
            .with("family_support", " HIGH ");
        let normalized = NormalizedAnswers::from_answers(&answers);
        assert_eq!(normalized.category("relationship_husband", "good", &["good", "bad"]), "good");
        assert_eq!(normalized.category("family_support", "medium", &["high", "medium", "low"]), "high");
    }

    #[test]
    fn test_booleans_read_as_yes_no() {
        let answers = AnswerSet::new().with("abuse", true).with("breastfeed", false);
        let normalized = NormalizedAnswers::from_answers(&answers);
        assert_eq!(normalized.yes_no("abuse", "no"), "yes");
        assert_eq!(normalized.yes_no("breastfeed", "yes"), "no");
        assert_eq!(normalized.yes_no("worry_newborn", "no"), "no");
    }
}
