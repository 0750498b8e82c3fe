//! Feature Vector - Named, ordered classifier input
//!
//! **Versioned feature vector with layout metadata**
//!
//! Unlike a fixed array, entries are keyed by column name: the prediction
//! service aligns them to whatever column order the loaded classifier
//! expects, so extra entries are harmless and missing ones get padded.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::layout::{layout_hash, FEATURE_LAYOUT, FEATURE_VERSION};

// ============================================================================
// FEATURE VALUE
// ============================================================================

/// A single cell. Derived vectors are fully numeric; text only appears in
/// vectors supplied from outside the derivation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s.as_str()),
            FeatureValue::Number(_) => None,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(n: f64) -> Self {
        FeatureValue::Number(n)
    }
}

impl From<i64> for FeatureValue {
    fn from(n: i64) -> Self {
        FeatureValue::Number(n as f64)
    }
}

impl From<bool> for FeatureValue {
    fn from(flag: bool) -> Self {
        FeatureValue::Number(if flag { 1.0 } else { 0.0 })
    }
}

impl From<&str> for FeatureValue {
    fn from(s: &str) -> Self {
        FeatureValue::Text(s.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(s: String) -> Self {
        FeatureValue::Text(s)
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(n) => write!(f, "{}", n),
            FeatureValue::Text(s) => write!(f, "{}", s),
        }
    }
}

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned feature vector with layout metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// `(name, value)` entries in insertion order
    entries: Vec<(String, FeatureValue)>,
}

impl FeatureVector {
    /// Empty vector stamped with the current layout
    pub fn new() -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            entries: Vec::with_capacity(FEATURE_LAYOUT.len()),
        }
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FeatureValue>,
    {
        let mut vector = Self::new();
        for (name, value) in entries {
            vector.insert(name, value);
        }
        vector
    }

    /// Build from a JSON object; non-scalar values are skipped
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut vector = Self::new();
        for (name, value) in object {
            match value {
                serde_json::Value::Number(n) => {
                    if let Some(x) = n.as_f64() {
                        vector.insert(name.clone(), x);
                    }
                }
                serde_json::Value::String(s) => vector.insert(name.clone(), s.clone()),
                serde_json::Value::Bool(b) => vector.insert(name.clone(), *b),
                serde_json::Value::Null => vector.insert(name.clone(), "nan"),
                _ => {}
            }
        }
        vector
    }

    /// Insert or replace a value, keeping the original position on replace
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Numeric value by name; `None` for missing or text entries
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FeatureValue::as_number)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every entry is numeric
    pub fn is_numeric(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.as_number().is_some())
    }

    /// Check if vector was built against the current layout
    pub fn is_compatible(&self) -> bool {
        self.version == FEATURE_VERSION && self.layout_hash == layout_hash()
    }

    /// Flat JSON object for storage and export
    pub fn to_json_object(&self) -> serde_json::Map<String, serde_json::Value> {
        self.entries
            .iter()
            .map(|(name, value)| {
                let json = match value {
                    FeatureValue::Number(n) => serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null),
                    FeatureValue::Text(s) => serde_json::Value::String(s.clone()),
                };
                (name.clone(), json)
            })
            .collect()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vector_has_current_layout() {
        let v = FeatureVector::new();
        assert!(v.is_compatible());
        assert!(v.is_empty());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut v = FeatureVector::from_entries([("Age", 28.0), ("PHQ9 Score", 4.0)]);
        v.insert("Age", 31.0);
        assert_eq!(v.len(), 2);
        assert_eq!(v.names().collect::<Vec<_>>(), vec!["Age", "PHQ9 Score"]);
        assert_eq!(v.number("Age"), Some(31.0));
    }

    #[test]
    fn test_text_entries_are_not_numbers() {
        let mut v = FeatureVector::new();
        v.insert("Abuse", "yes");
        assert_eq!(v.number("Abuse"), None);
        assert_eq!(v.get("Abuse").and_then(FeatureValue::as_text), Some("yes"));
        assert!(!v.is_numeric());
    }

    #[test]
    fn test_json_object_conversion() {
        let json = serde_json::json!({"Age": 30, "Abuse": "no", "Breastfeed": true, "Notes": [1, 2]});
        let v = FeatureVector::from_json_object(json.as_object().unwrap());
        assert_eq!(v.number("Age"), Some(30.0));
        assert_eq!(v.number("Breastfeed"), Some(1.0));
        assert!(!v.contains("Notes"));

        let back = v.to_json_object();
        assert_eq!(back.get("Abuse"), Some(&serde_json::json!("no")));
    }

    #[test]
    fn test_non_finite_numbers_export_as_null() {
        let v = FeatureVector::from_entries([("x", f64::NAN)]);
        assert_eq!(v.to_json_object().get("x"), Some(&serde_json::Value::Null));
    }
}
