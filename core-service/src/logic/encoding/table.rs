//! Label Encoding Table
//!
//! Ordered `token → code` lists per categorical column. Lookup is total:
//! unknown columns and unmatched values encode to the column default.
//!
//! ## Matching order
//! 1. exact match on the lowercased, trimmed value
//! 2. substring match in either direction, first entry in table order wins
//! 3. default code

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::training;

/// Code returned for unknown columns and unmatched values
pub const DEFAULT_CODE: i64 = 0;

/// Version of the built-in table
pub const TRAINING_TABLE_VERSION: u32 = 1;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("failed to read encoding table: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed encoding table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid encoding table: {0}")]
    Invalid(String),
}

// ============================================================================
// COLUMN
// ============================================================================

/// Encoding for one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnEncoding {
    pub column: String,

    /// `(token, code)` pairs in match-priority order
    pub tokens: Vec<(String, i64)>,

    /// Code for values that match nothing
    #[serde(default)]
    pub default_code: i64,
}

impl ColumnEncoding {
    pub fn new(column: &str, tokens: &[(&str, i64)]) -> Self {
        Self {
            column: column.to_string(),
            tokens: tokens.iter().map(|(t, c)| (t.to_string(), *c)).collect(),
            default_code: DEFAULT_CODE,
        }
    }

    /// Encode a raw value. Never fails.
    pub fn encode(&self, raw: &str) -> i64 {
        let value = raw.trim().to_lowercase();
        if value.is_empty() {
            return self.default_code;
        }

        if let Some((_, code)) = self.tokens.iter().find(|(token, _)| *token == value) {
            return *code;
        }

        self.tokens
            .iter()
            .find(|(token, _)| value.contains(token.as_str()) || token.contains(value.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(self.default_code)
    }

    fn validate(&self) -> Result<(), EncodingError> {
        if self.column.trim().is_empty() {
            return Err(EncodingError::Invalid("column with empty name".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for (token, _) in &self.tokens {
            if token.trim().is_empty() {
                return Err(EncodingError::Invalid(format!("empty token in '{}'", self.column)));
            }
            if *token != token.trim().to_lowercase() {
                return Err(EncodingError::Invalid(format!(
                    "token '{}' in '{}' must be lowercase and trimmed",
                    token, self.column
                )));
            }
            if !seen.insert(token.as_str()) {
                return Err(EncodingError::Invalid(format!(
                    "duplicate token '{}' in '{}'",
                    token, self.column
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// On-disk layout of a table file
#[derive(Debug, Serialize, Deserialize)]
struct TableFile {
    version: u32,
    columns: Vec<ColumnEncoding>,
}

/// Immutable column → encoding lookup, shared across requests
#[derive(Debug, Clone)]
pub struct LabelEncodingTable {
    version: u32,
    columns: Vec<ColumnEncoding>,
    index: HashMap<String, usize>,
}

impl LabelEncodingTable {
    /// Table matching the codes the shipped classifier was trained with
    pub fn training_default() -> Self {
        // The built-in columns are validated by tests; construction cannot fail.
        Self::from_columns(TRAINING_TABLE_VERSION, training::columns())
            .unwrap_or_else(|_| Self::empty())
    }

    pub fn empty() -> Self {
        Self {
            version: 0,
            columns: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn from_columns(version: u32, columns: Vec<ColumnEncoding>) -> Result<Self, EncodingError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            column.validate()?;
            if index.insert(column.column.clone(), i).is_some() {
                return Err(EncodingError::Invalid(format!(
                    "duplicate column '{}'",
                    column.column
                )));
            }
        }

        Ok(Self { version, columns, index })
    }

    pub fn from_json_str(content: &str) -> Result<Self, EncodingError> {
        let file: TableFile = serde_json::from_str(content)?;
        Self::from_columns(file.version, file.columns)
    }

    /// Load a table file. Any failure here is a startup failure.
    pub fn load(path: &Path) -> Result<Self, EncodingError> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&content)?;
        log::info!(
            "Loaded encoding table v{} ({} columns) from {}",
            table.version,
            table.columns.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn to_json_string(&self) -> Result<String, EncodingError> {
        let file = TableFile {
            version: self.version,
            columns: self.columns.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Encode `raw` for `column`. Unknown columns yield [`DEFAULT_CODE`].
    pub fn encode(&self, column: &str, raw: &str) -> i64 {
        match self.column(column) {
            Some(encoding) => encoding.encode(raw),
            None => DEFAULT_CODE,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnEncoding> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.column.as_str())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for LabelEncodingTable {
    fn default() -> Self {
        Self::training_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_table_is_valid() {
        let table = LabelEncodingTable::from_columns(TRAINING_TABLE_VERSION, training::columns());
        assert!(table.is_ok());
        assert_eq!(table.unwrap().len(), 33);
    }

    #[test]
    fn test_exact_match_ignores_case_and_whitespace() {
        let table = LabelEncodingTable::training_default();
        assert_eq!(table.encode("Education Level", "university"), 3);
        assert_eq!(table.encode("Education Level", "  University "), 3);
        assert_eq!(table.encode("Education Level", "UNIVERSITY"), 3);
        assert_eq!(table.encode("PHQ9 Result", "moderately severe"), 3);
    }

    #[test]
    fn test_substring_match_takes_first_entry() {
        let table = LabelEncodingTable::training_default();
        // "secondary high school" contains "high school"
        assert_eq!(table.encode("Education Level", "secondary high school"), 1);
        // "severe" is contained in "moderately severe" but exact wins
        assert_eq!(table.encode("PHQ9 Result", "severe"), 5);
        // no exact entry: "moderate" is the first token contained in the value
        assert_eq!(table.encode("PHQ9 Result", "moderate-ish"), 2);
    }

    #[test]
    fn test_unknown_values_and_columns_default() {
        let table = LabelEncodingTable::training_default();
        assert_eq!(table.encode("Family type", "commune"), DEFAULT_CODE);
        assert_eq!(table.encode("Family type", ""), DEFAULT_CODE);
        assert_eq!(table.encode("Favourite colour", "blue"), DEFAULT_CODE);
    }

    #[test]
    fn test_load_from_json_keeps_order() {
        let json = r#"{
            "version": 7,
            "columns": [
                {"column": "Mood", "tokens": [["low", 4], ["very low", 9]], "default_code": 2}
            ]
        }"#;
        let table = LabelEncodingTable::from_json_str(json).unwrap();
        assert_eq!(table.version(), 7);
        assert_eq!(table.encode("Mood", "very low"), 9);
        // substring: "low" is listed first
        assert_eq!(table.encode("Mood", "rather low"), 4);
        assert_eq!(table.encode("Mood", "cheerful"), 2);
    }

    #[test]
    fn test_invalid_tables_are_rejected() {
        let dup_column = r#"{"version": 1, "columns": [
            {"column": "A", "tokens": [["x", 0]]},
            {"column": "A", "tokens": [["y", 1]]}
        ]}"#;
        assert!(LabelEncodingTable::from_json_str(dup_column).is_err());

        let dup_token = r#"{"version": 1, "columns": [
            {"column": "A", "tokens": [["x", 0], ["x", 1]]}
        ]}"#;
        assert!(LabelEncodingTable::from_json_str(dup_token).is_err());

        let upper_token = r#"{"version": 1, "columns": [
            {"column": "A", "tokens": [["Yes", 1]]}
        ]}"#;
        assert!(LabelEncodingTable::from_json_str(upper_token).is_err());
    }

    #[test]
    fn test_json_round_trip_preserves_lookup() {
        let table = LabelEncodingTable::training_default();
        let json = table.to_json_string().unwrap();
        let reloaded = LabelEncodingTable::from_json_str(&json).unwrap();
        assert_eq!(reloaded.encode("Abuse", "yes"), 2);
        assert_eq!(reloaded.len(), table.len());
    }
}
