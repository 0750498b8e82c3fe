//! Features Module - Feature Derivation Engine
//!
//! Expands a short questionnaire into the 54 columns the classifier was
//! trained on. Layout, stages and encoding are separate files so a column
//! can change without touching the others.

pub mod answers;
pub mod derived;
pub mod engineered;
pub mod layout;
pub mod pipeline;
pub mod schema;
pub mod screening;
pub mod vector;

#[cfg(test)]
mod tests;

// Re-export common types
pub use answers::AnswerSet;
pub use layout::{feature_index, feature_name, layout_hash, LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use pipeline::{derive_raw, FeatureDeriver};
pub use schema::{minimal_input_schema, InputSchema};
pub use screening::{ScreeningScore, SeverityBand};
pub use vector::{FeatureValue, FeatureVector};
