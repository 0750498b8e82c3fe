//! Encoding Module - Categorical Answer Encoding
//!
//! Maps normalized categorical strings to the integer codes the classifier
//! was trained on. The table is data, not code: the built-in copy mirrors the
//! training-time label encoders and can be replaced by a versioned JSON file.

pub mod table;
mod training;

pub use table::{ColumnEncoding, EncodingError, LabelEncodingTable, DEFAULT_CODE};
