//! Dataset Module - labeled training data for offline retraining
//!
//! Labeled (features, outcome) pairs are appended to rotating JSONL files as
//! outcomes arrive, and exported on demand as a de-duplicated snapshot.

pub mod export;
pub mod record;
pub mod writer;

#[cfg(test)]
mod tests;

pub use export::write_snapshot;
pub use record::LabeledRecord;
pub use writer::{DatasetStats, DatasetWriter};
