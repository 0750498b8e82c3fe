//! Logic Module - the triage pipeline stages
//!
//! - `encoding/` - label encoding table (categorical text → training codes)
//! - `features/` - answer set → 54-column feature vector
//! - `model/` - classifier artifacts and the prediction service
//! - `explain/` - per-prediction feature attribution
//! - `dataset/` - labeled records for offline retraining

pub mod dataset;
pub mod encoding;
pub mod explain;
pub mod features;
pub mod model;
