//! Data models

pub mod feedback;
pub mod follow_up;
pub mod prediction;

pub use feedback::*;
pub use follow_up::*;
pub use prediction::*;
