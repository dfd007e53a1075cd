//! Core memory engine: tiered stores, scoring, maintenance, and recall.

pub mod archive;
pub mod error;
pub mod journal;
pub mod maintenance;
pub mod recall;
pub mod scoring;
pub mod store;
pub mod types;

pub use error::MemoryError;
pub use maintenance::TierSet;
