#![warn(clippy::unwrap_used)]

pub mod queries;
pub mod store;

pub use store::SegmentStore;
