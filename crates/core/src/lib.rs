//! Shared building blocks for the segment store: configuration, the error
//! taxonomy, and the segment/user value types.

pub mod config;
pub mod error;
pub mod types;

pub use crate::config::{AppConfig, DatabaseConfig};
pub use error::{SegmentError, SegmentResult};
pub use types::{Segment, User};
