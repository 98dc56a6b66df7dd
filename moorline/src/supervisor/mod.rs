//! Structured supervision for the pipeline task pair.

mod group;

pub use group::{GroupStatus, TaskGroup};
