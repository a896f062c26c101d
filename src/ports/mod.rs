//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the assessment service and the history store.

mod storage;

pub use storage::{AssessmentPage, AssessmentStore};
