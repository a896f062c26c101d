//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod assessment;
pub mod trend;

pub use assessment::AssessmentService;
pub use trend::{build_trend, summarize, TrendDelta, TrendDirection, TrendPoint, TrendSummary};
