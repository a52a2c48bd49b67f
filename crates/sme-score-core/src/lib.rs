//! Alternative credit scoring for small and medium businesses.
//!
//! Turns transactional, cash-flow, and advertising-performance series into
//! a 0-100 credit score with a risk tier and ranked decision drivers, for
//! businesses that lack traditional bureau history.
//!
//! Pipeline shape, leaves first:
//! [`dataset`] normalizes raw row tables into per-business series;
//! [`features`] computes fixed-width vectors at an as-of cutoff;
//! [`labels`] derives leakage-safe repayment labels from loan records;
//! [`model`] fits and applies a seeded random forest;
//! [`explain`] attributes a prediction to its top factors;
//! [`pipeline`] orchestrates offline training; [`engine`] is the
//! per-request scoring facade.
//!
//! Transport, UI, CSV parsing, and artifact persistence are external
//! collaborators; this crate is pure computation.

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod explain;
pub mod features;
pub mod labels;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod types;

#[cfg(test)]
pub(crate) mod testdata;

pub use engine::ScoringEngine;
pub use error::{ScoreEngineError, TrainingError};
pub use types::*;

/// Standard result type for all scoring-engine operations
pub type ScoreEngineResult<T> = Result<T, ScoreEngineError>;
