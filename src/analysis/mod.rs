//! Affinity normalization and interpretation engine.
//!
//! Raw measurements flow one way: unit normalization, numeric summaries,
//! rubric classification, then plain-language interpretation. Everything
//! here is pure and does no I/O.

pub mod aggregator;
pub mod interpret;
pub mod numfmt;
pub mod rubric;
pub mod stats;
pub mod units;

pub use aggregator::*;
pub use interpret::{synthesize, Interpretation, PrimaryReading, Scope};
pub use numfmt::sig3;
pub use rubric::{classify, PotencyBucket};
pub use stats::summarize;
pub use units::{normalize, to_nanomolar};
