//! Dependency classification.
//!
//! - [`classifier`] — first-match-wins lookup of one name against a rule set.
//! - [`engine`] — batch driver: partitions records by ecosystem and classifies
//!   each partition against its cached rule set.

pub mod classifier;
pub mod engine;
