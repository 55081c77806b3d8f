//! Async HTTP clients for package registries.
//!
//! - [`maven`] — Maven Central search, used to enumerate artifacts under a
//!   group prefix when authoring Java rule patterns.

pub mod maven;
