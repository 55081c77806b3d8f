//! Rule files: loading, compiling, caching, and ecosystem resolution.
//!
//! - [`compiler`] — turns a YAML rule file into an ordered [`compiler::RuleSet`].
//! - [`cache`] — per-run cache holding one compiled rule set per path.
//! - [`mapping`] — ecosystem identifier → rule file table.

pub mod cache;
pub mod compiler;
pub mod mapping;
