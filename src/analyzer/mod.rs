//! Manifest analyzers: turn a project directory into dependency records.
//!
//! Each analyzer tags records with the package-manager identifier that the
//! rule mapping understands (`pip`, `npm`, `yarn`, `maven`, `gradle`, `go`,
//! `cargo`) and with the manifest file they came from.

use std::path::Path;

use anyhow::Result;

use crate::models::{DependencyRecord, Language};

pub mod go;
pub mod java;
pub mod node;
pub mod python;
pub mod rust;

/// Extra column recording which manifest a record was read from.
pub const MANIFEST_COLUMN: &str = "manifest";

pub trait Analyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<DependencyRecord>>;
}

/// Run the analyzer for `language` over `path`.
pub fn analyze(language: Language, path: &Path) -> Result<Vec<DependencyRecord>> {
    match language {
        Language::Python => python::PythonAnalyzer::new().analyze(path),
        Language::JavaScript => node::NodeAnalyzer::new().analyze(path),
        Language::Java => java::JavaAnalyzer::new().analyze(path),
        Language::Go => go::GoAnalyzer::new().analyze(path),
        Language::Rust => rust::RustAnalyzer::new().analyze(path),
    }
}

fn record(name: impl Into<String>, version: impl Into<String>, ecosystem: &str, manifest: &str) -> DependencyRecord {
    DependencyRecord::new(name, version, ecosystem).with_extra(MANIFEST_COLUMN, manifest)
}
