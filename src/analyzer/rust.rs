use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::models::DependencyRecord;

#[derive(Debug, Deserialize)]
struct CargoLock {
    #[serde(default)]
    package: Vec<CargoLockPackage>,
}

#[derive(Debug, Deserialize)]
struct CargoLockPackage {
    name: String,
    version: String,
    /// Packages without a `source` field are local workspace members.
    source: Option<String>,
}

/// Reads `Cargo.lock`. Records are tagged `cargo`, which has no rule file in
/// the built-in mapping; configure one to categorize Rust crates.
pub struct RustAnalyzer;

impl RustAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl super::Analyzer for RustAnalyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<DependencyRecord>> {
        let lock_path = path.join("Cargo.lock");
        if !lock_path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&lock_path)?;
        parse_cargo_lock(&content)
    }
}

fn parse_cargo_lock(content: &str) -> Result<Vec<DependencyRecord>> {
    let lock: CargoLock = toml::from_str(content)?;

    Ok(lock
        .package
        .into_iter()
        .filter(|p| p.source.is_some())
        .map(|p| super::record(p.name, p.version, "cargo", "Cargo.lock"))
        .collect())
}
