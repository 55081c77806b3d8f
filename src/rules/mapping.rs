use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Built-in ecosystem → rule file table. Aliases share a file.
pub const DEFAULT_RULE_FILES: &[(&str, &str)] = &[
    ("pip", "rules_python.yaml"),
    ("maven", "rules_java.yaml"),
    ("gradle", "rules_java.yaml"),
    ("npm", "rules_javascript.yaml"),
    ("yarn", "rules_javascript.yaml"),
    ("go", "rules_go.yaml"),
];

/// Resolves ecosystem identifiers (case-insensitive) to rule file paths.
#[derive(Debug, Clone)]
pub struct EcosystemMap {
    rules_dir: PathBuf,
    files: BTreeMap<String, PathBuf>,
}

impl EcosystemMap {
    /// Map with the built-in table, rule files resolved under `rules_dir`.
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        DEFAULT_RULE_FILES
            .iter()
            .fold(Self::empty(rules_dir), |map, (eco, file)| map.with(eco, file))
    }

    pub fn empty(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
            files: BTreeMap::new(),
        }
    }

    /// Add or replace one entry. Relative files resolve against the rules dir.
    pub fn with(mut self, ecosystem: &str, file: impl AsRef<Path>) -> Self {
        self.files
            .insert(ecosystem.trim().to_lowercase(), file.as_ref().to_path_buf());
        self
    }

    pub fn resolve(&self, ecosystem: &str) -> Option<PathBuf> {
        self.files
            .get(&ecosystem.trim().to_lowercase())
            .map(|file| self.rules_dir.join(file))
    }

    /// Resolved rule files with the ecosystems that use each, sorted by path.
    pub fn rule_files(&self) -> BTreeMap<PathBuf, Vec<&str>> {
        let mut grouped: BTreeMap<PathBuf, Vec<&str>> = BTreeMap::new();
        for (eco, file) in &self.files {
            grouped
                .entry(self.rules_dir.join(file))
                .or_default()
                .push(eco.as_str());
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_aliases() {
        let map = EcosystemMap::new("rules");
        assert_eq!(map.resolve("maven"), map.resolve("gradle"));
        assert_eq!(map.resolve("NPM"), Some(PathBuf::from("rules/rules_javascript.yaml")));
        assert_eq!(map.resolve("cargo"), None);
    }

    #[test]
    fn test_override_and_absolute_paths() {
        let map = EcosystemMap::new("rules")
            .with("Cargo", "/etc/rules/rust.yaml")
            .with("pip", "custom_python.yaml");

        assert_eq!(map.resolve("cargo"), Some(PathBuf::from("/etc/rules/rust.yaml")));
        assert_eq!(map.resolve("pip"), Some(PathBuf::from("rules/custom_python.yaml")));
    }

    #[test]
    fn test_rule_files_groups_aliases() {
        let map = EcosystemMap::new("rules");
        let files = map.rule_files();
        assert_eq!(files.len(), 4);
        assert_eq!(
            files[&PathBuf::from("rules/rules_java.yaml")],
            vec!["gradle", "maven"]
        );
    }
}
