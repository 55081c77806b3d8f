use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::category::classifier::MatchStrategy;
use crate::rules::compiler::InvalidPatternPolicy;
use crate::rules::mapping::EcosystemMap;

/// Rules directory used when neither the config nor the CLI names one.
pub const DEFAULT_RULES_DIR: &str = "rules";

/// Root configuration structure, deserialized from `.dep-categorizr/config.toml`.
///
/// ```toml
/// rules_dir = "rules"
/// strategy = "combined"
/// invalid_patterns = "discard-file"
///
/// [ecosystems]
/// cargo = "rules_rust.yaml"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory that relative rule file names resolve against.
    pub rules_dir: Option<PathBuf>,
    pub strategy: MatchStrategy,
    pub invalid_patterns: InvalidPatternPolicy,
    /// Extra or overriding ecosystem → rule file entries, merged over the
    /// built-in table.
    pub ecosystems: BTreeMap<String, PathBuf>,
}

impl Config {
    /// Build the ecosystem map; `rules_dir` from the CLI wins over the config.
    pub fn ecosystem_map(&self, rules_dir: Option<&Path>) -> EcosystemMap {
        let dir = rules_dir
            .map(Path::to_path_buf)
            .or_else(|| self.rules_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RULES_DIR));

        self.ecosystems
            .iter()
            .fold(EcosystemMap::new(dir), |map, (eco, file)| map.with(eco, file))
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.dep-categorizr/config.toml`
/// 3. `~/.config/dep-categorizr/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".dep-categorizr").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("dep-categorizr")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.strategy, MatchStrategy::Combined);
        assert_eq!(cfg.invalid_patterns, InvalidPatternPolicy::DiscardFile);

        let map = cfg.ecosystem_map(None);
        assert_eq!(map.resolve("pip"), Some(PathBuf::from("rules/rules_python.yaml")));
    }

    #[test]
    fn test_parse_config() {
        let cfg: Config = toml::from_str(
            r#"
rules_dir = "/srv/rules"
strategy = "sequential"
invalid_patterns = "skip-pattern"

[ecosystems]
Cargo = "rules_rust.yaml"
pip = "python_v2.yaml"
"#,
        )
        .unwrap();

        assert_eq!(cfg.strategy, MatchStrategy::Sequential);
        assert_eq!(cfg.invalid_patterns, InvalidPatternPolicy::SkipPattern);

        let map = cfg.ecosystem_map(None);
        assert_eq!(map.resolve("cargo"), Some(PathBuf::from("/srv/rules/rules_rust.yaml")));
        assert_eq!(map.resolve("pip"), Some(PathBuf::from("/srv/rules/python_v2.yaml")));
        assert_eq!(map.resolve("npm"), Some(PathBuf::from("/srv/rules/rules_javascript.yaml")));

        let map = cfg.ecosystem_map(Some(Path::new("local")));
        assert_eq!(map.resolve("go"), Some(PathBuf::from("local/rules_go.yaml")));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<Config>("rule_dir = \"x\"").is_err());
    }

    #[test]
    fn test_load_config_from_project() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".dep-categorizr")).unwrap();
        std::fs::write(
            dir.path().join(".dep-categorizr").join("config.toml"),
            "strategy = \"sequential\"\n",
        )
        .unwrap();

        let cfg = load_config(dir.path(), None).unwrap();
        assert_eq!(cfg.strategy, MatchStrategy::Sequential);
    }

    #[test]
    fn test_override_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(dir.path(), Some(&missing)).is_err());
    }
}
