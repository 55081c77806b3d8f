use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use regex::Regex;
use serde::Deserialize;

use crate::models::DependencyRecord;

const ECOSYSTEM: &str = "pip";

/// Analyzer for Python projects.
///
/// Reads `Pipfile.lock` (pinned) → `requirements.txt` → `pyproject.toml`, and
/// keeps the first occurrence of each package name (case-insensitive).
pub struct PythonAnalyzer;

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl super::Analyzer for PythonAnalyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<DependencyRecord>> {
        let mut records = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        let sources: [(&str, fn(&Path) -> Result<Vec<DependencyRecord>>); 3] = [
            ("Pipfile.lock", parse_pipfile_lock),
            ("requirements.txt", parse_requirements_txt),
            ("pyproject.toml", parse_pyproject_toml),
        ];

        for (file, parse) in sources {
            let manifest = path.join(file);
            if !manifest.exists() {
                continue;
            }
            match parse(&manifest) {
                Ok(parsed) => {
                    for r in parsed {
                        let key = r.name.as_deref().unwrap_or_default().to_lowercase();
                        if seen.insert(key) {
                            records.push(r);
                        }
                    }
                }
                Err(err) => tracing::warn!("skipping {}: {err:#}", manifest.display()),
            }
        }

        Ok(records)
    }
}

fn requirement_re() -> Result<Regex> {
    // name, optional [extras], optional "<op> <version>"
    Ok(Regex::new(
        r"^([A-Za-z0-9][A-Za-z0-9_\-\.]*)\s*(?:\[[^\]]*\])?\s*(?:(===?|~=|>=|<=|!=|>|<)\s*([^\s;,#]+))?",
    )?)
}

/// Version text for a requirement: the pin for `==`, the raw spec otherwise.
fn version_of(op: Option<&str>, version: Option<&str>) -> String {
    match (op, version) {
        (Some("==") | Some("==="), Some(v)) => v.to_string(),
        (Some(op), Some(v)) => format!("{op}{v}"),
        _ => "*".to_string(),
    }
}

/// Parse `requirements.txt`; options (`-r`, `--index-url`) and comments are skipped.
fn parse_requirements_txt(path: &Path) -> Result<Vec<DependencyRecord>> {
    let content = std::fs::read_to_string(path)?;
    let re = requirement_re()?;
    let mut records = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
            continue;
        }
        if let Some(caps) = re.captures(line) {
            let version = version_of(
                caps.get(2).map(|m| m.as_str()),
                caps.get(3).map(|m| m.as_str()),
            );
            records.push(super::record(&caps[1], version, ECOSYSTEM, "requirements.txt"));
        }
    }

    Ok(records)
}

/// Parse `Pipfile.lock` — JSON with `default` and `develop` sections.
fn parse_pipfile_lock(path: &Path) -> Result<Vec<DependencyRecord>> {
    let content = std::fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&content)?;
    let mut records = Vec::new();

    for section in &["default", "develop"] {
        if let Some(pkgs) = json.get(section).and_then(|v| v.as_object()) {
            for (name, info) in pkgs {
                let version = info
                    .get("version")
                    .and_then(|v| v.as_str())
                    .unwrap_or("*")
                    .trim_start_matches("==");
                records.push(super::record(name.as_str(), version, ECOSYSTEM, "Pipfile.lock"));
            }
        }
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct Pyproject {
    project: Option<PyprojectProject>,
}

#[derive(Debug, Deserialize)]
struct PyprojectProject {
    #[serde(default)]
    dependencies: Vec<String>,
    #[serde(default, rename = "optional-dependencies")]
    optional_dependencies: std::collections::BTreeMap<String, Vec<String>>,
}

/// Parse `pyproject.toml` — `[project].dependencies` and optional groups.
fn parse_pyproject_toml(path: &Path) -> Result<Vec<DependencyRecord>> {
    let content = std::fs::read_to_string(path)?;
    let pyproject: Pyproject = toml::from_str(&content)?;
    let re = requirement_re()?;
    let mut records = Vec::new();

    let Some(project) = pyproject.project else {
        return Ok(records);
    };

    let specs = project
        .dependencies
        .iter()
        .chain(project.optional_dependencies.values().flatten());

    for spec in specs {
        if let Some(caps) = re.captures(spec.trim()) {
            let version = version_of(
                caps.get(2).map(|m| m.as_str()),
                caps.get(3).map(|m| m.as_str()),
            );
            records.push(super::record(&caps[1], version, ECOSYSTEM, "pyproject.toml"));
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Analyzer;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_requirements_txt() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "# comment").unwrap();
        writeln!(f, "-r base.txt").unwrap();
        writeln!(f, "requests==2.28.1").unwrap();
        writeln!(f, "flask>=2.0.0").unwrap();
        writeln!(f, "celery[redis]").unwrap();
        writeln!(f, "numpy==1.24.0 ; python_version >= '3.8'").unwrap();

        let records = parse_requirements_txt(f.path()).unwrap();
        let got: Vec<_> = records
            .iter()
            .map(|r| (r.name.as_deref().unwrap(), r.version.as_deref().unwrap()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("requests", "2.28.1"),
                ("flask", ">=2.0.0"),
                ("celery", "*"),
                ("numpy", "1.24.0"),
            ]
        );
        assert!(records.iter().all(|r| r.ecosystem.as_deref() == Some("pip")));
    }

    #[test]
    fn test_parse_pyproject_toml() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
[project]
name = "demo"
dependencies = ["django>=4.2", "httpx"]

[project.optional-dependencies]
test = ["pytest==7.4.0"]
"#
        )
        .unwrap();

        let records = parse_pyproject_toml(f.path()).unwrap();
        let names: Vec<_> = records.iter().filter_map(|r| r.name.as_deref()).collect();
        assert_eq!(names, vec!["django", "httpx", "pytest"]);
    }

    #[test]
    fn test_dedup_across_manifests() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Pipfile.lock"),
            r#"{"default": {"Django": {"version": "==4.2.1"}}, "develop": {}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("requirements.txt"), "django==4.0\npytest\n").unwrap();

        let records = PythonAnalyzer::new().analyze(dir.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].version.as_deref(), Some("4.2.1"));
        assert_eq!(records[1].name.as_deref(), Some("pytest"));
    }
}
