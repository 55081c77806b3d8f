use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use regex::Regex;
use serde_json::Value;

use crate::models::DependencyRecord;

pub struct NodeAnalyzer;

impl NodeAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl super::Analyzer for NodeAnalyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<DependencyRecord>> {
        let mut records: Vec<DependencyRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        let mut push_all = |parsed: Vec<DependencyRecord>| {
            for r in parsed {
                if seen.insert(r.name.clone().unwrap_or_default()) {
                    records.push(r);
                }
            }
        };

        // package-lock.json (npm, pinned)
        let lock = path.join("package-lock.json");
        if lock.exists() {
            match parse_package_lock_json(&lock) {
                Ok(parsed) => push_all(parsed),
                Err(err) => tracing::warn!("skipping {}: {err:#}", lock.display()),
            }
        }

        // yarn.lock
        let yarn = path.join("yarn.lock");
        if yarn.exists() {
            match parse_yarn_lock(&yarn) {
                Ok(parsed) => push_all(parsed),
                Err(err) => tracing::warn!("skipping {}: {err:#}", yarn.display()),
            }
        }

        // package.json only when there is no lockfile to read
        let pkg = path.join("package.json");
        if pkg.exists() && !lock.exists() && !yarn.exists() {
            match parse_package_json(&pkg) {
                Ok(parsed) => push_all(parsed),
                Err(err) => tracing::warn!("skipping {}: {err:#}", pkg.display()),
            }
        }

        Ok(records)
    }
}

/// Parse `package-lock.json` v2/v3 (the `packages` map).
fn parse_package_lock_json(path: &Path) -> Result<Vec<DependencyRecord>> {
    let content = std::fs::read_to_string(path)?;
    let json: Value = serde_json::from_str(&content)?;
    let mut records = Vec::new();

    if let Some(packages) = json.get("packages").and_then(|v| v.as_object()) {
        for (pkg_path, info) in packages {
            // The root project is the empty key.
            if pkg_path.is_empty() {
                continue;
            }

            let version = info
                .get("version")
                .and_then(|v| v.as_str())
                .unwrap_or("*");

            // "node_modules/a/node_modules/@scope/b" → "@scope/b"
            let name = match pkg_path.rfind("node_modules/") {
                Some(i) => &pkg_path[i + "node_modules/".len()..],
                None => pkg_path.as_str(),
            };

            records.push(super::record(name, version, "npm", "package-lock.json"));
        }
    }

    Ok(records)
}

/// Parse `yarn.lock` (classic line format).
fn parse_yarn_lock(path: &Path) -> Result<Vec<DependencyRecord>> {
    let content = std::fs::read_to_string(path)?;
    let mut records = Vec::new();
    let mut lines = content.lines().peekable();

    // "foo@^1.0.0:" or "@scope/foo@^1.0.0:"
    let header_re = Regex::new(r#"^"?(@?[^@"]+)@[^:"]+"?:$"#)?;
    let version_re = Regex::new(r#"^\s+version:?\s+"?([^"\s]+)"?"#)?;

    while let Some(line) = lines.next() {
        if line.is_empty() || line.starts_with('#') || line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }

        // Comma-separated specs share one entry; the first names it.
        let trimmed = line.trim_end_matches(':');
        let first_spec = trimmed.split(", ").next().unwrap_or(trimmed).trim_matches('"');

        let header = format!("{first_spec}:");
        let Some(caps) = header_re.captures(&header) else {
            continue;
        };
        let name = caps[1].to_string();

        let mut version = String::new();
        while let Some(next) = lines.peek() {
            if next.is_empty() || !(next.starts_with(' ') || next.starts_with('\t')) {
                break;
            }
            if let Some(vcaps) = version_re.captures(next) {
                version = vcaps[1].to_string();
            }
            lines.next();
            if !version.is_empty() {
                break;
            }
        }

        if !version.is_empty() {
            records.push(super::record(name, version, "yarn", "yarn.lock"));
        }
    }

    Ok(records)
}

/// Parse `package.json` — `dependencies` and `devDependencies`.
fn parse_package_json(path: &Path) -> Result<Vec<DependencyRecord>> {
    let content = std::fs::read_to_string(path)?;
    let json: Value = serde_json::from_str(&content)?;
    let mut records = Vec::new();

    for section in &["dependencies", "devDependencies"] {
        if let Some(pkgs) = json.get(section).and_then(|v| v.as_object()) {
            for (name, range) in pkgs {
                let version = range.as_str().unwrap_or("*");
                records.push(super::record(name.as_str(), version, "npm", "package.json"));
            }
        }
    }

    Ok(records)
}
