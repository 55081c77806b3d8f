use std::path::Path;

use anyhow::Result;
use regex::Regex;

use crate::models::DependencyRecord;

/// Analyzer for Go modules: the `require` directives of `go.mod`.
///
/// Both the single-line form and `require ( ... )` blocks are read; indirect
/// requirements are included. Module paths are used as names.
pub struct GoAnalyzer;

impl GoAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl super::Analyzer for GoAnalyzer {
    fn analyze(&self, path: &Path) -> Result<Vec<DependencyRecord>> {
        let go_mod = path.join("go.mod");
        if !go_mod.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&go_mod)?;
        parse_go_mod(&content)
    }
}

fn parse_go_mod(content: &str) -> Result<Vec<DependencyRecord>> {
    let module_re = Regex::new(r"^(\S+)\s+(v\S+)")?;
    let mut records = Vec::new();
    let mut in_block = false;

    for line in content.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let spec = if in_block {
            if line == ")" {
                in_block = false;
                continue;
            }
            line
        } else if let Some(rest) = line
            .strip_prefix("require")
            .filter(|rest| rest.starts_with(|c: char| c.is_whitespace() || c == '('))
        {
            let rest = rest.trim();
            if rest == "(" {
                in_block = true;
                continue;
            }
            rest
        } else {
            continue;
        };

        if let Some(caps) = module_re.captures(spec) {
            records.push(super::record(&caps[1], &caps[2], "go", "go.mod"));
        }
    }

    Ok(records)
}
