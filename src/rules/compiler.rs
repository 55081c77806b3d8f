use std::path::Path;
use std::sync::Arc;

use regex::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{RuleLoadCause, RuleLoadError};
use crate::models::Categorization;

/// What to do when one pattern in an otherwise valid file fails to compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidPatternPolicy {
    /// Reject the whole file; its ecosystem gets no rules.
    #[default]
    DiscardFile,
    /// Drop only the offending pattern and log a warning.
    SkipPattern,
}

/// On-disk rule document.
///
/// ```yaml
/// categories:
///   - name: Web Framework
///     patterns: ["^django", "^flask"]
///   - name: Testing
///     subcategories:
///       - name: Unit
///         patterns: ["pytest"]
/// ```
#[derive(Debug, Deserialize)]
struct RuleDocument {
    #[serde(default)]
    categories: Vec<CategoryDef>,
}

#[derive(Debug, Deserialize)]
struct CategoryDef {
    name: String,
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    subcategories: Vec<SubcategoryDef>,
}

#[derive(Debug, Deserialize)]
struct SubcategoryDef {
    name: String,
    #[serde(default)]
    patterns: Vec<String>,
}

/// A single compiled pattern and the labels it assigns.
#[derive(Debug, Clone)]
pub struct Rule {
    pub regex: Regex,
    pub category: String,
    pub sub_category: String,
}

impl Rule {
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn categorization(&self) -> Categorization {
        Categorization::new(self.category.clone(), self.sub_category.clone())
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
            && self.category == other.category
            && self.sub_category == other.sub_category
    }
}

/// Ordered, immutable rules for one rule file. Index order is precedence.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    /// All patterns as one alternation, same indices as `rules`.
    combined: Option<RegexSet>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        let combined = match RegexSetBuilder::new(rules.iter().map(Rule::pattern))
            .case_insensitive(true)
            .build()
        {
            Ok(set) => Some(set),
            Err(err) => {
                debug!("combined matcher unavailable, scanning rules one by one: {err}");
                None
            }
        };

        Self { rules, combined }
    }

    /// Rule set without a combined matcher, as when the set exceeds size limits.
    #[cfg(test)]
    pub fn without_combined(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            combined: None,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn combined(&self) -> Option<&RegexSet> {
        self.combined.as_ref()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl PartialEq for RuleSet {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules
    }
}

/// Read and compile a rule file.
pub fn compile(path: &Path, policy: InvalidPatternPolicy) -> Result<RuleSet, RuleLoadError> {
    let _span = tracing::warn_span!("rule_file", path = %path.display()).entered();

    let content = std::fs::read_to_string(path).map_err(|e| RuleLoadError {
        path: path.to_path_buf(),
        cause: RuleLoadCause::Io(Arc::new(e)),
    })?;

    compile_str(&content, policy).map_err(|cause| RuleLoadError {
        path: path.to_path_buf(),
        cause,
    })
}

/// Compile rule-file contents already in memory.
pub fn compile_str(content: &str, policy: InvalidPatternPolicy) -> Result<RuleSet, RuleLoadCause> {
    let document: RuleDocument =
        serde_yaml::from_str(content).map_err(|e| RuleLoadCause::Parse(Arc::new(e)))?;

    let mut rules = Vec::new();

    for (category, sub_category, pattern) in flatten(&document) {
        match compile_pattern(pattern) {
            Ok(regex) => rules.push(Rule {
                regex,
                category: category.to_string(),
                sub_category: sub_category.to_string(),
            }),
            Err(source) => {
                let cause = RuleLoadCause::Pattern {
                    category: category.to_string(),
                    pattern: pattern.to_string(),
                    source,
                };
                match policy {
                    InvalidPatternPolicy::DiscardFile => return Err(cause),
                    InvalidPatternPolicy::SkipPattern => warn!("{cause}, skipping pattern"),
                }
            }
        }
    }

    debug!("compiled {} rules", rules.len());
    Ok(RuleSet::new(rules))
}

/// Document order: categories, then a category's own patterns, then its
/// sub-categories in order.
fn flatten(document: &RuleDocument) -> Vec<(&str, &str, &str)> {
    let mut entries = Vec::new();

    for category in &document.categories {
        for pattern in &category.patterns {
            entries.push((category.name.as_str(), "", pattern.as_str()));
        }
        for sub in &category.subcategories {
            for pattern in &sub.patterns {
                entries.push((category.name.as_str(), sub.name.as_str(), pattern.as_str()));
            }
        }
    }

    entries
}

fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}
