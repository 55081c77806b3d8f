use std::collections::BTreeMap;

use serde_json::Value;

/// Category assigned when no rule matches.
pub const DEFAULT_CATEGORY: &str = "Other";

/// The `(category, sub_category)` pair produced by classification.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Categorization {
    pub category: String,
    pub sub_category: String,
}

impl Categorization {
    pub fn new(category: impl Into<String>, sub_category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            sub_category: sub_category.into(),
        }
    }

    /// The `("Other", "")` fallback.
    pub fn other() -> Self {
        Self::new(DEFAULT_CATEGORY, "")
    }

    pub fn is_other(&self) -> bool {
        self.category == DEFAULT_CATEGORY && self.sub_category.is_empty()
    }
}

impl Default for Categorization {
    fn default() -> Self {
        Self::other()
    }
}

impl std::fmt::Display for Categorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.sub_category.is_empty() {
            write!(f, "{}", self.category)
        } else {
            write!(f, "{} / {}", self.category, self.sub_category)
        }
    }
}

/// One dependency row flowing from a source, through the engine, to a sink.
///
/// The declared columns are fixed. Any other input column is kept verbatim in
/// `extra` and written back out, so sources with wider schemas round-trip
/// without the engine knowing about them.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyRecord {
    pub repo_id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    /// Package-manager identifier such as `pip`, `maven` or `npm`.
    pub ecosystem: Option<String>,
    /// Input column the ecosystem was read from (`ecosystem` or `package_type`).
    pub ecosystem_column: Option<String>,
    pub category: String,
    pub sub_category: String,
    pub extra: BTreeMap<String, Value>,
}

impl Default for DependencyRecord {
    fn default() -> Self {
        Self {
            repo_id: None,
            name: None,
            version: None,
            ecosystem: None,
            ecosystem_column: None,
            category: DEFAULT_CATEGORY.to_string(),
            sub_category: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl DependencyRecord {
    pub fn new(name: impl Into<String>, version: impl Into<String>, ecosystem: &str) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
            ecosystem: Some(ecosystem.to_string()),
            ..Self::default()
        }
    }

    /// Build a record from loosely-typed `(column, value)` pairs.
    ///
    /// Column names are matched case-insensitively. The first of `ecosystem`
    /// or `package_type` supplies the ecosystem; a second one is kept in
    /// `extra`. Incoming `category`/`sub_category` values are dropped because
    /// they are always recomputed. Blank values count as absent.
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut record = Self::default();

        for (column, value) in fields {
            match column.trim().to_ascii_lowercase().as_str() {
                "repo_id" => record.repo_id = cell_text(&value),
                "name" => record.name = cell_text(&value),
                "version" => record.version = cell_text(&value),
                "ecosystem" | "package_type" if record.ecosystem_column.is_none() => {
                    record.ecosystem = cell_text(&value);
                    record.ecosystem_column = Some(column);
                }
                "category" | "sub_category" => {}
                _ => {
                    record.extra.insert(column, value);
                }
            }
        }

        record
    }

    /// Value of `column` as it would be written back to a table.
    pub fn field(&self, column: &str) -> Value {
        let text = |v: &Option<String>| v.clone().map_or(Value::Null, Value::String);

        if self.ecosystem_column.as_deref() == Some(column) {
            return text(&self.ecosystem);
        }
        match column.trim().to_ascii_lowercase().as_str() {
            "repo_id" => text(&self.repo_id),
            "name" => text(&self.name),
            "version" => text(&self.version),
            "ecosystem" if self.ecosystem_column.is_none() => text(&self.ecosystem),
            "category" => Value::String(self.category.clone()),
            "sub_category" => Value::String(self.sub_category.clone()),
            _ => self.extra.get(column).cloned().unwrap_or(Value::Null),
        }
    }

    pub fn with_extra(mut self, column: &str, value: impl Into<String>) -> Self {
        self.extra
            .insert(column.to_string(), Value::String(value.into()));
        self
    }

    pub fn categorization(&self) -> Categorization {
        Categorization::new(self.category.clone(), self.sub_category.clone())
    }

    pub fn set_categorization(&mut self, categorization: Categorization) {
        self.category = categorization.category;
        self.sub_category = categorization.sub_category;
    }
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Language families the manifest analyzers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
    Java,
    Go,
    Rust,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Python => write!(f, "Python"),
            Language::JavaScript => write!(f, "JavaScript"),
            Language::Java => write!(f, "Java"),
            Language::Go => write!(f, "Go"),
            Language::Rust => write!(f, "Rust"),
        }
    }
}
