use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// A rule file could not be turned into a rule set.
///
/// Cloneable so the cache can hand the same failure to every caller that asks
/// for the path again.
#[derive(Debug, Clone, Error)]
#[error("failed to load rules from {}: {cause}", .path.display())]
pub struct RuleLoadError {
    pub path: PathBuf,
    #[source]
    pub cause: RuleLoadCause,
}

#[derive(Debug, Clone, Error)]
pub enum RuleLoadCause {
    #[error("cannot read file ({0})")]
    Io(Arc<std::io::Error>),

    #[error("malformed rule document ({0})")]
    Parse(Arc<serde_yaml::Error>),

    #[error("invalid pattern `{pattern}` in category `{category}`")]
    Pattern {
        category: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A record lacks a field the classifier needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecord {
    #[error("record #{index} has no dependency name")]
    MissingName { index: usize },

    #[error("record #{index} has no ecosystem")]
    MissingEcosystem { index: usize },
}
