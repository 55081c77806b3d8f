use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use super::compiler::{self, InvalidPatternPolicy, RuleSet};
use crate::error::RuleLoadError;

type Entry = Result<Arc<RuleSet>, RuleLoadError>;

/// Compiled rule sets keyed by file path, built lazily and kept for the run.
///
/// Failures are cached too, so a broken file is read once no matter how many
/// ecosystems point at it. The lock only guards lookup-or-load; published rule
/// sets are immutable and read without it.
#[derive(Debug, Default)]
pub struct RuleCache {
    policy: InvalidPatternPolicy,
    entries: Mutex<HashMap<PathBuf, Entry>>,
    loads: AtomicUsize,
}

impl RuleCache {
    pub fn new(policy: InvalidPatternPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn get_or_load(&self, path: &Path) -> Result<Arc<RuleSet>, RuleLoadError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get(path) {
            return entry.clone();
        }

        self.loads.fetch_add(1, Ordering::Relaxed);
        debug!(path = %path.display(), "loading rule file");

        let entry = compiler::compile(path, self.policy).map(Arc::new);
        entries.insert(path.to_path_buf(), entry.clone());
        entry
    }

    /// Number of times a rule file was actually read from disk.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn rule_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{}", content).unwrap();
        f
    }

    #[test]
    fn test_second_lookup_is_cached() {
        let f = rule_file("categories:\n  - name: Web\n    patterns: [\"^django\"]\n");
        let cache = RuleCache::new(InvalidPatternPolicy::DiscardFile);

        let first = cache.get_or_load(f.path()).unwrap();
        // Changing the file must not matter once it is cached.
        std::fs::write(f.path(), "categories: []\n").unwrap();
        let second = cache.get_or_load(f.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert_eq!(second.len(), 1);
        assert_eq!(cache.load_count(), 1);
    }

    #[test]
    fn test_failures_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        let cache = RuleCache::new(InvalidPatternPolicy::DiscardFile);

        assert!(cache.get_or_load(&path).is_err());
        assert!(cache.get_or_load(&path).is_err());
        assert_eq!(cache.load_count(), 1);
    }

    #[test]
    fn test_fresh_cache_rereads() {
        let f = rule_file("categories:\n  - name: Web\n    patterns: [\"^django\"]\n");
        let a = RuleCache::new(InvalidPatternPolicy::DiscardFile)
            .get_or_load(f.path())
            .unwrap();
        let b = RuleCache::new(InvalidPatternPolicy::DiscardFile)
            .get_or_load(f.path())
            .unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_concurrent_lookups_load_once() {
        let f = rule_file("categories:\n  - name: Web\n    patterns: [\"^django\"]\n");
        let cache = RuleCache::new(InvalidPatternPolicy::DiscardFile);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let rules = cache.get_or_load(f.path()).unwrap();
                    assert_eq!(rules.len(), 1);
                });
            }
        });

        assert_eq!(cache.load_count(), 1);
    }
}
