//! Report renderers for categorization results.
//!
//! - [`terminal`] — colored summary box and tables; respects `--verbose` / `--quiet`.
//! - [`markdown`] — Markdown summary with per-ecosystem and per-category tables.
//!
//! CSV and JSON output are plain record dumps, see [`crate::records`].

use std::collections::BTreeMap;

use crate::models::{Categorization, DependencyRecord};

pub mod markdown;
pub mod terminal;

/// Record count per categorization, most frequent first, ties by name.
pub fn category_counts(records: &[DependencyRecord]) -> Vec<(Categorization, usize)> {
    let mut counts: BTreeMap<Categorization, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.categorization()).or_insert(0) += 1;
    }

    let mut pairs: Vec<(Categorization, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(category: &str, sub: &str) -> DependencyRecord {
        let mut r = DependencyRecord::new("x", "1", "pip");
        r.set_categorization(Categorization::new(category, sub));
        r
    }

    #[test]
    fn test_category_counts_order() {
        let records = vec![
            rec("Testing", "Unit"),
            rec("Other", ""),
            rec("Testing", "Unit"),
            rec("Logging", ""),
            rec("Other", ""),
            rec("Testing", "Mocking"),
        ];
        let counts = category_counts(&records);
        assert_eq!(
            counts,
            vec![
                (Categorization::new("Other", ""), 2),
                (Categorization::new("Testing", "Unit"), 2),
                (Categorization::new("Logging", ""), 1),
                (Categorization::new("Testing", "Mocking"), 1),
            ]
        );
    }
}
