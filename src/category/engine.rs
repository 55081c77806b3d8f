use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::classifier::MatchStrategy;
use crate::error::{MalformedRecord, RuleLoadError};
use crate::models::{Categorization, DependencyRecord};
use crate::rules::cache::RuleCache;
use crate::rules::compiler::InvalidPatternPolicy;
use crate::rules::mapping::EcosystemMap;

/// Per-ecosystem counters for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EcosystemStats {
    pub records: usize,
    pub categorized: usize,
}

/// Outcome of [`BatchEngine::categorize`].
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub malformed: usize,
    /// Keyed by lowercased ecosystem identifier.
    pub ecosystems: BTreeMap<String, EcosystemStats>,
    pub unmapped: Vec<String>,
    pub failures: Vec<(String, RuleLoadError)>,
}

impl RunSummary {
    pub fn categorized(&self) -> usize {
        self.ecosystems.values().map(|s| s.categorized).sum()
    }
}

/// Classifies batches of records. Owns the rule cache for the run.
#[derive(Debug)]
pub struct BatchEngine {
    mapping: EcosystemMap,
    cache: RuleCache,
    strategy: MatchStrategy,
}

impl BatchEngine {
    pub fn new(mapping: EcosystemMap, strategy: MatchStrategy, policy: InvalidPatternPolicy) -> Self {
        Self {
            mapping,
            cache: RuleCache::new(policy),
            strategy,
        }
    }

    pub fn mapping(&self) -> &EcosystemMap {
        &self.mapping
    }

    pub fn cache(&self) -> &RuleCache {
        &self.cache
    }

    /// Overwrite `category`/`sub_category` on every record.
    ///
    /// Previous values are discarded first, so re-running over the output gives
    /// the same result. A partition whose rules fail to load stays at the
    /// default and does not affect other partitions.
    pub fn categorize(&self, records: &mut [DependencyRecord]) -> RunSummary {
        let mut summary = RunSummary {
            total: records.len(),
            ..RunSummary::default()
        };

        let mut partitions: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (index, record) in records.iter_mut().enumerate() {
            record.set_categorization(Categorization::other());
            match partition_key(index, record) {
                Ok(ecosystem) => partitions.entry(ecosystem).or_default().push(index),
                Err(err) => {
                    debug!("{err}, leaving default category");
                    summary.malformed += 1;
                }
            }
        }

        for (ecosystem, indices) in partitions {
            let stats = summary.ecosystems.entry(ecosystem.clone()).or_default();
            stats.records = indices.len();

            let Some(path) = self.mapping.resolve(&ecosystem) else {
                debug!(ecosystem = %ecosystem, "no rule file mapped, leaving default category");
                summary.unmapped.push(ecosystem);
                continue;
            };

            let rules = match self.cache.get_or_load(&path) {
                Ok(rules) => rules,
                Err(err) => {
                    warn!(ecosystem = %ecosystem, "{err}; {} records left as default", indices.len());
                    summary.failures.push((ecosystem, err));
                    continue;
                }
            };

            for index in indices {
                let record = &mut records[index];
                let name = record.name.as_deref().unwrap_or_default();
                let categorization = self.strategy.classify(name, &rules);
                if !categorization.is_other() {
                    stats.categorized += 1;
                }
                record.set_categorization(categorization);
            }

            info!(
                ecosystem = %ecosystem,
                records = stats.records,
                categorized = stats.categorized,
                "partition classified"
            );
        }

        debug!(rule_files_loaded = self.cache.load_count(), "run complete");
        summary
    }

    /// Classify a single name. Load failures and unmapped ecosystems give the
    /// default pair.
    pub fn classify(&self, ecosystem: &str, name: &str) -> Categorization {
        let mut records = [DependencyRecord {
            name: Some(name.to_string()),
            ecosystem: Some(ecosystem.to_string()),
            ..DependencyRecord::default()
        }];
        self.categorize(&mut records);
        records[0].categorization()
    }
}

fn partition_key(index: usize, record: &DependencyRecord) -> Result<String, MalformedRecord> {
    if record.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        return Err(MalformedRecord::MissingName { index });
    }
    match record.ecosystem.as_deref().map(str::trim) {
        Some(eco) if !eco.is_empty() => Ok(eco.to_lowercase()),
        _ => Err(MalformedRecord::MissingEcosystem { index }),
    }
}
