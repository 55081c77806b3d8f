use serde::Deserialize;

use crate::models::Categorization;
use crate::rules::compiler::{Rule, RuleSet};

/// How a name is matched against a rule set. Both give identical results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Try each rule's regex in order until one matches.
    Sequential,
    /// One pass over a `RegexSet` of every pattern; lowest matching index wins.
    #[default]
    Combined,
}

impl MatchStrategy {
    pub fn classify(self, name: &str, rules: &RuleSet) -> Categorization {
        match self {
            MatchStrategy::Sequential => classify(name, rules),
            MatchStrategy::Combined => classify_combined(name, rules),
        }
    }
}

/// Category of the first rule whose pattern occurs anywhere in `name`,
/// or `("Other", "")`.
pub fn classify(name: &str, rules: &RuleSet) -> Categorization {
    rules
        .rules()
        .iter()
        .find(|rule| rule.regex.is_match(name))
        .map(Rule::categorization)
        .unwrap_or_default()
}

/// Same contract as [`classify`], answered from the rule set's combined matcher.
pub fn classify_combined(name: &str, rules: &RuleSet) -> Categorization {
    let Some(set) = rules.combined() else {
        return classify(name, rules);
    };

    // SetMatches iterates in ascending index order.
    set.matches(name)
        .iter()
        .next()
        .and_then(|index| rules.rules().get(index))
        .map(Rule::categorization)
        .unwrap_or_default()
}
