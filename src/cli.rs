use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::category::classifier::MatchStrategy;
use crate::models::Language;
use crate::records::RecordFormat;
use crate::rules::compiler::InvalidPatternPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "dep-categorizr",
    about = "Categorize project dependencies with ordered per-ecosystem regex rules",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Show every record and info-level logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Categorize dependencies from a records file or a project's manifests
    Categorize(CategorizeArgs),

    /// Classify ad-hoc dependency names
    Classify {
        /// Ecosystem identifier, e.g. pip, npm, maven
        ecosystem: String,

        /// Dependency names
        #[arg(required = true)]
        names: Vec<String>,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// List the flattened rules in precedence order
    Rules {
        /// Only this ecosystem's rule file
        ecosystem: Option<String>,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Collect Maven Central `group:artifact` coordinates under a group prefix
    MavenArtifacts {
        /// Group ID prefix, e.g. io.micronaut
        group_prefix: String,

        /// Output file [default: <GROUP_PREFIX>.txt]
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Results requested per page
        #[arg(long, default_value_t = 200)]
        rows: usize,
    },
}

#[derive(Args, Debug)]
pub struct CategorizeArgs {
    /// Project path to scan for manifests (ignored with --input)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Read records from a CSV or JSON file instead of scanning manifests
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Format of --input [default: from file extension]
    #[arg(long, value_name = "FORMAT")]
    pub input_format: Option<RecordFormat>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Write the report here instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exclude a language from manifest scanning (repeatable)
    #[arg(long = "exclude-lang", value_name = "LANG")]
    pub exclude_lang: Vec<LanguageArg>,

    #[command(flatten)]
    pub rules: RuleArgs,
}

/// Rule resolution options shared by subcommands.
#[derive(Args, Debug)]
pub struct RuleArgs {
    /// Directory holding the rule files [default: from config, else ./rules]
    #[arg(long, value_name = "DIR")]
    pub rules_dir: Option<PathBuf>,

    /// Config file [default: ./.dep-categorizr/config.toml, fallback ~/.config/dep-categorizr/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Matching strategy [default: from config, else combined]
    #[arg(long, value_name = "STRATEGY")]
    pub strategy: Option<MatchStrategy>,

    /// What a bad pattern does to its rule file [default: from config, else discard-file]
    #[arg(long, value_name = "POLICY")]
    pub invalid_patterns: Option<InvalidPatternPolicy>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
    Csv,
    Markdown,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum LanguageArg {
    Python,
    Javascript,
    Java,
    Go,
    Rust,
}

impl From<&LanguageArg> for Language {
    fn from(arg: &LanguageArg) -> Self {
        match arg {
            LanguageArg::Python => Language::Python,
            LanguageArg::Javascript => Language::JavaScript,
            LanguageArg::Java => Language::Java,
            LanguageArg::Go => Language::Go,
            LanguageArg::Rust => Language::Rust,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_categorize() {
        let cli = Cli::parse_from([
            "dep-categorizr",
            "categorize",
            "--input",
            "deps.csv",
            "--strategy",
            "sequential",
            "--report",
            "markdown",
            "--exclude-lang",
            "rust",
        ]);
        let Command::Categorize(args) = cli.command else {
            panic!("expected categorize");
        };
        assert_eq!(args.input, Some(PathBuf::from("deps.csv")));
        assert_eq!(args.rules.strategy, Some(MatchStrategy::Sequential));
        assert_eq!(args.rules.invalid_patterns, None);
        assert!(matches!(args.report, ReportFormat::Markdown));
        assert_eq!(args.exclude_lang.len(), 1);
    }

    #[test]
    fn test_parse_invalid_patterns_policy() {
        let cli = Cli::parse_from(["dep-categorizr", "rules", "pip", "--invalid-patterns", "skip-pattern"]);
        let Command::Rules { ecosystem, rules } = cli.command else {
            panic!("expected rules");
        };
        assert_eq!(ecosystem.as_deref(), Some("pip"));
        assert_eq!(rules.invalid_patterns, Some(InvalidPatternPolicy::SkipPattern));
    }

    #[test]
    fn test_parse_classify() {
        let cli = Cli::parse_from(["dep-categorizr", "classify", "pip", "django", "pytest", "-q"]);
        assert!(cli.quiet);
        let Command::Classify { ecosystem, names, .. } = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(ecosystem, "pip");
        assert_eq!(names, vec!["django", "pytest"]);
    }
}
