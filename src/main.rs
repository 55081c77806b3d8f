//! `dep-categorizr` — classify dependencies into categories with ordered regex rules.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`config::load_config`]) and build the ecosystem → rule file map.
//! 3. Collect records from a CSV/JSON file ([`records`]) or from project
//!    manifests ([`detector`], [`analyzer`]).
//! 4. Categorize them ([`category::engine::BatchEngine`]), loading each
//!    ecosystem's rules once through the run's [`rules::cache::RuleCache`].
//! 5. Render the requested report ([`report`], [`records`]).

mod analyzer;
mod category;
mod cli;
mod config;
mod detector;
mod error;
mod models;
mod records;
mod registry;
mod report;
mod rules;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use category::engine::BatchEngine;
use cli::{CategorizeArgs, Cli, Command, ReportFormat, RuleArgs};
use config::load_config;
use detector::detect_languages;
use models::{DependencyRecord, Language};
use records::RecordTable;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Categorize(args) => categorize(args, cli.verbose, cli.quiet),
        Command::Classify {
            ecosystem,
            names,
            rules: rule_args,
        } => {
            let engine = build_engine(Path::new("."), &rule_args)?;
            for name in &names {
                let categorization = engine.classify(&ecosystem, name);
                println!(
                    "{}\t{}\t{}",
                    name, categorization.category, categorization.sub_category
                );
            }
            Ok(())
        }
        Command::Rules {
            ecosystem,
            rules: rule_args,
        } => {
            let engine = build_engine(Path::new("."), &rule_args)?;
            let mut files = engine.mapping().rule_files();
            if let Some(eco) = ecosystem {
                let eco = eco.to_lowercase();
                files.retain(|_, ecosystems| ecosystems.contains(&eco.as_str()));
                if files.is_empty() {
                    anyhow::bail!("no rule file is mapped for ecosystem `{eco}`");
                }
            }
            report::terminal::render_rules(&files, engine.cache());
            Ok(())
        }
        Command::MavenArtifacts {
            group_prefix,
            output,
            rows,
        } => maven_artifacts(&group_prefix, output, rows, cli.quiet).await,
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_engine(project: &Path, args: &RuleArgs) -> Result<BatchEngine> {
    let config = load_config(project, args.config.as_deref())?;
    let strategy = args.strategy.unwrap_or(config.strategy);
    let policy = args.invalid_patterns.unwrap_or(config.invalid_patterns);
    let mapping = config.ecosystem_map(args.rules_dir.as_deref());

    Ok(BatchEngine::new(mapping, strategy, policy))
}

fn categorize(args: CategorizeArgs, verbose: bool, quiet: bool) -> Result<()> {
    // Resolve project path
    let path = args
        .path
        .canonicalize()
        .unwrap_or_else(|_| args.path.clone());

    let engine = build_engine(&path, &args.rules)?;

    let (mut table, source) = match &args.input {
        Some(input) => (
            records::read_records(input, args.input_format)?,
            input.display().to_string(),
        ),
        None => (
            RecordTable::from_records(scan_manifests(&path, &args, quiet)?),
            path.display().to_string(),
        ),
    };

    let summary = engine.categorize(&mut table.records);

    match args.report {
        ReportFormat::Terminal => {
            report::terminal::render(&table.records, &summary, &source, verbose, quiet)?;
        }
        ReportFormat::Json => with_output(args.output.as_deref(), |w| records::write_json(&table, w))?,
        ReportFormat::Csv => with_output(args.output.as_deref(), |w| records::write_csv(&table, w))?,
        ReportFormat::Markdown => {
            let md = report::markdown::render(&table.records, &summary, &source);
            with_output(args.output.as_deref(), |w| Ok(w.write_all(md.as_bytes())?))?;
        }
    }

    Ok(())
}

fn scan_manifests(path: &Path, args: &CategorizeArgs, quiet: bool) -> Result<Vec<DependencyRecord>> {
    let excluded: Vec<Language> = args.exclude_lang.iter().map(Into::into).collect();

    let languages: Vec<Language> = detect_languages(path)
        .into_iter()
        .filter(|l| !excluded.contains(l))
        .collect();

    if languages.is_empty() {
        anyhow::bail!("No supported project manifests found in {}", path.display());
    }

    let mut all = Vec::new();
    for language in languages {
        let records = analyzer::analyze(language, path)
            .with_context(|| format!("analyzing {} manifests", language))?;

        if !quiet {
            eprintln!("  {} {} {} dependencies", "→".cyan(), language, records.len());
        }
        all.extend(records);
    }

    Ok(all)
}

/// Run `write` against the output file, or stdout when none is given.
fn with_output<F>(output: Option<&Path>, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    match output {
        Some(path) => {
            let mut file = std::io::BufWriter::new(
                std::fs::File::create(path)
                    .with_context(|| format!("creating {}", path.display()))?,
            );
            write(&mut file)?;
            file.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write(&mut lock)?;
        }
    }
    Ok(())
}

async fn maven_artifacts(group_prefix: &str, output: Option<PathBuf>, rows: usize, quiet: bool) -> Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{group_prefix}.txt")));

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let pb = if !quiet {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        pb.set_message(format!("searching g:{group_prefix}*"));
        Some(pb)
    } else {
        None
    };

    let coordinates = registry::maven::fetch_artifacts(&client, group_prefix, rows, |total| {
        if let Some(pb) = &pb {
            pb.set_message(format!("{total} artifacts"));
            pb.tick();
        }
    })
    .await;

    if let Some(pb) = pb {
        pb.finish_with_message(format!("{} artifacts", coordinates.len()));
    }

    let mut content = coordinates.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    std::fs::write(&output, content).with_context(|| format!("writing {}", output.display()))?;

    if !quiet {
        eprintln!("  {} wrote {}", "→".cyan(), output.display());
    }

    Ok(())
}
