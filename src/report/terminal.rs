use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::category::engine::RunSummary;
use crate::models::{Categorization, DependencyRecord};
use crate::rules::cache::RuleCache;

/// Render a colored terminal report.
pub fn render(
    records: &[DependencyRecord],
    summary: &RunSummary,
    source: &str,
    verbose: bool,
    quiet: bool,
) -> Result<()> {
    let categorized = summary.categorized();
    let other = summary.total - categorized;

    if quiet {
        println!(
            "Total: {}  Categorized: {}  Other: {}  Rule errors: {}",
            summary.total,
            categorized.to_string().green(),
            other.to_string().yellow(),
            summary.failures.len().to_string().red(),
        );
        return Ok(());
    }

    println!(
        "\n {} v{}",
        "dep-categorizr".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" Source: {}\n", source);

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total dependencies : {}", summary.total));
    println!(
        " │  {:<48} │",
        format!("{}  Categorized     : {:>4}", "✓".green(), categorized)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Other           : {:>4}", "•".yellow(), other)
    );
    println!(
        " │  {:<48} │",
        format!("{}  Malformed       : {:>4}", "✗".red(), summary.malformed)
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    for (ecosystem, err) in &summary.failures {
        println!(" {} {}: {}", "[RULES]".red().bold(), ecosystem, err);
    }
    if !summary.unmapped.is_empty() {
        println!(
            " {} no rule file for: {}",
            "[SKIP]".yellow().bold(),
            summary.unmapped.join(", ")
        );
    }
    if !summary.failures.is_empty() || !summary.unmapped.is_empty() {
        println!();
    }

    render_ecosystems(summary);
    render_categories(records);

    if verbose && !records.is_empty() {
        println!(" {} All dependencies:\n", "[ALL]".cyan().bold());
        render_records(records);
        println!();
    }

    Ok(())
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table(titles: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(titles));
    table
}

fn render_ecosystems(summary: &RunSummary) {
    if summary.ecosystems.is_empty() {
        return;
    }

    let mut table = new_table(&["Ecosystem", "Records", "Categorized", "Coverage"]);
    for (ecosystem, stats) in &summary.ecosystems {
        let coverage = if stats.records == 0 {
            0.0
        } else {
            stats.categorized as f64 * 100.0 / stats.records as f64
        };
        table.add_row(vec![
            Cell::new(ecosystem),
            Cell::new(stats.records).set_alignment(CellAlignment::Right),
            Cell::new(stats.categorized).set_alignment(CellAlignment::Right),
            Cell::new(format!("{coverage:.1}%")).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}\n", table);
}

fn render_categories(records: &[DependencyRecord]) {
    let counts = super::category_counts(records);
    if counts.is_empty() {
        return;
    }

    let mut table = new_table(&["Category", "Sub-category", "Count"]);
    for (categorization, count) in counts {
        table.add_row(vec![
            Cell::new(&categorization.category).fg(category_color(&categorization)),
            Cell::new(&categorization.sub_category),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}\n", table);
}

fn render_records(records: &[DependencyRecord]) {
    let mut table = new_table(&["Name", "Version", "Ecosystem", "Category", "Sub-category"]);

    for record in records {
        let categorization = record.categorization();
        table.add_row(vec![
            Cell::new(record.name.as_deref().unwrap_or("-")),
            Cell::new(record.version.as_deref().unwrap_or("-")),
            Cell::new(record.ecosystem.as_deref().unwrap_or("-")),
            Cell::new(&categorization.category).fg(category_color(&categorization)),
            Cell::new(&categorization.sub_category),
        ]);
    }

    println!("{}", table);
}

fn category_color(categorization: &Categorization) -> Color {
    if categorization.is_other() {
        Color::DarkGrey
    } else {
        Color::Green
    }
}

/// Print every rule of each rule file in precedence order.
pub fn render_rules(files: &BTreeMap<PathBuf, Vec<&str>>, cache: &RuleCache) {
    for (path, ecosystems) in files {
        let rules = match cache.get_or_load(path) {
            Ok(rules) => rules,
            Err(err) => {
                println!("\n {} {}", "[RULES]".red().bold(), err);
                continue;
            }
        };

        println!(
            "\n {} {} ({}) {} rules",
            "→".cyan(),
            path.display(),
            ecosystems.join(", "),
            rules.len()
        );

        if rules.is_empty() {
            continue;
        }

        let mut table = new_table(&["#", "Category", "Sub-category", "Pattern"]);
        for (index, rule) in rules.rules().iter().enumerate() {
            table.add_row(vec![
                Cell::new(index).set_alignment(CellAlignment::Right),
                Cell::new(&rule.category),
                Cell::new(&rule.sub_category),
                Cell::new(rule.pattern()),
            ]);
        }
        println!("{}", table);
    }
}
