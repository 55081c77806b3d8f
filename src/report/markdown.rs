use std::fmt::{self, Write};

use crate::category::engine::RunSummary;
use crate::models::DependencyRecord;

/// Render a Markdown summary report.
pub fn render(records: &[DependencyRecord], summary: &RunSummary, source: &str) -> String {
    let mut md = String::new();
    // fmt::Write for String is infallible.
    let _ = write_report(&mut md, records, summary, source);
    md
}

fn write_report(
    md: &mut String,
    records: &[DependencyRecord],
    summary: &RunSummary,
    source: &str,
) -> fmt::Result {
    let categorized = summary.categorized();

    writeln!(md, "# Dependency Categorization Report\n")?;
    writeln!(md, "**Source**: `{}`\n", source)?;

    writeln!(md, "## Summary\n")?;
    writeln!(md, "- **Total dependencies**: {}", summary.total)?;
    writeln!(
        md,
        "- **Categorized**: {} ({})",
        categorized,
        percent(categorized, summary.total)
    )?;
    writeln!(md, "- **Other**: {}", summary.total - categorized)?;
    writeln!(md, "- **Malformed records**: {}\n", summary.malformed)?;

    if !summary.ecosystems.is_empty() {
        writeln!(md, "## By Ecosystem\n")?;
        writeln!(md, "| Ecosystem | Records | Categorized | Coverage |")?;
        writeln!(md, "|---|---:|---:|---:|")?;
        for (ecosystem, stats) in &summary.ecosystems {
            writeln!(
                md,
                "| {} | {} | {} | {} |",
                escape(ecosystem),
                stats.records,
                stats.categorized,
                percent(stats.categorized, stats.records)
            )?;
        }
        md.push('\n');
    }

    let counts = super::category_counts(records);
    if !counts.is_empty() {
        writeln!(md, "## By Category\n")?;
        writeln!(md, "| Category | Sub-category | Count |")?;
        writeln!(md, "|---|---|---:|")?;
        for (categorization, count) in counts {
            writeln!(
                md,
                "| {} | {} | {} |",
                escape(&categorization.category),
                escape(&categorization.sub_category),
                count
            )?;
        }
        md.push('\n');
    }

    if !summary.failures.is_empty() || !summary.unmapped.is_empty() {
        writeln!(md, "## Data Quality Notes\n")?;
        for (ecosystem, err) in &summary.failures {
            writeln!(md, "- Rules unavailable for `{}`: {}", ecosystem, err)?;
        }
        for ecosystem in &summary.unmapped {
            writeln!(md, "- No rule file mapped for `{}`", ecosystem)?;
        }
        md.push('\n');
    }

    Ok(())
}

fn percent(part: usize, whole: usize) -> String {
    if whole == 0 {
        "0.0%".to_string()
    } else {
        format!("{:.1}%", part as f64 * 100.0 / whole as f64)
    }
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::engine::EcosystemStats;
    use crate::models::Categorization;

    #[test]
    fn test_render_markdown() {
        let mut django = DependencyRecord::new("django", "4.2", "pip");
        django.set_categorization(Categorization::new("Web Framework", ""));
        let records = vec![django, DependencyRecord::new("serde", "1", "cargo")];

        let mut summary = RunSummary {
            total: 2,
            unmapped: vec!["cargo".into()],
            ..RunSummary::default()
        };
        summary.ecosystems.insert(
            "pip".into(),
            EcosystemStats {
                records: 1,
                categorized: 1,
            },
        );
        summary.ecosystems.insert(
            "cargo".into(),
            EcosystemStats {
                records: 1,
                categorized: 0,
            },
        );

        let md = render(&records, &summary, "deps.csv");

        assert!(md.starts_with("# Dependency Categorization Report"));
        assert!(md.contains("- **Categorized**: 1 (50.0%)"));
        assert!(md.contains("| pip | 1 | 1 | 100.0% |"));
        assert!(md.contains("| Web Framework |  | 1 |"));
        assert!(md.contains("- No rule file mapped for `cargo`"));
    }

    #[test]
    fn test_escape_pipes() {
        assert_eq!(escape("a|b"), "a\\|b");
    }
}
