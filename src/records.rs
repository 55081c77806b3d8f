//! Tabular record sources and sinks (CSV and JSON).

use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::models::DependencyRecord;

/// Column layout for records that did not come from a table.
const FIXED_COLUMNS: &[&str] = &["repo_id", "name", "version", "ecosystem"];

/// Output columns appended when the input lacks them.
const CATEGORY_COLUMNS: &[&str] = &["category", "sub_category"];

/// Records plus the column layout they are written back with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    pub columns: Vec<String>,
    pub records: Vec<DependencyRecord>,
}

impl RecordTable {
    /// Keep the input columns in order and add the category columns.
    pub fn with_columns(columns: Vec<String>, records: Vec<DependencyRecord>) -> Self {
        let mut table = Self { columns, records };
        table.add_category_columns();
        table
    }

    /// Layout for records built in memory: the fixed columns (`repo_id` only
    /// when some record has one), then every extra column, sorted.
    pub fn from_records(records: Vec<DependencyRecord>) -> Self {
        let extra_columns: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.extra.keys().map(String::as_str))
            .collect();
        let has_repo_id = records.iter().any(|r| r.repo_id.is_some());

        let columns = FIXED_COLUMNS
            .iter()
            .copied()
            .filter(|c| has_repo_id || *c != "repo_id")
            .chain(CATEGORY_COLUMNS.iter().copied())
            .chain(extra_columns)
            .map(str::to_string)
            .collect();

        Self { columns, records }
    }

    fn add_category_columns(&mut self) {
        for column in CATEGORY_COLUMNS {
            if !self.columns.iter().any(|c| c.trim().eq_ignore_ascii_case(column)) {
                self.columns.push(column.to_string());
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RecordFormat {
    Csv,
    Json,
}

impl RecordFormat {
    /// Guess from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(RecordFormat::Csv),
            "json" => Some(RecordFormat::Json),
            _ => None,
        }
    }
}

/// Read records from a file, using `format` or else the file extension.
pub fn read_records(path: &Path, format: Option<RecordFormat>) -> Result<RecordTable> {
    let format = format
        .or_else(|| RecordFormat::from_path(path))
        .with_context(|| {
            format!(
                "cannot tell the format of {}; pass --input-format",
                path.display()
            )
        })?;

    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    match format {
        RecordFormat::Csv => read_csv(file),
        RecordFormat::Json => read_json(file),
    }
    .with_context(|| format!("reading records from {}", path.display()))
}

/// CSV with a header row. Every cell is read as text.
pub fn read_csv<R: Read>(reader: R) -> Result<RecordTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut records = Vec::new();

    for row in rdr.records() {
        let row = row?;
        let fields = headers
            .iter()
            .zip(row.iter())
            .map(|(column, cell)| (column.to_string(), Value::String(cell.to_string())));
        records.push(DependencyRecord::from_fields(fields));
    }

    let columns = headers.iter().map(str::to_string).collect();
    Ok(RecordTable::with_columns(columns, records))
}

/// A JSON array of objects. Columns are listed in first-seen order.
pub fn read_json<R: Read>(reader: R) -> Result<RecordTable> {
    let rows: Vec<Map<String, Value>> = serde_json::from_reader(reader)?;

    let mut columns: Vec<String> = Vec::new();
    for key in rows.iter().flat_map(Map::keys) {
        if !columns.contains(key) {
            columns.push(key.clone());
        }
    }

    let records = rows.into_iter().map(DependencyRecord::from_fields).collect();
    Ok(RecordTable::with_columns(columns, records))
}

/// One row per record, in the table's column order.
pub fn write_csv<W: Write>(table: &RecordTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&table.columns)?;

    for record in &table.records {
        wtr.write_record(table.columns.iter().map(|column| cell(&record.field(column))))?;
    }

    wtr.flush()?;
    Ok(())
}

/// An array of objects keyed by the table's columns. Absent values are `null`.
pub fn write_json<W: Write>(table: &RecordTable, mut writer: W) -> Result<()> {
    let rows: Vec<Map<String, Value>> = table
        .records
        .iter()
        .map(|record| {
            table
                .columns
                .iter()
                .map(|column| (column.clone(), record.field(column)))
                .collect()
        })
        .collect();

    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writeln!(writer)?;
    Ok(())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Categorization;
    use serde_json::json;

    fn write_csv_string(table: &RecordTable) -> String {
        let mut out = Vec::new();
        write_csv(table, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_read_csv_with_package_type() {
        let data = "id,repo_id,name,version,package_type\n\
                    1,10,django,4.2,pip\n\
                    2,10,,1.0,pip\n";
        let table = read_csv(data.as_bytes()).unwrap();
        let records = &table.records;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("django"));
        assert_eq!(records[0].ecosystem.as_deref(), Some("pip"));
        assert_eq!(records[0].extra.get("id"), Some(&json!("1")));
        assert_eq!(records[1].name, None);
        assert_eq!(
            table.columns,
            vec!["id", "repo_id", "name", "version", "package_type", "category", "sub_category"]
        );
    }

    #[test]
    fn test_csv_keeps_input_shape() {
        let data = "id,repo_id,name,version,package_type\n1,10,django,4.2,pip\n";
        let mut table = read_csv(data.as_bytes()).unwrap();
        table.records[0].set_categorization(Categorization::new("Web Framework", ""));

        let text = write_csv_string(&table);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "id,repo_id,name,version,package_type,category,sub_category",
                "1,10,django,4.2,pip,Web Framework,",
            ]
        );
    }

    #[test]
    fn test_csv_existing_category_columns_stay_in_place() {
        let data = "name,category,sub_category,ecosystem\npytest,Old,Stale,pip\n";
        let mut table = read_csv(data.as_bytes()).unwrap();
        table.records[0].set_categorization(Categorization::new("Testing", "Unit"));

        let text = write_csv_string(&table);
        assert_eq!(text, "name,category,sub_category,ecosystem\npytest,Testing,Unit,pip\n");
    }

    #[test]
    fn test_csv_both_ecosystem_columns_round_trip() {
        let data = "name,ecosystem,package_type\nx,pip,PyPI\n";
        let table = read_csv(data.as_bytes()).unwrap();

        assert_eq!(table.records[0].ecosystem.as_deref(), Some("pip"));
        assert_eq!(table.records[0].extra.get("package_type"), Some(&json!("PyPI")));

        let text = write_csv_string(&table);
        assert_eq!(
            text,
            "name,ecosystem,package_type,category,sub_category\nx,pip,PyPI,Other,\n"
        );
    }

    #[test]
    fn test_read_json_array() {
        let data = r#"[
            {"repo_id": 3, "name": "react", "version": "18.2.0", "ecosystem": "npm", "stars": 5},
            {"name": "lodash", "package_type": "yarn"}
        ]"#;
        let table = read_json(data.as_bytes()).unwrap();
        let records = &table.records;

        assert_eq!(records[0].repo_id.as_deref(), Some("3"));
        assert_eq!(records[0].extra.get("stars"), Some(&json!(5)));
        assert_eq!(records[1].ecosystem.as_deref(), Some("yarn"));
        assert!(table.columns.contains(&"package_type".to_string()));
        assert!(table.columns.ends_with(&["category".to_string(), "sub_category".to_string()]));
    }

    #[test]
    fn test_json_keeps_package_type_key() {
        let data = r#"[{"name": "lodash", "package_type": "yarn", "id": 9}]"#;
        let table = read_json(data.as_bytes()).unwrap();

        let mut out = Vec::new();
        write_json(&table, &mut out).unwrap();
        let value: Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value[0]["package_type"], json!("yarn"));
        assert_eq!(value[0]["id"], json!(9));
        assert_eq!(value[0]["category"], json!("Other"));
        assert!(value[0].get("ecosystem").is_none());
    }

    #[test]
    fn test_in_memory_records_layout() {
        let mut a = DependencyRecord::new("django", "4.2", "pip").with_extra("id", "1");
        a.category = "Web Framework".into();
        let b = DependencyRecord::new("serde", "1.0", "cargo").with_extra("manifest", "Cargo.lock");

        let text = write_csv_string(&RecordTable::from_records(vec![a, b]));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "name,version,ecosystem,category,sub_category,id,manifest");
        assert_eq!(lines[1], "django,4.2,pip,Web Framework,,1,");
        assert_eq!(lines[2], "serde,1.0,cargo,Other,,,Cargo.lock");
    }

    #[test]
    fn test_write_json_in_memory_records() {
        let record = DependencyRecord::new("react", "18", "npm").with_extra("manifest", "package.json");
        let mut out = Vec::new();
        write_json(&RecordTable::from_records(vec![record]), &mut out).unwrap();

        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["manifest"], json!("package.json"));
        assert_eq!(value[0]["ecosystem"], json!("npm"));
        assert_eq!(value[0]["category"], json!("Other"));
        assert!(value[0].get("repo_id").is_none());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(RecordFormat::from_path(Path::new("deps.CSV")), Some(RecordFormat::Csv));
        assert_eq!(RecordFormat::from_path(Path::new("deps.json")), Some(RecordFormat::Json));
        assert_eq!(RecordFormat::from_path(Path::new("deps.parquet")), None);
    }
}
