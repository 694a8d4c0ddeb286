//! Reference dataset storage and incremental artifacts

use crate::error::{Error, Result};
use crate::parser::parse_csv;
use crate::table::{CellValue, Table};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Load the reference dataset; a missing file is an empty table
pub fn load_reference<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    if !path.exists() {
        log::info!("no reference at {}, starting empty", path.display());
        return Ok(Table::new(path.to_path_buf()));
    }
    parse_csv(path, 0)
}

/// Write a table as CSV, rendering empty cells as `missing`
pub fn write_csv<P: AsRef<Path>>(path: P, table: &Table, missing: &str) -> Result<()> {
    let path = path.as_ref();
    let csv_err = |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(table.column_names()).map_err(csv_err)?;
    for row in &table.rows {
        writer
            .write_record(row.cells.iter().map(|cell| match cell {
                CellValue::Empty => missing.to_string(),
                other => other.to_string_value(),
            }))
            .map_err(csv_err)?;
    }
    writer.flush()?;

    log::debug!("wrote {} rows to {}", table.row_count(), path.display());
    Ok(())
}

/// Append `delta` to `reference` and keep only the last row per key
///
/// Columns are the union of both tables, reference columns first. A row
/// that survives deduplication keeps its position in the concatenation.
pub fn merge_reference(reference: &Table, delta: &Table, key: &str) -> Result<Table> {
    let mut names: Vec<&str> = reference.column_names();
    let known: HashSet<&str> = names.iter().copied().collect();
    names.extend(delta.column_names().into_iter().filter(|n| !known.contains(n)));

    if !names.contains(&key) {
        return Err(Error::missing_column(
            delta.source_path.display().to_string(),
            key,
        ));
    }

    let mut merged = Table::with_columns(reference.source_path.clone(), names.iter().copied());
    for source in [reference, delta] {
        let mapping: Vec<Option<usize>> = names.iter().map(|n| source.column_index(n)).collect();
        for row in &source.rows {
            let cells = mapping
                .iter()
                .map(|idx| {
                    idx.and_then(|i| row.get(i))
                        .cloned()
                        .unwrap_or(CellValue::Empty)
                })
                .collect();
            merged.push_row(cells);
        }
    }

    let key_idx = merged.column_index(key).unwrap_or_default();
    let mut last: HashMap<String, usize> = HashMap::new();
    for (i, row) in merged.rows.iter().enumerate() {
        let k = row.get(key_idx).map(CellValue::to_string_value).unwrap_or_default();
        last.insert(k, i);
    }

    let total = merged.row_count();
    let mut position = 0usize;
    merged.rows.retain(|row| {
        let k = row.get(key_idx).map(CellValue::to_string_value).unwrap_or_default();
        let keep = last.get(&k) == Some(&position);
        position += 1;
        keep
    });

    log::info!(
        "merged {} delta rows into reference: {} rows ({} superseded)",
        delta.row_count(),
        merged.row_count(),
        total - merged.row_count()
    );
    Ok(merged)
}

/// `Incremental_Data_<YYYY-MM-DD>.csv` beside the reference file
pub fn incremental_path(reference_path: &Path, date: NaiveDate) -> PathBuf {
    let name = format!("Incremental_Data_{}.csv", date.format("%Y-%m-%d"));
    match reference_path.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv_str;
    use crate::reconcile::reconcile;
    use std::fs;
    use tempfile::TempDir;

    fn table(csv: &str) -> Table {
        parse_csv_str(csv, "mem.csv", 0).unwrap()
    }

    #[test]
    fn test_missing_reference_is_empty() {
        let dir = TempDir::new().unwrap();
        let reference = load_reference(dir.path().join("Final.csv")).unwrap();
        assert!(reference.is_empty());
    }

    #[test]
    fn test_write_renders_missing_as_placeholder() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let t = table("XID,Total Area,Brochure Link\nR1,,\"a, b\"\n");

        write_csv(&path, &t, "NA").unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "XID,Total Area,Brochure Link\nR1,NA,\"a, b\"\n");

        let back = load_reference(&path).unwrap();
        assert_eq!(back.cell(0, "Brochure Link"), Some(&CellValue::String("a, b".to_string())));
    }

    #[test]
    fn test_merge_last_write_wins() {
        let reference = table("XID,x\nA,1\nB,1\n");
        let delta = table("XID,x,y\nA,2,new\nC,3,\n");

        let merged = merge_reference(&reference, &delta, "XID").unwrap();
        assert_eq!(merged.column_names(), vec!["XID", "x", "y"]);
        assert_eq!(merged.row_count(), 3);
        assert_eq!(merged.cell(0, "XID"), Some(&CellValue::String("B".to_string())));
        assert_eq!(merged.cell(0, "y"), Some(&CellValue::Empty));
        assert_eq!(merged.cell(1, "x"), Some(&CellValue::Integer(2)));
        assert_eq!(merged.cell(2, "XID"), Some(&CellValue::String("C".to_string())));
    }

    #[test]
    fn test_merge_into_empty_reference() {
        let reference = Table::new(PathBuf::from("Final.csv"));
        let delta = table("XID,x\nA,1\n");
        let merged = merge_reference(&reference, &delta, "XID").unwrap();
        assert_eq!(merged.row_count(), 1);
        assert_eq!(merged.source_path, PathBuf::from("Final.csv"));
    }

    #[test]
    fn test_merge_missing_key() {
        let reference = Table::new(PathBuf::from("Final.csv"));
        let delta = table("ID,x\nA,1\n");
        assert!(merge_reference(&reference, &delta, "XID").is_err());
    }

    #[test]
    fn test_reconcile_after_merge_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Final.csv");
        let current = table("XID,Total Area,Brochure Link\nC1,2,\nR2,1,https://x/b.pdf\n");

        let reference = load_reference(&path).unwrap();
        let delta = reconcile(&reference, &current, "XID").unwrap();
        assert_eq!(delta.new_keys, vec!["C1", "R2"]);

        let merged = merge_reference(&reference, &delta.table, "XID").unwrap();
        write_csv(&path, &merged, "NA").unwrap();

        let reference = load_reference(&path).unwrap();
        let again = reconcile(&reference, &current, "XID").unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_incremental_path() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 11).unwrap();
        assert_eq!(
            incremental_path(Path::new("/data/Final.csv"), date),
            PathBuf::from("/data/Incremental_Data_2025-10-11.csv")
        );
        assert_eq!(
            incremental_path(Path::new("Final.csv"), date),
            PathBuf::from("Incremental_Data_2025-10-11.csv")
        );
    }
}
