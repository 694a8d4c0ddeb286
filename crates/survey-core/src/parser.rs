//! CSV reader for survey exports and reference datasets

use crate::error::{Error, Result};
use crate::table::{CellValue, Column, Table};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Parse a CSV file into a Table
///
/// `skip_rows` leading records (banner/title rows) are discarded before the
/// header row is read.
pub fn parse_csv<P: AsRef<Path>>(path: P, skip_rows: usize) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    read_table(BufReader::new(file), skip_rows, path.to_path_buf())
}

/// Parse CSV from a string (useful for testing)
pub fn parse_csv_str(content: &str, source_name: &str, skip_rows: usize) -> Result<Table> {
    read_table(content.as_bytes(), skip_rows, PathBuf::from(source_name))
}

fn read_table<R: Read>(reader: R, skip_rows: usize, path: PathBuf) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // Allow varying number of fields
        .from_reader(reader);

    let mut records = csv_reader.records().skip(skip_rows);

    let headers = match records.next() {
        Some(result) => result.map_err(|e| Error::Csv {
            path: path.clone(),
            source: e,
        })?,
        None => {
            return Err(Error::CsvParse {
                path,
                message: "no header row found in CSV".to_string(),
            })
        }
    };

    let names = dedupe_header_names(headers.iter());
    if names.iter().all(|n| n.is_empty()) {
        return Err(Error::CsvParse {
            path,
            message: "no columns found in CSV".to_string(),
        });
    }

    let columns: Vec<Column> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column::new(name, i))
        .collect();

    let mut table = Table {
        columns,
        rows: Vec::new(),
        source_path: path,
    };

    for (row_idx, result) in records.enumerate() {
        let record = result.map_err(|e| Error::Csv {
            path: table.source_path.clone(),
            source: e,
        })?;

        let cells: Vec<CellValue> = record.iter().map(CellValue::parse).collect();

        if cells.len() > table.column_count() {
            log::warn!(
                "row {} in {} has more cells than columns, truncating",
                row_idx + 1,
                table.source_path.display()
            );
        }

        // Fully blank lines inside an export are padding, not records
        if cells.iter().all(CellValue::is_empty) {
            continue;
        }

        table.push_row(cells);
    }

    log::debug!(
        "read {} rows x {} columns from {}",
        table.row_count(),
        table.column_count(),
        table.source_path.display()
    );

    Ok(table)
}

/// Trim header names and suffix repeats as `name.1`, `name.2`, ...
///
/// Survey exports carry duplicated headers (two `Locality` columns); the second
/// one is addressed downstream as `Locality.1`.
fn dedupe_header_names<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();

    for (i, name) in raw.enumerate() {
        let mut name = name.trim().to_string();
        if i == 0 {
            name = name.trim_start_matches('\u{feff}').to_string();
        }

        let count = seen.entry(name.clone()).or_insert(0);
        if *count > 0 {
            names.push(format!("{}.{}", name, count));
        } else {
            names.push(name);
        }
        *count += 1;
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let csv = "XID,rescom,Value\n1,Residential,100\n2,Commercial,200\n";
        let table = parse_csv_str(csv, "test.csv", 0).unwrap();

        assert_eq!(table.column_names(), vec!["XID", "rescom", "Value"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, "XID"), Some(&CellValue::Integer(1)));
        assert_eq!(
            table.cell(1, "rescom"),
            Some(&CellValue::String("Commercial".to_string()))
        );
    }

    #[test]
    fn test_skip_banner_rows() {
        let csv = "Field New Panel Data\nXID,rescom\n7,Commercial\n";
        let table = parse_csv_str(csv, "test.csv", 1).unwrap();

        assert_eq!(table.column_names(), vec!["XID", "rescom"]);
        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_parse_with_empty_and_short_rows() {
        let csv = "XID,Name,Value\n1,,100\n2,bar\n";
        let table = parse_csv_str(csv, "test.csv", 0).unwrap();

        assert_eq!(table.rows[0].cells[1], CellValue::Empty);
        assert_eq!(table.rows[1].cells[2], CellValue::Empty);
    }

    #[test]
    fn test_multiline_quoted_blob() {
        let csv = "XID,Brochure\n1,\"phaseIdentifier: Tower A_1_UC_R1\noriginal: https://x/b.pdf\"\n";
        let table = parse_csv_str(csv, "test.csv", 0).unwrap();

        let blob = table.cell(0, "Brochure").unwrap().to_string_value();
        assert_eq!(blob.lines().count(), 2);
    }

    #[test]
    fn test_duplicate_headers_are_suffixed() {
        let csv = "XID,Locality,Locality,Locality\n1,a,b,c\n";
        let table = parse_csv_str(csv, "test.csv", 0).unwrap();

        assert_eq!(
            table.column_names(),
            vec!["XID", "Locality", "Locality.1", "Locality.2"]
        );
    }

    #[test]
    fn test_blank_lines_skipped() {
        let csv = "XID,Name\n1,a\n,\n2,b\n";
        let table = parse_csv_str(csv, "test.csv", 0).unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_missing_header() {
        assert!(parse_csv_str("", "empty.csv", 0).is_err());
        assert!(parse_csv_str("banner\n", "banner.csv", 1).is_err());
    }
}
