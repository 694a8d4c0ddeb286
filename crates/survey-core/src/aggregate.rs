//! Per-entity aggregation of the flattened table

use crate::error::{Error, Result};
use crate::table::{CellValue, Table};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Group {
    numbers: Vec<Option<f64>>,
    links: Vec<String>,
}

/// Collapse rows sharing `key` into one row per key
///
/// Numeric fields keep the first parseable number in row order (values that
/// do not parse count as missing). Distinct non-empty link values are joined
/// with `", "`. Groups come out in ascending key order; rows without a key
/// are skipped. Absent numeric or link columns aggregate to missing.
pub fn aggregate(
    table: &Table,
    key: &str,
    numeric_fields: &[String],
    link_field: &str,
) -> Result<Table> {
    let key_idx = table
        .column_index(key)
        .ok_or_else(|| Error::missing_column(table.source_path.display().to_string(), key))?;
    let numeric_idx: Vec<Option<usize>> = numeric_fields
        .iter()
        .map(|f| table.column_index(f))
        .collect();
    let link_idx = table.column_index(link_field);

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    let mut keyless = 0usize;

    for row in &table.rows {
        let group_key = row
            .get(key_idx)
            .map(CellValue::to_string_value)
            .unwrap_or_default();
        if group_key.is_empty() {
            keyless += 1;
            continue;
        }

        let group = groups.entry(group_key).or_insert_with(|| Group {
            numbers: vec![None; numeric_fields.len()],
            links: Vec::new(),
        });

        for (slot, idx) in group.numbers.iter_mut().zip(&numeric_idx) {
            if slot.is_none() {
                *slot = idx.and_then(|i| row.get(i)).and_then(CellValue::as_number);
            }
        }

        if let Some(link) = link_idx.and_then(|i| row.get(i)) {
            let link = link.to_string_value();
            if !link.is_empty() && !group.links.contains(&link) {
                group.links.push(link);
            }
        }
    }

    if keyless > 0 {
        log::warn!("skipped {} rows without a {} value", keyless, key);
    }

    let mut columns = vec![key.to_string()];
    columns.extend(numeric_fields.iter().cloned());
    columns.push(link_field.to_string());
    let mut out = Table::with_columns(table.source_path.clone(), columns);

    for (group_key, group) in groups {
        let mut cells = Vec::with_capacity(out.column_count());
        cells.push(CellValue::String(group_key));
        cells.extend(
            group
                .numbers
                .into_iter()
                .map(|n| n.map_or(CellValue::Empty, CellValue::Float)),
        );
        cells.push(if group.links.is_empty() {
            CellValue::Empty
        } else {
            CellValue::String(group.links.join(", "))
        });
        out.push_row(cells);
    }

    log::info!(
        "aggregated {} rows into {} entities",
        table.row_count(),
        out.row_count()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv_str;

    fn numeric() -> Vec<String> {
        vec!["Total Area".to_string(), "Tower Count".to_string()]
    }

    #[test]
    fn test_coalesce_first_non_missing() {
        let csv = "XID,Total Area,Tower Count,Brochure Link\n\
                   R1,,,\n\
                   R1,5,,https://x/a.pdf\n\
                   R1,,3,\n\
                   R1,9,4,https://x/a.pdf\n";
        let table = parse_csv_str(csv, "flat.csv", 0).unwrap();
        let out = aggregate(&table, "XID", &numeric(), "Brochure Link").unwrap();

        assert_eq!(out.row_count(), 1);
        assert_eq!(out.cell(0, "Total Area"), Some(&CellValue::Float(5.0)));
        assert_eq!(out.cell(0, "Tower Count"), Some(&CellValue::Float(3.0)));
        assert_eq!(
            out.cell(0, "Brochure Link"),
            Some(&CellValue::String("https://x/a.pdf".to_string()))
        );
    }

    #[test]
    fn test_all_missing_and_unparseable() {
        let csv = "XID,Total Area,Tower Count,Brochure Link\n\
                   C2,twelve,,\n\
                   C2,,n/a,\n";
        let table = parse_csv_str(csv, "flat.csv", 0).unwrap();
        let out = aggregate(&table, "XID", &numeric(), "Brochure Link").unwrap();

        assert_eq!(out.cell(0, "Total Area"), Some(&CellValue::Empty));
        assert_eq!(out.cell(0, "Tower Count"), Some(&CellValue::Empty));
        assert_eq!(out.cell(0, "Brochure Link"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_groups_sorted_and_links_joined() {
        let csv = "XID,Total Area,Brochure Link\n\
                   R2,1,https://x/b.pdf\n\
                   C1,2,https://x/c.pdf\n\
                   R2,,https://x/d.pdf\n\
                   R2,,https://x/b.pdf\n\
                   ,7,https://x/orphan.pdf\n";
        let table = parse_csv_str(csv, "flat.csv", 0).unwrap();
        let out = aggregate(&table, "XID", &numeric(), "Brochure Link").unwrap();

        assert_eq!(
            out.column_names(),
            vec!["XID", "Total Area", "Tower Count", "Brochure Link"]
        );
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.cell(0, "XID"), Some(&CellValue::String("C1".to_string())));
        assert_eq!(
            out.cell(1, "Brochure Link"),
            Some(&CellValue::String("https://x/b.pdf, https://x/d.pdf".to_string()))
        );
        // Absent column aggregates to missing
        assert_eq!(out.cell(1, "Tower Count"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_missing_key_column() {
        let table = parse_csv_str("Name\nfoo\n", "flat.csv", 0).unwrap();
        assert!(aggregate(&table, "XID", &numeric(), "Brochure Link").is_err());
    }
}
