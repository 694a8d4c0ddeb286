//! End-to-end transform: raw export to delta and updated reference

use crate::aggregate::aggregate;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::flatten::{drop_columns, expand_url_lists, flatten, to_table};
use crate::processor::process_table;
use crate::reconcile::{Delta, Reconciler};
use crate::store::merge_reference;
use crate::table::Table;

/// Every intermediate and final product of one run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Survey visits read from the export
    pub processed_rows: usize,
    /// One row per structured entry, URL lists expanded
    pub flattened: Table,
    /// One row per entity
    pub aggregated: Table,
    /// New and changed entities relative to the reference
    pub delta: Delta,
    /// Reference with the delta merged in
    pub updated_reference: Table,
}

/// Process, flatten, expand URL lists and drop leftover columns
pub fn flatten_table(input: &Table, config: &PipelineConfig) -> Result<Table> {
    let rows = process_table(input, config)?;
    let rows = flatten(&rows, &config.flatten_columns);
    let mut rows = expand_url_lists(rows, &config.url_columns);
    drop_columns(&mut rows, &config.drop_flattened_columns);
    to_table(&rows, input.source_path.clone())
}

/// Run every stage over an input export and the current reference
///
/// Pure: nothing is read or written here. Persisting the delta and the
/// updated reference is up to the caller.
pub fn run(input: &Table, reference: &Table, config: &PipelineConfig) -> Result<PipelineOutput> {
    let processed_rows = input.row_count();
    let flattened = flatten_table(input, config)?;

    let aggregated = aggregate(
        &flattened,
        &config.id_column,
        &config.numeric_fields,
        &config.link_field,
    )?;

    let delta = Reconciler::new(config.id_column.as_str(), config.na_placeholder.as_str())
        .reconcile(reference, &aggregated)?;
    let updated_reference = merge_reference(reference, &delta.table, &config.id_column)?;

    Ok(PipelineOutput {
        processed_rows,
        flattened,
        aggregated,
        delta,
        updated_reference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_csv_str;
    use crate::table::CellValue;
    use std::path::PathBuf;

    const EXPORT: &str = "\
Survey Panel Export
XID,rescom,visitdate,User,Basic Details,Brochure,Tower Details,Video URL
42,Residential,2025-10-11,alice,\"projectdetails_projectname: Green Acres
projectdetails_totalarea: 12.5
projectdetails_towercount: 3\",\"phaseIdentifier: Tower A_1_UC_REG1
original: https://x/a.pdf
phaseIdentifier: Tower B_2_RTM_REG2
original: https://x/b.pdf\",\"phaseIdentifier: P1_1_UC_X
towerName: T1\",\"v1: https://x/v1.mp4
v2: https://x/v2.mp4\"
42,Residential,2025-11-02,alice,\"projectdetails_totalarea: 99\",,,
7,Commercial,,bob,,\"phaseIdentifier: Mall_1_UC_M1
original: https://x/m.pdf\",,
";

    fn input() -> Table {
        parse_csv_str(EXPORT, "export.csv", 1).unwrap()
    }

    fn cell(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    #[test]
    fn test_flatten_table_shape() {
        let config = PipelineConfig::default();
        let flat = flatten_table(&input(), &config).unwrap();

        // R42 visit one: basic + 2 brochures; visit two: basic; C7: empty basic + brochure
        assert_eq!(flat.row_count(), 6);
        let names = flat.column_names();
        assert_eq!(&names[..3], &["XID", "ID", "rescom"]);
        assert!(!names.contains(&"User"));
        assert!(!names.contains(&"Tower Details"));
        assert!(!names.contains(&"Brochure"));
        assert!(names.contains(&"Video URL_2"));
        assert_eq!(flat.cell(0, "ID"), Some(&cell("R42_20251011")));
        assert_eq!(flat.cell(2, "Brochure Link"), Some(&cell("https://x/b.pdf")));
    }

    #[test]
    fn test_first_run_everything_new() {
        let config = PipelineConfig::default();
        let reference = Table::new(PathBuf::from("Final.csv"));
        let out = run(&input(), &reference, &config).unwrap();

        assert_eq!(out.processed_rows, 3);
        assert_eq!(
            out.aggregated.column_names(),
            config.aggregate_columns().iter().map(String::as_str).collect::<Vec<_>>()
        );
        assert_eq!(out.delta.new_keys, vec!["C7", "R42"]);
        assert_eq!(out.aggregated.cell(1, "Total Area"), Some(&CellValue::Float(12.5)));
        assert_eq!(out.aggregated.cell(1, "Tower Count"), Some(&CellValue::Float(3.0)));
        assert_eq!(
            out.aggregated.cell(1, "Brochure Link"),
            Some(&cell("https://x/a.pdf, https://x/b.pdf"))
        );
        assert_eq!(out.updated_reference.row_count(), 2);
    }

    #[test]
    fn test_second_run_is_empty() {
        let config = PipelineConfig::default();
        let reference = Table::new(PathBuf::from("Final.csv"));
        let first = run(&input(), &reference, &config).unwrap();
        let second = run(&input(), &first.updated_reference, &config).unwrap();

        assert!(second.delta.is_empty());
        assert_eq!(second.updated_reference.rows, first.updated_reference.rows);
    }

    #[test]
    fn test_changed_entity_detected() {
        let config = PipelineConfig::default();
        let reference = parse_csv_str(
            "XID,Total Area,Open Area,Floor Count,Tower Count,Brochure Link\n\
             C7,NA,NA,NA,NA,https://x/m.pdf\n\
             R42,10,NA,NA,3,\"https://x/a.pdf, https://x/b.pdf\"\n",
            "Final.csv",
            0,
        )
        .unwrap();

        let out = run(&input(), &reference, &config).unwrap();
        assert!(out.delta.new_keys.is_empty());
        assert_eq!(out.delta.changed_keys, vec!["R42"]);
        assert_eq!(out.updated_reference.row_count(), 2);
        assert_eq!(out.updated_reference.cell(1, "XID"), Some(&cell("R42")));
        assert_eq!(
            out.updated_reference.cell(1, "Total Area"),
            Some(&CellValue::Float(12.5))
        );
    }
}
