//! Flattening processed rows into a wide table
//!
//! One-to-many structured columns are exploded into one row per entry, URL
//! lists become numbered columns, and whatever structure is left is rendered
//! as JSON text when the rows are turned back into a [`Table`].

use crate::error::Result;
use crate::fields::Record;
use crate::processor::{Slot, SurveyRow};
use crate::table::{CellValue, Table};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Explode `list_fields` into rows
///
/// Each row yields one output row per entry found across the listed columns
/// (in column order), or a single row when there are none. Listed columns are
/// removed; entry fields overwrite same-named columns. No deduplication.
pub fn flatten(rows: &[SurveyRow], list_fields: &[String]) -> Vec<SurveyRow> {
    let listed: HashSet<&str> = list_fields.iter().map(String::as_str).collect();
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let mut base = row.clone();
        base.columns.retain(|(name, _)| !listed.contains(name.as_str()));

        let entries: Vec<Record> = list_fields
            .iter()
            .filter_map(|field| row.block(field))
            .flat_map(|block| block.entries())
            .collect();

        if entries.is_empty() {
            out.push(base);
            continue;
        }

        for entry in entries {
            let mut flat = base.clone();
            for (field, value) in entry {
                flat.set(field.label(), Slot::Cell(CellValue::text(value)));
            }
            out.push(flat);
        }
    }

    log::debug!("flattened {} rows into {}", rows.len(), out.len());
    out
}

/// Expand URL-list columns into `field_1..field_N`
///
/// N is the longest list across all rows; shorter lists leave trailing
/// columns empty. The original column is removed.
pub fn expand_url_lists(mut rows: Vec<SurveyRow>, url_fields: &[String]) -> Vec<SurveyRow> {
    for field in url_fields {
        let width = rows
            .iter()
            .filter_map(|row| row.block(field).and_then(|b| b.urls()))
            .map(<[String]>::len)
            .max()
            .unwrap_or(0);

        for row in &mut rows {
            let urls = match row.remove(field) {
                Some(Slot::Block(block)) => block.urls().map(<[String]>::to_vec).unwrap_or_default(),
                _ => Vec::new(),
            };
            for i in 0..width {
                let cell = urls.get(i).map_or(CellValue::Empty, |u| CellValue::text(u.as_str()));
                row.set(format!("{}_{}", field, i + 1), Slot::Cell(cell));
            }
        }
    }
    rows
}

/// Remove columns from every row
pub fn drop_columns(rows: &mut [SurveyRow], names: &[String]) {
    for row in rows {
        for name in names {
            row.remove(name);
        }
    }
}

/// Render rows into a table whose columns are the union of all row columns
/// in first-seen order
pub fn to_table(rows: &[SurveyRow], source: PathBuf) -> Result<Table> {
    let mut names: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for row in rows {
        for name in row.column_names() {
            if seen.insert(name) {
                names.push(name);
            }
        }
    }

    let col_index: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    let mut table = Table::with_columns(source, names.iter().copied());

    for row in rows {
        let mut cells = vec![CellValue::Empty; table.column_count()];
        for (name, slot) in &row.columns {
            let Some(&idx) = col_index.get(name.as_str()) else {
                continue;
            };
            cells[idx] = match slot {
                Slot::Cell(cell) => cell.clone(),
                Slot::Block(block) if block.is_empty() => CellValue::Empty,
                Slot::Block(block) => CellValue::String(serde_json::to_string(block)?),
            };
        }
        table.push_row(cells);
    }

    Ok(table)
}
