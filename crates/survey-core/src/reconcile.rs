//! Reconciliation of the current aggregated dataset against the reference
//!
//! Rows are joined on the entity key. A key missing from the reference is
//! new; a key present in both is changed when any shared column differs
//! after NA normalisation. Unchanged rows are not emitted.

use crate::error::{Error, Result};
use crate::table::{CellValue, Row, Table};
use std::collections::{BTreeSet, HashMap, HashSet};

/// New and changed rows of the current dataset
#[derive(Debug, Clone)]
pub struct Delta {
    pub new_keys: Vec<String>,
    pub changed_keys: Vec<String>,
    /// New rows followed by changed rows, with the current dataset's columns
    pub table: Table,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.table.rows.is_empty()
    }
}

/// Diff settings: join key and the stringified-missing placeholder
#[derive(Debug, Clone)]
pub struct Reconciler {
    key: String,
    placeholder: String,
}

impl Reconciler {
    pub fn new(key: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            placeholder: placeholder.into(),
        }
    }

    /// Normalised comparison value; `None` for anything NA-like
    ///
    /// Empty cells, blank text, `n/a`, `na` and the placeholder (all
    /// case-insensitive) are missing. Numbers compare by value.
    pub fn normalize(&self, cell: &CellValue) -> Option<String> {
        match cell {
            CellValue::Empty => None,
            CellValue::Integer(i) => Some((*i as f64).to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::String(s) => {
                let s = s.trim();
                let missing = s.is_empty()
                    || s.eq_ignore_ascii_case("n/a")
                    || s.eq_ignore_ascii_case("na")
                    || s.eq_ignore_ascii_case(&self.placeholder);
                (!missing).then(|| s.to_string())
            }
        }
    }

    /// Diff `current` against `reference`, then drop uniformly missing rows
    pub fn reconcile(&self, reference: &Table, current: &Table) -> Result<Delta> {
        let cur_key = current.column_index(&self.key).ok_or_else(|| {
            Error::missing_column(current.source_path.display().to_string(), &self.key)
        })?;

        // An empty reference (first run) has no columns at all
        let ref_key = if reference.columns.is_empty() {
            None
        } else {
            Some(reference.column_index(&self.key).ok_or_else(|| {
                Error::missing_column(reference.source_path.display().to_string(), &self.key)
            })?)
        };

        let common: Vec<(usize, usize)> = {
            let names: BTreeSet<&str> = current
                .columns
                .iter()
                .map(|c| c.name.as_str())
                .filter(|n| reference.find_column(n).is_some())
                .collect();
            names
                .into_iter()
                .filter_map(|n| Some((reference.column_index(n)?, current.column_index(n)?)))
                .collect()
        };

        // First reference row per key wins
        let mut reference_rows: HashMap<String, &Row> = HashMap::new();
        if let Some(ref_key) = ref_key {
            for row in &reference.rows {
                let key = row.get(ref_key).map(CellValue::to_string_value).unwrap_or_default();
                reference_rows.entry(key).or_insert(row);
            }
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut new_rows = Vec::new();
        let mut changed_rows = Vec::new();
        let mut new_keys = Vec::new();
        let mut changed_keys = Vec::new();

        for row in &current.rows {
            let key = row.get(cur_key).map(CellValue::to_string_value).unwrap_or_default();
            if !seen.insert(key.clone()) {
                continue;
            }

            match reference_rows.get(&key) {
                None => {
                    new_rows.push(row.clone());
                    new_keys.push(key);
                }
                Some(old) => {
                    let differs = common.iter().any(|&(ref_idx, cur_idx)| {
                        let old_val = old.get(ref_idx).and_then(|c| self.normalize(c));
                        let new_val = row.get(cur_idx).and_then(|c| self.normalize(c));
                        old_val != new_val
                    });
                    if differs {
                        changed_rows.push(row.clone());
                        changed_keys.push(key);
                    }
                }
            }
        }

        let mut table = Table::with_columns(
            current.source_path.clone(),
            current.columns.iter().map(|c| c.name.clone()),
        );
        table.rows = new_rows;
        table.rows.append(&mut changed_rows);

        let table = self.drop_placeholder_rows(table, cur_key);
        let kept: HashSet<String> = table
            .rows
            .iter()
            .filter_map(|r| r.get(cur_key).map(CellValue::to_string_value))
            .collect();
        new_keys.retain(|k| kept.contains(k));
        changed_keys.retain(|k| kept.contains(k));

        log::info!(
            "reconciled {} current rows: {} new, {} changed",
            current.row_count(),
            new_keys.len(),
            changed_keys.len()
        );

        Ok(Delta {
            new_keys,
            changed_keys,
            table,
        })
    }

    /// Drop rows whose every non-key column is missing or the placeholder
    fn drop_placeholder_rows(&self, mut table: Table, key_idx: usize) -> Table {
        if table.column_count() < 2 {
            return table;
        }
        let before = table.row_count();
        table.rows.retain(|row| {
            !row.cells
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != key_idx)
                .all(|(_, cell)| match cell {
                    CellValue::Empty => true,
                    other => other.to_string_value() == self.placeholder,
                })
        });
        let dropped = before - table.row_count();
        if dropped > 0 {
            log::debug!("dropped {} rows holding only '{}'", dropped, self.placeholder);
        }
        table
    }
}

/// Reconcile with the default `NA` placeholder
pub fn reconcile(reference: &Table, current: &Table, key: &str) -> Result<Delta> {
    Reconciler::new(key, "NA").reconcile(reference, current)
}
