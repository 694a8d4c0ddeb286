//! Row processor: keys every survey visit and parses its blob columns

use crate::blocks::{parse_block, StructuredBlock};
use crate::config::PipelineConfig;
use crate::dates::{cell_timestamp, MODIFY_DATE_FORMAT, VISIT_DATE_FORMAT};
use crate::error::{Error, Result};
use crate::identifier::{visit_key, KeyBuilder};
use crate::table::{CellValue, Table};
use chrono::NaiveDateTime;
use std::collections::HashSet;

/// A column value in a processed row
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Cell(CellValue),
    Block(StructuredBlock),
}

/// One survey visit after processing, columns in output order
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyRow {
    /// Business entity key (`R42`, `C7`)
    pub entity_key: String,
    /// Visit record key (`R42_20251011`)
    pub visit_key: String,
    pub columns: Vec<(String, Slot)>,
}

impl SurveyRow {
    pub fn new(entity_key: impl Into<String>, visit_key: impl Into<String>) -> Self {
        Self {
            entity_key: entity_key.into(),
            visit_key: visit_key.into(),
            columns: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn cell(&self, name: &str) -> Option<&CellValue> {
        match self.get(name)? {
            Slot::Cell(cell) => Some(cell),
            Slot::Block(_) => None,
        }
    }

    pub fn block(&self, name: &str) -> Option<&StructuredBlock> {
        match self.get(name)? {
            Slot::Block(block) => Some(block),
            Slot::Cell(_) => None,
        }
    }

    /// Overwrite a column in place, or append it
    pub fn set(&mut self, name: impl Into<String>, slot: Slot) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = slot,
            None => self.columns.push((name, slot)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Slot> {
        let idx = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(idx).1)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }
}

/// Process every row of a raw survey export
///
/// Produces one [`SurveyRow`] per input row: renames and input drops are
/// applied, the id column holds the entity key, the visit key column follows
/// it, date columns are normalised and blob columns are parsed. Fails only
/// when the id or category column is absent.
pub fn process_table(table: &Table, config: &PipelineConfig) -> Result<Vec<SurveyRow>> {
    let names: Vec<String> = table
        .columns
        .iter()
        .map(|c| {
            config
                .renames
                .iter()
                .find(|r| r.from == c.name)
                .map_or_else(|| c.name.clone(), |r| r.to.clone())
        })
        .collect();

    let position = |wanted: &str| names.iter().position(|n| n == wanted);

    let missing: Vec<String> = [&config.id_column, &config.category_column]
        .into_iter()
        .filter(|c| position(c.as_str()).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns {
            table: table.source_path.display().to_string(),
            columns: missing,
        });
    }
    let id_idx = position(config.id_column.as_str()).unwrap_or_default();
    let category_idx = position(config.category_column.as_str()).unwrap_or_default();
    let visit_idx = position(config.visit_date_column.as_str());
    let modify_idx = position(config.modify_date_column.as_str());

    for blob in &config.blob_columns {
        if position(blob.column.as_str()).is_none() {
            log::debug!("blob column '{}' not present in input", blob.column);
        }
    }

    let dropped: HashSet<&str> = config.drop_input_columns.iter().map(String::as_str).collect();
    let keys = KeyBuilder::new(config.residential_labels.iter().cloned());

    let mut rows = Vec::with_capacity(table.row_count());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let id = row.get(id_idx).cloned().unwrap_or(CellValue::Empty);
        if id.is_empty() {
            log::warn!("row {} has no {}", row_idx + 1, config.id_column);
        }
        let category = row
            .get(category_idx)
            .map(CellValue::to_string_value)
            .unwrap_or_default();

        let entity_key = keys.entity_key(&category, &id);
        let visited = visit_idx.and_then(|i| cell_timestamp(row.get(i)));
        let modified = modify_idx.and_then(|i| cell_timestamp(row.get(i)));
        let record_key = visit_key(
            &entity_key,
            visited.map(|t| t.date()),
            modified.map(|t| t.date()),
        );

        let mut out = SurveyRow::new(entity_key.clone(), record_key.clone());
        for (col_idx, name) in names.iter().enumerate() {
            if dropped.contains(name.as_str()) || *name == config.visit_key_column {
                continue;
            }
            let cell = row.get(col_idx).cloned().unwrap_or(CellValue::Empty);

            if col_idx == id_idx {
                out.set(name.clone(), Slot::Cell(CellValue::String(entity_key.clone())));
                out.set(
                    config.visit_key_column.clone(),
                    Slot::Cell(CellValue::String(record_key.clone())),
                );
            } else if Some(col_idx) == visit_idx {
                out.set(name.clone(), Slot::Cell(format_date(visited, VISIT_DATE_FORMAT)));
            } else if Some(col_idx) == modify_idx {
                out.set(name.clone(), Slot::Cell(format_date(modified, MODIFY_DATE_FORMAT)));
            } else if let Some(kind) = config.blob_kind(name) {
                let block = parse_block(kind, &cell.to_string_value());
                out.set(name.clone(), Slot::Block(block));
            } else {
                out.set(name.clone(), Slot::Cell(cell));
            }
        }
        rows.push(out);
    }

    log::info!(
        "processed {} rows from {}",
        rows.len(),
        table.source_path.display()
    );
    Ok(rows)
}

fn format_date(ts: Option<NaiveDateTime>, format: &str) -> CellValue {
    ts.map_or(CellValue::Empty, |t| CellValue::String(t.format(format).to_string()))
}
