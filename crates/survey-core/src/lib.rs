//! survey-core: Core library for turning field-survey exports into reference deltas
//!
//! This library provides functionality to:
//! - Parse survey panel CSV exports into structured tables
//! - Key every visit by business entity and visit date
//! - Parse the free-text blob columns into typed structured blocks
//! - Flatten and aggregate visits into one row per entity
//! - Reconcile against a reference dataset and emit only new or changed rows

pub mod aggregate;
pub mod blocks;
pub mod config;
pub mod dates;
pub mod error;
pub mod fields;
pub mod flatten;
pub mod identifier;
pub mod parser;
pub mod phase;
pub mod pipeline;
pub mod processor;
pub mod reconcile;
pub mod store;
pub mod table;

pub use aggregate::aggregate;
pub use blocks::{parse_block, BlockKind, StructuredBlock, TowerGroup};
pub use config::{BlobColumn, PipelineConfig, Rename};
pub use error::{Error, Result};
pub use fields::{Field, Record};
pub use flatten::{drop_columns, expand_url_lists, flatten, to_table};
pub use identifier::{visit_key, EntityKind, KeyBuilder};
pub use parser::{parse_csv, parse_csv_str};
pub use phase::PhaseIdentifier;
pub use pipeline::{flatten_table, run, PipelineOutput};
pub use processor::{process_table, Slot, SurveyRow};
pub use reconcile::{reconcile, Delta, Reconciler};
pub use store::{incremental_path, load_reference, merge_reference, write_csv};
pub use table::{CellValue, Column, Row, Table};
