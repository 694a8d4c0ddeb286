//! Pipeline configuration
//!
//! Column names, parser assignments and aggregation fields are passed to
//! every stage explicitly through [`PipelineConfig`]. The defaults describe
//! the field-survey panel export.

use crate::blocks::BlockKind;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A blob column and the parser that reads it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobColumn {
    pub column: String,
    pub kind: BlockKind,
}

impl BlobColumn {
    pub fn new(column: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            column: column.into(),
            kind,
        }
    }
}

/// A column rename applied before anything else touches the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

/// Everything the pipeline needs to know about the input and output layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Banner rows preceding the header in the input export
    pub skip_rows: usize,
    /// Column renames, applied first
    pub renames: Vec<Rename>,
    /// Columns removed right after renaming
    pub drop_input_columns: Vec<String>,
    /// Numeric entity id; replaced in place by the business entity key
    pub id_column: String,
    /// Residential/commercial discriminator
    pub category_column: String,
    pub visit_date_column: String,
    pub modify_date_column: String,
    /// Inserted after the id column, holding the visit record key
    pub visit_key_column: String,
    /// Category labels (case-insensitive) that mark a residential entity
    pub residential_labels: Vec<String>,
    pub blob_columns: Vec<BlobColumn>,
    /// Structured columns exploded into rows, in entry order
    pub flatten_columns: Vec<String>,
    /// URL-list columns expanded into numbered columns
    pub url_columns: Vec<String>,
    /// Columns removed from the flattened table
    pub drop_flattened_columns: Vec<String>,
    /// Numeric fields coalesced per entity
    pub numeric_fields: Vec<String>,
    /// Link field joined per entity
    pub link_field: String,
    /// Written for missing values in aggregated and reference files
    pub na_placeholder: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip_rows: 1,
            renames: vec![
                Rename::new("visitdate", "Visit Date"),
                Rename::new("Phase & Construction Status", "Phase And Construction Status"),
                Rename::new("Project", "Project Images"),
            ],
            drop_input_columns: strings(&["User"]),
            id_column: "XID".to_string(),
            category_column: "rescom".to_string(),
            visit_date_column: "Visit Date".to_string(),
            modify_date_column: "Modify Date".to_string(),
            visit_key_column: "ID".to_string(),
            residential_labels: strings(&["residential"]),
            blob_columns: vec![
                BlobColumn::new("Basic Details", BlockKind::BasicDetails),
                BlobColumn::new("Phase And Construction Status", BlockKind::PhaseStatus),
                BlobColumn::new("Brochure", BlockKind::Brochure),
                BlobColumn::new("Payment Plan", BlockKind::PaymentPlan),
                BlobColumn::new("Tower Details", BlockKind::TowerDetails),
                BlobColumn::new("OC/CC Certificate", BlockKind::Certificate),
                BlobColumn::new("Options Added", BlockKind::Options),
                BlobColumn::new("Prices", BlockKind::Prices),
                BlobColumn::new("Project Images", BlockKind::UrlList),
                BlobColumn::new("Locality.1", BlockKind::UrlList),
                BlobColumn::new("Raw Video", BlockKind::UrlList),
                BlobColumn::new("Video URL", BlockKind::UrlList),
            ],
            flatten_columns: strings(&[
                "Basic Details",
                "Phase And Construction Status",
                "Brochure",
                "Payment Plan",
                "Options Added",
                "OC/CC Certificate",
                "Prices",
            ]),
            url_columns: strings(&["Project Images", "Video URL"]),
            drop_flattened_columns: strings(&[
                "Tower Details",
                "Locality.1",
                "Raw Video",
                "Amenity (In Brochure)",
                "Amenities Added",
                "Options (In Brochure)",
                "Additional Details",
                "Additional Comments",
                "Info Not Available",
            ]),
            numeric_fields: strings(&["Total Area", "Open Area", "Floor Count", "Tower Count"]),
            link_field: "Brochure Link".to_string(),
            na_placeholder: "NA".to_string(),
        }
    }
}

impl Rename {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from JSON; absent keys take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the configuration to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Parser assigned to a column, if it is a blob column
    pub fn blob_kind(&self, column: &str) -> Option<BlockKind> {
        self.blob_columns
            .iter()
            .find(|b| b.column == column)
            .map(|b| b.kind)
    }

    /// Columns of the aggregated table: key, numeric fields, link field
    pub fn aggregate_columns(&self) -> Vec<String> {
        let mut columns = vec![self.id_column.clone()];
        columns.extend(self.numeric_fields.iter().cloned());
        columns.push(self.link_field.clone());
        columns
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
