//! Business entity keys and visit record keys

use chrono::NaiveDate;
use std::fmt::Display;

/// Suffix used when a visit has neither a visit nor a modification date
pub const MISSING_DATE: &str = "MISSING_DATE";

/// Entity type derived from the category column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Residential,
    Commercial,
}

impl EntityKind {
    /// Key prefix
    pub fn prefix(self) -> char {
        match self {
            EntityKind::Residential => 'R',
            EntityKind::Commercial => 'C',
        }
    }
}

/// Derives entity keys; anything not recognised as residential is commercial.
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    residential_labels: Vec<String>,
}

impl Default for KeyBuilder {
    fn default() -> Self {
        Self::new(["residential"])
    }
}

impl KeyBuilder {
    pub fn new<I, S>(residential_labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            residential_labels: residential_labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self, category: &str) -> EntityKind {
        let category = category.trim();
        if self
            .residential_labels
            .iter()
            .any(|label| label.eq_ignore_ascii_case(category))
        {
            EntityKind::Residential
        } else {
            EntityKind::Commercial
        }
    }

    /// `R<id>` for residential categories, `C<id>` otherwise
    pub fn entity_key(&self, category: &str, id: impl Display) -> String {
        format!("{}{}", self.kind(category).prefix(), id)
    }
}

/// `<entity>_<YYYYMMDD>` from the visit date, else the modification date,
/// else `<entity>_MISSING_DATE`
pub fn visit_key(entity_key: &str, visit: Option<NaiveDate>, modified: Option<NaiveDate>) -> String {
    match visit.or(modified) {
        Some(date) => format!("{}_{}", entity_key, date.format("%Y%m%d")),
        None => format!("{}_{}", entity_key, MISSING_DATE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key() {
        let keys = KeyBuilder::default();
        assert_eq!(keys.entity_key("Residential", 42), "R42");
        assert_eq!(keys.entity_key("RESIDENTIAL", 42), "R42");
        assert_eq!(keys.entity_key(" residential ", 42), "R42");
        assert_eq!(keys.entity_key("commercial", 7), "C7");
        assert_eq!(keys.entity_key("Unknown", 7), "C7");
        assert_eq!(keys.entity_key("", 7), "C7");
    }

    #[test]
    fn test_custom_labels() {
        let keys = KeyBuilder::new(["Residential", "Res"]);
        assert_eq!(keys.entity_key("res", 1), "R1");
        assert_eq!(keys.kind("Mixed Use"), EntityKind::Commercial);
    }

    #[test]
    fn test_visit_key_fallback_chain() {
        let visit = NaiveDate::from_ymd_opt(2025, 10, 11);
        let modified = NaiveDate::from_ymd_opt(2025, 11, 2);

        assert_eq!(visit_key("R42", visit, modified), "R42_20251011");
        assert_eq!(visit_key("R42", None, modified), "R42_20251102");
        assert_eq!(visit_key("R42", None, None), "R42_MISSING_DATE");
    }
}
