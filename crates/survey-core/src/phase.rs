//! Decomposition of composite phase identifiers such as `Tower A_1_UC_REG123`.

use crate::fields::{Field, Record};
use once_cell::sync::Lazy;
use regex::Regex;

/// Phase name: everything before `_<n>_UC_` or `_<n>_RTM_`.
static PHASE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.+?)_\d+_(?:UC_|RTM_)").expect("phase name pattern"));

/// Registration code: the run after the first `RTM_` or `UC_`.
static REGISTRATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:RTM_|UC_)([A-Za-z0-9/_-]+)").expect("registration pattern"));

/// A phase identifier split into its readable name and optional RERA code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhaseIdentifier {
    /// Human-readable phase name; empty when the pattern is absent
    pub name: String,
    /// Registration code, absent when missing or the literal `null`
    pub registration: Option<String>,
}

impl PhaseIdentifier {
    /// Split a raw identifier. The two extractions are independent.
    pub fn decompose(raw: &str) -> Self {
        let name = PHASE_NAME
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let registration = REGISTRATION
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|code| !code.is_empty() && !code.eq_ignore_ascii_case("null"));

        Self { name, registration }
    }

    /// The decomposed mapping: `Phase Identifier` always, `RERA Number` when valid.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(Field::PhaseIdentifier, self.name.clone());
        if let Some(code) = &self.registration {
            record.insert(Field::ReraNumber, code.clone());
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_construction_with_code() {
        let phase = PhaseIdentifier::decompose("Tower A_1_UC_REG123");
        assert_eq!(phase.name, "Tower A");
        assert_eq!(phase.registration.as_deref(), Some("REG123"));

        let record = phase.to_record();
        assert_eq!(record.get(&Field::PhaseIdentifier).unwrap(), "Tower A");
        assert_eq!(record.get(&Field::ReraNumber).unwrap(), "REG123");
    }

    #[test]
    fn test_null_code_is_dropped() {
        let record = PhaseIdentifier::decompose("Tower A_1_UC_null").to_record();
        assert_eq!(record.len(), 1);
        assert_eq!(record.get(&Field::PhaseIdentifier).unwrap(), "Tower A");
        assert!(!record.contains_key(&Field::ReraNumber));

        let phase = PhaseIdentifier::decompose("Phase 2_3_RTM_NULL");
        assert_eq!(phase.name, "Phase 2");
        assert_eq!(phase.registration, None);
    }

    #[test]
    fn test_ready_to_move_with_slashes() {
        let phase = PhaseIdentifier::decompose("Wing B _12_RTM_P52100/2021-01_x");
        assert_eq!(phase.name, "Wing B");
        assert_eq!(phase.registration.as_deref(), Some("P52100/2021-01_x"));
    }

    #[test]
    fn test_first_match_only() {
        let phase = PhaseIdentifier::decompose("A_1_UC_B_2_UC_C");
        assert_eq!(phase.name, "A");
        assert_eq!(phase.registration.as_deref(), Some("B_2_UC_C"));
    }

    #[test]
    fn test_no_pattern() {
        let phase = PhaseIdentifier::decompose("Just a name");
        assert_eq!(phase.name, "");
        assert_eq!(phase.registration, None);

        // Code extraction is independent of the name pattern
        let phase = PhaseIdentifier::decompose("UC_ABC");
        assert_eq!(phase.name, "");
        assert_eq!(phase.registration.as_deref(), Some("ABC"));
    }

    #[test]
    fn test_nameless_identifier_still_emits_phase() {
        let record = PhaseIdentifier::decompose("12").to_record();
        assert_eq!(record.len(), 1);
        assert_eq!(record.get(&Field::PhaseIdentifier).unwrap(), "");
    }
}
