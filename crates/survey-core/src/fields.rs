//! Canonical output fields produced by the block parsers.
//!
//! Every value a block parser emits is keyed by a [`Field`]; a source key that
//! has no entry in its parser's lookup table simply cannot be represented.
//! Declaration order doubles as column order when records are flattened.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// One parsed sub-block: canonical field to trimmed value.
pub type Record = BTreeMap<Field, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    // Basic details
    ProjectDetailsSources,
    OpenArea,
    UnitCount,
    TotalArea,
    GreenArea,
    FloorCount,
    TowerCount,
    PossessionStatus,
    BuilderName,
    ProjectName,
    UspDetails,
    ProjectAddress,
    Latitude,
    Longitude,
    ReraRegNo,

    // Phase and construction status
    PhaseIdentifier,
    ReraNumber,
    Sources,
    ReraId,
    ConstructionStatus,
    CompletionDate,
    LaunchDate,
    SaleableArea,

    // Brochure
    BrochureLink,
    BrochureSource,

    // Payment plan
    PaymentDocumentLink,
    PaymentDocumentSource,
    PaymentPlanType,

    // Tower details
    TowerName,
    TotalFloorNo,
    PropertyType,
    BhkConfig,
    LiftCount,
    MinUnitsPerFloor,
    MaxUnitsPerFloor,
    UnitEntranceFacing,
    UnitViewFacing,
    TowerOpenSide,
    TowerDetailsSource,

    // OC/CC certificate
    CertificateUrl,
    CertificateSource,
    TowerId,

    // Options added
    OptionsAreaUnit,
    OptionsBhk,
    OptionsBuiltupArea,
    OptionsCarpetArea,
    OptionsComments,
    OptionsIsInvalid,
    OptionsIsNew,
    OptionsUrl,
    OptionsPlotArea,
    OptionsPropertyType,
    OptionsSuperArea,

    // Prices
    Comments,
    IsAllInclusive,
    IsLaunchPrice,
    PriceDocumentUrl,
    PriceCategory,
    PriceSource,
    TypeOfPrices,
    VisitOutcome,
}

impl Field {
    /// Output column name
    pub fn label(self) -> &'static str {
        match self {
            Field::ProjectDetailsSources => "Project Details Sources",
            Field::OpenArea => "Open Area",
            Field::UnitCount => "Unit Count",
            Field::TotalArea => "Total Area",
            Field::GreenArea => "Green Area",
            Field::FloorCount => "Floor Count",
            Field::TowerCount => "Tower Count",
            Field::PossessionStatus => "Possession Status",
            Field::BuilderName => "Builder Name",
            Field::ProjectName => "Project Name",
            Field::UspDetails => "USP Details",
            Field::ProjectAddress => "Project Address",
            Field::Latitude => "Latitude",
            Field::Longitude => "Longitude",
            Field::ReraRegNo => "RERA Reg No",
            Field::PhaseIdentifier => "Phase Identifier",
            Field::ReraNumber => "RERA Number",
            Field::Sources => "Sources",
            Field::ReraId => "RERAID",
            Field::ConstructionStatus => "Construction Status",
            Field::CompletionDate => "Completion Date",
            Field::LaunchDate => "Launch Date",
            Field::SaleableArea => "Saleable Area",
            Field::BrochureLink => "Brochure Link",
            Field::BrochureSource => "Brochure Source",
            Field::PaymentDocumentLink => "Payment Document Link",
            Field::PaymentDocumentSource => "Payment Document Source",
            Field::PaymentPlanType => "Payment Plan Type",
            Field::TowerName => "Tower Name",
            Field::TotalFloorNo => "Total Floor No",
            Field::PropertyType => "Property Type",
            Field::BhkConfig => "BHK Config",
            Field::LiftCount => "Lift Count",
            Field::MinUnitsPerFloor => "Minimum Unit Per Floor Count",
            Field::MaxUnitsPerFloor => "Maximum Unit Per Floor Count",
            Field::UnitEntranceFacing => "Unit Entrance Facing",
            Field::UnitViewFacing => "Unit View Facing",
            Field::TowerOpenSide => "Tower Open Side",
            Field::TowerDetailsSource => "Tower Details Source",
            Field::CertificateUrl => "Certificate URL",
            Field::CertificateSource => "Certificate Source",
            Field::TowerId => "Tower ID",
            Field::OptionsAreaUnit => "Options Area Unit",
            Field::OptionsBhk => "Options BHK",
            Field::OptionsBuiltupArea => "Options Builtup Area",
            Field::OptionsCarpetArea => "Options Carpet Area",
            Field::OptionsComments => "Options Comments",
            Field::OptionsIsInvalid => "Options Is Invalid",
            Field::OptionsIsNew => "Options Is New",
            Field::OptionsUrl => "Options URL",
            Field::OptionsPlotArea => "Options Plot Area",
            Field::OptionsPropertyType => "Options Property Type",
            Field::OptionsSuperArea => "Options Super Area",
            Field::Comments => "Comments",
            Field::IsAllInclusive => "Is All Inclusive",
            Field::IsLaunchPrice => "Is Launch Price",
            Field::PriceDocumentUrl => "Price Document URL",
            Field::PriceCategory => "Price Category",
            Field::PriceSource => "Price Source",
            Field::TypeOfPrices => "Type of Prices",
            Field::VisitOutcome => "Visit Outcome",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_with_labels() {
        let mut record = Record::new();
        record.insert(Field::BrochureLink, "https://x/b.pdf".to_string());
        record.insert(Field::PhaseIdentifier, "Tower A".to_string());

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Phase Identifier":"Tower A","Brochure Link":"https://x/b.pdf"}"#
        );
    }
}
