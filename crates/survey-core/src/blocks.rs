//! Block parsers for the free-text blob columns of a survey export
//!
//! Each blob is a run of `key: value` lines. Most blobs repeat: a sentinel key
//! (usually `phaseIdentifier`) opens a new sub-block. Every parser shares one
//! algorithm and differs only in its [`BlockSpec`]: the sentinel, the lookup
//! table from source key to canonical [`Field`], and a value post-processor.

use crate::fields::{Field, Record};
use crate::phase::PhaseIdentifier;
use serde::{Deserialize, Serialize, Serializer};

/// Identity of a block parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    BasicDetails,
    PhaseStatus,
    Brochure,
    PaymentPlan,
    TowerDetails,
    Certificate,
    Options,
    Prices,
    UrlList,
}

impl BlockKind {
    /// All parser kinds
    pub const ALL: [BlockKind; 9] = [
        BlockKind::BasicDetails,
        BlockKind::PhaseStatus,
        BlockKind::Brochure,
        BlockKind::PaymentPlan,
        BlockKind::TowerDetails,
        BlockKind::Certificate,
        BlockKind::Options,
        BlockKind::Prices,
        BlockKind::UrlList,
    ];

    /// Configuration name (snake_case, as used in config files)
    pub fn name(self) -> &'static str {
        match self {
            BlockKind::BasicDetails => "basic_details",
            BlockKind::PhaseStatus => "phase_status",
            BlockKind::Brochure => "brochure",
            BlockKind::PaymentPlan => "payment_plan",
            BlockKind::TowerDetails => "tower_details",
            BlockKind::Certificate => "certificate",
            BlockKind::Options => "options",
            BlockKind::Prices => "prices",
            BlockKind::UrlList => "url_list",
        }
    }

    /// Look up a kind by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Parsing parameters for this kind
    pub fn spec(self) -> &'static BlockSpec {
        match self {
            BlockKind::BasicDetails => &BASIC_DETAILS,
            BlockKind::PhaseStatus => &PHASE_STATUS,
            BlockKind::Brochure => &BROCHURE,
            BlockKind::PaymentPlan => &PAYMENT_PLAN,
            BlockKind::TowerDetails => &TOWER_DETAILS,
            BlockKind::Certificate => &CERTIFICATE,
            BlockKind::Options => &OPTIONS,
            BlockKind::Prices => &PRICES,
            BlockKind::UrlList => &URL_LIST,
        }
    }
}

/// Per-value cleanup applied after trimming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFilter {
    Verbatim,
    /// Remove `[`, `]` and `'` left over from list literals
    StripListPunctuation,
    /// Cut a URL at its query string
    TruncateAtQuery,
}

impl ValueFilter {
    pub fn apply(self, value: &str) -> String {
        match self {
            ValueFilter::Verbatim => value.to_string(),
            ValueFilter::StripListPunctuation => {
                value.replace(['[', ']', '\''], "").trim().to_string()
            }
            ValueFilter::TruncateAtQuery => value
                .split_once('?')
                .map_or(value, |(head, _)| head)
                .trim()
                .to_string(),
        }
    }
}

/// What happens to a `phaseIdentifier` value after parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseHandling {
    /// Left as written
    Raw,
    /// Replaced by the decomposed phase name
    NameOnly,
    /// Decomposed into name and `RERA Number`
    NameAndRegistration,
}

/// Static parameters of one block parser
#[derive(Debug)]
pub struct BlockSpec {
    /// Key that opens a new repeating sub-block; `None` parses the cell as one block
    pub sentinel: Option<&'static str>,
    /// Source key to canonical field
    pub fields: &'static [(&'static str, Field)],
    pub filter: ValueFilter,
    /// Match source keys (and the sentinel) ignoring ASCII case
    pub case_insensitive_keys: bool,
    pub phase: PhaseHandling,
}

impl BlockSpec {
    /// Canonical field for a source key, if recognised
    pub fn lookup(&self, key: &str) -> Option<Field> {
        self.fields
            .iter()
            .find(|(source, _)| self.key_matches(source, key))
            .map(|(_, field)| *field)
    }

    fn key_matches(&self, expected: &str, key: &str) -> bool {
        if self.case_insensitive_keys {
            expected.eq_ignore_ascii_case(key)
        } else {
            expected == key
        }
    }

    fn opens_block(&self, line: &str) -> bool {
        let Some(sentinel) = self.sentinel else {
            return false;
        };
        match line.split_once(':') {
            Some((key, _)) => self.key_matches(sentinel, key.trim()),
            None => false,
        }
    }
}

static BASIC_DETAILS: BlockSpec = BlockSpec {
    sentinel: None,
    fields: &[
        ("projectdetails_sources", Field::ProjectDetailsSources),
        ("projectdetails_openarea", Field::OpenArea),
        ("projectdetails_unitcount", Field::UnitCount),
        ("projectdetails_totalarea", Field::TotalArea),
        ("projectdetails_greenarea", Field::GreenArea),
        ("projectdetails_floorcount", Field::FloorCount),
        ("projectdetails_towercount", Field::TowerCount),
        ("projectdetails_possessionstatus", Field::PossessionStatus),
        ("projectdetails_buildername", Field::BuilderName),
        ("projectdetails_projectname", Field::ProjectName),
        ("projectdetails_uspdetails", Field::UspDetails),
        ("projectdetails_address", Field::ProjectAddress),
        ("projectdetails_latitude", Field::Latitude),
        ("projectdetails_longitude", Field::Longitude),
        ("projectdetails_reraregno", Field::ReraRegNo),
        ("phaseIdentifier", Field::PhaseIdentifier),
        ("Sources", Field::Sources),
        ("RERAID", Field::ReraId),
        ("ConstructionStatus", Field::ConstructionStatus),
        ("CompletionDate", Field::CompletionDate),
        ("LaunchDate", Field::LaunchDate),
        ("SaleableArea", Field::SaleableArea),
    ],
    filter: ValueFilter::Verbatim,
    case_insensitive_keys: false,
    phase: PhaseHandling::Raw,
};

static PHASE_STATUS: BlockSpec = BlockSpec {
    sentinel: Some("phaseIdentifier"),
    fields: &[
        ("phaseIdentifier", Field::PhaseIdentifier),
        ("Sources", Field::Sources),
        ("RERAID", Field::ReraId),
        ("ConstructionStatus", Field::ConstructionStatus),
        ("CompletionDate", Field::CompletionDate),
        ("LaunchDate", Field::LaunchDate),
        ("SaleableArea", Field::SaleableArea),
    ],
    filter: ValueFilter::Verbatim,
    case_insensitive_keys: false,
    phase: PhaseHandling::NameAndRegistration,
};

static BROCHURE: BlockSpec = BlockSpec {
    sentinel: Some("phaseIdentifier"),
    fields: &[
        ("original", Field::BrochureLink),
        ("Source", Field::BrochureSource),
        ("phaseIdentifier", Field::PhaseIdentifier),
    ],
    filter: ValueFilter::StripListPunctuation,
    case_insensitive_keys: false,
    phase: PhaseHandling::NameOnly,
};

static PAYMENT_PLAN: BlockSpec = BlockSpec {
    sentinel: Some("phaseIdentifier"),
    fields: &[
        ("original", Field::PaymentDocumentLink),
        ("Source", Field::PaymentDocumentSource),
        ("paymentPlanType", Field::PaymentPlanType),
        ("phaseIdentifier", Field::PhaseIdentifier),
    ],
    filter: ValueFilter::TruncateAtQuery,
    case_insensitive_keys: false,
    phase: PhaseHandling::NameOnly,
};

static TOWER_DETAILS: BlockSpec = BlockSpec {
    sentinel: Some("phaseIdentifier"),
    fields: &[
        ("phaseIdentifier", Field::PhaseIdentifier),
        ("towerName", Field::TowerName),
        ("totalFloorNo", Field::TotalFloorNo),
        ("propertyType", Field::PropertyType),
        ("bhkConfig", Field::BhkConfig),
        ("NoofLifts", Field::LiftCount),
        ("minUnitsPerFloor", Field::MinUnitsPerFloor),
        ("maxUnitsPerFloor", Field::MaxUnitsPerFloor),
        ("unitEntranceFacing", Field::UnitEntranceFacing),
        ("unitViewFacing", Field::UnitViewFacing),
        ("towerOpenSide", Field::TowerOpenSide),
        ("source", Field::TowerDetailsSource),
    ],
    filter: ValueFilter::Verbatim,
    case_insensitive_keys: false,
    phase: PhaseHandling::NameOnly,
};

static CERTIFICATE: BlockSpec = BlockSpec {
    sentinel: Some("phaseIdentifier"),
    fields: &[
        ("original", Field::CertificateUrl),
        ("phaseIdentifier", Field::PhaseIdentifier),
        ("source", Field::CertificateSource),
        ("towerId", Field::TowerId),
    ],
    filter: ValueFilter::TruncateAtQuery,
    case_insensitive_keys: false,
    phase: PhaseHandling::NameOnly,
};

static OPTIONS: BlockSpec = BlockSpec {
    sentinel: Some("superArea"),
    fields: &[
        ("areaUnit", Field::OptionsAreaUnit),
        ("bhk", Field::OptionsBhk),
        ("builtupArea", Field::OptionsBuiltupArea),
        ("carpetArea", Field::OptionsCarpetArea),
        ("comments", Field::OptionsComments),
        ("isInvalid", Field::OptionsIsInvalid),
        ("isNew", Field::OptionsIsNew),
        ("original", Field::OptionsUrl),
        ("plotArea", Field::OptionsPlotArea),
        ("propertyType", Field::OptionsPropertyType),
        ("superArea", Field::OptionsSuperArea),
    ],
    filter: ValueFilter::Verbatim,
    case_insensitive_keys: false,
    phase: PhaseHandling::NameOnly,
};

static PRICES: BlockSpec = BlockSpec {
    sentinel: Some("phaseIdentifier"),
    fields: &[
        ("comments", Field::Comments),
        ("isallinclusive", Field::IsAllInclusive),
        ("islaunchprice", Field::IsLaunchPrice),
        ("original", Field::PriceDocumentUrl),
        ("phaseidentifier", Field::PhaseIdentifier),
        ("pricecategory", Field::PriceCategory),
        ("source", Field::PriceSource),
        ("typeofprices", Field::TypeOfPrices),
        ("visitoutcome", Field::VisitOutcome),
    ],
    filter: ValueFilter::TruncateAtQuery,
    case_insensitive_keys: true,
    phase: PhaseHandling::NameOnly,
};

static URL_LIST: BlockSpec = BlockSpec {
    sentinel: None,
    fields: &[],
    filter: ValueFilter::Verbatim,
    case_insensitive_keys: false,
    phase: PhaseHandling::Raw,
};

/// Towers sharing one decomposed phase name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TowerGroup {
    pub phase: String,
    pub towers: Vec<Record>,
}

/// Parsed form of one blob cell, tagged by the parser that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredBlock {
    BasicDetails(Record),
    Phases(Vec<Record>),
    Brochures(Vec<Record>),
    PaymentPlans(Vec<Record>),
    Towers(#[serde(serialize_with = "serialize_tower_groups")] Vec<TowerGroup>),
    Certificates(Vec<Record>),
    Options(Vec<Record>),
    Prices(Vec<Record>),
    Urls(Vec<String>),
}

impl StructuredBlock {
    /// Whether the block carries no values at all
    pub fn is_empty(&self) -> bool {
        match self {
            StructuredBlock::BasicDetails(record) => record.is_empty(),
            StructuredBlock::Phases(records)
            | StructuredBlock::Brochures(records)
            | StructuredBlock::PaymentPlans(records)
            | StructuredBlock::Certificates(records)
            | StructuredBlock::Options(records)
            | StructuredBlock::Prices(records) => records.is_empty(),
            StructuredBlock::Towers(groups) => groups.is_empty(),
            StructuredBlock::Urls(urls) => urls.is_empty(),
        }
    }

    /// Mappings this block contributes when flattened
    ///
    /// A single mapping contributes itself even when empty; tower records get
    /// their phase name back. URL lists contribute nothing.
    pub fn entries(&self) -> Vec<Record> {
        match self {
            StructuredBlock::BasicDetails(record) => vec![record.clone()],
            StructuredBlock::Phases(records)
            | StructuredBlock::Brochures(records)
            | StructuredBlock::PaymentPlans(records)
            | StructuredBlock::Certificates(records)
            | StructuredBlock::Options(records)
            | StructuredBlock::Prices(records) => records.clone(),
            StructuredBlock::Towers(groups) => groups
                .iter()
                .flat_map(|group| {
                    group.towers.iter().map(move |tower| {
                        let mut record = tower.clone();
                        record.insert(Field::PhaseIdentifier, group.phase.clone());
                        record
                    })
                })
                .collect(),
            StructuredBlock::Urls(_) => Vec::new(),
        }
    }

    /// URL list contents, if this is a URL list
    pub fn urls(&self) -> Option<&[String]> {
        match self {
            StructuredBlock::Urls(urls) => Some(urls),
            _ => None,
        }
    }
}

fn serialize_tower_groups<S: Serializer>(
    groups: &[TowerGroup],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(groups.iter().map(|g| (&g.phase, &g.towers)))
}

/// Values that stand for "nothing here"
pub fn is_null_like(value: &str) -> bool {
    matches!(value, "" | "null" | "[]")
}

/// Parse one blob cell with the parser for `kind`
pub fn parse_block(kind: BlockKind, text: &str) -> StructuredBlock {
    let spec = kind.spec();
    match kind {
        BlockKind::BasicDetails => StructuredBlock::BasicDetails(
            parse_records(text, spec).into_iter().next().unwrap_or_default(),
        ),
        BlockKind::PhaseStatus => StructuredBlock::Phases(parse_records(text, spec)),
        BlockKind::Brochure => StructuredBlock::Brochures(parse_records(text, spec)),
        BlockKind::PaymentPlan => StructuredBlock::PaymentPlans(parse_records(text, spec)),
        BlockKind::TowerDetails => {
            StructuredBlock::Towers(group_by_phase(parse_records(text, spec)))
        }
        BlockKind::Certificate => StructuredBlock::Certificates(parse_records(text, spec)),
        BlockKind::Options => StructuredBlock::Options(parse_records(text, spec)),
        BlockKind::Prices => StructuredBlock::Prices(parse_records(text, spec)),
        BlockKind::UrlList => StructuredBlock::Urls(parse_urls(text)),
    }
}

/// Split `text` into sub-blocks and parse each into a record
///
/// Empty sub-blocks are dropped, so the result holds only non-empty records.
pub fn parse_records(text: &str, spec: &BlockSpec) -> Vec<Record> {
    split_sub_blocks(text, spec)
        .into_iter()
        .map(|lines| parse_sub_block(&lines, spec))
        .filter(|record| !record.is_empty())
        .collect()
}

fn split_sub_blocks<'a>(text: &'a str, spec: &BlockSpec) -> Vec<Vec<&'a str>> {
    let mut blocks: Vec<Vec<&str>> = vec![Vec::new()];

    for line in text.trim().lines() {
        if spec.opens_block(line) && blocks.last().is_some_and(|b| !b.is_empty()) {
            blocks.push(Vec::new());
        }
        if let Some(current) = blocks.last_mut() {
            current.push(line);
        }
    }

    blocks
}

fn parse_sub_block(lines: &[&str], spec: &BlockSpec) -> Record {
    let mut record = Record::new();

    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Some(field) = spec.lookup(key.trim()) else {
            continue;
        };
        let value = spec.filter.apply(value.trim());
        if is_null_like(&value) {
            continue;
        }
        record.insert(field, value);
    }

    if let Some(raw) = record.get(&Field::PhaseIdentifier) {
        let phase = PhaseIdentifier::decompose(raw);
        match spec.phase {
            PhaseHandling::Raw => {}
            PhaseHandling::NameOnly => {
                record.insert(Field::PhaseIdentifier, phase.name);
            }
            PhaseHandling::NameAndRegistration => record.extend(phase.to_record()),
        }
    }

    record
}

/// Group tower records by phase name in first-seen order
///
/// Records without a phase identifier cannot be addressed by phase and are
/// discarded.
fn group_by_phase(records: Vec<Record>) -> Vec<TowerGroup> {
    let mut groups: Vec<TowerGroup> = Vec::new();

    for mut record in records {
        let Some(phase) = record.remove(&Field::PhaseIdentifier) else {
            continue;
        };
        match groups.iter_mut().find(|g| g.phase == phase) {
            Some(group) => group.towers.push(record),
            None => groups.push(TowerGroup {
                phase,
                towers: vec![record],
            }),
        }
    }

    groups
}

/// Every `label: url` line's value, in order
pub fn parse_urls(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !is_null_like(value))
        .collect()
}
