// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

pub type Year = i32;

/// An ISO 3166 alpha-3 country code, stored upper-case.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(code: &str) -> CountryCode {
        CountryCode(code.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CountryCode {
    fn from(code: &str) -> CountryCode {
        CountryCode::new(code)
    }
}

/// What a deployment row describes.
///
/// Only operations feed the derived metrics and the index. Military presence
/// rows (permanent stationing abroad) are kept for the map layer.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum MissionType {
    Operation,
    MilitaryPresence,
}

impl MissionType {
    /// Parses the labels used in the deployment workbook.
    pub fn parse(label: &str) -> Option<MissionType> {
        match label.trim() {
            "Operation" => Some(MissionType::Operation),
            "MilitaryPresence" => Some(MissionType::MilitaryPresence),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionType::Operation => "Operation",
            MissionType::MilitaryPresence => "MilitaryPresence",
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct DeploymentRecord {
    pub country: CountryCode,
    pub year: Year,
    pub theatre: String,
    pub organisation: String,
    pub mission_name: String,
    pub mission_type: MissionType,
    pub deployed: u64,
    /// Position of the map marker, when the source provides one.
    pub location: Option<(f64, f64)>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PopulationRecord {
    pub country: CountryCode,
    pub year: Year,
    pub population: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ActiveDutyRecord {
    pub country: CountryCode,
    pub year: Year,
    pub personnel_count: u64,
}

/// The countries currently chosen by the user.
///
/// Ordered by first occurrence, without duplicates. An empty selection is valid
/// and means that there is nothing to display.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CountrySelection {
    countries: Vec<CountryCode>,
}

impl CountrySelection {
    pub fn new<I: IntoIterator<Item = CountryCode>>(codes: I) -> CountrySelection {
        let mut countries: Vec<CountryCode> = Vec::new();
        for code in codes {
            if !countries.contains(&code) {
                countries.push(code);
            }
        }
        CountrySelection { countries }
    }

    pub fn from_codes(codes: &[&str]) -> CountrySelection {
        CountrySelection::new(codes.iter().map(|c| CountryCode::new(c)))
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn contains(&self, country: &CountryCode) -> bool {
        self.countries.contains(country)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CountryCode> {
        self.countries.iter()
    }

    pub fn as_slice(&self) -> &[CountryCode] {
        &self.countries
    }
}

// ******** Output data structures *********

/// The result of a computation driven by a country selection.
#[derive(PartialEq, Debug, Clone)]
pub enum SelectionOutcome<T> {
    /// Nothing was selected: the caller should render an empty or prompt state.
    NoSelection,
    Computed(T),
}

impl<T> SelectionOutcome<T> {
    pub fn computed(self) -> Option<T> {
        match self {
            SelectionOutcome::NoSelection => None,
            SelectionOutcome::Computed(x) => Some(x),
        }
    }

    pub fn is_no_selection(&self) -> bool {
        matches!(self, SelectionOutcome::NoSelection)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> SelectionOutcome<U> {
        match self {
            SelectionOutcome::NoSelection => SelectionOutcome::NoSelection,
            SelectionOutcome::Computed(x) => SelectionOutcome::Computed(f(x)),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct CountryRatio {
    pub country: CountryCode,
    pub total_deployed: u64,
    pub value: f64,
}

/// Ratios for every selected country, sorted by value in decreasing order.
///
/// `condensed` is set when there are more rows than the display keeps; the full
/// list is always returned.
#[derive(PartialEq, Debug, Clone)]
pub struct RankedRatios {
    pub rows: Vec<CountryRatio>,
    pub condensed: bool,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TheatreShare {
    pub theatre: String,
    pub deployed: u64,
    /// Percentage of the total deployment, one decimal.
    pub share: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct OrganisationShare {
    pub organisation: String,
    pub deployed: u64,
    pub percent_of_total: f64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MissionShare {
    pub organisation: String,
    pub mission_name: String,
    pub deployed: u64,
}

/// Primary axis of the organisation breakdown. Only the orientation differs,
/// the numbers are the same.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BreakdownAxis {
    Country,
    Organisation,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CountryOrganisationRow {
    pub country: CountryCode,
    pub organisation: String,
    pub deployed: u64,
    pub percent_of_country_total: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CountryOrganisationTable {
    pub rows: Vec<CountryOrganisationRow>,
    /// Countries by total deployment, in decreasing order.
    pub country_order: Vec<CountryCode>,
    pub condensed: bool,
}

/// Everything the dashboard shows for one (countries, year) selection.
#[derive(PartialEq, Debug, Clone)]
pub struct DerivedCountryMetrics {
    pub year: Year,
    pub total_deployed: u64,
    pub per_capita: Result<RankedRatios, MetricsError>,
    pub percent_active_personnel: Result<RankedRatios, MetricsError>,
    pub dominant_theatre: Option<TheatreShare>,
    pub dominant_theatre_by_country: Vec<(CountryCode, Option<TheatreShare>)>,
    pub organisation_breakdown: Vec<OrganisationShare>,
    pub mission_breakdown: Vec<MissionShare>,
    pub breakdown_axis: BreakdownAxis,
    pub country_organisations: CountryOrganisationTable,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MdiScore {
    pub country: CountryCode,
    pub year: Year,
    pub mdi: u8,
}

/// The intermediate values of the index for one country.
#[derive(PartialEq, Debug, Clone)]
pub struct MdiComponent {
    pub country: CountryCode,
    pub total_deployed: u64,
    pub population: u64,
    pub per_capita: f64,
    pub z_total: f64,
    pub z_per_capita: f64,
    pub combined: f64,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum NotComputableReason {
    /// The reference universe needs at least two countries.
    TooFewCountries { found: usize },
    ZeroVarianceTotals,
    ZeroVariancePerCapita,
    /// All the combined scores are equal: there is nothing to rescale.
    ZeroWidthCombined,
}

impl Display for NotComputableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotComputableReason::TooFewCountries { found } => {
                write!(f, "at least 2 countries are required, found {}", found)
            }
            NotComputableReason::ZeroVarianceTotals => {
                write!(f, "all countries have the same total deployment")
            }
            NotComputableReason::ZeroVariancePerCapita => {
                write!(f, "all countries have the same deployment per capita")
            }
            NotComputableReason::ZeroWidthCombined => {
                write!(f, "all countries have the same combined score")
            }
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum MdiYearOutcome {
    Computed { year: Year, scores: Vec<MdiScore> },
    NotComputable { year: Year, reason: NotComputableReason },
}

impl MdiYearOutcome {
    pub fn year(&self) -> Year {
        match self {
            MdiYearOutcome::Computed { year, .. } => *year,
            MdiYearOutcome::NotComputable { year, .. } => *year,
        }
    }

    pub fn scores(&self) -> &[MdiScore] {
        match self {
            MdiYearOutcome::Computed { scores, .. } => scores,
            MdiYearOutcome::NotComputable { .. } => &[],
        }
    }
}

/// The reference datasets looked up by (country, year).
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ReferenceDataset {
    Population,
    ActiveDuty,
}

impl Display for ReferenceDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceDataset::Population => write!(f, "population"),
            ReferenceDataset::ActiveDuty => write!(f, "active duty personnel"),
        }
    }
}

/// Errors that prevent a metric from being computed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MetricsError {
    /// Standardizing or rescaling a distribution without any spread.
    DivisionByZero,
    /// The source datasets disagree: a selected country has no reference row.
    MissingReference {
        dataset: ReferenceDataset,
        country: CountryCode,
        year: Year,
    },
    DuplicateReference {
        dataset: ReferenceDataset,
        country: CountryCode,
        year: Year,
    },
    YearOutOfRange {
        year: Year,
    },
    /// A deployment record with a blank country, theatre, organisation or
    /// mission name.
    IncompleteDeployment {
        field: &'static str,
        country: CountryCode,
        year: Year,
    },
}

impl Error for MetricsError {}

impl Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::DivisionByZero => write!(f, "division by zero"),
            MetricsError::MissingReference {
                dataset,
                country,
                year,
            } => write!(f, "no {} record for {} in {}", dataset, country, year),
            MetricsError::DuplicateReference {
                dataset,
                country,
                year,
            } => write!(
                f,
                "more than one {} record for {} in {}",
                dataset, country, year
            ),
            MetricsError::YearOutOfRange { year } => {
                write!(f, "year {} is not covered by the deployment data", year)
            }
            MetricsError::IncompleteDeployment {
                field,
                country,
                year,
            } => write!(
                f,
                "deployment record of {:?} in {} has no {}",
                country.as_str(),
                year,
                field
            ),
        }
    }
}

// ********* Configuration **********

/// How the two standardized quantities are combined into one score.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum ZScoreCombination {
    /// Equal-weight sum. This is the canonical index.
    Sum,
    /// Weighted average of the two z-scores. Weights are normalized by their sum.
    Weighted { total: f64, per_capita: f64 },
}

#[derive(PartialEq, Debug, Clone)]
pub struct MetricsRules {
    /// Number of entries kept before collapsing into "Other" (or flagging a
    /// ranking as condensed).
    pub top_n: usize,
    /// Deployment per capita is expressed per this many inhabitants.
    pub per_capita_scaling: f64,
    pub active_personnel_scaling: f64,
    pub mdi_min: f64,
    pub mdi_max: f64,
    pub combination: ZScoreCombination,
}

impl MetricsRules {
    pub const DEFAULT_RULES: MetricsRules = MetricsRules {
        top_n: 5,
        per_capita_scaling: 100_000.0,
        active_personnel_scaling: 100.0,
        mdi_min: 0.0,
        mdi_max: 100.0,
        combination: ZScoreCombination::Sum,
    };
}

impl Default for MetricsRules {
    fn default() -> Self {
        MetricsRules::DEFAULT_RULES
    }
}
