//! The countries covered by the deployment dataset: display names, regions and
//! the preset groups of the country filter.

use crate::config::{CountryCode, CountrySelection};

/// (code, name, region), sorted by code.
const KNOWN_COUNTRIES: &[(&str, &str, &str)] = &[
    ("ALB", "Albania", "Southern Europe"),
    ("AUS", "Australia", "Australia and New Zealand"),
    ("BEL", "Belgium", "Western Europe"),
    ("BGR", "Bulgaria", "Eastern Europe"),
    ("CAN", "Canada", "Northern America"),
    ("CZE", "Czech Republic", "Eastern Europe"),
    ("DEU", "Germany", "Western Europe"),
    ("DNK", "Denmark", "Northern Europe"),
    ("ESP", "Spain", "Southern Europe"),
    ("EST", "Estonia", "Northern Europe"),
    ("FRA", "France", "Western Europe"),
    ("GBR", "United Kingdom", "Northern Europe"),
    ("GRC", "Greece", "Southern Europe"),
    ("HRV", "Croatia", "Southern Europe"),
    ("HUN", "Hungary", "Eastern Europe"),
    ("ITA", "Italy", "Southern Europe"),
    ("JPN", "Japan", "Eastern Asia"),
    ("KOR", "Republic of Korea", "Eastern Asia"),
    ("LTU", "Lithuania", "Northern Europe"),
    ("LUX", "Luxembourg", "Western Europe"),
    ("LVA", "Latvia", "Northern Europe"),
    ("MKD", "Republic of Macedonia", "Southern Europe"),
    ("MNE", "Montenegro", "Southern Europe"),
    ("NLD", "Netherlands", "Western Europe"),
    ("NOR", "Norway", "Northern Europe"),
    ("NZL", "New Zealand", "Australia and New Zealand"),
    ("POL", "Poland", "Eastern Europe"),
    ("PRT", "Portugal", "Southern Europe"),
    ("ROU", "Romania", "Eastern Europe"),
    ("SVK", "Slovakia", "Eastern Europe"),
    ("SVN", "Slovenia", "Southern Europe"),
    ("TUR", "Turkey", "Western Asia"),
    ("USA", "United States", "Northern America"),
];

const NATO_MEMBERS: &[&str] = &[
    "ALB", "BEL", "BGR", "CAN", "HRV", "CZE", "DNK", "EST", "FRA", "DEU", "GRC", "HUN", "ISL",
    "ITA", "LVA", "LTU", "LUX", "MNE", "NLD", "MKD", "NOR", "POL", "PRT", "ROU", "SVK", "SVN",
    "ESP", "TUR", "GBR", "USA",
];

/// European countries, in the broad sense used by the "EU" button.
const EUROPEAN_COUNTRIES: &[&str] = &[
    "UKR", "FRA", "ESP", "SWE", "DEU", "FIN", "NOR", "POL", "ITA", "GBR", "ROU", "BLR", "GRC",
    "BGR", "ISL", "PRT", "CZE", "DNK", "HUN", "SRB", "AUT", "IRL", "LTU", "LVA", "HRV", "BIH",
    "SVK", "EST", "NLD", "CHE", "MDA", "BEL", "ALB", "MKD", "SVN", "MNE", "CYP", "LUX", "FRO",
    "AND", "MLT", "LIE", "GGY", "SMR", "GIB", "MCO", "VAT",
];

fn lookup(code: &CountryCode) -> Option<&'static (&'static str, &'static str, &'static str)> {
    KNOWN_COUNTRIES
        .binary_search_by(|(c, _, _)| (*c).cmp(code.as_str()))
        .ok()
        .map(|idx| &KNOWN_COUNTRIES[idx])
}

pub fn country_name(code: &CountryCode) -> Option<&'static str> {
    lookup(code).map(|(_, name, _)| *name)
}

pub fn country_region(code: &CountryCode) -> Option<&'static str> {
    lookup(code).map(|(_, _, region)| *region)
}

/// The name of a country, or its code if it is not known.
pub fn display_name(code: &CountryCode) -> String {
    country_name(code)
        .map(|n| n.to_string())
        .unwrap_or_else(|| code.to_string())
}

pub fn is_known(code: &CountryCode) -> bool {
    lookup(code).is_some()
}

/// All the known countries, sorted by code.
pub fn known_countries() -> Vec<CountryCode> {
    KNOWN_COUNTRIES
        .iter()
        .map(|(c, _, _)| CountryCode::new(c))
        .collect()
}

/// The preset selections of the country filter.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum CountryGroup {
    All,
    Nato,
    Eu,
}

impl CountryGroup {
    pub fn parse(name: &str) -> Option<CountryGroup> {
        match name.trim().to_lowercase().as_str() {
            "all" => Some(CountryGroup::All),
            "nato" => Some(CountryGroup::Nato),
            "eu" => Some(CountryGroup::Eu),
            _ => None,
        }
    }

    /// The known countries of the group, sorted by code.
    pub fn selection(&self) -> CountrySelection {
        let members: Option<&[&str]> = match self {
            CountryGroup::All => None,
            CountryGroup::Nato => Some(NATO_MEMBERS),
            CountryGroup::Eu => Some(EUROPEAN_COUNTRIES),
        };
        CountrySelection::new(
            KNOWN_COUNTRIES
                .iter()
                .filter(|(c, _, _)| members.map(|m| m.contains(c)).unwrap_or(true))
                .map(|(c, _, _)| CountryCode::new(c)),
        )
    }
}
