//! Series over the years of the dataset.

use log::debug;
use std::collections::HashMap;

use crate::config::*;
use crate::store::RecordStore;

/// The deployment of one country for every year of the dataset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountrySeries {
    pub country: CountryCode,
    pub points: Vec<(Year, u64)>,
}

/// The index of one country, for the years in which it could be computed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountryMdiSeries {
    pub country: CountryCode,
    pub points: Vec<(Year, u8)>,
}

/// Total deployment of each selected country by year.
///
/// Every year of the dataset is present, in increasing order. A country with
/// no operation in a year has a deployment of 0 for this year.
pub fn deployments_over_time(
    store: &RecordStore,
    selection: &CountrySelection,
) -> SelectionOutcome<Vec<CountrySeries>> {
    if selection.is_empty() {
        return SelectionOutcome::NoSelection;
    }
    let mut sums: HashMap<(&CountryCode, Year), u64> = HashMap::new();
    for r in store.operations().filter(|r| selection.contains(&r.country)) {
        *sums.entry((&r.country, r.year)).or_insert(0) += r.deployed;
    }
    let res = selection
        .iter()
        .map(|c| CountrySeries {
            country: c.clone(),
            points: store
                .years()
                .iter()
                .map(|y| (*y, sums.get(&(c, *y)).copied().unwrap_or(0)))
                .collect(),
        })
        .collect();
    SelectionOutcome::Computed(res)
}

/// Deployment of the whole selection into one theatre, by year.
pub fn theatre_over_time(
    store: &RecordStore,
    selection: &CountrySelection,
    theatre: &str,
) -> SelectionOutcome<Vec<(Year, u64)>> {
    if selection.is_empty() {
        return SelectionOutcome::NoSelection;
    }
    let mut sums: HashMap<Year, u64> = HashMap::new();
    for r in store
        .operations()
        .filter(|r| r.theatre == theatre && selection.contains(&r.country))
    {
        *sums.entry(r.year).or_insert(0) += r.deployed;
    }
    debug!(
        "theatre_over_time: {}: {} years with deployments",
        theatre,
        sums.len()
    );
    SelectionOutcome::Computed(
        store
            .years()
            .iter()
            .map(|y| (*y, sums.get(y).copied().unwrap_or(0)))
            .collect(),
    )
}

/// The index of each selected country over the years of a table.
///
/// Years that are not computable, or in which the country is not part of the
/// reference universe, are left out of the series.
pub fn mdi_series(table: &[MdiYearOutcome], selection: &CountrySelection) -> Vec<CountryMdiSeries> {
    selection
        .iter()
        .map(|c| CountryMdiSeries {
            country: c.clone(),
            points: table
                .iter()
                .filter_map(|o| {
                    o.scores()
                        .iter()
                        .find(|s| s.country == *c)
                        .map(|s| (o.year(), s.mdi))
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::mdi::compute_mdi_table;

    fn op(country: &str, year: Year, theatre: &str, deployed: u64) -> DeploymentRecord {
        DeploymentRecord {
            country: CountryCode::new(country),
            year,
            theatre: theatre.to_string(),
            organisation: "UN".to_string(),
            mission_name: "m".to_string(),
            mission_type: MissionType::Operation,
            deployed,
            location: None,
        }
    }

    fn store() -> RecordStore {
        let mut b = Builder::new();
        b.add_deployments(vec![
            op("FRA", 2019, "Sahel", 5000),
            op("FRA", 2021, "Sahel", 3000),
            op("FRA", 2021, "Levant", 600),
            op("ITA", 2019, "Levant", 1100),
            op("ITA", 2020, "Levant", 1000),
            op("ITA", 2021, "Levant", 900),
            op("ESP", 2021, "Levant", 600),
        ])
        .unwrap();
        b.add_deployment(DeploymentRecord {
            mission_type: MissionType::MilitaryPresence,
            ..op("FRA", 2020, "Sahel", 4000)
        })
        .unwrap();
        for (c, p) in [("FRA", 67_000_000), ("ITA", 59_000_000), ("ESP", 47_000_000)].iter() {
            for y in 2019..=2021 {
                b.add_population(PopulationRecord {
                    country: CountryCode::new(c),
                    year: y,
                    population: *p,
                })
                .unwrap();
            }
        }
        b.build()
    }

    #[test]
    fn missing_years_are_zero() {
        let s = store();
        let sel = CountrySelection::from_codes(&["FRA", "ITA"]);
        let series = deployments_over_time(&s, &sel).computed().unwrap();
        assert_eq!(
            series,
            vec![
                CountrySeries {
                    country: CountryCode::new("FRA"),
                    // Presence in 2020 does not count.
                    points: vec![(2019, 5000), (2020, 0), (2021, 3600)],
                },
                CountrySeries {
                    country: CountryCode::new("ITA"),
                    points: vec![(2019, 1100), (2020, 1000), (2021, 900)],
                },
            ]
        );
    }

    #[test]
    fn theatre_series() {
        let s = store();
        let sel = CountrySelection::from_codes(&["FRA", "ITA"]);
        assert_eq!(
            theatre_over_time(&s, &sel, "Levant").computed().unwrap(),
            vec![(2019, 1100), (2020, 1000), (2021, 1500)]
        );
        assert_eq!(
            theatre_over_time(&s, &sel, "Arctic").computed().unwrap(),
            vec![(2019, 0), (2020, 0), (2021, 0)]
        );
        assert!(theatre_over_time(&s, &CountrySelection::default(), "Levant").is_no_selection());
        assert!(deployments_over_time(&s, &CountrySelection::default()).is_no_selection());
    }

    #[test]
    fn index_series_skips_missing_years() {
        let s = store();
        let table = compute_mdi_table(&s, &MetricsRules::DEFAULT_RULES);
        let sel = CountrySelection::from_codes(&["ESP", "FRA"]);
        let series = mdi_series(&table, &sel);
        assert_eq!(series.len(), 2);
        // ESP only deploys in 2021.
        let esp_years: Vec<Year> = series[0].points.iter().map(|(y, _)| *y).collect();
        assert_eq!(esp_years, vec![2021]);
        // 2020 has a single country with operations: not computable.
        let fra_years: Vec<Year> = series[1].points.iter().map(|(y, _)| *y).collect();
        assert_eq!(fra_years, vec![2019, 2021]);
    }
}
