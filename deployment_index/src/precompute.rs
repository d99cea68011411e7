//! Batch computation of the metrics for every country and year.
//!
//! The tables produced here are what the dashboard would otherwise compute on
//! every interaction. Unlike [`crate::metrics::compute_country_metrics`], a
//! missing reference row does not fail the table: the row is skipped.

use log::{info, warn};

use crate::config::*;
use crate::mdi::compute_mdi_table;
use crate::metrics::{country_totals, sort_ratios};
use crate::primitives::safe_ratio;
use crate::store::RecordStore;

#[derive(PartialEq, Debug, Clone)]
pub struct ActivePersonnelRow {
    pub country: CountryCode,
    pub year: Year,
    pub total_deployed: u64,
    pub personnel_count: u64,
    pub percent: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct YearCountryRatio {
    pub year: Year,
    pub ratio: CountryRatio,
}

#[derive(PartialEq, Debug, Clone)]
pub struct OrganisationRow {
    pub country: CountryCode,
    pub year: Year,
    pub organisation: String,
    pub deployed: u64,
    pub percent_of_country_total: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PrecomputedTables {
    pub per_capita: Vec<YearCountryRatio>,
    pub active_personnel: Vec<ActivePersonnelRow>,
    pub organisations: Vec<OrganisationRow>,
    pub mdi: Vec<MdiYearOutcome>,
}

/// Computes all the tables, year by year in increasing order.
pub fn precompute_tables(store: &RecordStore, rules: &MetricsRules) -> PrecomputedTables {
    let all = CountrySelection::new(store.countries().iter().cloned());
    let mut res = PrecomputedTables {
        per_capita: Vec::new(),
        active_personnel: Vec::new(),
        organisations: Vec::new(),
        mdi: compute_mdi_table(store, rules),
    };

    for year in store.years().iter().cloned() {
        let rows: Vec<&DeploymentRecord> = store.operations_for(&all, year).collect();
        // Only the countries with operations this year.
        let totals: Vec<(CountryCode, u64)> = country_totals(&all, &rows)
            .into_iter()
            .filter(|(c, _)| rows.iter().any(|r| r.country == *c))
            .collect();
        info!(
            "precompute_tables: year {}: {} countries, {} rows",
            year,
            totals.len(),
            rows.len()
        );

        let mut per_capita: Vec<CountryRatio> = Vec::new();
        for (country, total) in totals.iter() {
            match store.population_of(country, year) {
                Some(p) => per_capita.push(CountryRatio {
                    country: country.clone(),
                    total_deployed: *total,
                    value: safe_ratio(*total as f64, p as f64, rules.per_capita_scaling),
                }),
                None => warn!(
                    "precompute_tables: no population for {} in {}, per capita skipped",
                    country, year
                ),
            }

            match store.active_duty_of(country, year) {
                Some(personnel_count) => res.active_personnel.push(ActivePersonnelRow {
                    country: country.clone(),
                    year,
                    total_deployed: *total,
                    personnel_count,
                    percent: safe_ratio(
                        *total as f64,
                        personnel_count as f64,
                        rules.active_personnel_scaling,
                    ),
                }),
                None => warn!(
                    "precompute_tables: no active duty personnel for {} in {}, skipped",
                    country, year
                ),
            }

            res.organisations
                .extend(organisation_rows(country, year, *total, &rows));
        }
        sort_ratios(&mut per_capita);
        res.per_capita
            .extend(per_capita.into_iter().map(|ratio| YearCountryRatio { year, ratio }));
    }
    res
}

/// Deployment of one country by organisation, largest first.
fn organisation_rows(
    country: &CountryCode,
    year: Year,
    country_total: u64,
    rows: &[&DeploymentRecord],
) -> Vec<OrganisationRow> {
    let mut orgs: Vec<(&str, u64)> = Vec::new();
    for r in rows.iter().filter(|r| r.country == *country) {
        match orgs.iter_mut().find(|(o, _)| *o == r.organisation) {
            Some((_, d)) => *d += r.deployed,
            None => orgs.push((r.organisation.as_str(), r.deployed)),
        }
    }
    orgs.sort_by(|(o1, d1), (o2, d2)| d2.cmp(d1).then_with(|| o1.cmp(o2)));
    orgs.into_iter()
        .map(|(organisation, deployed)| OrganisationRow {
            country: country.clone(),
            year,
            organisation: organisation.to_string(),
            deployed,
            percent_of_country_total: safe_ratio(deployed as f64, country_total as f64, 100.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn op(country: &str, year: Year, org: &str, deployed: u64) -> DeploymentRecord {
        DeploymentRecord {
            country: CountryCode::new(country),
            year,
            theatre: "Europe".to_string(),
            organisation: org.to_string(),
            mission_name: "m".to_string(),
            mission_type: MissionType::Operation,
            deployed,
            location: None,
        }
    }

    fn store() -> RecordStore {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut b = Builder::new();
        b.add_deployments(vec![
            op("NLD", 2020, "NATO", 300),
            op("NLD", 2020, "UN", 100),
            op("NLD", 2020, "EU", 100),
            op("NLD", 2020, "h", 1),
            op("NLD", 2020, "i", 1),
            op("NLD", 2020, "j", 1),
            op("NLD", 2020, "k", 1),
            op("BEL", 2020, "NATO", 120),
            op("BEL", 2021, "NATO", 140),
        ])
        .unwrap();
        for (c, y, p) in [("NLD", 2020, 17_000_000), ("BEL", 2020, 11_500_000)].iter() {
            b.add_population(PopulationRecord {
                country: CountryCode::new(c),
                year: *y,
                population: *p,
            })
            .unwrap();
        }
        b.add_active_duty(ActiveDutyRecord {
            country: CountryCode::new("BEL"),
            year: 2020,
            personnel_count: 24_000,
        })
        .unwrap();
        b.build()
    }

    #[test]
    fn missing_references_are_skipped() {
        let t = precompute_tables(&store(), &MetricsRules::DEFAULT_RULES);
        let pc: Vec<(Year, &str, f64)> = t
            .per_capita
            .iter()
            .map(|r| (r.year, r.ratio.country.as_str(), r.ratio.value))
            .collect();
        // BEL 2021 has no population.
        assert_eq!(pc, vec![(2020, "NLD", 3.0), (2020, "BEL", 1.0)]);
        assert_eq!(
            t.active_personnel,
            vec![ActivePersonnelRow {
                country: CountryCode::new("BEL"),
                year: 2020,
                total_deployed: 120,
                personnel_count: 24_000,
                percent: 0.5,
            }]
        );
        assert_eq!(t.mdi.len(), 2);
    }

    #[test]
    fn organisations_are_not_collapsed() {
        let t = precompute_tables(&store(), &MetricsRules::DEFAULT_RULES);
        let nld: Vec<(&str, u64, f64)> = t
            .organisations
            .iter()
            .filter(|r| r.country.as_str() == "NLD")
            .map(|r| (r.organisation.as_str(), r.deployed, r.percent_of_country_total))
            .collect();
        assert_eq!(nld.len(), 7);
        assert_eq!(nld[0], ("NATO", 300, 59.5));
        assert_eq!(nld[1], ("EU", 100, 19.8));
        assert_eq!(nld[2], ("UN", 100, 19.8));
        assert_eq!(nld[6], ("k", 1, 0.2));
        let bel: Vec<(Year, u64)> = t
            .organisations
            .iter()
            .filter(|r| r.country.as_str() == "BEL")
            .map(|r| (r.year, r.deployed))
            .collect();
        assert_eq!(bel, vec![(2020, 120), (2021, 140)]);
    }
}
