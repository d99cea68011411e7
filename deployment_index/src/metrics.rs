use log::{debug, info};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::*;
use crate::primitives::{safe_ratio, top_n_with_other, OTHER_LABEL};
use crate::store::RecordStore;

/// Computes all the derived metrics for a selection of countries and a year.
///
/// Arguments:
/// * `store` the reference data
/// * `selection` the selected countries. If it is empty, nothing is computed and
/// [`SelectionOutcome::NoSelection`] is returned.
/// * `year` a year of the deployment dataset
///
/// Per-capita and active personnel ratios that cannot be computed because a
/// reference row is missing are reported in their own field; the other
/// metrics are still computed.
pub fn compute_country_metrics(
    store: &RecordStore,
    selection: &CountrySelection,
    year: Year,
    rules: &MetricsRules,
) -> Result<SelectionOutcome<DerivedCountryMetrics>, MetricsError> {
    if selection.is_empty() {
        info!("compute_country_metrics: empty selection, nothing to compute");
        return Ok(SelectionOutcome::NoSelection);
    }
    let year = store.select_year(year)?;
    let rows: Vec<&DeploymentRecord> = store.operations_for(selection, year).collect();
    info!(
        "compute_country_metrics: year {}: {} countries, {} deployment rows",
        year,
        selection.len(),
        rows.len()
    );

    let country_totals = country_totals(selection, &rows);
    let total_deployed: u64 = country_totals.iter().map(|(_, t)| *t).sum();

    let per_capita = ranked_ratios(
        &country_totals,
        |c| store.require_population(c, year),
        rules.per_capita_scaling,
        rules.top_n,
    );
    debug!("compute_country_metrics: per capita: {:?}", per_capita);
    let percent_active_personnel = ranked_ratios(
        &country_totals,
        |c| store.require_active_duty(c, year),
        rules.active_personnel_scaling,
        rules.top_n,
    );
    debug!(
        "compute_country_metrics: active personnel: {:?}",
        percent_active_personnel
    );

    let dominant_theatre_by_country = selection
        .iter()
        .map(|c| {
            let country_rows: Vec<&DeploymentRecord> =
                rows.iter().filter(|r| r.country == *c).cloned().collect();
            (c.clone(), dominant_theatre(&country_rows))
        })
        .collect();

    let breakdown_axis = if selection.len() == 1 {
        BreakdownAxis::Organisation
    } else {
        BreakdownAxis::Country
    };

    Ok(SelectionOutcome::Computed(DerivedCountryMetrics {
        year,
        total_deployed,
        per_capita,
        percent_active_personnel,
        dominant_theatre: dominant_theatre(&rows),
        dominant_theatre_by_country,
        organisation_breakdown: organisation_breakdown(&rows, rules.top_n),
        mission_breakdown: mission_breakdown(&rows),
        breakdown_axis,
        country_organisations: country_organisations(&country_totals, &rows, rules.top_n),
    }))
}

/// Total deployment of each selected country, in selection order.
/// Countries without rows have a total of 0.
pub(crate) fn country_totals(
    selection: &CountrySelection,
    rows: &[&DeploymentRecord],
) -> Vec<(CountryCode, u64)> {
    let mut totals: HashMap<&CountryCode, u64> = HashMap::new();
    for r in rows.iter() {
        *totals.entry(&r.country).or_insert(0) += r.deployed;
    }
    selection
        .iter()
        .map(|c| (c.clone(), totals.get(c).copied().unwrap_or(0)))
        .collect()
}

fn ranked_ratios<F>(
    country_totals: &[(CountryCode, u64)],
    denominator: F,
    scaling: f64,
    top_n: usize,
) -> Result<RankedRatios, MetricsError>
where
    F: Fn(&CountryCode) -> Result<u64, MetricsError>,
{
    let mut rows: Vec<CountryRatio> = Vec::new();
    for (country, total) in country_totals.iter() {
        let d = denominator(country)?;
        rows.push(CountryRatio {
            country: country.clone(),
            total_deployed: *total,
            value: safe_ratio(*total as f64, d as f64, scaling),
        });
    }
    sort_ratios(&mut rows);
    let condensed = rows.len() > top_n;
    Ok(RankedRatios { rows, condensed })
}

/// Decreasing value, ties by country code.
pub(crate) fn sort_ratios(rows: &mut [CountryRatio]) {
    rows.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.country.cmp(&b.country))
    });
}

/// Sums by key, then orders by decreasing total and increasing key.
fn ranked_totals<'a, K, F>(rows: &[&'a DeploymentRecord], key: F) -> Vec<(K, u64)>
where
    K: Ord,
    F: Fn(&'a DeploymentRecord) -> K,
{
    let mut sums: BTreeMap<K, u64> = BTreeMap::new();
    for r in rows.iter() {
        *sums.entry(key(*r)).or_insert(0) += r.deployed;
    }
    let mut res: Vec<(K, u64)> = sums.into_iter().collect();
    // The sort is stable and the map iterates by key: ties stay in key order.
    res.sort_by(|(_, v1), (_, v2)| v2.cmp(v1));
    res
}

/// The theatre with the largest deployment and its share of the total.
///
/// When several theatres have the same deployment, the first one by name wins.
pub fn dominant_theatre(rows: &[&DeploymentRecord]) -> Option<TheatreShare> {
    let grand_total: u64 = rows.iter().map(|r| r.deployed).sum();
    let theatres = ranked_totals(rows, |r| r.theatre.as_str());
    theatres.first().map(|(theatre, deployed)| TheatreShare {
        theatre: theatre.to_string(),
        deployed: *deployed,
        share: safe_ratio(*deployed as f64, grand_total as f64, 100.0),
    })
}

/// Deployment by organisation, the largest `top_n` and "Other".
pub fn organisation_breakdown(rows: &[&DeploymentRecord], top_n: usize) -> Vec<OrganisationShare> {
    let grand_total: u64 = rows.iter().map(|r| r.deployed).sum();
    let orgs: Vec<(String, u64)> = ranked_totals(rows, |r| r.organisation.as_str())
        .into_iter()
        .map(|(o, v)| (o.to_string(), v))
        .collect();
    top_n_with_other(&orgs, top_n)
        .into_iter()
        .map(|(organisation, deployed)| OrganisationShare {
            organisation,
            deployed,
            percent_of_total: safe_ratio(deployed as f64, grand_total as f64, 100.0),
        })
        .collect()
}

/// Deployment by (organisation, mission), ordered by organisation then mission.
pub fn mission_breakdown(rows: &[&DeploymentRecord]) -> Vec<MissionShare> {
    let mut sums: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for r in rows.iter() {
        *sums
            .entry((r.organisation.as_str(), r.mission_name.as_str()))
            .or_insert(0) += r.deployed;
    }
    sums.into_iter()
        .map(|((org, mission), deployed)| MissionShare {
            organisation: org.to_string(),
            mission_name: mission.to_string(),
            deployed,
        })
        .collect()
}

/// Deployment of each country in each organisation.
///
/// Organisations outside the `top_n` of the whole selection are merged into
/// "Other" for every country.
fn country_organisations(
    country_totals: &[(CountryCode, u64)],
    rows: &[&DeploymentRecord],
    top_n: usize,
) -> CountryOrganisationTable {
    let top_orgs: HashSet<&str> = ranked_totals(rows, |r| r.organisation.as_str())
        .into_iter()
        .take(top_n)
        .map(|(o, _)| o)
        .collect();

    let mut country_order: Vec<(CountryCode, u64)> = country_totals.to_vec();
    country_order.sort_by(|(c1, t1), (c2, t2)| t2.cmp(t1).then_with(|| c1.cmp(c2)));
    let totals: HashMap<&CountryCode, u64> = country_totals.iter().map(|(c, t)| (c, *t)).collect();

    let mut sums: BTreeMap<(&CountryCode, &str), u64> = BTreeMap::new();
    for r in rows.iter() {
        let label = if top_orgs.contains(r.organisation.as_str()) {
            r.organisation.as_str()
        } else {
            OTHER_LABEL
        };
        *sums.entry((&r.country, label)).or_insert(0) += r.deployed;
    }

    let mut table_rows: Vec<CountryOrganisationRow> = Vec::new();
    for (country, _) in country_order.iter() {
        let mut country_rows: Vec<CountryOrganisationRow> = sums
            .iter()
            .filter(|((c, _), _)| *c == country)
            .map(|((_, org), deployed)| CountryOrganisationRow {
                country: country.clone(),
                organisation: org.to_string(),
                deployed: *deployed,
                percent_of_country_total: safe_ratio(
                    *deployed as f64,
                    totals.get(country).copied().unwrap_or(0) as f64,
                    100.0,
                ),
            })
            .collect();
        country_rows.sort_by(|a, b| {
            b.deployed
                .cmp(&a.deployed)
                .then_with(|| a.organisation.cmp(&b.organisation))
        });
        table_rows.extend(country_rows);
    }

    let condensed = country_order.len() > top_n;
    CountryOrganisationTable {
        rows: table_rows,
        country_order: country_order.into_iter().map(|(c, _)| c).collect(),
        condensed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn op(country: &str, year: Year, theatre: &str, org: &str, mission: &str, deployed: u64) -> DeploymentRecord {
        DeploymentRecord {
            country: CountryCode::new(country),
            year,
            theatre: theatre.to_string(),
            organisation: org.to_string(),
            mission_name: mission.to_string(),
            mission_type: MissionType::Operation,
            deployed,
            location: None,
        }
    }

    fn pop(b: &mut Builder, country: &str, year: Year, population: u64) {
        b.add_population(PopulationRecord {
            country: CountryCode::new(country),
            year,
            population,
        })
        .unwrap();
    }

    fn active(b: &mut Builder, country: &str, year: Year, personnel_count: u64) {
        b.add_active_duty(ActiveDutyRecord {
            country: CountryCode::new(country),
            year,
            personnel_count,
        })
        .unwrap();
    }

    fn store() -> RecordStore {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut b = Builder::new();
        b.add_deployments(vec![
            op("USA", 2021, "Middle East", "NATO", "Op A", 600),
            op("USA", 2021, "Europe", "NATO", "Op B", 300),
            op("USA", 2021, "Middle East", "USA", "Op C", 100),
            op("DEU", 2021, "Europe", "EU", "Op D", 300),
            op("DEU", 2021, "Africa", "UN", "Op E", 200),
            op("CAN", 2021, "Europe", "NATO", "Op B", 100),
            op("USA", 2020, "Middle East", "NATO", "Op A", 800),
        ])
        .unwrap();
        b.add_deployment(DeploymentRecord {
            mission_type: MissionType::MilitaryPresence,
            ..op("USA", 2021, "Asia", "USA", "Japan", 5000)
        })
        .unwrap();
        pop(&mut b, "USA", 2021, 10_000_000);
        pop(&mut b, "DEU", 2021, 1_000_000);
        pop(&mut b, "CAN", 2021, 1_000_000);
        active(&mut b, "USA", 2021, 1_000_000);
        active(&mut b, "DEU", 2021, 200);
        active(&mut b, "CAN", 2021, 0);
        b.build()
    }

    fn metrics(codes: &[&str], year: Year) -> DerivedCountryMetrics {
        compute_country_metrics(
            &store(),
            &CountrySelection::from_codes(codes),
            year,
            &MetricsRules::DEFAULT_RULES,
        )
        .unwrap()
        .computed()
        .unwrap()
    }

    #[test]
    fn empty_selection_is_signalled() {
        let res = compute_country_metrics(
            &store(),
            &CountrySelection::default(),
            2021,
            &MetricsRules::DEFAULT_RULES,
        );
        assert_eq!(res, Ok(SelectionOutcome::NoSelection));
    }

    #[test]
    fn unknown_year_is_an_error() {
        let res = compute_country_metrics(
            &store(),
            &CountrySelection::from_codes(&["USA"]),
            1990,
            &MetricsRules::DEFAULT_RULES,
        );
        assert_eq!(res, Err(MetricsError::YearOutOfRange { year: 1990 }));
    }

    #[test]
    fn totals_and_ratios() {
        let m = metrics(&["USA", "DEU"], 2021);
        // Military presence is not counted.
        assert_eq!(m.total_deployed, 1500);

        let pc = m.per_capita.unwrap();
        assert!(!pc.condensed);
        let values: Vec<(&str, f64)> = pc.rows.iter().map(|r| (r.country.as_str(), r.value)).collect();
        assert_eq!(values, vec![("DEU", 50.0), ("USA", 10.0)]);

        let active = m.percent_active_personnel.unwrap();
        let values: Vec<(&str, f64)> = active
            .rows
            .iter()
            .map(|r| (r.country.as_str(), r.value))
            .collect();
        // Deployed can exceed the size of the active force: no clamping.
        assert_eq!(values, vec![("DEU", 250.0), ("USA", 0.1)]);
    }

    #[test]
    fn zero_active_personnel_gives_zero() {
        let m = metrics(&["CAN"], 2021);
        let active = m.percent_active_personnel.unwrap();
        assert_eq!(active.rows[0].value, 0.0);
        assert_eq!(active.rows[0].total_deployed, 100);
    }

    #[test]
    fn missing_reference_is_local_to_the_metric() {
        // No population nor active duty for 2020.
        let m = metrics(&["USA"], 2020);
        assert_eq!(
            m.per_capita,
            Err(MetricsError::MissingReference {
                dataset: ReferenceDataset::Population,
                country: CountryCode::new("USA"),
                year: 2020
            })
        );
        assert!(m.percent_active_personnel.is_err());
        assert_eq!(m.total_deployed, 800);
        assert_eq!(m.dominant_theatre.unwrap().theatre, "Middle East");
    }

    #[test]
    fn dominant_theatre_share() {
        let m = metrics(&["USA", "DEU"], 2021);
        assert_eq!(
            m.dominant_theatre,
            Some(TheatreShare {
                theatre: "Middle East".to_string(),
                deployed: 700,
                share: 46.7
            })
        );
        let by_country: Vec<(String, String)> = m
            .dominant_theatre_by_country
            .iter()
            .map(|(c, t)| (c.to_string(), t.clone().unwrap().theatre))
            .collect();
        assert_eq!(
            by_country,
            vec![
                ("USA".to_string(), "Middle East".to_string()),
                ("DEU".to_string(), "Europe".to_string())
            ]
        );
    }

    #[test]
    fn dominant_theatre_ties_use_the_name() {
        let rows = vec![
            op("FRA", 2021, "Sahel", "UN", "x", 50),
            op("FRA", 2021, "Baltics", "NATO", "y", 50),
            op("FRA", 2021, "Levant", "UN", "z", 20),
        ];
        let refs: Vec<&DeploymentRecord> = rows.iter().collect();
        let t = dominant_theatre(&refs).unwrap();
        assert_eq!(t.theatre, "Baltics");
        assert_eq!(t.share, 41.7);
        assert_eq!(dominant_theatre(&[]), None);
    }

    #[test]
    fn organisations_with_percentages() {
        let m = metrics(&["USA", "DEU"], 2021);
        let orgs: Vec<(&str, u64, f64)> = m
            .organisation_breakdown
            .iter()
            .map(|o| (o.organisation.as_str(), o.deployed, o.percent_of_total))
            .collect();
        assert_eq!(
            orgs,
            vec![
                ("NATO", 900, 60.0),
                ("EU", 300, 20.0),
                ("UN", 200, 13.3),
                ("USA", 100, 6.7)
            ]
        );
        assert_eq!(m.breakdown_axis, BreakdownAxis::Country);
        assert_eq!(metrics(&["USA"], 2021).breakdown_axis, BreakdownAxis::Organisation);
    }

    #[test]
    fn organisations_beyond_five_become_other() {
        let rows: Vec<DeploymentRecord> = [100, 90, 80, 70, 60, 50, 40]
            .iter()
            .enumerate()
            .map(|(i, d)| op("ITA", 2021, "Europe", &format!("org{}", i + 1), "m", *d))
            .collect();
        let refs: Vec<&DeploymentRecord> = rows.iter().collect();
        let res = organisation_breakdown(&refs, 5);
        assert_eq!(res.len(), 6);
        let other = res.last().unwrap();
        assert_eq!(other.organisation, "Other");
        assert_eq!(other.deployed, 90);
        assert_eq!(other.percent_of_total, 18.4);
        assert_eq!(res.iter().map(|o| o.deployed).sum::<u64>(), 490);
    }

    #[test]
    fn missions_are_grouped() {
        let m = metrics(&["USA", "CAN"], 2021);
        let missions: Vec<(&str, &str, u64)> = m
            .mission_breakdown
            .iter()
            .map(|x| (x.organisation.as_str(), x.mission_name.as_str(), x.deployed))
            .collect();
        assert_eq!(
            missions,
            vec![("NATO", "Op A", 600), ("NATO", "Op B", 400), ("USA", "Op C", 100)]
        );
    }

    #[test]
    fn country_organisation_table() {
        let m = metrics(&["CAN", "DEU", "USA"], 2021);
        let t = m.country_organisations;
        assert!(!t.condensed);
        assert_eq!(
            t.country_order,
            vec![CountryCode::new("USA"), CountryCode::new("DEU"), CountryCode::new("CAN")]
        );
        let rows: Vec<(&str, &str, u64, f64)> = t
            .rows
            .iter()
            .map(|r| (r.country.as_str(), r.organisation.as_str(), r.deployed, r.percent_of_country_total))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("USA", "NATO", 900, 90.0),
                ("USA", "USA", 100, 10.0),
                ("DEU", "EU", 300, 60.0),
                ("DEU", "UN", 200, 40.0),
                ("CAN", "NATO", 100, 100.0),
            ]
        );
    }

    #[test]
    fn country_organisation_table_merges_small_organisations() {
        let rows: Vec<DeploymentRecord> = (1..=7)
            .map(|i| op("NOR", 2021, "Europe", &format!("org{}", i), "m", 10 * i as u64))
            .collect();
        let refs: Vec<&DeploymentRecord> = rows.iter().collect();
        let totals = vec![(CountryCode::new("NOR"), 280)];
        let t = country_organisations(&totals, &refs, 5);
        assert_eq!(t.rows.len(), 6);
        assert!(t.rows.iter().any(|r| r.organisation == "Other" && r.deployed == 30));
    }

    #[test]
    fn condensed_above_five_countries() {
        let mut b = Builder::new();
        for (i, c) in ["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"].iter().enumerate() {
            b.add_deployment(op(c, 2021, "Europe", "NATO", "m", 10 + i as u64))
                .unwrap();
            pop(&mut b, c, 2021, 1000);
            active(&mut b, c, 2021, 1000);
        }
        let store = b.build();
        let sel = CountrySelection::from_codes(&["AAA", "BBB", "CCC", "DDD", "EEE", "FFF"]);
        let m = compute_country_metrics(&store, &sel, 2021, &MetricsRules::DEFAULT_RULES)
            .unwrap()
            .computed()
            .unwrap();
        let pc = m.per_capita.unwrap();
        assert!(pc.condensed);
        // The full list is kept.
        assert_eq!(pc.rows.len(), 6);
        assert_eq!(pc.rows[0].country.as_str(), "FFF");
        assert!(m.country_organisations.condensed);
    }
}
