use log::debug;
use std::collections::{BTreeSet, HashMap};

use crate::config::*;

/// The reference datasets, loaded once and then only read.
///
/// A store is built with [`crate::builder::Builder`]. It has no mutating
/// methods, so a single instance can serve any number of concurrent
/// computations.
#[derive(Debug, Clone)]
pub struct RecordStore {
    pub(crate) deployments: Vec<DeploymentRecord>,
    pub(crate) population: HashMap<(CountryCode, Year), u64>,
    pub(crate) active_duty: HashMap<(CountryCode, Year), u64>,
    pub(crate) years: Vec<Year>,
    pub(crate) countries: Vec<CountryCode>,
}

impl RecordStore {
    pub(crate) fn new(
        deployments: Vec<DeploymentRecord>,
        population: HashMap<(CountryCode, Year), u64>,
        active_duty: HashMap<(CountryCode, Year), u64>,
    ) -> RecordStore {
        let years: BTreeSet<Year> = deployments.iter().map(|r| r.year).collect();
        let countries: BTreeSet<CountryCode> = deployments
            .iter()
            .filter(|r| r.mission_type == MissionType::Operation)
            .map(|r| r.country.clone())
            .collect();
        debug!(
            "RecordStore::new: {} deployment rows, years {:?}, {} countries",
            deployments.len(),
            years,
            countries.len()
        );
        RecordStore {
            deployments,
            population,
            active_duty,
            years: years.into_iter().collect(),
            countries: countries.into_iter().collect(),
        }
    }

    pub fn population_of(&self, country: &CountryCode, year: Year) -> Option<u64> {
        self.population.get(&(country.clone(), year)).copied()
    }

    pub fn active_duty_of(&self, country: &CountryCode, year: Year) -> Option<u64> {
        self.active_duty.get(&(country.clone(), year)).copied()
    }

    /// Like [`RecordStore::population_of`], with a missing row as an error.
    pub fn require_population(&self, country: &CountryCode, year: Year) -> Result<u64, MetricsError> {
        self.population_of(country, year)
            .ok_or_else(|| MetricsError::MissingReference {
                dataset: ReferenceDataset::Population,
                country: country.clone(),
                year,
            })
    }

    pub fn require_active_duty(&self, country: &CountryCode, year: Year) -> Result<u64, MetricsError> {
        self.active_duty_of(country, year)
            .ok_or_else(|| MetricsError::MissingReference {
                dataset: ReferenceDataset::ActiveDuty,
                country: country.clone(),
                year,
            })
    }

    /// All the deployment rows, operations and military presence.
    pub fn deployments(&self) -> &[DeploymentRecord] {
        &self.deployments
    }

    pub fn operations(&self) -> impl Iterator<Item = &DeploymentRecord> + '_ {
        self.deployments
            .iter()
            .filter(|r| r.mission_type == MissionType::Operation)
    }

    pub fn presence(&self) -> impl Iterator<Item = &DeploymentRecord> + '_ {
        self.deployments
            .iter()
            .filter(|r| r.mission_type == MissionType::MilitaryPresence)
    }

    /// The operation rows of the selected countries for one year.
    pub fn operations_for<'a>(
        &'a self,
        selection: &'a CountrySelection,
        year: Year,
    ) -> impl Iterator<Item = &'a DeploymentRecord> + 'a {
        self.operations()
            .filter(move |r| r.year == year && selection.contains(&r.country))
    }

    /// The military presence rows of the selected countries for one year
    /// (the marker layer of the map).
    pub fn presence_for<'a>(
        &'a self,
        selection: &'a CountrySelection,
        year: Year,
    ) -> impl Iterator<Item = &'a DeploymentRecord> + 'a {
        self.presence()
            .filter(move |r| r.year == year && selection.contains(&r.country))
    }

    /// The years covered by the deployment dataset, in increasing order.
    pub fn years(&self) -> &[Year] {
        &self.years
    }

    /// The countries with at least one operation, sorted by code.
    pub fn countries(&self) -> &[CountryCode] {
        &self.countries
    }

    /// Checks that a year belongs to the deployment dataset.
    pub fn select_year(&self, year: Year) -> Result<Year, MetricsError> {
        if self.years.binary_search(&year).is_ok() {
            Ok(year)
        } else {
            Err(MetricsError::YearOutOfRange { year })
        }
    }

    /// The most recent year of the dataset.
    pub fn latest_year(&self) -> Option<Year> {
        self.years.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::Builder;
    use crate::config::*;
    use crate::store::RecordStore;

    fn row(country: &str, year: Year, mission_type: MissionType, deployed: u64) -> DeploymentRecord {
        DeploymentRecord {
            country: CountryCode::new(country),
            year,
            theatre: "Europe".to_string(),
            organisation: "NATO".to_string(),
            mission_name: "Op".to_string(),
            mission_type,
            deployed,
            location: None,
        }
    }

    fn store() -> RecordStore {
        let mut b = Builder::new();
        b.add_deployment(row("usa", 2021, MissionType::Operation, 10)).unwrap();
        b.add_deployment(row("DEU", 2019, MissionType::Operation, 3)).unwrap();
        b.add_deployment(row("JPN", 2020, MissionType::MilitaryPresence, 7)).unwrap();
        b.add_population(PopulationRecord {
            country: CountryCode::new("USA"),
            year: 2021,
            population: 330_000_000,
        })
        .unwrap();
        b.build()
    }

    #[test]
    fn year_domain_covers_all_missions() {
        let s = store();
        assert_eq!(s.years(), &[2019, 2020, 2021]);
        assert_eq!(s.latest_year(), Some(2021));
        assert_eq!(s.select_year(2020), Ok(2020));
        assert_eq!(
            s.select_year(1999),
            Err(MetricsError::YearOutOfRange { year: 1999 })
        );
    }

    #[test]
    fn countries_come_from_operations() {
        let s = store();
        assert_eq!(
            s.countries(),
            &[CountryCode::new("DEU"), CountryCode::new("USA")]
        );
        assert_eq!(s.presence().count(), 1);
        assert_eq!(s.operations().count(), 2);
    }

    #[test]
    fn missing_references_are_explicit() {
        let s = store();
        let usa = CountryCode::new("USA");
        assert_eq!(s.population_of(&usa, 2021), Some(330_000_000));
        assert_eq!(s.population_of(&usa, 2020), None);
        assert_eq!(
            s.require_active_duty(&usa, 2021),
            Err(MetricsError::MissingReference {
                dataset: ReferenceDataset::ActiveDuty,
                country: usa.clone(),
                year: 2021
            })
        );
    }

    #[test]
    fn selection_filters_rows() {
        let s = store();
        let sel = CountrySelection::from_codes(&["USA", "JPN"]);
        assert_eq!(s.operations_for(&sel, 2021).count(), 1);
        assert_eq!(s.operations_for(&sel, 2019).count(), 0);
        assert_eq!(s.presence_for(&sel, 2020).count(), 1);
    }

    #[test]
    fn store_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RecordStore>();
    }
}
