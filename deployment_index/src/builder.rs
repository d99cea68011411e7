pub use crate::config::*;
use crate::store::RecordStore;

use log::debug;
use std::collections::HashMap;

/// Assembles a [`RecordStore`] from the raw records.
///
/// This is the one-time initialization step: once built, the store cannot be
/// modified.
///
/// ```
/// use deployment_index::builder::Builder;
/// use deployment_index::*;
///
/// let mut builder = Builder::new();
/// builder.add_population(PopulationRecord {
///     country: CountryCode::new("CAN"),
///     year: 2021,
///     population: 38_000_000,
/// })?;
/// let store = builder.build();
/// assert_eq!(store.population_of(&CountryCode::new("CAN"), 2021), Some(38_000_000));
///
/// # Ok::<(), MetricsError>(())
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    deployments: Vec<DeploymentRecord>,
    population: HashMap<(CountryCode, Year), u64>,
    active_duty: HashMap<(CountryCode, Year), u64>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Adds one deployment row. The country and the labels must not be blank.
    pub fn add_deployment(&mut self, record: DeploymentRecord) -> Result<(), MetricsError> {
        let fields = [
            ("country", record.country.as_str()),
            ("theatre", record.theatre.as_str()),
            ("organisation", record.organisation.as_str()),
            ("mission name", record.mission_name.as_str()),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(MetricsError::IncompleteDeployment {
                field: *field,
                country: record.country.clone(),
                year: record.year,
            });
        }
        self.deployments.push(record);
        Ok(())
    }

    pub fn add_deployments(&mut self, records: Vec<DeploymentRecord>) -> Result<(), MetricsError> {
        for r in records {
            self.add_deployment(r)?;
        }
        Ok(())
    }

    /// Adds the population of a country for a year.
    ///
    /// There must be at most one record per country and year.
    pub fn add_population(&mut self, record: PopulationRecord) -> Result<(), MetricsError> {
        insert_reference(
            &mut self.population,
            ReferenceDataset::Population,
            record.country,
            record.year,
            record.population,
        )
    }

    pub fn add_active_duty(&mut self, record: ActiveDutyRecord) -> Result<(), MetricsError> {
        insert_reference(
            &mut self.active_duty,
            ReferenceDataset::ActiveDuty,
            record.country,
            record.year,
            record.personnel_count,
        )
    }

    pub fn build(self) -> RecordStore {
        debug!(
            "build: {} deployments, {} population rows, {} active duty rows",
            self.deployments.len(),
            self.population.len(),
            self.active_duty.len()
        );
        RecordStore::new(self.deployments, self.population, self.active_duty)
    }
}

fn insert_reference(
    table: &mut HashMap<(CountryCode, Year), u64>,
    dataset: ReferenceDataset,
    country: CountryCode,
    year: Year,
    value: u64,
) -> Result<(), MetricsError> {
    let key = (country, year);
    if table.contains_key(&key) {
        return Err(MetricsError::DuplicateReference {
            dataset,
            country: key.0,
            year,
        });
    }
    table.insert(key, value);
    Ok(())
}
