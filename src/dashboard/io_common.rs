// Conversion of the raw tables read from the files into records.

use std::collections::HashMap;

use crate::dashboard::*;

/// A cell as read from a file, before any interpretation.
#[derive(PartialEq, Debug, Clone)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
}

impl RawCell {
    fn as_text(&self) -> Option<String> {
        match self {
            RawCell::Empty => None,
            RawCell::Text(s) if s.trim().is_empty() => None,
            RawCell::Text(s) => Some(s.trim().to_string()),
            RawCell::Number(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
            RawCell::Number(f) => Some(f.to_string()),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            RawCell::Number(f) if f.is_finite() => Some(*f),
            RawCell::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }
}

/// The content of a worksheet or a CSV file. The first row is the header.
#[derive(PartialEq, Debug, Clone)]
pub struct RawTable {
    pub path: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    fn column(&self, name: &str) -> MdiResult<usize> {
        self.optional_column(name).context(MissingColumnSnafu {
            column: name,
            path: self.path.clone(),
        })
    }

    fn optional_column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == name)
    }

    /// The data rows with their line number in the file (the header is line 1).
    /// Rows without any value are skipped.
    fn data_rows(&self) -> impl Iterator<Item = (usize, &Vec<RawCell>)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (idx + 2, row))
            .filter(|(_, row)| row.iter().any(|c| c.as_text().is_some()))
    }
}

static EMPTY: RawCell = RawCell::Empty;

fn cell(row: &[RawCell], idx: usize) -> &RawCell {
    row.get(idx).unwrap_or(&EMPTY)
}

fn wrong_cell(lineno: usize, column: &str, row: &[RawCell]) -> MdiError {
    MdiError::WrongCellType {
        lineno,
        column: column.to_string(),
        content: format!("{:?}", row),
    }
}

fn read_text(row: &[RawCell], lineno: usize, idx: usize, column: &str) -> MdiResult<String> {
    cell(row, idx)
        .as_text()
        .ok_or_else(|| wrong_cell(lineno, column, row))
}

/// A non-negative whole number. Missing values are `None`.
fn read_count(row: &[RawCell], lineno: usize, idx: usize, column: &str) -> MdiResult<Option<u64>> {
    let c = cell(row, idx);
    if c.as_text().is_none() {
        return Ok(None);
    }
    match c.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(Some(f as u64)),
        _ => Err(wrong_cell(lineno, column, row)),
    }
}

fn read_year(row: &[RawCell], lineno: usize, idx: usize) -> MdiResult<Year> {
    cell(row, idx)
        .as_text()
        .and_then(|s| parse_year(&s))
        .ok_or_else(|| wrong_cell(lineno, "Year", row))
}

/// Parses `2021` as well as `2021.0` (spreadsheets store numbers as floats).
pub fn parse_year(s: &str) -> Option<Year> {
    let s = s.trim();
    if let Ok(y) = s.parse::<Year>() {
        return Some(y);
    }
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < 10_000.0 => Some(f as Year),
        _ => None,
    }
}

pub fn deployments_from_table(table: &RawTable) -> MdiResult<Vec<DeploymentRecord>> {
    let country_idx = table.column("Country")?;
    let year_idx = table.column("Year")?;
    let theatre_idx = table.column("Theatre")?;
    let org_idx = table.column("Organisation")?;
    let mission_idx = table.column("MissionName")?;
    let type_idx = table.column("MissionType")?;
    let deployed_idx = table.column("Deployed")?;
    let lat_idx = table.optional_column("Lat");
    let lon_idx = table.optional_column("Lon");

    let mut res: Vec<DeploymentRecord> = Vec::new();
    for (lineno, row) in table.data_rows() {
        let mission_type = MissionType::parse(&read_text(row, lineno, type_idx, "MissionType")?)
            .ok_or_else(|| wrong_cell(lineno, "MissionType", row))?;
        let deployed = match read_count(row, lineno, deployed_idx, "Deployed")? {
            Some(d) => d,
            None => {
                warn!(
                    "deployments_from_table: {}: line {}: no deployment count, skipping row",
                    table.path, lineno
                );
                continue;
            }
        };
        let location = match (lat_idx, lon_idx) {
            (Some(lat), Some(lon)) => cell(row, lat).as_f64().zip(cell(row, lon).as_f64()),
            _ => None,
        };
        let record = DeploymentRecord {
            country: CountryCode::new(&read_text(row, lineno, country_idx, "Country")?),
            year: read_year(row, lineno, year_idx)?,
            theatre: read_text(row, lineno, theatre_idx, "Theatre")?,
            organisation: read_text(row, lineno, org_idx, "Organisation")?,
            mission_name: read_text(row, lineno, mission_idx, "MissionName")?,
            mission_type,
            deployed,
            location,
        };
        debug!("deployments_from_table: line {}: {:?}", lineno, record);
        res.push(record);
    }
    info!(
        "deployments_from_table: {}: {} deployment rows",
        table.path,
        res.len()
    );
    Ok(res)
}

pub fn active_duty_from_table(table: &RawTable) -> MdiResult<Vec<ActiveDutyRecord>> {
    let country_idx = table.column("Country")?;
    let year_idx = table.column("Year")?;
    let count_idx = table.column("Personnel_Count")?;

    let mut res: Vec<ActiveDutyRecord> = Vec::new();
    for (lineno, row) in table.data_rows() {
        let country = CountryCode::new(&read_text(row, lineno, country_idx, "Country")?);
        let year = read_year(row, lineno, year_idx)?;
        match read_count(row, lineno, count_idx, "Personnel_Count")? {
            Some(personnel_count) => res.push(ActiveDutyRecord {
                country,
                year,
                personnel_count,
            }),
            None => debug!(
                "active_duty_from_table: line {}: no value for {} in {}",
                lineno, country, year
            ),
        }
    }
    info!(
        "active_duty_from_table: {}: {} active duty rows",
        table.path,
        res.len()
    );
    Ok(res)
}

/// Reshapes the wide population table (one column per year) into records.
///
/// Columns whose header is text are ignored. A header that starts like a
/// number but is not a year is an error.
pub fn population_from_wide_table(table: &RawTable) -> MdiResult<Vec<PopulationRecord>> {
    let country_idx = table.column("Country")?;
    let mut year_columns: Vec<(usize, Year)> = Vec::new();
    for (idx, h) in table.header.iter().enumerate() {
        if idx == country_idx {
            continue;
        }
        match parse_year(h) {
            Some(year) => year_columns.push((idx, year)),
            None if h.trim().starts_with(|c: char| c.is_ascii_digit()) => {
                return BadYearHeaderSnafu {
                    content: h.clone(),
                    path: table.path.clone(),
                }
                .fail();
            }
            None => debug!("population_from_wide_table: ignoring column {:?}", h),
        }
    }
    let mut seen: HashMap<Year, usize> = HashMap::new();
    for (idx, y) in year_columns.iter() {
        if let Some(prev) = seen.insert(*y, *idx) {
            whatever!(
                "{}: year {} appears in columns {} and {}",
                table.path,
                y,
                prev + 1,
                idx + 1
            );
        }
    }

    let mut res: Vec<PopulationRecord> = Vec::new();
    for (lineno, row) in table.data_rows() {
        let country = CountryCode::new(&read_text(row, lineno, country_idx, "Country")?);
        for (idx, year) in year_columns.iter() {
            let column = table.header[*idx].as_str();
            if let Some(population) = read_count(row, lineno, *idx, column)? {
                res.push(PopulationRecord {
                    country: country.clone(),
                    year: *year,
                    population,
                });
            }
        }
    }
    info!(
        "population_from_wide_table: {}: {} years, {} population rows",
        table.path,
        year_columns.len(),
        res.len()
    );
    Ok(res)
}
