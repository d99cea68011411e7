// Country lists stored as CSV files with a 'countries' column.

use deployment_index::countries::is_known;

use crate::dashboard::io_common::RawCell;
use crate::dashboard::io_csv::read_csv_table;
use crate::dashboard::*;

const COUNTRIES_COLUMN: &str = "countries";

#[derive(PartialEq, Debug, Clone)]
pub struct ImportedSelection {
    pub selection: CountrySelection,
    /// The codes of the file that are not known countries, in file order.
    pub invalid: Vec<String>,
}

/// Reads a country list. Unknown codes are left out of the selection and reported.
pub fn read_country_list(path: &str) -> MdiResult<ImportedSelection> {
    let table = read_csv_table(path)?;
    let idx = table
        .header
        .iter()
        .position(|h| h == COUNTRIES_COLUMN)
        .context(MissingColumnSnafu {
            column: COUNTRIES_COLUMN,
            path,
        })?;
    let mut valid: Vec<CountryCode> = Vec::new();
    let mut invalid: Vec<String> = Vec::new();
    for row in table.rows.iter() {
        let code = match row.get(idx) {
            Some(RawCell::Text(s)) => s.trim().to_string(),
            _ => continue,
        };
        let cc = CountryCode::new(&code);
        if is_known(&cc) {
            valid.push(cc);
        } else if !invalid.contains(&code) {
            invalid.push(code);
        }
    }
    if !invalid.is_empty() {
        warn!(
            "read_country_list: {}: the following country codes are invalid: {:?}",
            path, invalid
        );
    }
    let selection = CountrySelection::new(valid);
    info!(
        "read_country_list: {}: {} countries selected",
        path,
        selection.len()
    );
    Ok(ImportedSelection { selection, invalid })
}

pub fn write_country_list(path: &str, selection: &CountrySelection) -> MdiResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(CsvWriteSnafu { path })?;
    wtr.write_record(&[COUNTRIES_COLUMN])
        .context(CsvWriteSnafu { path })?;
    for c in selection.iter() {
        wtr.write_record(&[c.as_str()])
            .context(CsvWriteSnafu { path })?;
    }
    wtr.flush().context(WritingFileSnafu { path })?;
    info!("write_country_list: {}: {} countries", path, selection.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn testdata(name: &str) -> String {
        let p: PathBuf = [env!("CARGO_MANIFEST_DIR"), "testdata", name].iter().collect();
        p.display().to_string()
    }

    #[test]
    fn unknown_codes_are_reported() {
        let res = read_country_list(&testdata("country_list.csv")).unwrap();
        assert_eq!(
            res.selection,
            CountrySelection::from_codes(&["USA", "DEU", "FRA"])
        );
        assert_eq!(res.invalid, vec!["XYZ".to_string(), "Germany".to_string()]);
    }

    #[test]
    fn missing_column() {
        let res = read_country_list(&testdata("small/active_duty.csv"));
        assert!(matches!(res, Err(MdiError::MissingColumn { .. })));
    }

    #[test]
    fn written_lists_can_be_read_back() {
        let path = std::env::temp_dir()
            .join("mdi_country_list_out.csv")
            .display()
            .to_string();
        let sel = CountrySelection::from_codes(&["NOR", "CAN", "JPN"]);
        write_country_list(&path, &sel).unwrap();
        let res = read_country_list(&path).unwrap();
        assert_eq!(res.selection, sel);
        assert!(res.invalid.is_empty());
    }
}
