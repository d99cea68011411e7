// Primitives for reading CSV files.

use crate::dashboard::io_common::{RawCell, RawTable};
use crate::dashboard::*;

/// Reads a CSV file with a header row. Every non-empty cell is kept as text.
pub fn read_csv_table(path: &str) -> MdiResult<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();
    debug!("read_csv_table: {}: header: {:?}", path, header);

    let mut rows: Vec<Vec<RawCell>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let row: Vec<RawCell> = line
            .iter()
            .map(|s| {
                if s.trim().is_empty() {
                    RawCell::Empty
                } else {
                    RawCell::Text(s.to_string())
                }
            })
            .collect();
        rows.push(row);
    }
    info!("read_csv_table: {}: {} rows", path, rows.len());
    Ok(RawTable {
        path: path.to_string(),
        header,
        rows,
    })
}
