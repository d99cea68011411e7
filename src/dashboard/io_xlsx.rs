// Primitives for reading Excel workbooks.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::dashboard::io_common::{RawCell, RawTable};
use crate::dashboard::*;

/// Reads a worksheet. The first row is the header.
///
/// Without a worksheet name, the first worksheet of the workbook is used.
pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> MdiResult<RawTable> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = match iter.next() {
        Some(h) => h.iter().map(header_cell).collect(),
        None => return EmptyExcelSnafu { path }.fail(),
    };
    debug!("read_excel_table: {}: header: {:?}", path, header);

    let rows: Vec<Vec<RawCell>> = iter
        .map(|row| row.iter().map(raw_cell).collect())
        .collect();
    info!("read_excel_table: {}: {} rows", path, rows.len());
    Ok(RawTable {
        path: path.to_string(),
        header,
        rows,
    })
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> MdiResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_table: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(name) = worksheet_name {
        workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })
    }
}

// Year headers are often stored as numbers.
fn header_cell(cell: &DataType) -> String {
    match raw_cell(cell) {
        RawCell::Empty => "".to_string(),
        RawCell::Text(s) => s.trim().to_string(),
        RawCell::Number(f) if f.fract() == 0.0 => format!("{}", f as i64),
        RawCell::Number(f) => f.to_string(),
    }
}

fn raw_cell(cell: &DataType) -> RawCell {
    match cell {
        DataType::Empty => RawCell::Empty,
        DataType::String(s) => RawCell::Text(s.clone()),
        DataType::Float(f) => RawCell::Number(*f),
        DataType::Int(i) => RawCell::Number(*i as f64),
        other => RawCell::Text(format!("{:?}", other)),
    }
}
