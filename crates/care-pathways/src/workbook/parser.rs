use serde::Deserialize;
use std::io::Read;

/// One long-format workbook row: `scenario,parameter,value`.
#[derive(Debug, Deserialize)]
pub(crate) struct WorkbookRow {
    pub(crate) scenario: String,
    pub(crate) parameter: String,
    pub(crate) value: String,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<WorkbookRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for row in csv_reader.deserialize::<WorkbookRow>() {
        rows.push(row?);
    }

    Ok(rows)
}
