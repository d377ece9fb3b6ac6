use std::{collections::HashMap, io::Cursor};

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    data::{Cell, DATETIME_DISPLAY_FORMAT, format_number, is_missing_token, parse_number},
    error::{InsightsError, Result},
    frame::{Column, RawTable, Table},
    io_utils::{self, SourceFormat},
};

/// Parses an uploaded file into a [`RawTable`], choosing the parser from the
/// declared file name only.
pub fn load(bytes: &[u8], file_name: &str, encoding: &'static Encoding) -> Result<RawTable> {
    let format = SourceFormat::from_file_name(file_name);
    debug!("Loading '{file_name}' as {format:?}");
    let table = match format {
        SourceFormat::Delimited(delimiter) => load_delimited(bytes, delimiter, encoding)?,
        SourceFormat::Spreadsheet => load_spreadsheet(bytes)?,
    };
    info!(
        "Read {} row(s) across {} column(s) from '{}'",
        table.row_count(),
        table.column_count(),
        file_name
    );
    Ok(RawTable::new(table))
}

fn parse_error(err: impl std::fmt::Display) -> InsightsError {
    InsightsError::Parse(err.to_string())
}

pub fn load_delimited(bytes: &[u8], delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    let text = io_utils::decode_bytes(bytes, encoding).map_err(InsightsError::Parse)?;
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
    let mut records = reader
        .records()
        .filter(|record| !matches!(record, Ok(r) if is_blank_record(r)));

    let header_record = records
        .next()
        .ok_or_else(|| InsightsError::Parse("No columns to parse from file".to_string()))?
        .map_err(parse_error)?;
    let headers = normalize_headers(header_record.iter().map(str::to_string));
    let width = headers.len();

    let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    for record in records {
        let record = record.map_err(parse_error)?;
        if record.len() > width {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(InsightsError::Parse(format!(
                "Error tokenizing data. Expected {width} fields in line {line}, saw {}",
                record.len()
            )));
        }
        for (idx, column) in raw_columns.iter_mut().enumerate() {
            let value = record.get(idx).filter(|v| !is_missing_token(v));
            column.push(value.map(str::to_string));
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(name, values)| Column::new(name, infer_column(values)))
        .collect();
    Table::from_columns(columns)
}

fn is_blank_record(record: &csv::StringRecord) -> bool {
    record.len() == 1 && record.get(0) == Some("")
}

/// A column whose every present value reads as a number becomes numeric;
/// otherwise present values stay text.
fn infer_column(values: Vec<Option<String>>) -> Vec<Cell> {
    let numeric = values
        .iter()
        .flatten()
        .map(|value| parse_number(value))
        .collect::<Option<Vec<_>>>()
        .is_some();
    values
        .into_iter()
        .map(|value| match value {
            None => Cell::Empty,
            Some(value) if numeric => parse_number(&value).map_or(Cell::Empty, Cell::Number),
            Some(value) => Cell::Text(value),
        })
        .collect()
}

/// Blank names become `Unnamed: <index>`; repeats get `.1`, `.2`, ... suffixes.
pub fn normalize_headers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let resolved = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            resolved
        })
        .collect()
}

pub fn load_spreadsheet(bytes: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(parse_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InsightsError::Parse("Workbook contains no sheets".to_string()))?
        .map_err(parse_error)?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| InsightsError::Parse("No columns to parse from file".to_string()))?;
    let headers = normalize_headers(header_row.iter().map(header_text));

    let body = rows
        .filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)))
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect::<Vec<Vec<Cell>>>();
    Ok(Table::from_rows(&headers, body))
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        other => other.to_string(),
    }
}

fn spreadsheet_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if is_missing_token(s) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::text(if *b { "True" } else { "False" }),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => Cell::Text(value.format(DATETIME_DISPLAY_FORMAT).to_string()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_headers_mangles_duplicates_and_blanks() {
        let headers = normalize_headers(
            ["Item", "", "Item", "Item"]
                .into_iter()
                .map(str::to_string),
        );
        assert_eq!(headers, vec!["Item", "Unnamed: 1", "Item.1", "Item.2"]);
    }

    #[test]
    fn infer_column_keeps_mixed_columns_as_text() {
        let cells = infer_column(vec![Some("5".into()), Some("five".into()), None]);
        assert_eq!(
            cells,
            vec![Cell::text("5"), Cell::text("five"), Cell::Empty]
        );
    }

    #[test]
    fn infer_column_promotes_numeric_columns() {
        let cells = infer_column(vec![Some("5".into()), None, Some("2.5".into())]);
        assert_eq!(
            cells,
            vec![Cell::Number(5.0), Cell::Empty, Cell::Number(2.5)]
        );
    }
}
