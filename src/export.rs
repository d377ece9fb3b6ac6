use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveTime;

use crate::{
    data::{Cell, DATE_DISPLAY_FORMAT},
    frame::{CleanTable, Column},
    io_utils,
};

pub const CLEANED_SUFFIX: &str = "_cleaned.csv";

/// `sales.xlsx` → `sales_cleaned.csv`; a name without a dot keeps its full
/// text as the stem.
pub fn cleaned_file_name(original: &str) -> String {
    let stem = original
        .rsplit_once('.')
        .map_or(original, |(stem, _)| stem);
    format!("{stem}{CLEANED_SUFFIX}")
}

/// Writes the table as comma-delimited UTF-8 with a header row and returns
/// the number of data rows written.
pub fn write_csv<W: Write>(table: &CleanTable, writer: W) -> Result<usize> {
    let mut writer = io_utils::csv_writer(writer);
    writer
        .write_record(table.headers())
        .context("Writing output headers")?;

    let date_only = table
        .columns()
        .iter()
        .map(is_date_only_column)
        .collect::<Vec<_>>();
    for (idx, row) in table.rows().enumerate() {
        let fields = row
            .iter()
            .zip(&date_only)
            .map(|(cell, date_only)| format_cell(cell, *date_only));
        writer
            .write_record(fields)
            .with_context(|| format!("Writing output row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output writer")?;
    Ok(table.row_count())
}

pub fn to_csv_bytes(table: &CleanTable) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    Ok(buffer)
}

/// A timestamp column whose every value sits at midnight prints dates only.
fn is_date_only_column(column: &Column) -> bool {
    let mut saw_date = false;
    for cell in column.values() {
        match cell {
            Cell::DateTime(Some(dt)) => {
                if dt.time() != NaiveTime::MIN {
                    return false;
                }
                saw_date = true;
            }
            Cell::DateTime(None) => {}
            _ => return false,
        }
    }
    saw_date
}

fn format_cell(cell: &Cell, date_only: bool) -> String {
    match cell {
        Cell::DateTime(Some(dt)) if date_only => dt.format(DATE_DISPLAY_FORMAT).to_string(),
        other => other.as_display(),
    }
}
