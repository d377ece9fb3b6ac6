//! I/O helpers shared by the loader, the cleaned-file export and the CLI.
//!
//! - **Format resolution**: the declared file name picks the parser
//!   (`.xlsx`/`.xls` → spreadsheet, `.txt` → tab, everything else → comma).
//!   File contents are never sniffed.
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//! - **Reader/writer construction**: `open_csv_reader` and `csv_writer`.
//! - **stdout**: the `-` path convention routes output through standard out.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited(u8),
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_file_name(file_name: &str) -> Self {
        match file_extension(file_name) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xls") => {
                SourceFormat::Spreadsheet
            }
            Some(ext) if ext.eq_ignore_ascii_case("txt") => {
                SourceFormat::Delimited(DEFAULT_TSV_DELIMITER)
            }
            _ => SourceFormat::Delimited(DEFAULT_CSV_DELIMITER),
        }
    }
}

/// Text after the last `.`, if the name has one.
pub fn file_extension(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Decodes `bytes`, honouring a byte-order mark when present.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String, String> {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(format!("Failed to decode text with encoding {}", used.name()))
    } else {
        Ok(text.into_owned())
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(DEFAULT_CSV_DELIMITER)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    builder.from_writer(writer)
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    })
}

pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Opening input file {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_declared_extension() {
        assert_eq!(
            SourceFormat::from_file_name("sales.XLSX"),
            SourceFormat::Spreadsheet
        );
        assert_eq!(
            SourceFormat::from_file_name("legacy.xls"),
            SourceFormat::Spreadsheet
        );
        assert_eq!(
            SourceFormat::from_file_name("export.TxT"),
            SourceFormat::Delimited(b'\t')
        );
        assert_eq!(
            SourceFormat::from_file_name("export.csv"),
            SourceFormat::Delimited(b',')
        );
        assert_eq!(
            SourceFormat::from_file_name("export.tsv"),
            SourceFormat::Delimited(b',')
        );
        assert_eq!(
            SourceFormat::from_file_name("no_extension"),
            SourceFormat::Delimited(b',')
        );
    }

    #[test]
    fn decode_bytes_strips_utf8_bom() {
        let decoded = decode_bytes(b"\xEF\xBB\xBFa,b", UTF_8).unwrap();
        assert_eq!(decoded, "a,b");
    }

    #[test]
    fn resolve_encoding_rejects_unknown_labels() {
        assert!(resolve_encoding(Some("klingon")).is_err());
        assert_eq!(resolve_encoding(Some("latin1")).unwrap().name(), "windows-1252");
    }
}
