mod common;

use encoding_rs::{UTF_8, WINDOWS_1252};
use rust_xlsxwriter::Workbook;
use sales_insights::{data::Cell, error::InsightsError, loader::load};

use common::{SALES_CSV, num, text};

#[test]
fn csv_upload_infers_numeric_and_text_columns() {
    let raw = load(SALES_CSV.as_bytes(), "sales.csv", UTF_8).expect("load csv");
    assert_eq!(raw.row_count(), 5);
    assert_eq!(
        raw.headers(),
        vec![
            "Order ID",
            "Order Date",
            "Item Name",
            "Branch Name",
            "Order Region",
            "Item Price",
            "Quantity"
        ]
    );
    assert_eq!(raw.cell(0, 0), Some(&num(1001.0)));
    assert_eq!(raw.cell(0, 1), Some(&text("2024-01-05")));
    assert_eq!(raw.cell(3, 3), Some(&Cell::Empty));
    assert_eq!(raw.cell(0, 5), Some(&num(2500.0)));
}

#[test]
fn extension_matching_ignores_case() {
    let raw = load(b"a\tb\n1\t2\n", "EXPORT.TXT", UTF_8).expect("load tab file");
    assert_eq!(raw.headers(), vec!["a", "b"]);
    assert_eq!(raw.cell(0, 1), Some(&num(2.0)));
}

#[test]
fn csv_extension_with_tab_content_is_still_comma_parsed() {
    let raw = load(b"a\tb\n1\t2\n", "export.csv", UTF_8).expect("load");
    assert_eq!(raw.column_count(), 1);
    assert_eq!(raw.headers(), vec!["a\tb"]);
    assert_eq!(raw.cell(0, 0), Some(&text("1\t2")));
}

#[test]
fn unknown_extension_falls_back_to_comma() {
    let raw = load(b"a,b\nx,y\n", "export.dat", UTF_8).expect("load");
    assert_eq!(raw.column_count(), 2);
}

#[test]
fn na_tokens_become_missing_cells() {
    let raw = load(b"a,b\nNA,1\nn/a,\nnull,3\n", "na.csv", UTF_8).expect("load");
    let a = raw.column("a").unwrap().values();
    assert!(a.iter().all(Cell::is_empty));
    let b = raw.column("b").unwrap().values();
    assert_eq!(b, &[num(1.0), Cell::Empty, num(3.0)]);
}

#[test]
fn short_rows_are_padded_and_long_rows_rejected() {
    let raw = load(b"a,b,c\n1,2\n", "short.csv", UTF_8).expect("load");
    assert_eq!(raw.cell(0, 2), Some(&Cell::Empty));

    let err = load(b"a,b\n1,2,3\n", "long.csv", UTF_8).unwrap_err();
    match err {
        InsightsError::Parse(message) => {
            assert!(message.contains("Expected 2 fields"), "{message}");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn empty_upload_is_a_parse_error() {
    let err = load(b"", "empty.csv", UTF_8).unwrap_err();
    assert!(matches!(err, InsightsError::Parse(_)));
}

#[test]
fn header_only_upload_yields_empty_table() {
    let raw = load(b"Item Price,Quantity\n", "headers.csv", UTF_8).expect("load");
    assert_eq!(raw.row_count(), 0);
    assert_eq!(raw.column_count(), 2);
}

#[test]
fn blank_lines_are_skipped() {
    let raw = load(b"a,b\n1,2\n\n3,4\n", "blank.csv", UTF_8).expect("load");
    assert_eq!(raw.row_count(), 2);
}

#[test]
fn duplicate_headers_are_disambiguated() {
    let raw = load(b"Item,Item,\n1,2,3\n", "dupes.csv", UTF_8).expect("load");
    assert_eq!(raw.headers(), vec!["Item", "Item.1", "Unnamed: 2"]);
}

#[test]
fn input_encoding_is_applied() {
    let (bytes, _, _) = WINDOWS_1252.encode("Item Name\nCaf\u{e9}\n");
    let raw = load(&bytes, "latin.csv", WINDOWS_1252).expect("load");
    assert_eq!(raw.cell(0, 0), Some(&text("Caf\u{e9}")));
}

#[test]
fn invalid_utf8_is_a_parse_error() {
    let err = load(b"a\n\xff\xfe\xfd\n", "bad.csv", UTF_8).unwrap_err();
    assert!(matches!(err, InsightsError::Parse(_)));
}

#[test]
fn spreadsheet_upload_reads_first_sheet() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Item Name").unwrap();
    sheet.write_string(0, 1, "Item Price").unwrap();
    sheet.write_string(0, 2, "Quantity").unwrap();
    sheet.write_string(1, 0, "Rice").unwrap();
    sheet.write_number(1, 1, 2500.0).unwrap();
    sheet.write_number(1, 2, 2.0).unwrap();
    sheet.write_string(2, 0, "Beans").unwrap();
    sheet.write_string(2, 1, "N/A").unwrap();
    sheet.write_number(2, 2, 1.0).unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let raw = load(&bytes, "Sales.XLSX", UTF_8).expect("load xlsx");
    assert_eq!(raw.headers(), vec!["Item Name", "Item Price", "Quantity"]);
    assert_eq!(raw.row_count(), 2);
    assert_eq!(raw.cell(0, 0), Some(&text("Rice")));
    assert_eq!(raw.cell(0, 1), Some(&num(2500.0)));
    assert_eq!(raw.cell(1, 1), Some(&Cell::Empty));
}

#[test]
fn corrupt_spreadsheet_is_a_parse_error() {
    let err = load(b"definitely not a workbook", "broken.xlsx", UTF_8).unwrap_err();
    assert!(matches!(err, InsightsError::Parse(_)));
}
