mod common;

use encoding_rs::UTF_8;
use sales_insights::{
    clean::{Cleaner, MissingValuePolicy},
    data::Cell,
    error::{InsightsError, Result},
    frame::CleanTable,
    session::Session,
    sink::{PostgresSink, SALES_TABLE, SinkConfig, TableSink, export_to_sink},
};

use common::{SALES_CSV, clean_rows, num, text};

/// Records what it was handed, or fails like an unreachable database.
#[derive(Default)]
struct RecordingSink {
    fail: bool,
    written: Vec<(String, usize)>,
}

impl TableSink for RecordingSink {
    fn replace_table(&mut self, name: &str, table: &CleanTable) -> Result<usize> {
        if self.fail {
            return Err(InsightsError::Connection("refused".to_string()));
        }
        self.written.push((name.to_string(), table.row_count()));
        Ok(table.row_count())
    }
}

#[test]
fn fresh_session_requires_an_upload() {
    let session = Session::new();
    assert!(session.table().is_none());
    assert!(matches!(
        session.require().unwrap_err(),
        InsightsError::PreconditionFailed(_)
    ));
}

#[test]
fn upload_stores_cleaned_table_and_name() {
    let mut session = Session::new();
    let rows = session
        .upload(SALES_CSV.as_bytes(), "sales.csv", UTF_8)
        .unwrap()
        .row_count();
    assert_eq!(rows, 4);
    assert_eq!(session.source_name(), Some("sales.csv"));
    assert_eq!(
        session.cleaned_file_name().as_deref(),
        Some("sales_cleaned.csv")
    );
    assert!(session.require().unwrap().has_column("Total"));
}

#[test]
fn session_cleans_with_its_own_policy() {
    let mut session = Session::with_cleaner(Cleaner::new(MissingValuePolicy {
        fill: Cell::text("unknown"),
        numeric_fallback: 0.0,
    }));
    let table = session
        .upload(b"Branch Name,Item Price,Quantity\n,4,2\n", "branches.csv", UTF_8)
        .unwrap();
    assert_eq!(
        table.column("Branch Name").unwrap().values(),
        &[text("unknown")]
    );
    assert_eq!(table.column("Total").unwrap().values(), &[num(8.0)]);
}

#[test]
fn second_upload_replaces_the_first() {
    let mut session = Session::new();
    session
        .upload(SALES_CSV.as_bytes(), "sales.csv", UTF_8)
        .unwrap();
    session
        .upload(b"Item Price,Quantity\n3,4\n", "march.csv", UTF_8)
        .unwrap();
    assert_eq!(session.source_name(), Some("march.csv"));
    assert_eq!(
        session.require().unwrap().column("Total").unwrap().values(),
        &[num(12.0)]
    );
}

#[test]
fn failed_upload_keeps_previous_table() {
    let mut session = Session::new();
    session
        .upload(SALES_CSV.as_bytes(), "sales.csv", UTF_8)
        .unwrap();
    let err = session.upload(b"", "empty.csv", UTF_8).unwrap_err();
    assert!(matches!(err, InsightsError::Parse(_)));
    assert_eq!(session.source_name(), Some("sales.csv"));
    assert_eq!(session.require().unwrap().row_count(), 4);
}

#[test]
fn clear_empties_the_slot() {
    let mut session = Session::new();
    session.replace("manual.csv", clean_rows(&["Total"], vec![vec![num(1.0)]]));
    session.clear();
    assert!(session.require().is_err());
}

#[test]
fn export_writes_under_sales_table_name() {
    let mut session = Session::new();
    session
        .upload(SALES_CSV.as_bytes(), "sales.csv", UTF_8)
        .unwrap();
    let mut sink = RecordingSink::default();
    assert_eq!(export_to_sink(&session, &mut sink).unwrap(), 4);
    assert_eq!(sink.written, vec![(SALES_TABLE.to_string(), 4)]);
}

#[test]
fn export_without_upload_fails_before_touching_sink() {
    let session = Session::new();
    let mut sink = RecordingSink::default();
    assert!(matches!(
        export_to_sink(&session, &mut sink).unwrap_err(),
        InsightsError::PreconditionFailed(_)
    ));
    assert!(sink.written.is_empty());
}

#[test]
fn failed_export_leaves_session_intact() {
    let mut session = Session::new();
    session
        .upload(SALES_CSV.as_bytes(), "sales.csv", UTF_8)
        .unwrap();
    let before = session.require().unwrap().clone();
    let mut sink = RecordingSink {
        fail: true,
        ..RecordingSink::default()
    };
    assert!(matches!(
        export_to_sink(&session, &mut sink).unwrap_err(),
        InsightsError::Connection(_)
    ));
    assert_eq!(session.require().unwrap(), &before);
}

#[test]
fn unreachable_postgres_is_a_connection_error() {
    let mut session = Session::new();
    session
        .upload(SALES_CSV.as_bytes(), "sales.csv", UTF_8)
        .unwrap();
    let mut sink = PostgresSink::new(SinkConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        connect_timeout_secs: 5,
        ..SinkConfig::default()
    });
    let err = export_to_sink(&session, &mut sink).unwrap_err();
    assert!(matches!(err, InsightsError::Connection(_)), "{err:?}");
    assert_eq!(session.require().unwrap().row_count(), 4);
}
