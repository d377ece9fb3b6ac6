//! Relational sink for the cleaned table.
//!
//! The destination table is dropped and recreated on every load; nothing is
//! appended or migrated. Column types are picked from the cell contents.

use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sqlx::{
    Connection, PgConnection, Postgres,
    postgres::{PgArguments, PgConnectOptions},
    query::Query,
};

use crate::{
    data::Cell,
    error::{InsightsError, Result},
    frame::{CleanTable, Column},
    session::Session,
};

pub const SALES_TABLE: &str = "ecommerce_sales";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub username: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
    pub connect_timeout_secs: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            username: "postgres".to_string(),
            password: String::new(),
            database: "ecommercedb".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            connect_timeout_secs: 10,
        }
    }
}

impl SinkConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening sink config {path:?}"))?;
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing sink config {path:?}"))
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
    }

    /// Connection target without the password, for log lines.
    pub fn describe(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

/// Destination that can take a whole table, replacing any previous contents.
pub trait TableSink {
    /// Returns the number of rows written.
    fn replace_table(&mut self, name: &str, table: &CleanTable) -> Result<usize>;
}

/// Sends the session's table to `sink` under [`SALES_TABLE`]. The session is
/// only read.
pub fn export_to_sink(session: &Session, sink: &mut dyn TableSink) -> Result<usize> {
    let table = session.require()?;
    sink.replace_table(SALES_TABLE, table)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    DoublePrecision,
    Timestamp,
    Text,
}

impl SqlType {
    pub fn for_column(column: &Column) -> Self {
        let values = column.values();
        if values.is_empty() {
            SqlType::Text
        } else if values.iter().all(|cell| matches!(cell, Cell::Number(_))) {
            SqlType::DoublePrecision
        } else if values.iter().all(|cell| matches!(cell, Cell::DateTime(_))) {
            SqlType::Timestamp
        } else {
            SqlType::Text
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::DoublePrecision => "DOUBLE PRECISION",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Text => "TEXT",
        }
    }
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn drop_table_sql(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(name))
}

pub fn create_table_sql(name: &str, table: &CleanTable) -> String {
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            format!(
                "{} {}",
                quote_identifier(column.name()),
                SqlType::for_column(column).as_sql()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({columns})", quote_identifier(name))
}

pub fn insert_sql(name: &str, table: &CleanTable) -> String {
    if table.column_count() == 0 {
        return format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(name));
    }
    let columns = table
        .columns()
        .iter()
        .map(|column| quote_identifier(column.name()))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=table.column_count())
        .map(|idx| format!("${idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders})",
        quote_identifier(name)
    )
}

/// PostgreSQL destination. Each call opens one connection, writes inside a
/// single transaction and closes it again.
#[derive(Debug, Clone)]
pub struct PostgresSink {
    config: SinkConfig,
}

impl PostgresSink {
    pub fn new(config: SinkConfig) -> Self {
        Self { config }
    }

    async fn connect(&self) -> Result<PgConnection> {
        let timeout = Duration::from_secs(self.config.connect_timeout_secs);
        let options = self.config.connect_options();
        match tokio::time::timeout(timeout, PgConnection::connect_with(&options)).await {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(err)) => Err(InsightsError::Connection(err.to_string())),
            Err(_) => Err(InsightsError::Connection(format!(
                "timed out after {}s connecting to {}",
                self.config.connect_timeout_secs,
                self.config.describe()
            ))),
        }
    }

    async fn write(&self, name: &str, table: &CleanTable) -> Result<usize> {
        let mut conn = self.connect().await?;
        debug!("Connected to {}", self.config.describe());
        let written = write_table(&mut conn, name, table)
            .await
            .map_err(|err| InsightsError::Write(err.to_string()))?;
        if let Err(err) = conn.close().await {
            debug!("Closing connection failed: {err}");
        }
        Ok(written)
    }
}

impl TableSink for PostgresSink {
    fn replace_table(&mut self, name: &str, table: &CleanTable) -> Result<usize> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| InsightsError::Connection(err.to_string()))?;
        let written = runtime.block_on(self.write(name, table))?;
        info!(
            "Replaced table '{}' on {} with {} row(s)",
            name,
            self.config.describe(),
            written
        );
        Ok(written)
    }
}

async fn write_table(
    conn: &mut PgConnection,
    name: &str,
    table: &CleanTable,
) -> std::result::Result<usize, sqlx::Error> {
    let types = table
        .columns()
        .iter()
        .map(SqlType::for_column)
        .collect::<Vec<_>>();
    let drop = drop_table_sql(name);
    let create = create_table_sql(name, table);
    let insert = insert_sql(name, table);

    let mut tx = conn.begin().await?;
    sqlx::query(&drop).execute(&mut *tx).await?;
    sqlx::query(&create).execute(&mut *tx).await?;
    for row in table.rows() {
        let mut query = sqlx::query(&insert);
        for (cell, ty) in row.into_iter().zip(&types) {
            query = bind_cell(query, cell, *ty);
        }
        query.execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(table.row_count())
}

fn bind_cell<'q>(
    query: Query<'q, Postgres, PgArguments>,
    cell: &Cell,
    ty: SqlType,
) -> Query<'q, Postgres, PgArguments> {
    match ty {
        SqlType::DoublePrecision => query.bind(cell.as_number()),
        SqlType::Timestamp => query.bind(cell.as_datetime()),
        SqlType::Text => query.bind(match cell {
            Cell::Empty => None,
            other => Some(other.as_display()),
        }),
    }
}
