use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::chart::ChartKind;

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean sales exports and report business insights", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean a sales export and write `<name>_cleaned.csv`
    Upload(UploadArgs),
    /// Show total sales, order counts, top performers and the monthly trend
    Insights(InsightsArgs),
    /// Replace the `ecommerce_sales` table in PostgreSQL with the cleaned data
    LoadSql(LoadSqlArgs),
    /// Describe a line, bar or pie chart over two columns as JSON
    Chart(ChartArgs),
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Sales export to read (.csv, .xlsx, .xls or tab-separated .txt)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Character encoding of delimited input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Destination for the cleaned CSV (`-` for stdout); defaults to
    /// `<name>_cleaned.csv` next to the input
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Number of cleaned rows to preview
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct InsightsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Emit the metrics as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct LoadSqlArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// YAML file with username, password, database, host, port and connect_timeout_secs
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// PostgreSQL user name [default: postgres]
    #[arg(long)]
    pub username: Option<String>,
    /// PostgreSQL password
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Database name [default: ecommercedb]
    #[arg(long)]
    pub database: Option<String>,
    /// Database host [default: localhost]
    #[arg(long)]
    pub host: Option<String>,
    /// Database port [default: 5432]
    #[arg(long)]
    pub port: Option<u16>,
    /// Seconds to wait for the connection before giving up [default: 10]
    #[arg(long = "connect-timeout")]
    pub connect_timeout: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Chart type
    #[arg(long, value_enum)]
    pub kind: ChartKind,
    /// Column for the x axis (slice labels for pie charts)
    #[arg(short = 'x', long = "x-axis")]
    pub x: String,
    /// Column for the y axis (slice values for pie charts)
    #[arg(short = 'y', long = "y-axis")]
    pub y: String,
    /// Write the chart JSON here instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}
