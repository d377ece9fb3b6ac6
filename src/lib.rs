pub mod chart;
pub mod clean;
pub mod cli;
pub mod columns;
pub mod data;
pub mod error;
pub mod export;
pub mod frame;
pub mod io_utils;
pub mod loader;
pub mod metrics;
pub mod report;
pub mod session;
pub mod sink;

use std::{env, io::Write, path::PathBuf, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    chart::{ChartData, ChartSpec},
    cli::{ChartArgs, Cli, Commands, InsightsArgs, LoadSqlArgs, SourceArgs, UploadArgs},
    metrics::SummaryMetrics,
    session::Session,
    sink::{PostgresSink, SALES_TABLE, SinkConfig},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sales_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Upload(args) => handle_upload(&args),
        Commands::Insights(args) => handle_insights(&args),
        Commands::LoadSql(args) => handle_load_sql(&args),
        Commands::Chart(args) => handle_chart(&args),
    }
}

/// One CLI invocation is one session: read the input, clean it and hold it.
fn open_session(source: &SourceArgs) -> Result<Session> {
    let encoding = io_utils::resolve_encoding(source.input_encoding.as_deref())?;
    let bytes = io_utils::read_input(&source.input)?;
    let file_name = source
        .input
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| source.input.display().to_string());
    debug!("Read {} byte(s) from {:?}", bytes.len(), source.input);

    let mut session = Session::new();
    session
        .upload(&bytes, &file_name, encoding)
        .with_context(|| format!("Loading {:?}", source.input))?;
    Ok(session)
}

fn handle_upload(args: &UploadArgs) -> Result<()> {
    let session = open_session(&args.source)?;
    let table = session.require()?;
    let output = match (&args.output, session.cleaned_file_name()) {
        (Some(path), _) => path.clone(),
        (None, Some(name)) => args.source.input.with_file_name(name),
        (None, None) => PathBuf::from("-"),
    };
    let to_stdout = io_utils::is_dash(&output);

    let writer = io_utils::open_output(Some(output.as_path()))?;
    let rows = export::write_csv(table, writer)
        .with_context(|| format!("Writing cleaned file {output:?}"))?;
    if !to_stdout {
        info!("File cleaned and stored: {rows} row(s) written to {output:?}");
        print!("{}", report::render_preview(table, args.rows));
    }
    Ok(())
}

fn handle_insights(args: &InsightsArgs) -> Result<()> {
    let session = open_session(&args.source)?;
    let table = session.require()?;
    if !table.has_column(columns::TOTAL) {
        bail!(
            "Please upload and clean data first: no '{}' column (needs '{}' and '{}')",
            columns::TOTAL,
            columns::ITEM_PRICE,
            columns::QUANTITY
        );
    }
    let metrics = SummaryMetrics::compute(table).context("Computing business insights")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print!("{}", report::render_metrics(&metrics));
    }
    Ok(())
}

fn handle_load_sql(args: &LoadSqlArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => SinkConfig::load(path)?,
        None => SinkConfig::default(),
    };
    if let Some(username) = &args.username {
        config.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }
    if let Some(database) = &args.database {
        config.database = database.clone();
    }
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(timeout) = args.connect_timeout {
        config.connect_timeout_secs = timeout;
    }

    let session = open_session(&args.source)?;
    let target = config.describe();
    info!("Loading cleaned data into '{SALES_TABLE}' on {target}");
    let mut postgres = PostgresSink::new(config);
    let rows = sink::export_to_sink(&session, &mut postgres)
        .with_context(|| format!("Loading into {target}"))?;
    println!("Data loaded into PostgreSQL successfully: {rows} row(s) in '{SALES_TABLE}'");
    Ok(())
}

#[derive(Serialize)]
struct ChartDocument<'a> {
    spec: &'a ChartSpec,
    data: &'a ChartData,
}

fn handle_chart(args: &ChartArgs) -> Result<()> {
    let session = open_session(&args.source)?;
    let table = session.require()?;
    let spec = ChartSpec::build(args.kind, &args.x, &args.y, table)?;
    let data = spec.resolve(table)?;
    debug!("Built {:?} chart '{}'", spec.kind, spec.title);

    let mut writer = io_utils::open_output(args.output.as_deref())?;
    serde_json::to_writer_pretty(
        &mut writer,
        &ChartDocument {
            spec: &spec,
            data: &data,
        },
    )
    .context("Writing chart JSON")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
