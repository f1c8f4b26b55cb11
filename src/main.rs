// src/main.rs

pub mod config;
pub mod errors;
pub mod loader;
pub mod output;
pub mod queries;
pub mod record;
pub mod report;
pub mod rows;

use std::{io::Write, sync::Arc};

use anyhow::Context;
use futures::future::try_join_all;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
//
use crate::{
    config::Config,
    errors::{Result, RunnerError},
    record::SalesTable,
    report::{run_report, Precision, ReportKind, ReportOutput},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::new();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase())),
        )
        .with_writer(std::io::stderr)
        .init();

    // bad selectors surface before any data is read
    let reports = config.selected_reports()?;

    let path = config.input.clone();
    let options = config.load_options();
    let (table, summary) = tokio::task::spawn_blocking(move || loader::load_path(&path, &options))
        .await
        .context("loader task failed")?
        .with_context(|| format!("failed to load {}", config.input.display()))?;

    if !summary.rejected.is_empty() {
        info!(rejected = summary.rejected.len(), "malformed rows were skipped");
    }
    if table.is_empty() {
        warn!("no usable records, reports will be empty");
    }
    info!(records = table.len(), total_sales = table.total_sales(), "table ready");

    let outputs = run_reports(Arc::new(table), &reports, config.precision()).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for report_output in &outputs {
        output::write_report(&mut out, report_output, config.format)?;
    }
    out.flush()?;

    Ok(())
}

// each report gets its own blocking task over the shared read-only table
async fn run_reports(
    table: Arc<SalesTable>,
    reports: &[ReportKind],
    precision: Precision,
) -> Result<Vec<ReportOutput>> {
    let tasks = reports.iter().map(|&kind| {
        let table = Arc::clone(&table);

        async move {
            let output = tokio::task::spawn_blocking(move || run_report(kind, &table, &precision))
                .await
                .map_err(|err| RunnerError::Task(format!("{}: {}", kind, err)))?;

            info!(report = %kind, rows = output.len(), "report complete");

            Ok::<_, RunnerError>(output)
        }
    });

    try_join_all(tasks).await
}
