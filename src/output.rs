// src/output.rs

use std::io::Write;

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
//
use crate::{errors::Result, report::ReportOutput};

#[derive(Serialize)]
struct JsonReport<'a, T> {
    report: &'a str,
    rows: &'a [T],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

pub fn write_report<W: Write>(out: &mut W, output: &ReportOutput, format: OutputFormat) -> Result<()> {
    let kind = output.kind();

    match output {
        ReportOutput::RevenueByRegion(rows) => write_rows(out, kind.title(), kind.name(), rows, format),
        ReportOutput::TopProducts(rows) => write_rows(out, kind.title(), kind.name(), rows, format),
        ReportOutput::MonthlyTrend(rows) => write_rows(out, kind.title(), kind.name(), rows, format),
        ReportOutput::CategoryProfitability(rows) => write_rows(out, kind.title(), kind.name(), rows, format),
        ReportOutput::DiscountImpact(rows) => write_rows(out, kind.title(), kind.name(), rows, format),
        ReportOutput::SegmentBreakdown(rows) => write_rows(out, kind.title(), kind.name(), rows, format),
    }
}

fn write_rows<W, T>(out: &mut W, title: &str, name: &str, rows: &[T], format: OutputFormat) -> Result<()>
where
    W: Write,
    T: Serialize + Tabled,
{
    match format {
        OutputFormat::Table => {
            writeln!(out, "{}", title)?;
            if rows.is_empty() {
                writeln!(out, "(no rows)")?;
            } else {
                writeln!(out, "{}", Table::new(rows).with(Style::rounded()))?;
            }
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            writeln!(out, "# {}", name)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut *out);

            // header written by hand so empty reports still carry one
            writer.write_record(T::headers().iter().map(|header| header.to_string()))?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
            drop(writer);

            writeln!(out)?;
        }
        OutputFormat::Json => {
            let document = JsonReport { report: name, rows };
            serde_json::to_writer_pretty(&mut *out, &document)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
