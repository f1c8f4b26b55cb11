// src/config.rs

use std::path::PathBuf;

use clap::Parser;
//
use crate::{
    errors::Result,
    loader::{LoadOptions, LoadPolicy},
    output::OutputFormat,
    queries::MAX_DECIMAL_PLACES,
    report::{Precision, ReportKind},
};

/// Every flag falls back to an environment variable, which a `.env` file may
/// provide.
#[derive(Clone, Debug, Parser)]
#[command(name = "superstore-reports")]
#[command(about = "Run business reports over a denormalized sales CSV")]
pub struct Config {
    /// Sales CSV to load
    #[arg(short, long, env = "SALES_DATA_PATH")]
    pub input: PathBuf,

    /// Reports to run, or "all"
    #[arg(short, long = "report", env = "SALES_REPORTS", value_delimiter = ',', default_value = "all")]
    pub reports: Vec<String>,

    /// What to do with malformed rows
    #[arg(long, env = "SALES_LOAD_POLICY", value_enum, default_value_t = LoadPolicy::Skip)]
    pub policy: LoadPolicy,

    /// chrono format for order and ship dates (defaults to ISO, then m/d/Y)
    #[arg(long, env = "SALES_DATE_FORMAT")]
    pub date_format: Option<String>,

    /// Decimal places for currency and margins
    #[arg(
        long,
        env = "SALES_CURRENCY_PRECISION",
        default_value_t = 2,
        value_parser = clap::value_parser!(u32).range(0..=MAX_DECIMAL_PLACES as i64)
    )]
    pub currency_precision: u32,

    /// Decimal places for average discount percentages
    #[arg(
        long,
        env = "SALES_PERCENT_PRECISION",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(0..=MAX_DECIMAL_PLACES as i64)
    )]
    pub percent_precision: u32,

    #[arg(short, long, env = "SALES_OUTPUT_FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "SALES_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn new() -> Self {
        // a missing .env is fine, real env vars still apply
        dotenv::dotenv().ok();

        Self::parse()
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            policy: self.policy,
            date_format: self.date_format.clone(),
        }
    }

    pub fn precision(&self) -> Precision {
        Precision {
            currency: self.currency_precision,
            percent: self.percent_precision,
        }
    }

    pub fn selected_reports(&self) -> Result<Vec<ReportKind>> {
        ReportKind::parse_selection(&self.reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_options() {
        let config = Config::try_parse_from([
            "superstore-reports",
            "--input",
            "sales.csv",
            "--report",
            "top-products,monthly-trend",
            "--policy",
            "abort",
            "--currency-precision",
            "3",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(config.input, PathBuf::from("sales.csv"));
        assert_eq!(
            config.selected_reports().unwrap(),
            vec![ReportKind::TopProducts, ReportKind::MonthlyTrend]
        );
        assert_eq!(config.load_options().policy, LoadPolicy::Abort);
        assert_eq!(config.precision(), Precision { currency: 3, percent: 1 });
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn precision_flags_are_bounded() {
        let too_fine = Config::try_parse_from([
            "superstore-reports",
            "-i",
            "sales.csv",
            "--currency-precision",
            "400",
        ]);
        assert!(too_fine.is_err());

        let config = Config::try_parse_from([
            "superstore-reports",
            "-i",
            "sales.csv",
            "--percent-precision",
            "12",
        ])
        .unwrap();
        assert_eq!(config.precision().percent, 12);
    }

    #[test]
    fn unknown_report_is_rejected_at_selection() {
        let config =
            Config::try_parse_from(["superstore-reports", "-i", "sales.csv", "-r", "forecast"])
                .unwrap();

        assert!(config.selected_reports().is_err());
    }
}
