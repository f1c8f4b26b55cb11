// src/loader.rs

use std::{fs::File, io, path::Path};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use tracing::{debug, info, warn};
//
use crate::{
    errors::{MalformedRecord, Result, RunnerError},
    record::{SalesRecord, SalesTable},
};

const AUTO_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Columns every source must provide, after header normalization, with the
/// spelling variants accepted for each.
const REQUIRED_COLUMNS: [(&str, &[&str]); 19] = [
    ("order_id", &[]),
    ("order_date", &[]),
    ("ship_date", &[]),
    ("ship_mode", &[]),
    ("customer_id", &[]),
    ("customer_name", &["customer"]),
    ("segment", &[]),
    ("country", &[]),
    ("city", &[]),
    ("state", &[]),
    ("region", &[]),
    ("product_id", &[]),
    ("category", &[]),
    ("sub_category", &["subcategory"]),
    ("product_name", &["product"]),
    ("sales", &[]),
    ("quantity", &[]),
    ("discount", &[]),
    ("profit", &[]),
];

/// What to do with a row that fails validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LoadPolicy {
    /// Exclude the row, log it and keep going.
    #[default]
    Skip,
    /// Fail the whole load on the first bad row.
    Abort,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub policy: LoadPolicy,
    /// Explicit chrono format for both date columns; `None` tries ISO then US.
    pub date_format: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadSummary {
    pub rows_read: usize,
    pub rejected: Vec<MalformedRecord>,
}

// raw csv row, every field kept as text so failures can name the column
#[derive(Clone, Debug, Deserialize)]
struct SalesRow {
    order_id: String,
    order_date: String,
    ship_date: String,
    ship_mode: String,
    customer_id: String,
    #[serde(alias = "customer")]
    customer_name: String,
    segment: String,
    country: String,
    city: String,
    state: String,
    region: String,
    product_id: String,
    category: String,
    #[serde(alias = "subcategory")]
    sub_category: String,
    #[serde(alias = "product")]
    product_name: String,
    sales: String,
    quantity: String,
    discount: String,
    profit: String,
}

pub fn load_path(path: &Path, options: &LoadOptions) -> Result<(SalesTable, LoadSummary)> {
    info!(path = %path.display(), policy = ?options.policy, "loading sales data");

    let file = File::open(path)?;

    load_reader(file, options)
}

pub fn load_reader<R: io::Read>(
    reader: R,
    options: &LoadOptions,
) -> Result<(SalesTable, LoadSummary)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    // normalize headers so serde field names match regardless of spelling
    let headers: StringRecord = reader.headers()?.iter().map(normalize_header).collect();
    check_columns(&headers)?;
    reader.set_headers(headers);

    let mut records = Vec::new();
    let mut summary = LoadSummary::default();

    for (index, row) in reader.deserialize::<SalesRow>().enumerate() {
        let row_number = index + 1;
        summary.rows_read += 1;

        let parsed = match row {
            Ok(row) => row.into_record(row_number, options.date_format.as_deref()),
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => Err(MalformedRecord {
                row: row_number,
                field: "record",
                value: String::new(),
                reason: err.to_string(),
            }),
        };

        match parsed {
            Ok(record) => records.push(record),
            Err(malformed) => match options.policy {
                LoadPolicy::Abort => return Err(malformed.into()),
                LoadPolicy::Skip => {
                    warn!("skipping {}", malformed);
                    summary.rejected.push(malformed);
                }
            },
        }
    }

    info!(
        rows = summary.rows_read,
        loaded = records.len(),
        rejected = summary.rejected.len(),
        "sales data loaded"
    );

    Ok((SalesTable::new(records), summary))
}

/// Lowercases a header and collapses every run of non-alphanumerics into `_`.
pub fn normalize_header(header: &str) -> String {
    let mut normalized = String::with_capacity(header.len());
    let mut pending_separator = false;

    for ch in header.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !normalized.is_empty() {
                normalized.push('_');
            }
            pending_separator = false;
            normalized.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    normalized
}

fn check_columns(headers: &StringRecord) -> Result<()> {
    for (column, aliases) in REQUIRED_COLUMNS {
        let matches = headers
            .iter()
            .filter(|header| *header == column || aliases.iter().any(|alias| alias == header))
            .count();

        match matches {
            0 => return Err(RunnerError::MissingColumn { column }),
            1 => {}
            _ => return Err(RunnerError::DuplicateColumn { column }),
        }
    }

    debug!(columns = headers.len(), "all required columns present");

    Ok(())
}

impl SalesRow {
    fn into_record(
        self,
        row: usize,
        date_format: Option<&str>,
    ) -> std::result::Result<SalesRecord, MalformedRecord> {
        let order_id = required_text(row, "order_id", self.order_id)?;
        let order_date = parse_date(row, "order_date", &self.order_date, date_format)?;
        let ship_date = parse_date(row, "ship_date", &self.ship_date, date_format)?;
        let sales = parse_amount(row, "sales", &self.sales)?;
        let quantity = parse_quantity(row, &self.quantity)?;
        let discount = parse_amount(row, "discount", &self.discount)?;
        let profit = parse_amount(row, "profit", &self.profit)?;

        if ship_date < order_date {
            return Err(malformed(row, "ship_date", &self.ship_date, "ship date precedes order date"));
        }
        if sales < 0.0 {
            return Err(malformed(row, "sales", &self.sales, "sales must not be negative"));
        }
        if !(0.0..=1.0).contains(&discount) {
            return Err(malformed(row, "discount", &self.discount, "discount must lie in [0, 1]"));
        }
        if profit > sales {
            return Err(malformed(row, "profit", &self.profit, "profit exceeds sales"));
        }

        Ok(SalesRecord {
            order_id,
            customer_id: self.customer_id,
            product_id: self.product_id,
            order_date,
            ship_date,
            ship_mode: self.ship_mode,
            customer_name: self.customer_name,
            segment: self.segment,
            country: self.country,
            city: self.city,
            state: self.state,
            region: self.region,
            category: self.category,
            sub_category: self.sub_category,
            product_name: self.product_name,
            sales,
            quantity,
            discount,
            profit,
        })
    }
}

fn malformed(row: usize, field: &'static str, value: &str, reason: impl Into<String>) -> MalformedRecord {
    MalformedRecord {
        row,
        field,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn required_text(
    row: usize,
    field: &'static str,
    value: String,
) -> std::result::Result<String, MalformedRecord> {
    if value.is_empty() {
        return Err(malformed(row, field, &value, "value is missing"));
    }

    Ok(value)
}

fn parse_date(
    row: usize,
    field: &'static str,
    value: &str,
    date_format: Option<&str>,
) -> std::result::Result<NaiveDate, MalformedRecord> {
    let parsed = match date_format {
        Some(format) => NaiveDate::parse_from_str(value, format).ok(),
        None => AUTO_DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok()),
    };

    parsed.ok_or_else(|| malformed(row, field, value, "not a valid date"))
}

fn parse_amount(
    row: usize,
    field: &'static str,
    value: &str,
) -> std::result::Result<f64, MalformedRecord> {
    match value.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(malformed(row, field, value, "not a number")),
    }
}

fn parse_quantity(row: usize, value: &str) -> std::result::Result<u32, MalformedRecord> {
    match value.parse::<u32>() {
        Ok(quantity) if quantity > 0 => Ok(quantity),
        Ok(_) => Err(malformed(row, "quantity", value, "quantity must be positive")),
        Err(_) => Err(malformed(row, "quantity", value, "not a whole number")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const HEADER: &str = "Row ID,Order ID,Order Date,Ship Date,Ship Mode,Customer ID,Customer Name,Segment,Country,City,State,Postal Code,Region,Product ID,Category,Sub-Category,Product Name,Sales,Quantity,Discount,Profit";

    fn source(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    const GOOD_ROW: &str = "1,CA-2016-152156,11/8/2016,11/11/2016,Second Class,CG-12520,Claire Gute,Consumer,United States,Henderson,Kentucky,42420,South,FUR-BO-10001798,Furniture,Bookcases,Bush Somerset Collection Bookcase,261.96,2,0,41.9136";
    const SECOND_ROW: &str = "2,US-2015-108966,2015-10-11,2015-10-18,Standard Class,SO-20335,Sean O'Donnell,Consumer,United States,Fort Lauderdale,Florida,33311,South,FUR-TA-10000577,Furniture,Tables,Bretford CR4500 Series Slim Rectangular Table,957.5775,5,0.45,-383.031";
    const BAD_SALES_ROW: &str = "3,CA-2016-138688,6/12/2016,6/16/2016,Second Class,DV-13045,Darrin Van Huff,Corporate,United States,Los Angeles,California,90036,West,OFF-LA-10000240,Office Supplies,Labels,Self-Adhesive Address Labels,abc,2,0,6.8714";

    #[test]
    fn loads_rows_with_extra_columns_and_mixed_date_formats() {
        let text = source(&[GOOD_ROW, SECOND_ROW]);
        let (table, summary) = load_reader(text.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(summary.rows_read, 2);
        assert!(summary.rejected.is_empty());

        let first = &table.records()[0];
        assert_eq!(first.order_id, "CA-2016-152156");
        assert_eq!(first.order_date, NaiveDate::from_ymd_opt(2016, 11, 8).unwrap());
        assert_eq!(first.sub_category, "Bookcases");
        assert_eq!(first.quantity, 2);

        let second = &table.records()[1];
        assert_eq!(second.order_date, NaiveDate::from_ymd_opt(2015, 10, 11).unwrap());
        assert_eq!(second.discount, 0.45);
        assert_eq!(second.profit, -383.031);
    }

    #[test]
    fn columns_may_appear_in_any_order_and_spelling() {
        let text = "profit,quantity,discount,sales,product_name,SubCategory,category,product_id,region,state,city,country,segment,customer_name,customer_id,ship_mode,ship_date,order_date,ORDER-ID\n\
                    1.5,1,0.1,10,Pen,Art,Office Supplies,P1,East,NY,New York City,United States,Consumer,Ann,C1,First Class,2020-01-03,2020-01-01,O1";
        let (table, _) = load_reader(text.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].order_id, "O1");
        assert_eq!(table.records()[0].sub_category, "Art");
        assert_eq!(table.records()[0].sales, 10.0);
    }

    #[test]
    fn missing_column_fails_before_reading_rows() {
        let text = HEADER.replace(",Region", "");
        let err = load_reader(text.as_bytes(), &LoadOptions::default()).unwrap_err();

        assert!(matches!(err, RunnerError::MissingColumn { column: "region" }));
    }

    #[test]
    fn column_and_alias_together_fail_before_reading_rows() {
        let text = format!("{},Customer\n{},Claire", HEADER, GOOD_ROW);
        let err = load_reader(text.as_bytes(), &LoadOptions::default()).unwrap_err();

        assert!(matches!(
            err,
            RunnerError::DuplicateColumn { column: "customer_name" }
        ));

        let repeated = HEADER.replace(",Region", ",Region,REGION");
        let err = load_reader(repeated.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, RunnerError::DuplicateColumn { column: "region" }));
    }

    #[test]
    fn skip_policy_excludes_only_the_bad_row() {
        let text = source(&[GOOD_ROW, BAD_SALES_ROW, SECOND_ROW]);
        let (table, summary) = load_reader(text.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(summary.rows_read, 3);
        assert_eq!(summary.rejected.len(), 1);

        let rejected = &summary.rejected[0];
        assert_eq!(rejected.row, 2);
        assert_eq!(rejected.field, "sales");
        assert_eq!(rejected.value, "abc");
    }

    #[test]
    fn abort_policy_fails_on_first_bad_row() {
        let text = source(&[GOOD_ROW, BAD_SALES_ROW, SECOND_ROW]);
        let options = LoadOptions {
            policy: LoadPolicy::Abort,
            date_format: None,
        };

        match load_reader(text.as_bytes(), &options) {
            Err(RunnerError::MalformedRecord(malformed)) => {
                assert_eq!(malformed.row, 2);
                assert_eq!(malformed.field, "sales");
            }
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn rejects_missing_order_id_and_bad_dates() {
        let no_id = GOOD_ROW.replace("CA-2016-152156", "");
        let bad_date = SECOND_ROW.replace("2015-10-11", "someday");
        let text = source(&[&no_id, &bad_date]);
        let (table, summary) = load_reader(text.as_bytes(), &LoadOptions::default()).unwrap();

        assert!(table.is_empty());
        let fields: Vec<_> = summary.rejected.iter().map(|m| (m.row, m.field)).collect();
        assert_eq!(fields, vec![(1, "order_id"), (2, "order_date")]);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let high_discount = GOOD_ROW.replace(",2,0,41.9136", ",2,1.5,41.9136");
        let zero_quantity = GOOD_ROW.replace(",2,0,41.9136", ",0,0,41.9136");
        let shipped_early = GOOD_ROW.replace("11/11/2016", "11/1/2016");
        let inflated_profit = GOOD_ROW.replace(",2,0,41.9136", ",2,0,500");
        let short_row = "4,O-4,2020-01-01";
        let text = source(&[&high_discount, &zero_quantity, &shipped_early, &inflated_profit, short_row]);
        let (table, summary) = load_reader(text.as_bytes(), &LoadOptions::default()).unwrap();

        assert!(table.is_empty());
        let fields: Vec<_> = summary.rejected.iter().map(|m| m.field).collect();
        assert_eq!(fields, vec!["discount", "quantity", "ship_date", "profit", "record"]);
    }

    #[test]
    fn explicit_date_format_replaces_auto_detection() {
        let row = GOOD_ROW.replace("11/8/2016,11/11/2016", "08.11.2016,11.11.2016");
        let text = source(&[&row]);
        let options = LoadOptions {
            policy: LoadPolicy::Abort,
            date_format: Some("%d.%m.%Y".to_string()),
        };
        let (table, _) = load_reader(text.as_bytes(), &options).unwrap();

        assert_eq!(
            table.records()[0].order_date,
            NaiveDate::from_ymd_opt(2016, 11, 8).unwrap()
        );
    }

    #[test]
    fn loads_from_a_file_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", source(&[GOOD_ROW])).unwrap();

        let (table, _) = load_path(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn normalizes_header_spellings() {
        assert_eq!(normalize_header("Order ID"), "order_id");
        assert_eq!(normalize_header(" Sub-Category "), "sub_category");
        assert_eq!(normalize_header("ORDER--DATE"), "order_date");
        assert_eq!(normalize_header("profit"), "profit");
    }
}
