// src/record.rs

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SalesRecord {
    // identifiers
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    // order lifecycle
    pub order_date: NaiveDate,
    pub ship_date: NaiveDate,
    pub ship_mode: String,
    // customer and location
    pub customer_name: String,
    pub segment: String,
    pub country: String,
    pub city: String,
    pub state: String,
    pub region: String,
    // product
    pub category: String,
    pub sub_category: String,
    pub product_name: String,
    // figures
    pub sales: f64,
    pub quantity: u32,
    pub discount: f64,
    pub profit: f64,
}

impl SalesRecord {
    pub fn order_year_month(&self) -> (i32, u32) {
        (self.order_date.year(), self.order_date.month())
    }
}

/// Immutable record set a report runs over.
#[derive(Clone, Debug, Default)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_sales(&self) -> f64 {
        self.records.iter().map(|r| r.sales).sum()
    }
}

impl FromIterator<SalesRecord> for SalesTable {
    fn from_iter<I: IntoIterator<Item = SalesRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
