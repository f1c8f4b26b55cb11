// src/rows.rs

use serde::Serialize;
use tabled::Tabled;

#[derive(Clone, Debug, PartialEq, Serialize, Tabled)]
pub struct RegionRevenue {
    pub region: String,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub profit_margin: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Tabled)]
pub struct ProductRevenue {
    pub product_name: String,
    pub category: String,
    pub sub_category: String,
    pub total_revenue: f64,
    pub units_sold: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Tabled)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub revenue: f64,
    // same month, previous year present in the data
    #[tabled(display_with = "display_optional")]
    pub prev_year_revenue: Option<f64>,
    #[tabled(display_with = "display_optional")]
    pub yoy_growth_pct: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Tabled)]
pub struct CategoryProfitability {
    pub category: String,
    pub sub_category: String,
    pub order_count: u64,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub avg_discount_pct: f64,
    pub profit_margin: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Tabled)]
pub struct DiscountImpact {
    pub discount_band: String,
    pub order_count: u64,
    pub avg_profit: f64,
    pub total_profit: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Tabled)]
pub struct SegmentBreakdown {
    pub segment: String,
    pub unique_customers: u64,
    pub order_count: u64,
    pub total_revenue: f64,
    pub avg_order_value: f64,
    pub profit_margin: f64,
}

fn display_optional(value: &Option<f64>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}
