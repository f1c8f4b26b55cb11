// src/queries.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
//
use crate::{
    record::{SalesRecord, SalesTable},
    report::Precision,
    rows::{
        CategoryProfitability, DiscountImpact, MonthlyRevenue, ProductRevenue, RegionRevenue,
        SegmentBreakdown,
    },
};

const TOP_PRODUCTS_LIMIT: usize = 10;

/// Most decimal places a figure is rounded to.
pub const MAX_DECIMAL_PLACES: u32 = 12;

#[derive(Clone, Copy, Debug, Default)]
struct Totals {
    count: u64,
    sales: f64,
    profit: f64,
    quantity: u64,
    discount: f64,
}

impl Totals {
    fn add(&mut self, record: &SalesRecord) {
        self.count += 1;
        self.sales += record.sales;
        self.profit += record.profit;
        self.quantity += u64::from(record.quantity);
        self.discount += record.discount;
    }

    fn margin(&self) -> f64 {
        margin(self.profit, self.sales)
    }
}

/// Discount ranges, upper bounds inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiscountBand {
    NoDiscount,
    UpTo10,
    UpTo20,
    UpTo30,
    Over30,
}

impl DiscountBand {
    pub fn for_discount(discount: f64) -> Self {
        if discount <= 0.0 {
            DiscountBand::NoDiscount
        } else if discount <= 0.10 {
            DiscountBand::UpTo10
        } else if discount <= 0.20 {
            DiscountBand::UpTo20
        } else if discount <= 0.30 {
            DiscountBand::UpTo30
        } else {
            DiscountBand::Over30
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DiscountBand::NoDiscount => "No Discount",
            DiscountBand::UpTo10 => "1-10%",
            DiscountBand::UpTo20 => "11-20%",
            DiscountBand::UpTo30 => "21-30%",
            DiscountBand::Over30 => "Over 30%",
        }
    }
}

/// Profit as a percentage of sales; 0 when there are no sales.
pub fn margin(profit: f64, sales: f64) -> f64 {
    if sales == 0.0 {
        return 0.0;
    }

    100.0 * profit / sales
}

pub fn mean(total: f64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }

    total / count as f64
}

/// Rounds half away from zero on the shortest decimal form of `value`, so
/// 1.005 becomes 1.01 the way a SQL `ROUND` over NUMERIC does.
pub fn round_to(value: f64, places: u32) -> f64 {
    let places = places.min(MAX_DECIMAL_PLACES);

    let rounded = value
        .to_string()
        .parse::<Decimal>()
        .ok()
        .and_then(|decimal| {
            decimal
                .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
                .to_f64()
        })
        .unwrap_or_else(|| {
            // out of Decimal range, fall back to float rounding
            let factor = 10f64.powi(places as i32);
            (value * factor).round() / factor
        });

    // avoid rendering -0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

// group by key, then order by metric descending; BTreeMap order breaks ties
fn ranked<K: Ord, F>(groups: BTreeMap<K, Totals>, metric: F) -> Vec<(K, Totals)>
where
    F: Fn(&Totals) -> f64,
{
    let mut ranked: Vec<(K, Totals)> = groups.into_iter().collect();
    ranked.sort_by(|(_, a), (_, b)| metric(b).total_cmp(&metric(a)));
    ranked
}

pub fn revenue_by_region(table: &SalesTable, precision: &Precision) -> Vec<RegionRevenue> {
    let mut groups: BTreeMap<&str, Totals> = BTreeMap::new();
    for record in table.records() {
        groups.entry(record.region.as_str()).or_default().add(record);
    }

    ranked(groups, |totals| totals.sales)
        .into_iter()
        .map(|(region, totals)| RegionRevenue {
            region: region.to_string(),
            total_revenue: round_to(totals.sales, precision.currency),
            total_profit: round_to(totals.profit, precision.currency),
            profit_margin: round_to(totals.margin(), precision.currency),
        })
        .collect()
}

pub fn top_products(table: &SalesTable, precision: &Precision) -> Vec<ProductRevenue> {
    let mut groups: BTreeMap<(&str, &str, &str), Totals> = BTreeMap::new();
    for record in table.records() {
        let key = (
            record.product_name.as_str(),
            record.category.as_str(),
            record.sub_category.as_str(),
        );
        groups.entry(key).or_default().add(record);
    }

    ranked(groups, |totals| totals.sales)
        .into_iter()
        .take(TOP_PRODUCTS_LIMIT)
        .map(|((product_name, category, sub_category), totals)| ProductRevenue {
            product_name: product_name.to_string(),
            category: category.to_string(),
            sub_category: sub_category.to_string(),
            total_revenue: round_to(totals.sales, precision.currency),
            units_sold: totals.quantity,
        })
        .collect()
}

pub fn monthly_trend(table: &SalesTable, precision: &Precision) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in table.records() {
        *months.entry(record.order_year_month()).or_default() += record.sales;
    }

    // walking in (year, month) order leaves the latest earlier year per month here
    let mut previous: HashMap<u32, f64> = HashMap::new();

    months
        .into_iter()
        .map(|((year, month), revenue)| {
            let prev = previous.insert(month, revenue);
            let growth = match prev {
                Some(prev) if prev != 0.0 => Some(100.0 * (revenue - prev) / prev),
                _ => None,
            };

            MonthlyRevenue {
                year,
                month,
                revenue: round_to(revenue, precision.currency),
                prev_year_revenue: prev.map(|prev| round_to(prev, precision.currency)),
                yoy_growth_pct: growth.map(|growth| round_to(growth, precision.currency)),
            }
        })
        .collect()
}

pub fn category_profitability(
    table: &SalesTable,
    precision: &Precision,
) -> Vec<CategoryProfitability> {
    let mut groups: BTreeMap<(&str, &str), Totals> = BTreeMap::new();
    for record in table.records() {
        let key = (record.category.as_str(), record.sub_category.as_str());
        groups.entry(key).or_default().add(record);
    }

    ranked(groups, Totals::margin)
        .into_iter()
        .map(|((category, sub_category), totals)| CategoryProfitability {
            category: category.to_string(),
            sub_category: sub_category.to_string(),
            order_count: totals.count,
            total_revenue: round_to(totals.sales, precision.currency),
            total_profit: round_to(totals.profit, precision.currency),
            avg_discount_pct: round_to(
                100.0 * mean(totals.discount, totals.count),
                precision.percent,
            ),
            profit_margin: round_to(totals.margin(), precision.currency),
        })
        .collect()
}

pub fn discount_impact(table: &SalesTable, precision: &Precision) -> Vec<DiscountImpact> {
    let mut groups: BTreeMap<DiscountBand, Totals> = BTreeMap::new();
    for record in table.records() {
        groups
            .entry(DiscountBand::for_discount(record.discount))
            .or_default()
            .add(record);
    }

    ranked(groups, |totals| mean(totals.profit, totals.count))
        .into_iter()
        .map(|(band, totals)| DiscountImpact {
            discount_band: band.label().to_string(),
            order_count: totals.count,
            avg_profit: round_to(mean(totals.profit, totals.count), precision.currency),
            total_profit: round_to(totals.profit, precision.currency),
        })
        .collect()
}

pub fn segment_breakdown(table: &SalesTable, precision: &Precision) -> Vec<SegmentBreakdown> {
    let mut groups: BTreeMap<&str, Totals> = BTreeMap::new();
    let mut customers: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for record in table.records() {
        groups.entry(record.segment.as_str()).or_default().add(record);
        customers
            .entry(record.segment.as_str())
            .or_default()
            .insert(record.customer_id.as_str());
    }

    ranked(groups, |totals| totals.sales)
        .into_iter()
        .map(|(segment, totals)| SegmentBreakdown {
            segment: segment.to_string(),
            unique_customers: customers.get(segment).map_or(0, |ids| ids.len() as u64),
            order_count: totals.count,
            total_revenue: round_to(totals.sales, precision.currency),
            avg_order_value: round_to(mean(totals.sales, totals.count), precision.currency),
            profit_margin: round_to(totals.margin(), precision.currency),
        })
        .collect()
}
