// src/report.rs

use std::{fmt, str::FromStr};

use tracing::debug;
//
use crate::{
    errors::{Result, RunnerError},
    queries,
    record::SalesTable,
    rows::{
        CategoryProfitability, DiscountImpact, MonthlyRevenue, ProductRevenue, RegionRevenue,
        SegmentBreakdown,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportKind {
    RevenueByRegion,
    TopProducts,
    MonthlyTrend,
    CategoryProfitability,
    DiscountImpact,
    SegmentBreakdown,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::RevenueByRegion,
        ReportKind::TopProducts,
        ReportKind::MonthlyTrend,
        ReportKind::CategoryProfitability,
        ReportKind::DiscountImpact,
        ReportKind::SegmentBreakdown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::RevenueByRegion => "revenue-by-region",
            ReportKind::TopProducts => "top-products",
            ReportKind::MonthlyTrend => "monthly-trend",
            ReportKind::CategoryProfitability => "category-profitability",
            ReportKind::DiscountImpact => "discount-impact",
            ReportKind::SegmentBreakdown => "segment-breakdown",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::RevenueByRegion => "Revenue by Region",
            ReportKind::TopProducts => "Top 10 Products by Revenue",
            ReportKind::MonthlyTrend => "Monthly Revenue Trend",
            ReportKind::CategoryProfitability => "Category Profitability",
            ReportKind::DiscountImpact => "Discount Impact on Profit",
            ReportKind::SegmentBreakdown => "Customer Segment Breakdown",
        }
    }

    // resolve selectors in order, expanding "all" and dropping repeats
    pub fn parse_selection<S: AsRef<str>>(names: &[S]) -> Result<Vec<ReportKind>> {
        let mut selected: Vec<ReportKind> = Vec::new();

        for name in names {
            let name = name.as_ref().trim();
            let kinds = if name.eq_ignore_ascii_case("all") {
                ReportKind::ALL.to_vec()
            } else {
                vec![name.parse::<ReportKind>()?]
            };

            for kind in kinds {
                if !selected.contains(&kind) {
                    selected.push(kind);
                }
            }
        }

        if selected.is_empty() {
            selected = ReportKind::ALL.to_vec();
        }

        Ok(selected)
    }
}

impl FromStr for ReportKind {
    type Err = RunnerError;

    fn from_str(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");

        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| RunnerError::UnknownReport {
                name: name.to_string(),
                expected: ReportKind::ALL.map(|kind| kind.name()).join(", "),
            })
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decimal places applied to report figures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Precision {
    /// Currency amounts and margin percentages.
    pub currency: u32,
    /// Average discount percentage.
    pub percent: u32,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            currency: 2,
            percent: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReportOutput {
    RevenueByRegion(Vec<RegionRevenue>),
    TopProducts(Vec<ProductRevenue>),
    MonthlyTrend(Vec<MonthlyRevenue>),
    CategoryProfitability(Vec<CategoryProfitability>),
    DiscountImpact(Vec<DiscountImpact>),
    SegmentBreakdown(Vec<SegmentBreakdown>),
}

impl ReportOutput {
    pub fn kind(&self) -> ReportKind {
        match self {
            ReportOutput::RevenueByRegion(_) => ReportKind::RevenueByRegion,
            ReportOutput::TopProducts(_) => ReportKind::TopProducts,
            ReportOutput::MonthlyTrend(_) => ReportKind::MonthlyTrend,
            ReportOutput::CategoryProfitability(_) => ReportKind::CategoryProfitability,
            ReportOutput::DiscountImpact(_) => ReportKind::DiscountImpact,
            ReportOutput::SegmentBreakdown(_) => ReportKind::SegmentBreakdown,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReportOutput::RevenueByRegion(rows) => rows.len(),
            ReportOutput::TopProducts(rows) => rows.len(),
            ReportOutput::MonthlyTrend(rows) => rows.len(),
            ReportOutput::CategoryProfitability(rows) => rows.len(),
            ReportOutput::DiscountImpact(rows) => rows.len(),
            ReportOutput::SegmentBreakdown(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn run_report(kind: ReportKind, table: &SalesTable, precision: &Precision) -> ReportOutput {
    let output = match kind {
        ReportKind::RevenueByRegion => {
            ReportOutput::RevenueByRegion(queries::revenue_by_region(table, precision))
        }
        ReportKind::TopProducts => ReportOutput::TopProducts(queries::top_products(table, precision)),
        ReportKind::MonthlyTrend => {
            ReportOutput::MonthlyTrend(queries::monthly_trend(table, precision))
        }
        ReportKind::CategoryProfitability => {
            ReportOutput::CategoryProfitability(queries::category_profitability(table, precision))
        }
        ReportKind::DiscountImpact => {
            ReportOutput::DiscountImpact(queries::discount_impact(table, precision))
        }
        ReportKind::SegmentBreakdown => {
            ReportOutput::SegmentBreakdown(queries::segment_breakdown(table, precision))
        }
    };

    debug!(report = %kind, rows = output.len(), "report finished");

    output
}
