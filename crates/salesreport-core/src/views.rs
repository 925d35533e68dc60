//! The report's chart and table sections. Each returns `None` when a prerequisite column
//! is missing, so a sparse dataset degrades section by section.

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{group_sum, AggregateTable};
use crate::chart::{Chart, ChartPoint};
use crate::error::Result;
use crate::filters::{distinct_regions, select_region};
use crate::schema::{has_columns, MONTH, MONTH_NAMES, PRODUCT, QUARTER, REGION, REVENUE};
use crate::table::TableView;

pub const PIE_START_ANGLE_DEG: f64 = 90.0;

/// One region's rows plus its monthly revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalDrilldown {
    pub region: String,
    pub options: Vec<String>,
    pub rows: TableView,
    pub monthly_revenue: Option<Chart>,
}

fn requires(df: &DataFrame, section: &str, columns: &[&str]) -> bool {
    let present = has_columns(df, columns);
    if !present {
        debug!(section, ?columns, "skipping section, prerequisite column missing");
    }
    present
}

fn points(pairs: Vec<(String, f64)>) -> Vec<ChartPoint> {
    pairs
        .into_iter()
        .map(|(label, value)| ChartPoint::new(label, value))
        .collect()
}

/// Revenue per quarter as a line chart. Quarter labels sort chronologically as text.
pub fn quarterly_revenue(df: &DataFrame) -> Result<Option<Chart>> {
    if !requires(df, "quarterly revenue", &[QUARTER, REVENUE]) {
        return Ok(None);
    }
    let table = group_sum(df, QUARTER)?;
    Ok(table.project(REVENUE).map(|pairs| {
        Chart::line("Quarterly Revenue Trends", "Quarter", "Revenue", points(pairs))
    }))
}

/// The `limit` best-selling products by revenue, highest first.
pub fn top_products(df: &DataFrame, limit: usize) -> Result<Option<Chart>> {
    if !requires(df, "top products", &[PRODUCT, REVENUE]) {
        return Ok(None);
    }
    let mut table = group_sum(df, PRODUCT)?;
    if !table.sort_descending_by(REVENUE) {
        return Ok(None);
    }
    table.truncate(limit);
    Ok(table.project(REVENUE).map(|pairs| {
        Chart::bar("Top Performing Products", PRODUCT, REVENUE, points(pairs))
    }))
}

/// Every region with all of its summed measures, highest revenue first.
pub fn top_regions(df: &DataFrame) -> Result<Option<AggregateTable>> {
    if !requires(df, "top regions", &[REGION, REVENUE]) {
        return Ok(None);
    }
    let mut table = group_sum(df, REGION)?;
    if !table.sort_descending_by(REVENUE) {
        return Ok(None);
    }
    Ok(Some(table))
}

/// Revenue per month with all twelve months in calendar order; absent months draw no bar.
pub fn monthly_revenue(df: &DataFrame) -> Result<Option<Chart>> {
    if !requires(df, "monthly revenue", &[MONTH, REVENUE]) {
        return Ok(None);
    }
    let table = group_sum(df, MONTH)?;
    let points = MONTH_NAMES
        .iter()
        .map(|month| match table.value(month, REVENUE) {
            Some(value) => ChartPoint::new(*month, value),
            None => ChartPoint::empty(*month),
        })
        .collect();
    Ok(Some(Chart::bar(
        "Monthly Revenue Trends",
        "Month",
        "Revenue",
        points,
    )))
}

/// Rows and monthly revenue for one region. An unknown or missing request falls back to
/// the first region in the data.
pub fn regional_drilldown(
    df: &DataFrame,
    requested: Option<&str>,
) -> Result<Option<RegionalDrilldown>> {
    let Some(options) = distinct_regions(df)? else {
        debug!("skipping regional analysis, no Region column");
        return Ok(None);
    };
    let Some(first) = options.first().cloned() else {
        return Ok(None);
    };

    let region = requested
        .filter(|wanted| options.iter().any(|option| option.as_str() == *wanted))
        .map(str::to_string)
        .unwrap_or(first);

    let subset = select_region(df, &region)?;
    let rows = TableView::from_frame(&subset)?;

    let monthly_revenue = if requires(&subset, "regional monthly revenue", &[MONTH, REVENUE]) {
        let mut table = group_sum(&subset, MONTH)?;
        table.sort_by_month();
        table.project(REVENUE).map(|pairs| {
            Chart::bar(
                &format!("Monthly Revenue in {region}"),
                "Month",
                "Revenue",
                points(pairs),
            )
        })
    } else {
        None
    };

    Ok(Some(RegionalDrilldown {
        region,
        options,
        rows,
        monthly_revenue,
    }))
}

/// Each region's share of revenue as a pie. Skipped when shares would be meaningless
/// (non-positive total or a negative region).
pub fn revenue_distribution(df: &DataFrame) -> Result<Option<Chart>> {
    if !requires(df, "revenue distribution", &[REGION, REVENUE]) {
        return Ok(None);
    }
    let table = group_sum(df, REGION)?;
    let Some(pairs) = table.project(REVENUE) else {
        return Ok(None);
    };

    let total: f64 = pairs.iter().map(|(_, value)| value).sum();
    if total <= 0.0 || pairs.iter().any(|(_, value)| *value < 0.0) {
        debug!(total, "skipping revenue distribution, shares undefined");
        return Ok(None);
    }

    Ok(Some(Chart::pie(
        "Revenue Distribution by Region",
        PIE_START_ANGLE_DEG,
        points(pairs),
    )))
}
