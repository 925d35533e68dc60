use std::collections::BTreeSet;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calendar::canonicalize_dates;
use crate::error::{ReportWarning, Result};
use crate::schema::{has_column, int_values, text_values, REGION, YEAR};

/// Year and region selections for one render pass. An empty set means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub years: BTreeSet<i64>,
    pub regions: BTreeSet<String>,
}

impl FilterState {
    pub fn new(
        years: impl IntoIterator<Item = i64>,
        regions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            years: years.into_iter().collect(),
            regions: regions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty() && self.regions.is_empty()
    }
}

/// Choices offered by the filter controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub years: Vec<i64>,
    /// `None` when the dataset has no `Region` column.
    pub regions: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub df: DataFrame,
    pub warnings: Vec<ReportWarning>,
}

/// Narrows the dataset by year, then by region. Without a `Region` column the region
/// selection is ignored and a warning is returned instead. A narrowed frame has its
/// `Date` column re-rendered for the surviving rows.
pub fn apply_filters(df: &DataFrame, filters: &FilterState) -> Result<FilterOutcome> {
    let mut warnings = Vec::new();
    let mut output = filter_by_years(df, &filters.years)?;

    if has_column(&output, REGION) {
        output = filter_by_regions(&output, &filters.regions)?;
    } else {
        warnings.push(ReportWarning::missing_column(REGION, "region filter"));
    }

    if !filters.is_empty() {
        output = canonicalize_dates(&output)?;
    }

    Ok(FilterOutcome {
        df: output,
        warnings,
    })
}

pub fn filter_by_years(df: &DataFrame, years: &BTreeSet<i64>) -> Result<DataFrame> {
    if years.is_empty() {
        return Ok(df.clone());
    }
    let keep: Vec<bool> = int_values(df, YEAR)?
        .iter()
        .map(|year| year.is_some_and(|year| years.contains(&year)))
        .collect();
    Ok(df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?)
}

pub fn filter_by_regions(df: &DataFrame, regions: &BTreeSet<String>) -> Result<DataFrame> {
    if regions.is_empty() {
        return Ok(df.clone());
    }
    let keep: Vec<bool> = text_values(df, REGION)?
        .iter()
        .map(|region| region.as_ref().is_some_and(|region| regions.contains(region)))
        .collect();
    Ok(df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?)
}

/// Keeps rows whose `Region` equals `region` exactly.
pub fn select_region(df: &DataFrame, region: &str) -> Result<DataFrame> {
    let keep: Vec<bool> = text_values(df, REGION)?
        .iter()
        .map(|value| value.as_deref() == Some(region))
        .collect();
    Ok(df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?)
}

/// Distinct years in first-seen order.
pub fn distinct_years(df: &DataFrame) -> Result<Vec<i64>> {
    if !has_column(df, YEAR) {
        return Ok(Vec::new());
    }
    let mut seen = Vec::new();
    for year in int_values(df, YEAR)?.into_iter().flatten() {
        if !seen.contains(&year) {
            seen.push(year);
        }
    }
    Ok(seen)
}

/// Distinct non-null regions in first-seen order, or `None` without a `Region` column.
pub fn distinct_regions(df: &DataFrame) -> Result<Option<Vec<String>>> {
    if !has_column(df, REGION) {
        return Ok(None);
    }
    let mut seen: Vec<String> = Vec::new();
    for region in text_values(df, REGION)?.into_iter().flatten() {
        if !seen.contains(&region) {
            seen.push(region);
        }
    }
    Ok(Some(seen))
}

/// Year choices come from the full dataset; region choices from the year-filtered one.
pub fn filter_options(df: &DataFrame, filters: &FilterState) -> Result<FilterOptions> {
    let years = distinct_years(df)?;
    let regions = distinct_regions(&filter_by_years(df, &filters.years)?)?;
    Ok(FilterOptions { years, regions })
}
