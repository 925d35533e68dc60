use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::schema::{float_values, has_column, PROFIT, REVENUE};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: f64,
    pub formatted: String,
}

impl Metric {
    pub fn currency(label: &str, value: f64) -> Self {
        Self {
            label: label.to_string(),
            value,
            formatted: format_currency(value),
        }
    }
}

/// `Total Revenue` and `Total Profit`, each present only when its column exists.
pub fn compute_metrics(df: &DataFrame) -> Result<Vec<Metric>> {
    let mut metrics = Vec::new();
    if let Some(total) = column_total(df, REVENUE)? {
        metrics.push(Metric::currency("Total Revenue", total));
    }
    if let Some(total) = column_total(df, PROFIT)? {
        metrics.push(Metric::currency("Total Profit", total));
    }
    Ok(metrics)
}

/// Sum of a column with nulls skipped; `None` when the column is absent.
pub fn column_total(df: &DataFrame, name: &str) -> Result<Option<f64>> {
    if !has_column(df, name) {
        return Ok(None);
    }
    Ok(Some(float_values(df, name)?.into_iter().flatten().sum()))
}

/// `$1,234.56`: thousands separators, two decimals, sign after the dollar sign.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, digit) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("${sign}{grouped}.{fraction}")
}
