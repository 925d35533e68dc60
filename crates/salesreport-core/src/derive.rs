use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::schema::{
    float_values, has_column, has_columns, int_values, COST, PROFIT, REVENUE, UNITS_SOLD,
    UNIT_PRICE,
};

/// Fills in `Revenue` and then `Profit` when they are absent and their inputs are present.
///
/// Each rule is independent: a missing prerequisite silently skips that column. `Profit`
/// sees a `Revenue` derived by the first rule. Integer inputs give an integer result.
pub fn derive_financial_fields(df: &DataFrame) -> Result<DataFrame> {
    let mut output = df.clone();

    if !has_column(&output, REVENUE) && has_columns(&output, &[UNITS_SOLD, UNIT_PRICE]) {
        let revenue = combine(&output, REVENUE, UNITS_SOLD, UNIT_PRICE, i64::checked_mul, |a, b| {
            a * b
        })?;
        output.with_column(revenue)?;
        debug!("derived Revenue from Units Sold x Unit Price");
    }

    if !has_column(&output, PROFIT) && has_columns(&output, &[COST, REVENUE]) {
        let profit = combine(&output, PROFIT, REVENUE, COST, i64::checked_sub, |a, b| a - b)?;
        output.with_column(profit)?;
        debug!("derived Profit from Revenue - Cost");
    }

    Ok(output)
}

/// Row-wise `left op right` into a new column named `target`; null when either side is null.
fn combine(
    df: &DataFrame,
    target: &str,
    left: &str,
    right: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Series> {
    let both_integer = [left, right]
        .iter()
        .all(|name| df.column(name).is_ok_and(|column| column.dtype().is_integer()));

    if both_integer {
        let values: Vec<Option<i64>> = int_values(df, left)?
            .into_iter()
            .zip(int_values(df, right)?)
            .map(|pair| match pair {
                (Some(a), Some(b)) => int_op(a, b),
                _ => None,
            })
            .collect();
        return Ok(Series::new(target.into(), values));
    }

    let values: Vec<Option<f64>> = float_values(df, left)?
        .into_iter()
        .zip(float_values(df, right)?)
        .map(|pair| match pair {
            (Some(a), Some(b)) => Some(float_op(a, b)),
            _ => None,
        })
        .collect();
    Ok(Series::new(target.into(), values))
}
