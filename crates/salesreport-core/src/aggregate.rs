use std::cmp::Ordering;

use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::schema::{float_values, measure_columns, month_index, text_values};
use crate::table::{format_float, TableView};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub values: Vec<f64>,
}

/// A grouped-and-summed projection: one row per distinct key, one value per measure column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub key_column: String,
    pub value_columns: Vec<String>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn value_index(&self, column: &str) -> Option<usize> {
        self.value_columns.iter().position(|name| name == column)
    }

    /// `(key, value)` pairs for one measure, in row order.
    pub fn project(&self, column: &str) -> Option<Vec<(String, f64)>> {
        let idx = self.value_index(column)?;
        Some(
            self.rows
                .iter()
                .map(|row| (row.key.clone(), row.values[idx]))
                .collect(),
        )
    }

    pub fn value(&self, key: &str, column: &str) -> Option<f64> {
        let idx = self.value_index(column)?;
        self.rows
            .iter()
            .find(|row| row.key == key)
            .map(|row| row.values[idx])
    }

    /// Stable descending sort on one measure. Returns `false` if the column is unknown.
    pub fn sort_descending_by(&mut self, column: &str) -> bool {
        let Some(idx) = self.value_index(column) else {
            return false;
        };
        self.rows.sort_by(|a, b| {
            b.values[idx]
                .partial_cmp(&a.values[idx])
                .unwrap_or(Ordering::Equal)
        });
        true
    }

    /// Reorders rows into calendar month order; keys that are not month names go last.
    pub fn sort_by_month(&mut self) {
        self.rows
            .sort_by_key(|row| month_index(&row.key).unwrap_or(usize::MAX));
    }

    pub fn truncate(&mut self, len: usize) {
        self.rows.truncate(len);
    }

    pub fn to_table_view(&self) -> TableView {
        let mut columns = Vec::with_capacity(self.value_columns.len() + 1);
        columns.push(self.key_column.clone());
        columns.extend(self.value_columns.iter().cloned());

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(row.values.len() + 1);
                cells.push(row.key.clone());
                cells.extend(row.values.iter().map(|value| format_float(*value)));
                cells
            })
            .collect();

        TableView { columns, rows }
    }
}

/// Groups by `key` (null keys dropped, groups ascending by key) and sums every numeric
/// measure column. Nulls contribute nothing to a sum.
pub fn group_sum(df: &DataFrame, key: &str) -> Result<AggregateTable> {
    let measures: Vec<String> = measure_columns(df)
        .into_iter()
        .filter(|name| name != key)
        .collect();
    let aggregations: Vec<Expr> = measures.iter().map(|name| col(name.as_str()).sum()).collect();

    let grouped = df
        .clone()
        .lazy()
        .filter(col(key).is_not_null())
        .group_by([col(key)])
        .agg(aggregations)
        .sort([key], SortMultipleOptions::default())
        .collect()?;

    let keys = text_values(&grouped, key)?;
    let mut columns = Vec::with_capacity(measures.len());
    for name in &measures {
        columns.push(float_values(&grouped, name)?);
    }

    let rows = keys
        .into_iter()
        .enumerate()
        .map(|(idx, key)| AggregateRow {
            key: key.unwrap_or_default(),
            values: columns
                .iter()
                .map(|values| values[idx].unwrap_or(0.0))
                .collect(),
        })
        .collect();

    Ok(AggregateTable {
        key_column: key.to_string(),
        value_columns: measures,
        rows,
    })
}
