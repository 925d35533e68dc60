use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::schema::{float_values, int_values, text_values};

/// A DataFrame flattened to display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let columns: Vec<String> = df
            .get_columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect();

        let mut cells_by_column: Vec<Vec<String>> = Vec::with_capacity(columns.len());
        for column in df.get_columns() {
            let name = column.name().as_str();
            let cells: Vec<String> = match column.dtype() {
                DataType::Float32 | DataType::Float64 => float_values(df, name)?
                    .into_iter()
                    .map(|value| value.map(format_float).unwrap_or_default())
                    .collect(),
                dtype if dtype.is_integer() => int_values(df, name)?
                    .into_iter()
                    .map(|value| value.map(|v| v.to_string()).unwrap_or_default())
                    .collect(),
                _ => text_values(df, name)?
                    .into_iter()
                    .map(Option::unwrap_or_default)
                    .collect(),
            };
            cells_by_column.push(cells);
        }

        let rows = (0..df.height())
            .map(|row| {
                cells_by_column
                    .iter()
                    .map(|cells| cells[row].clone())
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// The first `rows` rows of `df`.
    pub fn head(df: &DataFrame, rows: usize) -> Result<Self> {
        Self::from_frame(&df.head(Some(rows)))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

pub fn format_float(value: f64) -> String {
    format!("{value:.2}")
}
