use polars::prelude::{DataFrame, DataType, PolarsResult};

pub const DATE: &str = "Date";
pub const MONTH: &str = "Month";
pub const QUARTER: &str = "Quarter";
pub const YEAR: &str = "Year";
pub const UNITS_SOLD: &str = "Units Sold";
pub const UNIT_PRICE: &str = "Unit Price";
pub const COST: &str = "Cost";
pub const REVENUE: &str = "Revenue";
pub const PROFIT: &str = "Profit";
pub const PRODUCT: &str = "Product";
pub const REGION: &str = "Region";

/// Calendar order used by every month-keyed output.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

pub fn has_columns(df: &DataFrame, names: &[&str]) -> bool {
    names.iter().all(|name| has_column(df, name))
}

pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Numeric columns that are summed by aggregate views. `Year` is a grouping key, not a measure.
pub fn measure_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|column| is_numeric(column.dtype()) && column.name().as_str() != YEAR)
        .map(|column| column.name().to_string())
        .collect()
}

pub fn month_index(name: &str) -> Option<usize> {
    MONTH_NAMES.iter().position(|month| *month == name)
}

pub(crate) fn text_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

pub(crate) fn float_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

pub(crate) fn int_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_iter().collect())
}
