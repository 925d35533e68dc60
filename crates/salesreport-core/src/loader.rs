use csv::{ReaderBuilder, StringRecord};
use polars::prelude::*;

use crate::error::{ReportError, Result};
use crate::schema::DATE;

/// Cell spellings read as missing values.
const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

#[derive(Debug, Clone, PartialEq)]
enum ColumnValues {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

/// Parses uploaded CSV bytes into a DataFrame, typing each column from its cells.
///
/// Rows shorter than the header are padded with nulls; rows longer than the header,
/// invalid UTF-8 and a missing header row are format errors.
pub fn load_csv(content: &[u8]) -> Result<DataFrame> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|err| ReportError::format(err.to_string()))?
        .clone();
    let names = header_names(&headers)?;

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| ReportError::format(err.to_string()))?;
        if record.len() > names.len() {
            return Err(ReportError::format(format!(
                "expected {} fields in line {}, saw {}",
                names.len(),
                record
                    .position()
                    .map(|pos| pos.line())
                    .unwrap_or(idx as u64 + 2),
                record.len()
            )));
        }
        for (column, values) in cells.iter_mut().enumerate() {
            values.push(record.get(column).and_then(clean_cell));
        }
    }

    let mut columns: Vec<Column> = Vec::with_capacity(names.len());
    for (name, values) in names.iter().zip(cells) {
        let typed = if name == DATE {
            ColumnValues::Text(values)
        } else {
            infer_column(values)
        };
        columns.push(into_column(name, typed));
    }

    Ok(DataFrame::new(columns)?)
}

fn header_names(headers: &StringRecord) -> Result<Vec<String>> {
    if headers.is_empty() || headers.iter().all(|name| name.trim().is_empty()) {
        return Err(ReportError::format("no header row found"));
    }

    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for (idx, raw) in headers.iter().enumerate() {
        let trimmed = raw.trim();
        let name = if trimmed.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            trimmed.to_string()
        };
        if names.contains(&name) {
            return Err(ReportError::format(format!("duplicate column name '{name}'")));
        }
        names.push(name);
    }
    Ok(names)
}

fn clean_cell(raw: &str) -> Option<String> {
    if NULL_TOKENS.contains(&raw.trim()) {
        None
    } else {
        Some(raw.to_string())
    }
}

fn infer_column(values: Vec<Option<String>>) -> ColumnValues {
    let present: Vec<&str> = values.iter().flatten().map(|value| value.trim()).collect();
    let all_int = present.iter().all(|value| value.parse::<i64>().is_ok());
    let all_float = present.iter().all(|value| value.parse::<f64>().is_ok());

    if present.is_empty() {
        ColumnValues::Text(values)
    } else if all_int {
        ColumnValues::Int(values.iter().map(|value| parse_trimmed(value)).collect())
    } else if all_float {
        ColumnValues::Float(values.iter().map(|value| parse_trimmed(value)).collect())
    } else {
        ColumnValues::Text(values)
    }
}

fn parse_trimmed<T: std::str::FromStr>(value: &Option<String>) -> Option<T> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

fn into_column(name: &str, values: ColumnValues) -> Column {
    match values {
        ColumnValues::Int(data) => Series::new(name.into(), data).into(),
        ColumnValues::Float(data) => Series::new(name.into(), data).into(),
        ColumnValues::Text(data) => {
            let utf8: Vec<Option<&str>> = data.iter().map(|v| v.as_deref()).collect();
            Series::new(name.into(), utf8).into()
        }
    }
}
