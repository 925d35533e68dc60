use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;
use tracing::info;

use crate::error::{ReportError, Result};
use crate::schema::{text_values, DATE, MONTH, MONTH_NAMES, QUARTER, YEAR};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d-%b-%Y",
];

const SHORT_YEAR_FORMAT: &str = "%m/%d/%y";

/// Result of dropping rows whose `Date` could not be parsed.
#[derive(Debug, Clone)]
pub struct NormalizedDates {
    pub df: DataFrame,
    pub dropped_rows: usize,
}

/// Parses a single `Date` cell. Slash dates are read month first.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        return parse_compact_date(value);
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }

    if has_short_slash_year(value) {
        return NaiveDate::parse_from_str(value, SHORT_YEAR_FORMAT)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0));
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn parse_compact_date(value: &str) -> Option<NaiveDateTime> {
    let year = value[0..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

fn has_short_slash_year(value: &str) -> bool {
    let parts: Vec<&str> = value.split('/').collect();
    parts.len() == 3 && parts[0].len() <= 2 && parts[2].len() == 2
}

pub fn month_name(dt: &NaiveDateTime) -> &'static str {
    MONTH_NAMES[dt.month0() as usize]
}

pub fn quarter_label(dt: &NaiveDateTime) -> String {
    format!("{}Q{}", dt.year(), dt.month0() / 3 + 1)
}

/// Requires a `Date` column, drops rows whose date does not parse, and rewrites the
/// survivors in canonical form (`%Y-%m-%d`, or `%Y-%m-%d %H:%M:%S` when any value
/// carries a time of day).
pub fn normalize_dates(df: &DataFrame) -> Result<NormalizedDates> {
    if df.column(DATE).is_err() {
        return Err(ReportError::Schema { column: DATE });
    }

    let parsed: Vec<Option<NaiveDateTime>> = text_values(df, DATE)?
        .iter()
        .map(|value| value.as_deref().and_then(parse_date))
        .collect();

    let keep: Vec<bool> = parsed.iter().map(Option::is_some).collect();
    let kept: Vec<NaiveDateTime> = parsed.into_iter().flatten().collect();
    let dropped_rows = df.height() - kept.len();

    let rendered = render_dates(&kept);

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let mut output = df.filter(&mask)?;
    output.with_column(Series::new(DATE.into(), rendered))?;

    if dropped_rows > 0 {
        info!(dropped_rows, "dropped rows with unparseable dates");
    }

    Ok(NormalizedDates {
        df: output,
        dropped_rows,
    })
}

/// Re-renders `Date` so the format reflects only the rows still in `df`: a subset whose
/// times are all midnight goes back to `%Y-%m-%d`. Frames without `Date` pass through.
pub fn canonicalize_dates(df: &DataFrame) -> Result<DataFrame> {
    if df.column(DATE).is_err() {
        return Ok(df.clone());
    }

    let raw = text_values(df, DATE)?;
    let parsed: Vec<Option<NaiveDateTime>> = raw
        .iter()
        .map(|value| value.as_deref().and_then(parse_date))
        .collect();
    let fmt = date_format(parsed.iter().flatten());

    let rendered: Vec<Option<String>> = parsed
        .iter()
        .zip(raw)
        .map(|(dt, original)| match dt {
            Some(dt) => Some(dt.format(fmt).to_string()),
            None => original,
        })
        .collect();

    let mut output = df.clone();
    output.with_column(Series::new(DATE.into(), rendered))?;
    Ok(output)
}

fn render_dates(dates: &[NaiveDateTime]) -> Vec<String> {
    let fmt = date_format(dates.iter());
    dates.iter().map(|dt| dt.format(fmt).to_string()).collect()
}

fn date_format<'a>(mut dates: impl Iterator<Item = &'a NaiveDateTime>) -> &'static str {
    let date_only = dates
        .all(|dt| dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 && dt.nanosecond() == 0);
    if date_only {
        "%Y-%m-%d"
    } else {
        "%Y-%m-%d %H:%M:%S"
    }
}

/// Adds (or overwrites) `Month`, `Quarter` and `Year` from `Date`.
pub fn derive_calendar_fields(df: &DataFrame) -> Result<DataFrame> {
    if df.column(DATE).is_err() {
        return Err(ReportError::Schema { column: DATE });
    }

    let dates = text_values(df, DATE)?;
    let len = dates.len();

    let mut months: Vec<Option<&str>> = Vec::with_capacity(len);
    let mut quarters: Vec<Option<String>> = Vec::with_capacity(len);
    let mut years: Vec<Option<i64>> = Vec::with_capacity(len);

    for value in &dates {
        match value.as_deref().and_then(parse_date) {
            Some(dt) => {
                months.push(Some(month_name(&dt)));
                quarters.push(Some(quarter_label(&dt)));
                years.push(Some(i64::from(dt.year())));
            }
            None => {
                months.push(None);
                quarters.push(None);
                years.push(None);
            }
        }
    }

    let quarters: Vec<Option<&str>> = quarters.iter().map(|q| q.as_deref()).collect();

    let mut output = df.clone();
    output.with_column(Series::new(MONTH.into(), months))?;
    output.with_column(Series::new(QUARTER.into(), quarters))?;
    output.with_column(Series::new(YEAR.into(), years))?;
    Ok(output)
}
