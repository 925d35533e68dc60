use polars::prelude::*;
use serde::Serialize;

use crate::calendar::canonicalize_dates;
use crate::error::Result;

pub const EXPORT_FILE_NAME: &str = "sales_data_report.csv";
pub const EXPORT_MIME: &str = "text/csv";

/// The downloadable dataset of a render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportArtifact {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub row_count: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        Ok(Self {
            file_name: EXPORT_FILE_NAME,
            mime: EXPORT_MIME,
            row_count: df.height(),
            bytes: export_csv(df)?,
        })
    }
}

/// UTF-8 CSV with a header row and no index column. `Date` is rendered from the rows
/// being written, not from the dataset they were filtered out of.
pub fn export_csv(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut frame = canonicalize_dates(df)?;
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .finish(&mut frame)?;
    Ok(buffer)
}
