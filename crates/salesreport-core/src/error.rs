// crates/salesreport-core/src/error.rs

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Failures that halt a render pass. The `Display` text is shown to the user verbatim.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("The uploaded file is not valid CSV: {message}")]
    Format { message: String },

    #[error("The uploaded file does not contain a '{column}' column.")]
    Schema { column: &'static str },

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl ReportError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Fatal input problems the user can fix by uploading a different file.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::Schema { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Non-fatal conditions raised during a pass. The dependent section is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    MissingOptionalColumn {
        column: String,
        section: &'static str,
    },
}

impl ReportWarning {
    pub fn missing_column(column: &str, section: &'static str) -> Self {
        Self::MissingOptionalColumn {
            column: column.to_string(),
            section,
        }
    }
}

impl fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOptionalColumn { column, .. } => {
                write!(f, "The uploaded file does not contain a '{column}' column.")
            }
        }
    }
}
