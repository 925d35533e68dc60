pub mod aggregate;
pub mod calendar;
pub mod chart;
pub mod derive;
pub mod error;
pub mod export;
pub mod filters;
pub mod loader;
pub mod metrics;
pub mod report;
pub mod schema;
pub mod svg;
pub mod table;
pub mod views;

pub use error::{ReportError, ReportWarning, Result};
pub use export::{ExportArtifact, EXPORT_FILE_NAME, EXPORT_MIME};
pub use filters::{FilterOptions, FilterState};
pub use report::{
    prepare_dataset, render_prepared, render_report, PreparedDataset, RenderRequest,
    ReportBundle, ReportSettings,
};
