use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::calendar::{derive_calendar_fields, normalize_dates};
use crate::chart::Chart;
use crate::derive::derive_financial_fields;
use crate::error::{ReportWarning, Result};
use crate::export::ExportArtifact;
use crate::filters::{apply_filters, filter_options, FilterOptions, FilterState};
use crate::loader::load_csv;
use crate::metrics::{compute_metrics, Metric};
use crate::table::TableView;
use crate::views::{
    monthly_revenue, quarterly_revenue, regional_drilldown, revenue_distribution, top_products,
    top_regions, RegionalDrilldown,
};

/// Display limits, set from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSettings {
    pub preview_rows: usize,
    pub top_products: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            top_products: 5,
        }
    }
}

/// Everything one interaction selects: filters plus the drill-down region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub filters: FilterState,
    pub drilldown_region: Option<String>,
}

/// The loaded dataset after date normalization and field derivation, before filtering.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub df: DataFrame,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetOverview {
    pub total_rows: usize,
    pub dropped_rows: usize,
    pub filtered_rows: usize,
    pub columns: Vec<String>,
}

/// Every artifact of one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportBundle {
    pub overview: DatasetOverview,
    pub preview: TableView,
    pub filter_options: FilterOptions,
    pub applied_filters: FilterState,
    pub warnings: Vec<ReportWarning>,
    pub metrics: Vec<Metric>,
    pub quarterly_revenue: Option<Chart>,
    pub top_products: Option<Chart>,
    pub top_regions: Option<TableView>,
    pub monthly_revenue: Option<Chart>,
    pub regional: Option<RegionalDrilldown>,
    pub revenue_distribution: Option<Chart>,
    pub export: ExportArtifact,
}

impl ReportBundle {
    /// Charts in display order, for callers that render them all the same way.
    pub fn charts(&self) -> Vec<&Chart> {
        [
            self.quarterly_revenue.as_ref(),
            self.top_products.as_ref(),
            self.monthly_revenue.as_ref(),
            self.regional
                .as_ref()
                .and_then(|regional| regional.monthly_revenue.as_ref()),
            self.revenue_distribution.as_ref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Load, date validation and field derivation. Errors here are fatal for the pass.
pub fn prepare_dataset(content: &[u8]) -> Result<PreparedDataset> {
    let raw = load_csv(content)?;
    let normalized = normalize_dates(&raw)?;
    let with_calendar = derive_calendar_fields(&normalized.df)?;
    let df = derive_financial_fields(&with_calendar)?;

    Ok(PreparedDataset {
        df,
        dropped_rows: normalized.dropped_rows,
    })
}

/// One full render pass over raw CSV bytes. Holds no state between calls.
pub fn render_report(
    content: &[u8],
    request: &RenderRequest,
    settings: &ReportSettings,
) -> Result<ReportBundle> {
    let prepared = prepare_dataset(content)?;
    render_prepared(&prepared, request, settings)
}

/// Filters a prepared dataset and builds every section from the filtered rows.
pub fn render_prepared(
    prepared: &PreparedDataset,
    request: &RenderRequest,
    settings: &ReportSettings,
) -> Result<ReportBundle> {
    let df = &prepared.df;
    let preview = TableView::head(df, settings.preview_rows)?;
    let filter_options = filter_options(df, &request.filters)?;

    let filtered = apply_filters(df, &request.filters)?;
    let view = &filtered.df;

    let bundle = ReportBundle {
        overview: DatasetOverview {
            total_rows: df.height(),
            dropped_rows: prepared.dropped_rows,
            filtered_rows: view.height(),
            columns: df
                .get_columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect(),
        },
        preview,
        filter_options,
        applied_filters: request.filters.clone(),
        warnings: filtered.warnings,
        metrics: compute_metrics(view)?,
        quarterly_revenue: quarterly_revenue(view)?,
        top_products: top_products(view, settings.top_products)?,
        top_regions: top_regions(view)?.map(|table| table.to_table_view()),
        monthly_revenue: monthly_revenue(view)?,
        regional: regional_drilldown(view, request.drilldown_region.as_deref())?,
        revenue_distribution: revenue_distribution(view)?,
        export: ExportArtifact::from_frame(view)?,
    };

    info!(
        total_rows = bundle.overview.total_rows,
        filtered_rows = bundle.overview.filtered_rows,
        filters_active = !request.filters.is_empty(),
        warnings = bundle.warnings.len(),
        "render pass complete"
    );

    Ok(bundle)
}
