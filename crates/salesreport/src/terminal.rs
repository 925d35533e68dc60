use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use salesreport_core::chart::{Chart, ChartKind};
use salesreport_core::table::{format_float, TableView};
use salesreport_core::ReportBundle;

fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn table_view(view: &TableView) -> Table {
    let mut table = new_table(view.columns.clone());
    for row in &view.rows {
        table.add_row(row.clone());
    }
    table
}

/// A chart's data as a two-column table; pies get a share column instead of raw values.
pub fn chart_table(chart: &Chart) -> Table {
    if let ChartKind::Pie { .. } = chart.kind {
        let mut table = new_table(vec![
            "Region".to_string(),
            "Revenue".to_string(),
            "Share".to_string(),
        ]);
        for share in chart.shares() {
            table.add_row(vec![share.label, format_float(share.value), share.percent_label]);
        }
        return table;
    }

    let mut table = new_table(vec![chart.x_label.clone(), chart.y_label.clone()]);
    for point in &chart.points {
        table.add_row(vec![
            point.label.clone(),
            point.value.map(format_float).unwrap_or_default(),
        ]);
    }
    table
}

fn section(out: &mut String, title: &str, table: &Table) {
    out.push_str(&format!("\n{title}\n{table}\n"));
}

/// Everything in a bundle, laid out for a terminal.
pub fn render_bundle(bundle: &ReportBundle) -> String {
    let mut out = String::new();
    let overview = &bundle.overview;

    let mut summary = new_table(vec!["Rows".to_string(), "Count".to_string()]);
    summary.add_row(vec!["Loaded".to_string(), overview.total_rows.to_string()]);
    summary.add_row(vec![
        "Dropped (unreadable date)".to_string(),
        overview.dropped_rows.to_string(),
    ]);
    summary.add_row(vec![
        "After filters".to_string(),
        overview.filtered_rows.to_string(),
    ]);
    section(&mut out, "Overview", &summary);

    for warning in &bundle.warnings {
        out.push_str(&format!("\nWarning: {warning}\n"));
    }

    if !bundle.metrics.is_empty() {
        let mut metrics = new_table(vec!["Metric".to_string(), "Value".to_string()]);
        for metric in &bundle.metrics {
            metrics.add_row(vec![metric.label.clone(), metric.formatted.clone()]);
        }
        section(&mut out, "Key Metrics", &metrics);
    }

    for chart in [
        &bundle.quarterly_revenue,
        &bundle.top_products,
        &bundle.monthly_revenue,
    ]
    .into_iter()
    .flatten()
    {
        section(&mut out, &chart.title, &chart_table(chart));
    }

    if let Some(regions) = &bundle.top_regions {
        section(&mut out, "Top Performing Regions", &table_view(regions));
    }

    if let Some(regional) = &bundle.regional {
        section(
            &mut out,
            &format!("Regional Analysis: {}", regional.region),
            &table_view(&regional.rows),
        );
        if let Some(chart) = &regional.monthly_revenue {
            section(&mut out, &chart.title, &chart_table(chart));
        }
    }

    if let Some(chart) = &bundle.revenue_distribution {
        section(&mut out, &chart.title, &chart_table(chart));
    }

    out
}
