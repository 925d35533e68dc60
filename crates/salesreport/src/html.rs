//! Server-rendered pages. Every piece of user data goes through [`escape`].

use salesreport_core::chart::Chart;
use salesreport_core::svg::{escape_xml as escape, render_svg};
use salesreport_core::table::TableView;
use salesreport_core::{RenderRequest, ReportBundle};

use crate::server::{query_string, Session};

const TITLE: &str = "Sales Data Report Generator";

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; color: #222; }
header { padding: 16px 24px; background: #1f3b57; color: white; }
header p { margin: 4px 0 0; opacity: 0.8; }
.layout { display: flex; align-items: flex-start; }
aside { width: 260px; padding: 16px 24px; background: #f4f6f8; min-height: 100vh; box-sizing: border-box; }
aside select { width: 100%; }
main { flex: 1; padding: 16px 24px; overflow-x: auto; }
table { border-collapse: collapse; margin: 8px 0 24px; font-size: 13px; }
th, td { border: 1px solid #d0d7de; padding: 4px 8px; text-align: left; }
th { background: #eef1f4; }
.error { background: #fdecea; border: 1px solid #f5c2c0; padding: 12px; margin: 16px 0; }
.warning { background: #fff8e1; border: 1px solid #ffe08a; padding: 12px; margin: 16px 0; }
.metrics { display: flex; gap: 24px; margin: 16px 0; }
.metric { border: 1px solid #d0d7de; padding: 12px 16px; border-radius: 4px; }
.metric strong { display: block; font-size: 22px; }
figure { margin: 16px 0; }
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{}</title><style>{STYLE}</style></head><body>{body}</body></html>",
        escape(title)
    )
}

fn header(subtitle: &str) -> String {
    format!(
        "<header><h1>{TITLE}</h1><p>{}</p></header>",
        escape(subtitle)
    )
}

fn upload_form(replaces: Option<&Session>) -> String {
    let hidden = replaces
        .map(|session| {
            format!(
                r#"<input type="hidden" name="replaces" value="{}">"#,
                session.id
            )
        })
        .unwrap_or_default();
    format!(
        r#"<form method="post" action="/upload" enctype="multipart/form-data">{hidden}<input type="file" name="file" accept=".csv,text/csv" required> <button type="submit">Upload</button></form>"#
    )
}

/// The landing page, optionally with a blocking error banner.
pub fn upload_page(error: Option<&str>) -> String {
    let mut body = header("Explore revenue and profit across periods, products and regions.");
    body.push_str("<main>");
    if let Some(message) = error {
        body.push_str(&format!(r#"<div class="error">{}</div>"#, escape(message)));
    }
    body.push_str("<p>Upload a CSV file to get started.</p>");
    body.push_str(&upload_form(None));
    body.push_str("</main>");
    page(TITLE, &body)
}

pub fn not_found_page() -> String {
    let body = format!(
        "{}<main><p>This report is no longer available.</p><p><a href=\"/\">Upload a CSV file</a></p></main>",
        header("Report not found")
    );
    page(TITLE, &body)
}

pub fn table_html(table: &TableView) -> String {
    let mut html = String::from("<table><thead><tr>");
    for column in &table.columns {
        html.push_str(&format!("<th>{}</th>", escape(column)));
    }
    html.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn figure(chart: &Chart) -> String {
    format!("<figure>{}</figure>", render_svg(chart))
}

fn multi_select<T: ToString>(
    name: &str,
    label: &str,
    options: &[T],
    selected: impl Fn(&T) -> bool,
) -> String {
    let mut html = format!(
        r#"<label for="{name}">{}</label><select id="{name}" name="{name}" multiple size="{}">"#,
        escape(label),
        options.len().clamp(2, 8)
    );
    for option in options {
        let value = escape(&option.to_string());
        let attr = if selected(option) { " selected" } else { "" };
        html.push_str(&format!(r#"<option value="{value}"{attr}>{value}</option>"#));
    }
    html.push_str("</select>");
    html
}

fn hidden_filters(request: &RenderRequest) -> String {
    let mut html = String::new();
    for year in &request.filters.years {
        html.push_str(&format!(r#"<input type="hidden" name="year" value="{year}">"#));
    }
    for region in &request.filters.regions {
        html.push_str(&format!(
            r#"<input type="hidden" name="region" value="{}">"#,
            escape(region)
        ));
    }
    html
}

fn sidebar(session: &Session, bundle: &ReportBundle, request: &RenderRequest) -> String {
    let mut html = String::from("<aside><h2>Filters</h2>");
    html.push_str(&format!(
        r#"<form method="get" action="/report/{}">"#,
        session.id
    ));
    html.push_str(&multi_select(
        "year",
        "Year",
        bundle.filter_options.years.as_slice(),
        |year| request.filters.years.contains(year),
    ));
    if let Some(regions) = &bundle.filter_options.regions {
        // Selections outside the year-narrowed options stay visible and selected.
        let mut options = regions.clone();
        for selected in &request.filters.regions {
            if !options.contains(selected) {
                options.push(selected.clone());
            }
        }
        html.push_str(&multi_select("region", "Region", options.as_slice(), |region| {
            request.filters.regions.contains(region)
        }));
    }
    if let Some(drill) = &request.drilldown_region {
        html.push_str(&format!(
            r#"<input type="hidden" name="drill" value="{}">"#,
            escape(drill)
        ));
    }
    html.push_str(r#"<p><button type="submit">Apply filters</button></p></form>"#);

    html.push_str("<h2>New upload</h2>");
    html.push_str(&upload_form(Some(session)));
    html.push_str("</aside>");
    html
}

fn regional_section(session: &Session, bundle: &ReportBundle, request: &RenderRequest) -> String {
    let Some(regional) = &bundle.regional else {
        return String::new();
    };

    let mut html = String::from("<section><h2>Regional Analysis</h2>");
    html.push_str(&format!(
        r#"<form method="get" action="/report/{}">{}<label for="drill">Select a region</label> <select id="drill" name="drill">"#,
        session.id,
        hidden_filters(request)
    ));
    for option in &regional.options {
        let value = escape(option);
        let attr = if *option == regional.region {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!(r#"<option value="{value}"{attr}>{value}</option>"#));
    }
    html.push_str(r#"</select> <button type="submit">Show region</button></form>"#);
    html.push_str(&format!("<h3>Data for {}</h3>", escape(&regional.region)));
    html.push_str(&table_html(&regional.rows));
    if let Some(chart) = &regional.monthly_revenue {
        html.push_str(&figure(chart));
    }
    html.push_str("</section>");
    html
}

/// The full report for one render pass.
pub fn report_page(session: &Session, bundle: &ReportBundle) -> String {
    let request = RenderRequest {
        filters: bundle.applied_filters.clone(),
        drilldown_region: bundle
            .regional
            .as_ref()
            .map(|regional| regional.region.clone()),
    };
    let query = query_string(&request);
    let overview = &bundle.overview;

    let mut body = header(&format!(
        "{} (uploaded {})",
        session.file_name,
        session.uploaded_at.format("%Y-%m-%d %H:%M UTC")
    ));
    body.push_str(r#"<div class="layout">"#);
    body.push_str(&sidebar(session, bundle, &request));
    body.push_str("<main>");

    for warning in &bundle.warnings {
        body.push_str(&format!(
            r#"<div class="warning">{}</div>"#,
            escape(&warning.to_string())
        ));
    }

    body.push_str(&format!(
        "<p>{} rows loaded, {} dropped with unreadable dates, {} after filters.</p>",
        overview.total_rows, overview.dropped_rows, overview.filtered_rows
    ));
    body.push_str("<h2>Data Preview</h2>");
    body.push_str(&table_html(&bundle.preview));

    if overview.filtered_rows == 0 {
        body.push_str("<p>No rows match the selected filters.</p>");
    }

    if !bundle.metrics.is_empty() {
        body.push_str(r#"<h2>Key Metrics</h2><div class="metrics">"#);
        for metric in &bundle.metrics {
            body.push_str(&format!(
                r#"<div class="metric"><span>{}</span><strong>{}</strong></div>"#,
                escape(&metric.label),
                escape(&metric.formatted)
            ));
        }
        body.push_str("</div>");
    }

    for chart in [&bundle.quarterly_revenue, &bundle.top_products, &bundle.monthly_revenue]
        .into_iter()
        .flatten()
    {
        body.push_str(&figure(chart));
    }

    if let Some(table) = &bundle.top_regions {
        body.push_str("<h2>Top Performing Regions</h2>");
        body.push_str(&table_html(table));
    }

    body.push_str(&regional_section(session, bundle, &request));

    if let Some(chart) = &bundle.revenue_distribution {
        body.push_str(&figure(chart));
    }

    let suffix = if query.is_empty() {
        String::new()
    } else {
        format!("?{query}")
    };
    body.push_str(&format!(
        r#"<h2>Download</h2><p><a href="/report/{id}/download{suffix}" download="{file}">Download Report CSV</a> ({rows} rows) &middot; <a href="/report/{id}/bundle.json{suffix}">JSON</a></p>"#,
        id = session.id,
        suffix = escape(&suffix),
        file = bundle.export.file_name,
        rows = bundle.export.row_count,
    ));

    body.push_str("</main></div>");
    page(TITLE, &body)
}
