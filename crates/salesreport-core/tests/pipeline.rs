use std::path::PathBuf;

use anyhow::Result;
use polars::prelude::*;

use salesreport_core::filters::apply_filters;
use salesreport_core::table::TableView;
use salesreport_core::{
    prepare_dataset, render_prepared, render_report, FilterState, RenderRequest, ReportError,
    ReportSettings, ReportWarning,
};

fn sample_bytes() -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/sales_sample.csv");
    std::fs::read(path).expect("sample csv present")
}

fn float_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn text_column(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .cast(&DataType::String)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect()
}

#[test]
fn derives_revenue_quarters_and_totals() -> Result<()> {
    let csv = b"Date,Product,Region,Units Sold,Unit Price\n\
                2025-01-05,Widget,East,10,5\n\
                2025-04-10,Gadget,West,4,25\n";

    let bundle = render_report(csv, &RenderRequest::default(), &ReportSettings::default())?;
    let prepared = prepare_dataset(csv)?;

    assert_eq!(float_column(&prepared.df, "Revenue"), vec![Some(50.0), Some(100.0)]);
    assert_eq!(
        text_column(&prepared.df, "Quarter"),
        vec![Some("2025Q1".to_string()), Some("2025Q2".to_string())]
    );

    let revenue = bundle
        .metrics
        .iter()
        .find(|metric| metric.label == "Total Revenue")
        .expect("revenue metric");
    assert_eq!(revenue.formatted, "$150.00");
    assert!(bundle.metrics.iter().all(|metric| metric.label != "Total Profit"));

    let quarterly = bundle.quarterly_revenue.expect("quarterly chart");
    assert_eq!(quarterly.labels(), vec!["2025Q1", "2025Q2"]);
    Ok(())
}

#[test]
fn unparseable_dates_are_dropped_before_totals() -> Result<()> {
    let bundle = render_report(
        &sample_bytes(),
        &RenderRequest::default(),
        &ReportSettings::default(),
    )?;

    assert_eq!(bundle.overview.total_rows, 9);
    assert_eq!(bundle.overview.dropped_rows, 1);
    assert_eq!(bundle.metrics[0].formatted, "$846.00");
    assert_eq!(bundle.metrics[1].label, "Total Profit");
    assert_eq!(bundle.metrics[1].formatted, "$336.00");
    Ok(())
}

#[test]
fn calendar_fields_agree_with_date() -> Result<()> {
    let prepared = prepare_dataset(&sample_bytes())?;
    let dates = text_column(&prepared.df, "Date");
    let months = text_column(&prepared.df, "Month");
    let quarters = text_column(&prepared.df, "Quarter");
    let years = float_column(&prepared.df, "Year");

    assert_eq!(dates[0].as_deref(), Some("2024-02-14"));
    assert_eq!(months[0].as_deref(), Some("February"));
    assert_eq!(quarters[0].as_deref(), Some("2024Q1"));
    assert_eq!(years[0], Some(2024.0));

    assert_eq!(dates[8].as_deref(), Some("2025-12-02"));
    assert_eq!(months[8].as_deref(), Some("December"));
    assert_eq!(quarters[8].as_deref(), Some("2025Q4"));
    assert_eq!(years[8], Some(2025.0));
    Ok(())
}

#[test]
fn missing_region_warns_once_and_skips_regional_sections() -> Result<()> {
    let csv = b"Date,Product,Revenue\n2025-01-05,Widget,50\n2025-02-05,Gadget,70\n";
    let request = RenderRequest {
        filters: FilterState::new([], ["East"]),
        drilldown_region: Some("East".to_string()),
    };

    let bundle = render_report(csv, &request, &ReportSettings::default())?;

    assert_eq!(
        bundle.warnings,
        vec![ReportWarning::missing_column("Region", "region filter")]
    );
    assert_eq!(
        bundle.warnings[0].to_string(),
        "The uploaded file does not contain a 'Region' column."
    );
    assert_eq!(bundle.filter_options.regions, None);
    assert!(bundle.top_regions.is_none());
    assert!(bundle.regional.is_none());
    assert!(bundle.revenue_distribution.is_none());

    // region selection is ignored, not applied to an absent column
    assert_eq!(bundle.overview.filtered_rows, 2);
    assert!(bundle.quarterly_revenue.is_some());
    assert!(bundle.top_products.is_some());
    assert!(bundle.monthly_revenue.is_some());
    Ok(())
}

#[test]
fn year_filter_restricts_every_section() -> Result<()> {
    let request = RenderRequest {
        filters: FilterState::new([2025], Vec::<String>::new()),
        drilldown_region: None,
    };
    let bundle = render_report(&sample_bytes(), &request, &ReportSettings::default())?;

    assert_eq!(bundle.overview.filtered_rows, 6);
    assert_eq!(bundle.metrics[0].formatted, "$656.00");
    assert_eq!(bundle.metrics[1].formatted, "$256.00");

    let quarterly = bundle.quarterly_revenue.expect("quarterly chart");
    assert!(quarterly.labels().iter().all(|label| label.starts_with("2025")));

    let exported = prepare_dataset(&bundle.export.bytes)?;
    let years = float_column(&exported.df, "Year");
    assert_eq!(years.len(), 6);
    assert!(years.iter().all(|year| *year == Some(2025.0)));

    // year options are always drawn from the full dataset
    assert_eq!(bundle.filter_options.years, vec![2024, 2025]);
    Ok(())
}

#[test]
fn region_options_follow_year_selection() -> Result<()> {
    let request = RenderRequest {
        filters: FilterState::new([2024], Vec::<String>::new()),
        drilldown_region: None,
    };
    let bundle = render_report(&sample_bytes(), &request, &ReportSettings::default())?;
    assert_eq!(
        bundle.filter_options.regions,
        Some(vec![
            "East".to_string(),
            "West".to_string(),
            "North".to_string()
        ])
    );
    Ok(())
}

#[test]
fn empty_selection_means_everything() -> Result<()> {
    let prepared = prepare_dataset(&sample_bytes())?;
    let outcome = apply_filters(&prepared.df, &FilterState::default())?;
    assert_eq!(outcome.df.height(), prepared.df.height());
    assert!(outcome.warnings.is_empty());
    Ok(())
}

#[test]
fn filtering_is_idempotent() -> Result<()> {
    let prepared = prepare_dataset(&sample_bytes())?;
    let filters = FilterState::new([2025], ["West", "North"]);

    let once = apply_filters(&prepared.df, &filters)?.df;
    let twice = apply_filters(&once, &filters)?.df;

    assert_eq!(once.height(), 3);
    assert!(once.equals_missing(&twice));
    Ok(())
}

#[test]
fn top_products_are_ranked_and_truncated() -> Result<()> {
    let settings = ReportSettings {
        preview_rows: 5,
        top_products: 3,
    };
    let bundle = render_report(&sample_bytes(), &RenderRequest::default(), &settings)?;

    let chart = bundle.top_products.expect("top products chart");
    assert_eq!(chart.labels(), vec!["Gizmo", "Gadget", "Widget"]);
    assert_eq!(chart.value_of("Gizmo"), Some(320.0));
    assert_eq!(chart.value_of("Widget"), Some(140.0));
    Ok(())
}

#[test]
fn top_regions_table_is_sorted_by_revenue() -> Result<()> {
    let bundle = render_report(
        &sample_bytes(),
        &RenderRequest::default(),
        &ReportSettings::default(),
    )?;

    let table = bundle.top_regions.expect("top regions table");
    let region_idx = table.column_index("Region").expect("region column");
    let revenue_idx = table.column_index("Revenue").expect("revenue column");
    assert!(table.column_index("Year").is_none());

    let ranked: Vec<(&str, &str)> = table
        .rows
        .iter()
        .map(|row| (row[region_idx].as_str(), row[revenue_idx].as_str()))
        .collect();
    assert_eq!(
        ranked,
        vec![
            ("West", "320.00"),
            ("North", "240.00"),
            ("East", "196.00"),
            ("South", "90.00"),
        ]
    );
    Ok(())
}

#[test]
fn monthly_chart_has_twelve_calendar_slots() -> Result<()> {
    let request = RenderRequest {
        filters: FilterState::new([2024], Vec::<String>::new()),
        drilldown_region: None,
    };
    let bundle = render_report(&sample_bytes(), &request, &ReportSettings::default())?;

    let chart = bundle.monthly_revenue.expect("monthly chart");
    assert_eq!(
        chart.labels(),
        vec![
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
        ]
    );
    assert_eq!(chart.value_of("February"), Some(50.0));
    assert_eq!(chart.value_of("July"), Some(100.0));
    assert_eq!(chart.value_of("March"), None);
    Ok(())
}

#[test]
fn drilldown_selects_requested_region() -> Result<()> {
    let request = RenderRequest {
        filters: FilterState::default(),
        drilldown_region: Some("West".to_string()),
    };
    let bundle = render_report(&sample_bytes(), &request, &ReportSettings::default())?;

    let regional = bundle.regional.expect("regional drilldown");
    assert_eq!(regional.region, "West");
    assert_eq!(regional.options, vec!["East", "West", "North", "South"]);
    assert_eq!(regional.rows.len(), 3);

    let chart = regional.monthly_revenue.expect("regional chart");
    assert_eq!(chart.title, "Monthly Revenue in West");
    assert_eq!(chart.labels(), vec!["January", "April", "July"]);
    assert_eq!(chart.value_of("January"), Some(120.0));
    Ok(())
}

#[test]
fn unknown_drilldown_region_falls_back_to_first() -> Result<()> {
    let request = RenderRequest {
        filters: FilterState::default(),
        drilldown_region: Some("Atlantis".to_string()),
    };
    let bundle = render_report(&sample_bytes(), &request, &ReportSettings::default())?;
    assert_eq!(bundle.regional.expect("regional drilldown").region, "East");
    Ok(())
}

#[test]
fn revenue_distribution_shares_sum_to_one() -> Result<()> {
    let bundle = render_report(
        &sample_bytes(),
        &RenderRequest::default(),
        &ReportSettings::default(),
    )?;

    let pie = bundle.revenue_distribution.expect("pie chart");
    let shares = pie.shares();
    let labels: Vec<(&str, &str)> = shares
        .iter()
        .map(|share| (share.label.as_str(), share.percent_label.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("East", "23.2%"),
            ("North", "28.4%"),
            ("South", "10.6%"),
            ("West", "37.8%"),
        ]
    );
    let total: f64 = shares.iter().map(|share| share.fraction).sum();
    assert!((total - 1.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn pie_is_skipped_for_negative_regions() -> Result<()> {
    let csv = b"Date,Region,Revenue\n2025-01-05,East,50\n2025-01-06,West,-80\n";
    let bundle = render_report(csv, &RenderRequest::default(), &ReportSettings::default())?;
    assert!(bundle.revenue_distribution.is_none());
    assert!(bundle.top_regions.is_some());
    Ok(())
}

#[test]
fn export_round_trips_filtered_rows() -> Result<()> {
    let prepared = prepare_dataset(&sample_bytes())?;
    let request = RenderRequest {
        filters: FilterState::new([2025], ["East", "West"]),
        drilldown_region: None,
    };
    let bundle = render_prepared(&prepared, &request, &ReportSettings::default())?;
    let filtered = apply_filters(&prepared.df, &request.filters)?.df;

    assert_eq!(bundle.export.file_name, "sales_data_report.csv");
    assert_eq!(bundle.export.mime, "text/csv");
    assert_eq!(bundle.export.row_count, filtered.height());

    let reloaded = prepare_dataset(&bundle.export.bytes)?;
    assert_eq!(reloaded.dropped_rows, 0);
    assert_eq!(reloaded.df.get_column_names(), filtered.get_column_names());
    assert!(reloaded.df.equals_missing(&filtered));
    Ok(())
}

#[test]
fn export_drops_times_when_filtered_rows_are_date_only() -> Result<()> {
    let csv = b"Date,Region,Revenue\n\
                2024-03-01 10:30:00,East,5\n\
                2025-01-05,East,50\n";
    let prepared = prepare_dataset(csv)?;
    assert_eq!(
        text_column(&prepared.df, "Date")[1],
        Some("2025-01-05 00:00:00".to_string())
    );

    let request = RenderRequest {
        filters: FilterState::new([2025], Vec::<String>::new()),
        drilldown_region: None,
    };
    let bundle = render_prepared(&prepared, &request, &ReportSettings::default())?;
    let filtered = apply_filters(&prepared.df, &request.filters)?.df;
    assert_eq!(
        text_column(&filtered, "Date"),
        vec![Some("2025-01-05".to_string())]
    );

    let exported = String::from_utf8(bundle.export.bytes.clone())?;
    assert!(exported.contains("\n2025-01-05,East,50,"));
    assert!(!exported.contains("00:00:00"));

    let reloaded = prepare_dataset(&bundle.export.bytes)?;
    assert!(reloaded.df.equals_missing(&filtered));
    Ok(())
}

#[test]
fn export_round_trips_cell_values_when_column_types_narrow() -> Result<()> {
    let csv = b"Date,Product,Region,Units Sold,Unit Price,Discount\n\
                2024-03-01,Widget,East,2,5,1.5\n\
                2025-01-05,42,East,10,5,\n\
                2025-02-07,43,West,1,7,\n";
    let prepared = prepare_dataset(csv)?;
    let request = RenderRequest {
        filters: FilterState::new([2025], Vec::<String>::new()),
        drilldown_region: None,
    };
    let bundle = render_prepared(&prepared, &request, &ReportSettings::default())?;
    let filtered = apply_filters(&prepared.df, &request.filters)?.df;

    let reloaded = prepare_dataset(&bundle.export.bytes)?;
    assert_eq!(reloaded.dropped_rows, 0);
    assert_eq!(
        TableView::from_frame(&reloaded.df)?,
        TableView::from_frame(&filtered)?
    );

    let view = TableView::from_frame(&filtered)?;
    let product = view.column_index("Product").expect("product column");
    let discount = view.column_index("Discount").expect("discount column");
    assert_eq!(view.rows[0][product], "42");
    assert_eq!(view.rows[0][discount], "");
    Ok(())
}

#[test]
fn preview_uses_unfiltered_head() -> Result<()> {
    let request = RenderRequest {
        filters: FilterState::new([2025], Vec::<String>::new()),
        drilldown_region: None,
    };
    let bundle = render_report(&sample_bytes(), &request, &ReportSettings::default())?;
    assert_eq!(bundle.preview.len(), 5);
    let date_idx = bundle.preview.column_index("Date").expect("date column");
    assert_eq!(bundle.preview.rows[0][date_idx], "2024-02-14");
    Ok(())
}

#[test]
fn missing_date_column_is_a_schema_error() {
    let csv = b"Product,Revenue\nWidget,50\n";
    let err = render_report(csv, &RenderRequest::default(), &ReportSettings::default())
        .expect_err("date column is required");
    assert!(matches!(err, ReportError::Schema { column: "Date" }));
    assert!(err.is_user_facing());
    assert_eq!(
        err.to_string(),
        "The uploaded file does not contain a 'Date' column."
    );
}

#[test]
fn malformed_csv_is_a_format_error() {
    let ragged = b"Date,Revenue\n2025-01-05,50,extra\n";
    let err = render_report(ragged, &RenderRequest::default(), &ReportSettings::default())
        .expect_err("ragged row rejected");
    assert!(matches!(err, ReportError::Format { .. }));

    let binary: &[u8] = &[0xff, 0xfe, 0x00, 0x41];
    let err = render_report(binary, &RenderRequest::default(), &ReportSettings::default())
        .expect_err("binary input rejected");
    assert!(err.is_user_facing());

    let err = render_report(b"", &RenderRequest::default(), &ReportSettings::default())
        .expect_err("empty input rejected");
    assert!(matches!(err, ReportError::Format { .. }));
}

#[test]
fn times_of_day_are_preserved() -> Result<()> {
    let csv = b"Date,Revenue\n2025-01-05 10:30:00,50\n03/07/2025,20\n";
    let prepared = prepare_dataset(csv)?;
    assert_eq!(
        text_column(&prepared.df, "Date"),
        vec![
            Some("2025-01-05 10:30:00".to_string()),
            Some("2025-03-07 00:00:00".to_string())
        ]
    );
    assert_eq!(
        text_column(&prepared.df, "Month"),
        vec![Some("January".to_string()), Some("March".to_string())]
    );
    Ok(())
}
