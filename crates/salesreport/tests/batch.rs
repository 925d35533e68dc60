use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use salesreport::batch::{run_report, ReportJob};
use salesreport::terminal::render_bundle;
use salesreport_core::{FilterState, RenderRequest, ReportSettings};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../salesreport-core/tests/data/sales_sample.csv")
}

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("salesreport-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

#[test]
fn report_writes_export_and_charts() -> Result<()> {
    let dir = scratch_dir();
    let job = ReportJob {
        input: fixture(),
        request: RenderRequest {
            filters: FilterState::new([2025], Vec::<String>::new()),
            drilldown_region: Some("West".to_string()),
        },
        output: dir.join("sales_data_report.csv"),
        svg_dir: Some(dir.join("charts")),
    };

    let bundle = run_report(&job, &ReportSettings::default())?;

    let exported = fs::read_to_string(&job.output)?;
    assert_eq!(exported.lines().count(), 7);
    assert!(exported.lines().skip(1).all(|line| line.starts_with("2025-")));

    let mut charts: Vec<String> = fs::read_dir(dir.join("charts"))?
        .map(|entry| entry.map(|entry| entry.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    charts.sort();
    assert_eq!(
        charts,
        vec![
            "monthly_revenue_in_west.svg",
            "monthly_revenue_trends.svg",
            "quarterly_revenue_trends.svg",
            "revenue_distribution_by_region.svg",
            "top_performing_products.svg",
        ]
    );

    let text = render_bundle(&bundle);
    assert!(text.contains("Total Revenue"));
    assert!(text.contains("$656.00"));
    assert!(text.contains("Regional Analysis: West"));

    fs::remove_dir_all(dir)?;
    Ok(())
}

#[test]
fn report_surfaces_schema_errors() {
    let dir = scratch_dir();
    let input = dir.join("no_date.csv");
    fs::write(&input, "Product,Revenue\nWidget,50\n").expect("write input");

    let job = ReportJob {
        input,
        request: RenderRequest::default(),
        output: dir.join("out.csv"),
        svg_dir: None,
    };
    let err = run_report(&job, &ReportSettings::default()).expect_err("missing Date");
    assert_eq!(
        err.to_string(),
        "The uploaded file does not contain a 'Date' column."
    );
    assert!(!dir.join("out.csv").exists());

    fs::remove_dir_all(dir).expect("clean up");
}
