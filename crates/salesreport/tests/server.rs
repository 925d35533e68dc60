use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use salesreport::config::AppConfig;
use salesreport::server::router;

const BOUNDARY: &str = "salesreport-test-boundary";

const SALES_CSV: &str = "Date,Product,Region,Units Sold,Unit Price\n\
                         2024-12-30,Widget,North,1,10\n\
                         2025-01-05,Widget,East,10,5\n\
                         2025-04-10,Gadget,West,4,25\n";

fn upload_request(csv: &str, replaces: Option<&str>) -> Request<Body> {
    let mut body = String::new();
    if let Some(previous) = replaces {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"replaces\"\r\n\r\n{previous}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"sales.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{BOUNDARY}--\r\n"
    ));

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("valid request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

async fn body_text(response: Response<Body>) -> Result<String> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// Uploads `csv` and returns the report location from the redirect.
async fn upload(app: &Router, csv: &str) -> Result<String> {
    let response = app.clone().oneshot(upload_request(csv, None)).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .context("redirect location")?
        .to_str()?
        .to_string();
    Ok(location)
}

#[tokio::test]
async fn index_invites_an_upload() -> Result<()> {
    let app = router(&AppConfig::default());
    let response = app.oneshot(get("/")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("Upload a CSV file to get started."));
    assert!(html.contains("enctype=\"multipart/form-data\""));
    Ok(())
}

#[tokio::test]
async fn upload_redirects_to_rendered_report() -> Result<()> {
    let app = router(&AppConfig::default());
    let location = upload(&app, SALES_CSV).await?;
    assert!(location.starts_with("/report/"));

    let response = app.clone().oneshot(get(&location)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("Total Revenue"));
    assert!(html.contains("$160.00"));
    assert!(html.contains("<svg"));
    assert!(html.contains("Quarterly Revenue Trends"));
    assert!(html.contains("Revenue Distribution by Region"));
    assert!(html.contains("Download Report CSV"));
    assert!(html.contains("name=\"replaces\""));
    Ok(())
}

#[tokio::test]
async fn filters_narrow_the_report() -> Result<()> {
    let app = router(&AppConfig::default());
    let location = upload(&app, SALES_CSV).await?;

    let response = app
        .clone()
        .oneshot(get(&format!("{location}?year=2025&year=oops")))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("$150.00"));
    assert!(html.contains("<option value=\"2025\" selected>"));
    Ok(())
}

#[tokio::test]
async fn region_outside_year_options_stays_selected() -> Result<()> {
    let app = router(&AppConfig::default());
    let location = upload(&app, SALES_CSV).await?;

    let response = app
        .clone()
        .oneshot(get(&format!("{location}?year=2024&region=North&region=West")))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("$10.00"));
    assert!(html.contains("<option value=\"North\" selected>"));
    assert!(html.contains("<option value=\"West\" selected>"));
    assert!(!html.contains("<option value=\"East\""));
    Ok(())
}

#[tokio::test]
async fn download_is_an_attached_csv() -> Result<()> {
    let app = router(&AppConfig::default());
    let location = upload(&app, SALES_CSV).await?;

    let response = app
        .clone()
        .oneshot(get(&format!("{location}/download?year=2025&region=West")))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"sales_data_report.csv\""
    );

    let csv = body_text(response).await?;
    let mut lines = csv.lines();
    let header_line = lines.next().context("csv header")?;
    assert!(header_line.starts_with("Date,Product,Region"));
    assert!(header_line.contains("Revenue"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("2025-04-10,Gadget,West"));
    Ok(())
}

#[tokio::test]
async fn bundle_json_exposes_metrics() -> Result<()> {
    let app = router(&AppConfig::default());
    let location = upload(&app, SALES_CSV).await?;

    let response = app
        .clone()
        .oneshot(get(&format!("{location}/bundle.json?drill=West")))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let bundle: serde_json::Value = serde_json::from_str(&body_text(response).await?)?;
    assert_eq!(bundle["metrics"][0]["formatted"], "$160.00");
    assert_eq!(bundle["regional"]["region"], "West");
    assert_eq!(bundle["overview"]["total_rows"], 3);
    Ok(())
}

#[tokio::test]
async fn missing_date_column_shows_schema_banner() -> Result<()> {
    let app = router(&AppConfig::default());
    let response = app
        .oneshot(upload_request("Product,Revenue\nWidget,50\n", None))
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await?;
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("does not contain a &#39;Date&#39; column."));
    Ok(())
}

#[tokio::test]
async fn unknown_sessions_are_not_found() -> Result<()> {
    let app = router(&AppConfig::default());

    let response = app
        .clone()
        .oneshot(get(&format!("/report/{}", uuid::Uuid::new_v4())))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await?.contains("href=\"/\""));

    let response = app.oneshot(get("/report/not-a-session/download")).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn reupload_discards_the_previous_session() -> Result<()> {
    let app = router(&AppConfig::default());
    let first = upload(&app, SALES_CSV).await?;
    let first_id = first.trim_start_matches("/report/").to_string();

    let response = app
        .clone()
        .oneshot(upload_request(SALES_CSV, Some(&first_id)))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.clone().oneshot(get(&first)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn oldest_session_is_evicted() -> Result<()> {
    let config = AppConfig {
        max_sessions: 1,
        ..AppConfig::default()
    };
    let app = router(&config);
    let first = upload(&app, SALES_CSV).await?;
    let second = upload(&app, SALES_CSV).await?;

    let response = app.clone().oneshot(get(&first)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.clone().oneshot(get(&second)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
