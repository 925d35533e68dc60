use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use salesreport_core::svg::render_svg;
use salesreport_core::{render_report, RenderRequest, ReportBundle, ReportSettings};
use tracing::info;

/// One run of the `report` command.
#[derive(Debug, Clone)]
pub struct ReportJob {
    pub input: PathBuf,
    pub request: RenderRequest,
    pub output: PathBuf,
    pub svg_dir: Option<PathBuf>,
}

/// Renders the input file, writes the export CSV and (optionally) one SVG per chart.
pub fn run_report(job: &ReportJob, settings: &ReportSettings) -> Result<ReportBundle> {
    let content = fs::read(&job.input)
        .with_context(|| format!("failed to read {}", job.input.display()))?;
    let fingerprint = blake3::hash(&content).to_hex().to_string();

    let bundle = render_report(&content, &job.request, settings)?;

    fs::write(&job.output, &bundle.export.bytes)
        .with_context(|| format!("failed to write {}", job.output.display()))?;

    let svg_files = match &job.svg_dir {
        Some(dir) => write_charts(dir, &bundle)?,
        None => Vec::new(),
    };

    info!(
        input = %job.input.display(),
        fingerprint = %fingerprint,
        output = %job.output.display(),
        rows = bundle.export.row_count,
        charts = svg_files.len(),
        "report written"
    );
    Ok(bundle)
}

/// Writes each chart of the bundle to `dir` as `<title>.svg`.
pub fn write_charts(dir: &Path, bundle: &ReportBundle) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    for chart in bundle.charts() {
        let path = dir.join(format!("{}.svg", file_stem(&chart.title)));
        fs::write(&path, render_svg(chart))
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn file_stem(title: &str) -> String {
    let mut stem = String::with_capacity(title.len());
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            stem.extend(ch.to_lowercase());
        } else if !stem.is_empty() && !stem.ends_with('_') {
            stem.push('_');
        }
    }
    stem.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stems_are_snake_case() {
        assert_eq!(file_stem("Monthly Revenue Trends"), "monthly_revenue_trends");
        assert_eq!(file_stem("Monthly Revenue in R&D"), "monthly_revenue_in_r_d");
    }
}
