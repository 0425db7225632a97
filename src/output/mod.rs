//! Output module for rendering analysis reports
//!
//! This module handles:
//! - Rendering a report as markdown or JSON
//! - Writing the rendering to a file or standard output

mod markdown;

pub use markdown::render_markdown;

use crate::analysis::AnalysisReport;
use crate::config::OutputFormat;
use crate::AuditError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Serializes a report as pretty-printed JSON
pub fn render_json(report: &AnalysisReport) -> Result<String, AuditError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Renders a report in the requested format
pub fn render(report: &AnalysisReport, format: OutputFormat) -> Result<String, AuditError> {
    match format {
        OutputFormat::Markdown => Ok(render_markdown(report)),
        OutputFormat::Json => render_json(report),
    }
}

/// Writes a rendered report
///
/// # Arguments
///
/// * `report` - The report to write
/// * `format` - Output format
/// * `path` - Destination file; standard output when `None`
pub fn write_report(
    report: &AnalysisReport,
    format: OutputFormat,
    path: Option<&Path>,
) -> Result<(), AuditError> {
    let rendered = render(report, format)?;

    match path {
        Some(path) => {
            let mut file = File::create(path)?;
            file.write_all(rendered.as_bytes())?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(rendered.as_bytes())?;
            handle.flush()?;
        }
    }

    Ok(())
}
