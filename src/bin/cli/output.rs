//! Output formatting for CLI operations.

use serde_json::json;
use sevenz_update::progress::format_bytes_iec;
use sevenz_update::{BuildReport, FailedItem, SfxReport};

use crate::OutputFormat;

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a finished archive build
    fn format_build(&self, report: &BuildReport) -> String;

    /// Formats a finished SFX build
    fn format_sfx(&self, report: &SfxReport) -> String;

    /// Formats a build that left files out
    fn format_partial(&self, failures: &[FailedItem]) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_build(&self, report: &BuildReport) -> String {
        let mut output = format!(
            "Archive created successfully: {} entries, {}\n",
            report.entries,
            format_bytes_iec(report.total_size)
        );
        if report.volumes.len() > 1 {
            output.push_str(&format!("Volumes ({}):\n", report.volumes.len()));
            for volume in &report.volumes {
                output.push_str(&format!("  {}\n", volume.display()));
            }
        }
        output
    }

    fn format_sfx(&self, report: &SfxReport) -> String {
        let format = report
            .sfx
            .format
            .map(|f| f.name())
            .unwrap_or("unknown stub format");
        format!(
            "SFX archive created successfully: {}\n  Stub:    {} ({})\n  Archive: {}\n  Total:   {}\n",
            report.output.display(),
            format_bytes_iec(report.sfx.stub_size),
            format,
            format_bytes_iec(report.sfx.archive_size),
            format_bytes_iec(report.sfx.total_size)
        )
    }

    fn format_partial(&self, failures: &[FailedItem]) -> String {
        let mut output = format!("{} file(s) failed to compress:\n", failures.len());
        for item in failures {
            output.push_str(&format!("  {}\n", item));
        }
        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_build(&self, report: &BuildReport) -> String {
        let volumes: Vec<String> = report
            .volumes
            .iter()
            .map(|v| v.display().to_string())
            .collect();
        json!({
            "entries": report.entries,
            "total_size": report.total_size,
            "volumes": volumes,
        })
        .to_string()
    }

    fn format_sfx(&self, report: &SfxReport) -> String {
        json!({
            "output": report.output.display().to_string(),
            "entries": report.archive.entries,
            "stub_size": report.sfx.stub_size,
            "archive_size": report.sfx.archive_size,
            "total_size": report.sfx.total_size,
            "stub_format": report.sfx.format.map(|f| f.name()),
        })
        .to_string()
    }

    fn format_partial(&self, failures: &[FailedItem]) -> String {
        let failed: Vec<_> = failures
            .iter()
            .map(|item| {
                json!({
                    "path": item.path.display().to_string(),
                    "error": item.message,
                    "os_code": item.os_code,
                })
            })
            .collect();
        json!({ "failed": failed }).to_string()
    }
}

/// Creates a formatter for the requested format
pub fn create_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Human => Box::new(HumanFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}
