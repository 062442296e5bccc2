//! Output formatting utilities

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::calc::CalcStatus;
use crate::cli::OutputFormat;
use crate::core::error::CalcError;

/// Colored status glyph for table output
pub fn status_cell(status: CalcStatus) -> String {
    match status {
        CalcStatus::Pass => style("✓ pass").green().to_string(),
        CalcStatus::Warning => style("⚠ warning").yellow().to_string(),
        CalcStatus::Fail => style("✗ fail").red().to_string(),
    }
}

/// Serialize a result to the requested non-table format
pub fn print_serialized<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
        OutputFormat::Table => {}
    }
    Ok(())
}

/// Render field/value rows as a table
pub fn print_detail_table(rows: Vec<(String, String)>) {
    let mut builder = Builder::default();
    for (field, value) in rows {
        builder.push_record([field, value]);
    }
    println!("{}", builder.build().with(Style::modern()).to_string());
}

/// Format an optional value, "-" when absent
pub fn opt_value<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Print every validation issue and convert to a terminal error
pub fn report_issues(err: CalcError) -> miette::Report {
    eprintln!(
        "{} Input failed validation with {} issue(s):",
        style("✗").red(),
        err.issues.len()
    );
    for issue in &err.issues {
        eprintln!(
            "   {} {}: {}",
            style(&issue.code).red().bold(),
            style(&issue.field).cyan(),
            issue.message
        );
    }
    miette::miette!("invalid input")
}
