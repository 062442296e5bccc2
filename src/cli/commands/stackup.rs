//! `gdtkit stackup` command

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

use crate::calc::{evaluate_stackup, StackupAnalysis, StackupResult};
use crate::cli::args::StackupArgs;
use crate::cli::output::{opt_value, print_serialized, report_issues, status_cell};
use crate::cli::{GlobalOpts, OutputFormat};

pub fn run(args: StackupArgs, global: &GlobalOpts) -> Result<()> {
    let mut analysis: StackupAnalysis = super::load_input(&args.input)?;
    if global.precision.is_some() {
        analysis.precision = global.precision;
    }
    if let Some(method) = args.method {
        analysis.method = method.into();
    }
    if args.iterations.is_some() {
        analysis.iterations = args.iterations;
    }

    let result = evaluate_stackup(&analysis).map_err(report_issues)?;

    if let Some(ref path) = args.export {
        export_contributions(&result, path)?;
        eprintln!(
            "{} Contribution table written to {}",
            style("✓").green(),
            path.display()
        );
    }

    if global.format != OutputFormat::Table {
        return print_serialized(&result, global.format);
    }

    let mut builder = Builder::default();
    builder.push_record(["Status".to_string(), status_cell(result.status)]);
    builder.push_record(["Method".to_string(), result.method.to_string()]);
    builder.push_record(["Nominal result".to_string(), result.nominal_result.to_string()]);
    builder.push_record(["Mean shift".to_string(), result.mean_shift.to_string()]);
    builder.push_record(["Center".to_string(), result.center.to_string()]);
    builder.push_record([
        "Total tolerance".to_string(),
        format!("±{} {}", result.total_tolerance, result.units),
    ]);
    builder.push_record([
        "Window".to_string(),
        format!("{} .. {}", result.minimum_value, result.maximum_value),
    ]);
    builder.push_record([
        "Margin to minimum".to_string(),
        opt_value(result.acceptance.margin_to_minimum),
    ]);
    builder.push_record([
        "Margin to maximum".to_string(),
        opt_value(result.acceptance.margin_to_maximum),
    ]);
    if let Some(ref mc) = result.monte_carlo {
        builder.push_record([
            "Monte Carlo".to_string(),
            format!(
                "{} iterations, mean {}, σ {}, yield {}%",
                mc.iterations, mc.mean, mc.std_dev, mc.yield_pct
            ),
        ]);
    }
    println!("{}", builder.build().with(Style::modern()).to_string());

    // Contribution table, largest driver first
    let mut contribs: Vec<_> = result.contributions.iter().collect();
    contribs.sort_by(|a, b| b.share_pct.total_cmp(&a.share_pct));

    let mut builder = Builder::default();
    builder.push_record(["#", "Name", "Dir", "± Tol", "Share %"]);
    for (rank, c) in contribs.iter().enumerate() {
        builder.push_record([
            (rank + 1).to_string(),
            c.name.clone(),
            format!("{:?}", c.direction).to_lowercase(),
            c.bilateral_tolerance.to_string(),
            c.share_pct.to_string(),
        ]);
    }
    println!("{}", builder.build().with(Style::modern()).to_string());
    println!("{}", result.summary);
    Ok(())
}

/// Write the contribution table to a CSV file
fn export_contributions(result: &StackupResult, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;

    writer
        .write_record(["id", "name", "direction", "bilateral_tolerance", "share_pct"])
        .into_diagnostic()?;
    for c in &result.contributions {
        writer
            .write_record([
                c.id.clone(),
                c.name.clone(),
                format!("{:?}", c.direction).to_lowercase(),
                c.bilateral_tolerance.to_string(),
                c.share_pct.to_string(),
            ])
            .into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;
    Ok(())
}
