//! `gdtkit flatness` command

use miette::Result;

use crate::calc::flatness::FlatnessMode;
use crate::calc::{evaluate_flatness, FlatnessInput};
use crate::cli::args::CalcArgs;
use crate::cli::output::{print_detail_table, print_serialized, report_issues, status_cell};
use crate::cli::{GlobalOpts, OutputFormat};

pub fn run(args: CalcArgs, global: &GlobalOpts) -> Result<()> {
    let mut input: FlatnessInput = super::load_input(&args.input)?;
    if global.precision.is_some() {
        input.precision = global.precision;
    }

    let result = evaluate_flatness(&input).map_err(report_issues)?;

    if global.format != OutputFormat::Table {
        return print_serialized(&result, global.format);
    }

    let mode = match result.mode {
        FlatnessMode::IndicatorReading => "indicator reading",
        FlatnessMode::PointCloud => "point cloud",
    };
    let mut rows = vec![
        ("Status".to_string(), status_cell(result.status)),
        ("Mode".to_string(), mode.to_string()),
        (
            "Measured flatness".to_string(),
            format!("{} {}", result.measured_flatness, result.units),
        ),
        (
            "Deviation band".to_string(),
            format!("{} .. {}", result.min_deviation, result.max_deviation),
        ),
        (
            "Tolerance".to_string(),
            format!("{} {}", result.tolerance, result.units),
        ),
        (
            "Tolerance consumed".to_string(),
            format!("{}%", result.tolerance_consumed_pct),
        ),
    ];
    if result.mode == FlatnessMode::PointCloud {
        rows.insert(2, ("Points".to_string(), result.point_count.to_string()));
    }

    print_detail_table(rows);
    println!("{}", result.summary);
    Ok(())
}
