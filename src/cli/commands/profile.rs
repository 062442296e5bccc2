//! `gdtkit profile` command

use miette::Result;

use crate::calc::{evaluate_profile, ProfileInput};
use crate::cli::args::CalcArgs;
use crate::cli::output::{print_detail_table, print_serialized, report_issues, status_cell};
use crate::cli::{GlobalOpts, OutputFormat};

pub fn run(args: CalcArgs, global: &GlobalOpts) -> Result<()> {
    let mut input: ProfileInput = super::load_input(&args.input)?;
    if global.precision.is_some() {
        input.precision = global.precision;
    }

    let result = evaluate_profile(&input).map_err(report_issues)?;

    if global.format != OutputFormat::Table {
        return print_serialized(&result, global.format);
    }

    let nonconforming = if result.nonconforming_indices.is_empty() {
        "none".to_string()
    } else {
        result
            .nonconforming_indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    print_detail_table(vec![
        ("Status".to_string(), status_cell(result.status)),
        ("Zone".to_string(), result.zone.to_string()),
        (
            "Allowance (outside / inside)".to_string(),
            format!(
                "{} / {} {}",
                result.outside_allowance, result.inside_allowance, result.units
            ),
        ),
        (
            "Max deviation (outside / inside)".to_string(),
            format!("{} / {}", result.max_outside_deviation, result.max_inside_deviation),
        ),
        ("Points checked".to_string(), input.deviations.len().to_string()),
        ("Nonconforming points".to_string(), nonconforming),
        (
            "Tolerance consumed".to_string(),
            format!("{}%", result.tolerance_consumed_pct),
        ),
    ]);
    println!("{}", result.summary);
    Ok(())
}
