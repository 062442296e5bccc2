//! `gdtkit position` command

use miette::Result;

use crate::calc::{evaluate_position, PositionInput};
use crate::cli::args::CalcArgs;
use crate::cli::output::{print_detail_table, print_serialized, report_issues, status_cell};
use crate::cli::{GlobalOpts, OutputFormat};

pub fn run(args: CalcArgs, global: &GlobalOpts) -> Result<()> {
    let mut input: PositionInput = super::load_input(&args.input)?;
    if global.precision.is_some() {
        input.precision = global.precision;
    }

    let result = evaluate_position(&input).map_err(report_issues)?;

    if global.format != OutputFormat::Table {
        return print_serialized(&result, global.format);
    }

    let zone = if input.diametral_zone { "⌀ diametral" } else { "radial" };
    let mut rows = vec![
        ("Status".to_string(), status_cell(result.status)),
        ("Zone".to_string(), zone.to_string()),
        (
            "Material condition".to_string(),
            input.material_condition.to_string(),
        ),
        (
            "Size limits".to_string(),
            format!(
                "{} .. {} {}",
                result.size_limits.lower_limit, result.size_limits.upper_limit, result.units
            ),
        ),
        (
            "Size conformance".to_string(),
            if result.size_conformance { "yes" } else { "no" }.to_string(),
        ),
        (
            "Bonus tolerance".to_string(),
            format!("{} {}", result.bonus_tolerance, result.units),
        ),
        (
            "Virtual / resultant condition".to_string(),
            format!("{} / {}", result.virtual_condition, result.resultant_condition),
        ),
        (
            "Total allowable".to_string(),
            format!("{} {}", result.total_allowable_tolerance, result.units),
        ),
        (
            "Deviation (x, y)".to_string(),
            format!("({}, {})", result.deviation_x, result.deviation_y),
        ),
    ];
    if let Some(dz) = result.deviation_z {
        rows.push(("Deviation (z)".to_string(), dz.to_string()));
    }
    rows.extend([
        (
            "Actual position tolerance".to_string(),
            format!("{} {}", result.actual_position_tolerance, result.units),
        ),
        (
            "Tolerance consumed".to_string(),
            format!("{}%", result.tolerance_consumed_pct),
        ),
    ]);

    print_detail_table(rows);
    println!("{}", result.summary);
    Ok(())
}
