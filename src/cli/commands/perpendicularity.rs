//! `gdtkit perp` command

use miette::Result;

use crate::calc::{evaluate_perpendicularity, PerpendicularityInput};
use crate::cli::args::CalcArgs;
use crate::cli::output::{print_detail_table, print_serialized, report_issues, status_cell};
use crate::cli::{GlobalOpts, OutputFormat};

pub fn run(args: CalcArgs, global: &GlobalOpts) -> Result<()> {
    let mut input: PerpendicularityInput = super::load_input(&args.input)?;
    if global.precision.is_some() {
        input.precision = global.precision;
    }

    let result = evaluate_perpendicularity(&input).map_err(report_issues)?;

    if global.format != OutputFormat::Table {
        return print_serialized(&result, global.format);
    }

    let mut rows = vec![
        ("Status".to_string(), status_cell(result.status)),
        (
            "Material condition".to_string(),
            input.material_condition.to_string(),
        ),
        (
            "Measured deviation".to_string(),
            format!("{} {}", result.measured_deviation, result.units),
        ),
        (
            "Bonus tolerance".to_string(),
            format!("{} {}", result.bonus_tolerance, result.units),
        ),
        (
            "Total allowable".to_string(),
            format!("{} {}", result.total_allowable_tolerance, result.units),
        ),
        (
            "Tolerance consumed".to_string(),
            format!("{}%", result.tolerance_consumed_pct),
        ),
    ];
    if let Some(ref limits) = result.size_limits {
        rows.insert(
            2,
            (
                "Size limits".to_string(),
                format!("{} .. {} {}", limits.lower_limit, limits.upper_limit, result.units),
            ),
        );
    }
    if let Some(vc) = result.virtual_condition {
        rows.insert(3, ("Virtual condition".to_string(), vc.to_string()));
    }

    print_detail_table(rows);
    println!("{}", result.summary);
    Ok(())
}
