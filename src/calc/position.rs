//! Position tolerance evaluation (size + location conformance)
//!
//! Evaluates a true-position callout per ASME Y14.5-2018: resolves the size
//! limits, earns bonus tolerance from the actual size under MMC/LMC, forms
//! the deviation vector against the basic location, and compares the actual
//! position tolerance (doubled for a diametral zone) against the total
//! allowable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calc::{default_units, triage, CalcStatus};
use crate::core::error::{CalcError, IssueCode, Validator};
use crate::core::rounding::{resolve_precision, round_to};
use crate::core::size_limits::{
    bonus_tolerance, resolve_size_limits, resultant_condition, virtual_condition,
    MaterialCondition, SizeDimension, SizeLimits,
};

/// Input for a position evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionInput {
    /// Stated position tolerance from the feature control frame
    pub geometric_tolerance: f64,

    /// Whether the zone is diametral (cylindrical). True for the common
    /// diameter-symbol callout; false for a total-wide zone.
    #[serde(default = "default_true")]
    pub diametral_zone: bool,

    /// Material condition modifier
    #[serde(default)]
    pub material_condition: MaterialCondition,

    /// Size dimension of the toleranced feature
    pub size: SizeDimension,

    /// Measured actual size
    pub actual_size: f64,

    /// Basic (true) location
    pub basic_x: f64,
    pub basic_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_z: Option<f64>,

    /// Measured actual location
    pub actual_x: f64,
    pub actual_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_z: Option<f64>,

    /// Units (mm, in, etc.)
    #[serde(default = "default_units")]
    pub units: String,

    /// Decimal places for reported values (1-6, default 4)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

fn default_true() -> bool {
    true
}

/// Result of a position evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionResult {
    pub status: CalcStatus,
    pub summary: String,
    pub evaluated: DateTime<Utc>,
    pub units: String,

    /// Resolved size limits of the feature
    pub size_limits: SizeLimits,

    /// Actual size within [lower_limit, upper_limit]
    pub size_conformance: bool,

    /// Bonus tolerance earned from the actual size
    pub bonus_tolerance: f64,

    /// Stated tolerance plus bonus
    pub total_allowable_tolerance: f64,

    /// Worst-case mating boundary (reference value at RFS)
    pub virtual_condition: f64,

    /// Opposite-extreme boundary from the virtual condition
    pub resultant_condition: f64,

    /// Deviation vector components (actual - basic)
    pub deviation_x: f64,
    pub deviation_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviation_z: Option<f64>,

    /// Euclidean norm of the deviation vector
    pub radial_deviation: f64,

    /// 2x radial for a diametral zone, else radial
    pub actual_position_tolerance: f64,

    /// Actual position tolerance within the total allowable
    pub position_conformance: bool,

    /// Percentage of the allowable consumed
    pub tolerance_consumed_pct: f64,
}

fn validate(input: &PositionInput) -> Result<(), CalcError> {
    let mut v = Validator::new();

    v.require(
        input.geometric_tolerance > 0.0,
        IssueCode::InvalidTolerance,
        "geometric_tolerance",
        "geometric tolerance must be greater than zero",
    );
    v.require(
        input.size.nominal > 0.0,
        IssueCode::InvalidSize,
        "size.nominal",
        "nominal size must be greater than zero",
    );
    v.require(
        input.size.plus_tol >= 0.0,
        IssueCode::InvalidTolerance,
        "size.plus_tol",
        "plus tolerance cannot be negative",
    );
    v.require(
        input.size.minus_tol >= 0.0,
        IssueCode::InvalidTolerance,
        "size.minus_tol",
        "minus tolerance cannot be negative",
    );
    v.require(
        input.actual_size > 0.0,
        IssueCode::InvalidSize,
        "actual_size",
        "actual size must be greater than zero",
    );
    // MMC/LMC only apply to features of size; RFS carries no restriction
    if input.material_condition != MaterialCondition::Rfs {
        v.require(
            input.size.feature_type.is_feature_of_size(),
            IssueCode::InvalidMaterialCondition,
            "material_condition",
            format!(
                "{} modifier is not legal on a {} feature",
                input.material_condition, input.size.feature_type
            ),
        );
    }
    v.require(
        input.basic_z.is_some() == input.actual_z.is_some(),
        IssueCode::InvalidMeasurement,
        "actual_z",
        "basic_z and actual_z must be supplied together",
    );

    v.finish()
}

/// Evaluate a position callout, stamping the result with the current time
pub fn evaluate_position(input: &PositionInput) -> Result<PositionResult, CalcError> {
    evaluate_position_at(input, Utc::now())
}

/// Evaluate a position callout with an explicit timestamp
pub fn evaluate_position_at(
    input: &PositionInput,
    when: DateTime<Utc>,
) -> Result<PositionResult, CalcError> {
    validate(input)?;

    let precision = resolve_precision(input.precision);
    let limits = resolve_size_limits(&input.size, precision);
    let size_conformance = limits.contains(input.actual_size);

    let class = input.size.feature_type.feature_class();
    let bonus = bonus_tolerance(input.actual_size, &limits, input.material_condition, class);
    let total_allowable = input.geometric_tolerance + bonus;
    let vc = virtual_condition(&limits, input.geometric_tolerance, input.material_condition, class);
    let rc = resultant_condition(&limits, input.geometric_tolerance, input.material_condition, class);

    let dx = input.actual_x - input.basic_x;
    let dy = input.actual_y - input.basic_y;
    let dz = match (input.actual_z, input.basic_z) {
        (Some(az), Some(bz)) => Some(az - bz),
        _ => None,
    };

    let radial = (dx * dx + dy * dy + dz.map_or(0.0, |d| d * d)).sqrt();
    let actual_position = if input.diametral_zone {
        2.0 * radial
    } else {
        radial
    };

    let position_conformance = actual_position <= total_allowable;
    let conforms = size_conformance && position_conformance;
    // Triage on the rounded value so the status matches what is reported
    let consumed_pct = round_to(actual_position / total_allowable * 100.0, precision);
    let status = triage(conforms, consumed_pct);

    let summary = format!(
        "Position {}: actual {} against {} allowable ({}% consumed, bonus {}), size {}",
        status,
        round_to(actual_position, precision),
        round_to(total_allowable, precision),
        round_to(consumed_pct, 1),
        round_to(bonus, precision),
        if size_conformance {
            "in limits"
        } else {
            "out of limits"
        },
    );

    Ok(PositionResult {
        status,
        summary,
        evaluated: when,
        units: input.units.clone(),
        size_limits: limits,
        size_conformance,
        bonus_tolerance: round_to(bonus, precision),
        total_allowable_tolerance: round_to(total_allowable, precision),
        virtual_condition: round_to(vc, precision),
        resultant_condition: round_to(rc, precision),
        deviation_x: round_to(dx, precision),
        deviation_y: round_to(dy, precision),
        deviation_z: dz.map(|d| round_to(d, precision)),
        radial_deviation: round_to(radial, precision),
        actual_position_tolerance: round_to(actual_position, precision),
        position_conformance,
        tolerance_consumed_pct: consumed_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::size_limits::FeatureType;

    fn hole_at_mmc() -> PositionInput {
        // Hole 10.0 +0.1/-0.0, position 0.2 diametral at MMC
        PositionInput {
            geometric_tolerance: 0.2,
            diametral_zone: true,
            material_condition: MaterialCondition::Mmc,
            size: SizeDimension {
                nominal: 10.0,
                plus_tol: 0.1,
                minus_tol: 0.0,
                feature_type: FeatureType::Hole,
            },
            actual_size: 10.1,
            basic_x: 25.0,
            basic_y: 25.0,
            basic_z: None,
            actual_x: 25.05,
            actual_y: 25.05,
            actual_z: None,
            units: "mm".to_string(),
            precision: None,
        }
    }

    #[test]
    fn test_position_at_mmc_with_full_bonus() {
        // Worked example: bonus 0.1, allowable 0.3, diametral actual ~0.1414
        let result = evaluate_position(&hole_at_mmc()).unwrap();

        assert!((result.bonus_tolerance - 0.1).abs() < 1e-10);
        assert!((result.total_allowable_tolerance - 0.3).abs() < 1e-10);
        // VC = MMC - tol = 9.8, RC = LMC + tol = 10.3
        assert!((result.virtual_condition - 9.8).abs() < 1e-10);
        assert!((result.resultant_condition - 10.3).abs() < 1e-10);
        assert!((result.radial_deviation - 0.0707).abs() < 1e-4);
        assert!((result.actual_position_tolerance - 0.1414).abs() < 1e-4);
        assert!(result.size_conformance);
        assert!(result.position_conformance);
        assert_eq!(result.status, CalcStatus::Pass);
        assert!((result.tolerance_consumed_pct - 47.14).abs() < 0.01);
    }

    #[test]
    fn test_position_fails_outside_allowable() {
        let mut input = hole_at_mmc();
        input.actual_x = 25.2;
        input.actual_y = 25.2;

        let result = evaluate_position(&input).unwrap();
        // radial ~0.2828, diametral ~0.5657 > 0.3
        assert!(!result.position_conformance);
        assert_eq!(result.status, CalcStatus::Fail);
    }

    #[test]
    fn test_non_diametral_zone_uses_radial() {
        let mut input = hole_at_mmc();
        input.diametral_zone = false;

        let result = evaluate_position(&input).unwrap();
        assert!((result.actual_position_tolerance - result.radial_deviation).abs() < 1e-12);
    }

    #[test]
    fn test_size_violation_still_computes_with_clamped_bonus() {
        // Actual below MMC: size fails, raw bonus is negative and floors to 0
        let mut input = hole_at_mmc();
        input.actual_size = 9.9;

        let result = evaluate_position(&input).unwrap();
        assert!(!result.size_conformance);
        assert_eq!(result.bonus_tolerance, 0.0);
        assert_eq!(result.status, CalcStatus::Fail);
        // Location itself is fine
        assert!(result.position_conformance);
    }

    #[test]
    fn test_rfs_earns_no_bonus() {
        let mut input = hole_at_mmc();
        input.material_condition = MaterialCondition::Rfs;

        let result = evaluate_position(&input).unwrap();
        assert_eq!(result.bonus_tolerance, 0.0);
        assert!((result.total_allowable_tolerance - 0.2).abs() < 1e-10);
    }

    #[test]
    fn test_three_axis_deviation() {
        let mut input = hole_at_mmc();
        input.basic_z = Some(0.0);
        input.actual_z = Some(0.03);

        let result = evaluate_position(&input).unwrap();
        let expected = (0.05f64.powi(2) * 2.0 + 0.03f64.powi(2)).sqrt();
        assert!((result.radial_deviation - round_to(expected, 4)).abs() < 1e-10);
        assert_eq!(result.deviation_z, Some(0.03));
    }

    #[test]
    fn test_validation_reports_every_issue() {
        let mut input = hole_at_mmc();
        input.geometric_tolerance = 0.0;
        input.actual_size = -1.0;
        input.size.feature_type = FeatureType::Surface;

        let err = evaluate_position(&input).unwrap_err();
        let codes: Vec<_> = err.issues.iter().map(|i| i.code).collect();
        assert!(codes.contains(&IssueCode::InvalidTolerance));
        assert!(codes.contains(&IssueCode::InvalidSize));
        assert!(codes.contains(&IssueCode::InvalidMaterialCondition));
    }

    #[test]
    fn test_mismatched_z_pair_rejected() {
        let mut input = hole_at_mmc();
        input.actual_z = Some(0.1);

        let err = evaluate_position(&input).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].code, IssueCode::InvalidMeasurement);
    }

    #[test]
    fn test_timestamp_is_injected() {
        let when = "2024-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let result = evaluate_position_at(&hole_at_mmc(), when).unwrap();
        assert_eq!(result.evaluated, when);
    }

    #[test]
    fn test_result_yaml_roundtrip() {
        let result = evaluate_position(&hole_at_mmc()).unwrap();
        let yaml = serde_yml::to_string(&result).unwrap();
        let parsed: PositionResult = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.status, result.status);
        assert_eq!(parsed.total_allowable_tolerance, result.total_allowable_tolerance);
    }
}
