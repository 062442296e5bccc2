//! Perpendicularity evaluation
//!
//! Accepts either a directly measured linear deviation or an angular
//! deviation over a measurement length (converted via length * tan(angle)).
//! When a material condition modifier is in play the feature must be a
//! feature of size with a size dimension and a measured actual size, and
//! the earned bonus widens the allowable zone exactly as for position.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calc::{default_units, triage, CalcStatus};
use crate::core::error::{CalcError, IssueCode, Validator};
use crate::core::rounding::{resolve_precision, round_to};
use crate::core::size_limits::{
    bonus_tolerance, resolve_size_limits, virtual_condition, MaterialCondition, SizeDimension,
    SizeLimits,
};

/// Input for a perpendicularity evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerpendicularityInput {
    /// Stated perpendicularity tolerance
    pub tolerance: f64,

    /// Directly measured linear deviation from square
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviation: Option<f64>,

    /// Angular deviation from square, in degrees. Requires
    /// `measurement_length`; ignored when `deviation` is supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angular_deviation_deg: Option<f64>,

    /// Length over which the angular deviation was observed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_length: Option<f64>,

    /// Material condition modifier (default RFS: no bonus, no size needed)
    #[serde(default)]
    pub material_condition: MaterialCondition,

    /// Size dimension, required for MMC/LMC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeDimension>,

    /// Measured actual size, required for MMC/LMC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_size: Option<f64>,

    /// Units (mm, in, etc.)
    #[serde(default = "default_units")]
    pub units: String,

    /// Decimal places for reported values (1-6, default 4)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

/// Result of a perpendicularity evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerpendicularityResult {
    pub status: CalcStatus,
    pub summary: String,
    pub evaluated: DateTime<Utc>,
    pub units: String,

    /// Linear deviation actually evaluated (derived from the angle when
    /// measured angularly)
    pub measured_deviation: f64,

    /// Bonus tolerance earned from the actual size (0 at RFS)
    pub bonus_tolerance: f64,

    /// Stated tolerance plus bonus
    pub total_allowable_tolerance: f64,

    /// Resolved size limits when a size dimension participates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_limits: Option<SizeLimits>,

    /// Worst-case mating boundary when a size dimension participates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_condition: Option<f64>,

    pub conformance: bool,
    pub tolerance_consumed_pct: f64,
}

fn validate(input: &PerpendicularityInput) -> Result<(), CalcError> {
    let mut v = Validator::new();

    v.require(
        input.tolerance > 0.0,
        IssueCode::InvalidTolerance,
        "tolerance",
        "perpendicularity tolerance must be greater than zero",
    );

    match (input.deviation, input.angular_deviation_deg) {
        (None, None) => v.push(
            IssueCode::NoMeasurements,
            "deviation",
            "supply either a linear deviation or an angular deviation",
        ),
        (None, Some(_)) => {
            match input.measurement_length {
                None => v.push(
                    IssueCode::MissingMeasurementLength,
                    "measurement_length",
                    "angular deviation requires a measurement length",
                ),
                Some(len) => v.require(
                    len > 0.0,
                    IssueCode::InvalidMeasurement,
                    "measurement_length",
                    "measurement length must be greater than zero",
                ),
            };
        }
        _ => {}
    }

    if input.material_condition != MaterialCondition::Rfs {
        match &input.size {
            None => v.push(
                IssueCode::MissingSizeDimension,
                "size",
                format!(
                    "{} modifier requires a size dimension",
                    input.material_condition
                ),
            ),
            Some(size) => {
                v.require(
                    size.feature_type.is_feature_of_size(),
                    IssueCode::InvalidMaterialCondition,
                    "material_condition",
                    format!(
                        "{} modifier is not legal on a {} feature",
                        input.material_condition, size.feature_type
                    ),
                );
                v.require(
                    size.nominal > 0.0,
                    IssueCode::InvalidSize,
                    "size.nominal",
                    "nominal size must be greater than zero",
                );
            }
        }
        v.require(
            input.actual_size.is_some(),
            IssueCode::MissingActualSize,
            "actual_size",
            format!(
                "{} modifier requires a measured actual size",
                input.material_condition
            ),
        );
    }

    v.finish()
}

/// Evaluate a perpendicularity callout, stamping the result with the current time
pub fn evaluate_perpendicularity(
    input: &PerpendicularityInput,
) -> Result<PerpendicularityResult, CalcError> {
    evaluate_perpendicularity_at(input, Utc::now())
}

/// Evaluate a perpendicularity callout with an explicit timestamp
pub fn evaluate_perpendicularity_at(
    input: &PerpendicularityInput,
    when: DateTime<Utc>,
) -> Result<PerpendicularityResult, CalcError> {
    validate(input)?;

    let precision = resolve_precision(input.precision);

    let deviation = match input.deviation {
        Some(d) => d,
        None => {
            // Both validated present
            let angle = input.angular_deviation_deg.unwrap_or(0.0);
            let length = input.measurement_length.unwrap_or(0.0);
            length * angle.to_radians().tan()
        }
    };

    let (bonus, limits, vc) = match (input.material_condition, &input.size) {
        (MaterialCondition::Rfs, _) | (_, None) => (0.0, None, None),
        (condition, Some(size)) => {
            let limits = resolve_size_limits(size, precision);
            let class = size.feature_type.feature_class();
            // actual_size validated present for non-RFS
            let actual = input.actual_size.unwrap_or(size.nominal);
            let bonus = bonus_tolerance(actual, &limits, condition, class);
            let vc = virtual_condition(&limits, input.tolerance, condition, class);
            (bonus, Some(limits), Some(vc))
        }
    };

    let total_allowable = input.tolerance + bonus;
    let measured = deviation.abs();
    let conformance = measured <= total_allowable;
    // Triage on the rounded value so the status matches what is reported
    let consumed_pct = round_to(measured / total_allowable * 100.0, precision);
    let status = triage(conformance, consumed_pct);

    let summary = format!(
        "Perpendicularity {}: measured {} against {} allowable ({}% consumed, bonus {})",
        status,
        round_to(measured, precision),
        round_to(total_allowable, precision),
        round_to(consumed_pct, 1),
        round_to(bonus, precision),
    );

    Ok(PerpendicularityResult {
        status,
        summary,
        evaluated: when,
        units: input.units.clone(),
        measured_deviation: round_to(measured, precision),
        bonus_tolerance: round_to(bonus, precision),
        total_allowable_tolerance: round_to(total_allowable, precision),
        size_limits: limits,
        virtual_condition: vc.map(|v| round_to(v, precision)),
        conformance,
        tolerance_consumed_pct: consumed_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::size_limits::FeatureType;

    fn direct_rfs(tolerance: f64, deviation: f64) -> PerpendicularityInput {
        PerpendicularityInput {
            tolerance,
            deviation: Some(deviation),
            angular_deviation_deg: None,
            measurement_length: None,
            material_condition: MaterialCondition::Rfs,
            size: None,
            actual_size: None,
            units: "mm".to_string(),
            precision: None,
        }
    }

    #[test]
    fn test_direct_deviation_pass() {
        let result = evaluate_perpendicularity(&direct_rfs(0.1, 0.04)).unwrap();
        assert_eq!(result.measured_deviation, 0.04);
        assert_eq!(result.bonus_tolerance, 0.0);
        assert_eq!(result.total_allowable_tolerance, 0.1);
        assert!(result.conformance);
        assert_eq!(result.status, CalcStatus::Pass);
    }

    #[test]
    fn test_negative_deviation_uses_magnitude() {
        let result = evaluate_perpendicularity(&direct_rfs(0.1, -0.04)).unwrap();
        assert_eq!(result.measured_deviation, 0.04);
        assert!(result.conformance);
    }

    #[test]
    fn test_angular_deviation_conversion() {
        // 0.5 degrees over 50 mm: 50 * tan(0.5deg) ~ 0.4363
        let input = PerpendicularityInput {
            tolerance: 0.5,
            deviation: None,
            angular_deviation_deg: Some(0.5),
            measurement_length: Some(50.0),
            material_condition: MaterialCondition::Rfs,
            size: None,
            actual_size: None,
            units: "mm".to_string(),
            precision: None,
        };

        let result = evaluate_perpendicularity(&input).unwrap();
        assert!((result.measured_deviation - 0.4363).abs() < 1e-3);
        assert!(result.conformance);
        assert_eq!(result.status, CalcStatus::Pass);
    }

    #[test]
    fn test_angular_without_length_rejected() {
        let input = PerpendicularityInput {
            tolerance: 0.5,
            deviation: None,
            angular_deviation_deg: Some(0.5),
            measurement_length: None,
            material_condition: MaterialCondition::Rfs,
            size: None,
            actual_size: None,
            units: "mm".to_string(),
            precision: None,
        };

        let err = evaluate_perpendicularity(&input).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::MissingMeasurementLength);
    }

    #[test]
    fn test_mmc_bonus_widens_zone() {
        // Pin 9.9 +0.0/-0.1 at MMC; actual 9.85 earns 0.05 bonus
        let input = PerpendicularityInput {
            tolerance: 0.05,
            deviation: Some(0.08),
            angular_deviation_deg: None,
            measurement_length: None,
            material_condition: MaterialCondition::Mmc,
            size: Some(SizeDimension {
                nominal: 9.9,
                plus_tol: 0.0,
                minus_tol: 0.1,
                feature_type: FeatureType::Pin,
            }),
            actual_size: Some(9.85),
            units: "mm".to_string(),
            precision: None,
        };

        let result = evaluate_perpendicularity(&input).unwrap();
        assert!((result.bonus_tolerance - 0.05).abs() < 1e-10);
        assert!((result.total_allowable_tolerance - 0.1).abs() < 1e-10);
        assert!(result.conformance);
        assert!(result.size_limits.is_some());
        // External at MMC: VC = MMC + tol = 9.95
        assert_eq!(result.virtual_condition, Some(9.95));
    }

    #[test]
    fn test_mmc_requires_size_and_actual() {
        let input = PerpendicularityInput {
            tolerance: 0.05,
            deviation: Some(0.02),
            angular_deviation_deg: None,
            measurement_length: None,
            material_condition: MaterialCondition::Mmc,
            size: None,
            actual_size: None,
            units: "mm".to_string(),
            precision: None,
        };

        let err = evaluate_perpendicularity(&input).unwrap_err();
        let codes: Vec<_> = err.issues.iter().map(|i| i.code).collect();
        assert!(codes.contains(&IssueCode::MissingSizeDimension));
        assert!(codes.contains(&IssueCode::MissingActualSize));
    }

    #[test]
    fn test_surface_feature_rejects_modifier() {
        let input = PerpendicularityInput {
            tolerance: 0.05,
            deviation: Some(0.02),
            angular_deviation_deg: None,
            measurement_length: None,
            material_condition: MaterialCondition::Lmc,
            size: Some(SizeDimension {
                nominal: 20.0,
                plus_tol: 0.1,
                minus_tol: 0.1,
                feature_type: FeatureType::Plane,
            }),
            actual_size: Some(20.0),
            units: "mm".to_string(),
            precision: None,
        };

        let err = evaluate_perpendicularity(&input).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::InvalidMaterialCondition);
    }

    #[test]
    fn test_failure_over_allowable() {
        let result = evaluate_perpendicularity(&direct_rfs(0.05, 0.08)).unwrap();
        assert!(!result.conformance);
        assert_eq!(result.status, CalcStatus::Fail);
        assert!((result.tolerance_consumed_pct - 160.0).abs() < 0.01);
    }

    #[test]
    fn test_warning_near_limit() {
        let result = evaluate_perpendicularity(&direct_rfs(0.1, 0.095)).unwrap();
        assert!(result.conformance);
        assert_eq!(result.status, CalcStatus::Warning);
    }
}
