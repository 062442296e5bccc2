//! Flatness evaluation
//!
//! Two measurement modes:
//! - a pre-reduced total indicator reading (TIR), used directly as the
//!   measured flatness with symmetric +/- half-TIR bounds
//! - a point cloud of 3+ surface points, fit with a closed-form
//!   least-squares plane; flatness is the spread of signed point-to-plane
//!   distances
//!
//! The plane fit picks the dominant axis by comparing the three 2x2
//! cofactor determinants of the centered covariance matrix, which avoids a
//! degenerate normal when the surface is nearly parallel to an axis plane.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::calc::{default_units, triage, CalcStatus};
use crate::core::error::{CalcError, IssueCode, Validator};
use crate::core::rounding::{resolve_precision, round_to};

/// Input for a flatness evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatnessInput {
    /// Stated flatness tolerance
    pub tolerance: f64,

    /// Pre-reduced total indicator reading, if the surface was measured
    /// with a dial indicator sweep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_indicator_reading: Option<f64>,

    /// Measured surface points as [x, y, z]. Takes precedence over the TIR
    /// when both are supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f64; 3]>>,

    /// Units (mm, in, etc.)
    #[serde(default = "default_units")]
    pub units: String,

    /// Decimal places for reported values (1-6, default 4)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

/// How the measured flatness was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatnessMode {
    IndicatorReading,
    PointCloud,
}

/// Result of a flatness evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatnessResult {
    pub status: CalcStatus,
    pub summary: String,
    pub evaluated: DateTime<Utc>,
    pub units: String,

    pub mode: FlatnessMode,

    /// Peak-to-valley deviation from the reference plane
    pub measured_flatness: f64,

    /// Signed extremes about the reference plane (+/- TIR/2 in
    /// indicator-reading mode)
    pub max_deviation: f64,
    pub min_deviation: f64,

    /// Number of points used by the plane fit (0 in indicator mode)
    pub point_count: usize,

    pub tolerance: f64,
    pub tolerance_consumed_pct: f64,
}

/// Best-fit plane through a point set: unit normal and centroid
fn fit_plane(points: &[Vector3<f64>]) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let n = points.len() as f64;
    let centroid = points.iter().sum::<Vector3<f64>>() / n;

    // Centered covariance terms
    let (mut xx, mut xy, mut xz, mut yy, mut yz, mut zz) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for p in points {
        let r = p - &centroid;
        xx += r.x * r.x;
        xy += r.x * r.y;
        xz += r.x * r.z;
        yy += r.y * r.y;
        yz += r.y * r.z;
        zz += r.z * r.z;
    }

    // 2x2 cofactor determinants; the largest picks the dominant normal axis
    let det_x = yy * zz - yz * yz;
    let det_y = xx * zz - xz * xz;
    let det_z = xx * yy - xy * xy;
    let det_max = det_x.max(det_y).max(det_z);

    // Collinear or coincident points give no usable plane
    let scale = (xx + yy + zz) / n;
    if det_max <= f64::EPSILON * scale * scale {
        return None;
    }

    let normal = if det_max == det_x {
        Vector3::new(det_x, xz * yz - xy * zz, xy * yz - xz * yy)
    } else if det_max == det_y {
        Vector3::new(xz * yz - xy * zz, det_y, xy * xz - yz * xx)
    } else {
        Vector3::new(xy * yz - xz * yy, xy * xz - yz * xx, det_z)
    };

    Some((normal.normalize(), centroid))
}

fn validate(input: &FlatnessInput) -> Result<(), CalcError> {
    let mut v = Validator::new();

    v.require(
        input.tolerance > 0.0,
        IssueCode::InvalidTolerance,
        "tolerance",
        "flatness tolerance must be greater than zero",
    );

    match (&input.points, input.total_indicator_reading) {
        (None, None) => v.push(
            IssueCode::NoMeasurements,
            "points",
            "supply either a point cloud or a total indicator reading",
        ),
        (Some(points), _) => v.require(
            points.len() >= 3,
            IssueCode::InsufficientPoints,
            "points",
            format!("plane fit needs at least 3 points, got {}", points.len()),
        ),
        (None, Some(tir)) => v.require(
            tir >= 0.0,
            IssueCode::InvalidMeasurement,
            "total_indicator_reading",
            "indicator reading cannot be negative",
        ),
    }

    v.finish()
}

/// Evaluate a flatness callout, stamping the result with the current time
pub fn evaluate_flatness(input: &FlatnessInput) -> Result<FlatnessResult, CalcError> {
    evaluate_flatness_at(input, Utc::now())
}

/// Evaluate a flatness callout with an explicit timestamp
pub fn evaluate_flatness_at(
    input: &FlatnessInput,
    when: DateTime<Utc>,
) -> Result<FlatnessResult, CalcError> {
    validate(input)?;

    let precision = resolve_precision(input.precision);

    let (mode, measured, max_dev, min_dev, point_count) = match &input.points {
        Some(raw) => {
            let points: Vec<Vector3<f64>> =
                raw.iter().map(|p| Vector3::new(p[0], p[1], p[2])).collect();

            let (normal, centroid) = fit_plane(&points).ok_or_else(|| {
                CalcError::new(vec![crate::core::error::ValidationIssue::new(
                    IssueCode::DegenerateGeometry,
                    "points",
                    "points are collinear or coincident; no reference plane exists",
                )])
            })?;

            let mut max_d = f64::NEG_INFINITY;
            let mut min_d = f64::INFINITY;
            for p in &points {
                let d = normal.dot(&(p - &centroid));
                max_d = max_d.max(d);
                min_d = min_d.min(d);
            }
            (
                FlatnessMode::PointCloud,
                max_d - min_d,
                max_d,
                min_d,
                points.len(),
            )
        }
        None => {
            // Validated present above
            let tir = input.total_indicator_reading.unwrap_or(0.0);
            (FlatnessMode::IndicatorReading, tir, tir / 2.0, -tir / 2.0, 0)
        }
    };

    let conforms = measured <= input.tolerance;
    // Triage on the rounded value so the status matches what is reported
    let consumed_pct = round_to(measured / input.tolerance * 100.0, precision);
    let status = triage(conforms, consumed_pct);

    let summary = format!(
        "Flatness {}: measured {} against {} tolerance ({}% consumed)",
        status,
        round_to(measured, precision),
        round_to(input.tolerance, precision),
        round_to(consumed_pct, 1),
    );

    Ok(FlatnessResult {
        status,
        summary,
        evaluated: when,
        units: input.units.clone(),
        mode,
        measured_flatness: round_to(measured, precision),
        max_deviation: round_to(max_dev, precision),
        min_deviation: round_to(min_dev, precision),
        point_count,
        tolerance: input.tolerance,
        tolerance_consumed_pct: consumed_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud_input(points: Vec<[f64; 3]>, tolerance: f64) -> FlatnessInput {
        FlatnessInput {
            tolerance,
            total_indicator_reading: None,
            points: Some(points),
            units: "mm".to_string(),
            precision: None,
        }
    }

    #[test]
    fn test_tir_mode() {
        let input = FlatnessInput {
            tolerance: 0.05,
            total_indicator_reading: Some(0.03),
            points: None,
            units: "mm".to_string(),
            precision: None,
        };

        let result = evaluate_flatness(&input).unwrap();
        assert_eq!(result.mode, FlatnessMode::IndicatorReading);
        assert_eq!(result.measured_flatness, 0.03);
        assert_eq!(result.max_deviation, 0.015);
        assert_eq!(result.min_deviation, -0.015);
        assert_eq!(result.status, CalcStatus::Pass);
    }

    #[test]
    fn test_perfectly_flat_cloud() {
        let points = vec![
            [0.0, 0.0, 1.0],
            [10.0, 0.0, 1.0],
            [0.0, 10.0, 1.0],
            [10.0, 10.0, 1.0],
        ];
        let result = evaluate_flatness(&cloud_input(points, 0.05)).unwrap();
        assert_eq!(result.mode, FlatnessMode::PointCloud);
        assert_eq!(result.point_count, 4);
        assert!(result.measured_flatness.abs() < 1e-9);
        assert_eq!(result.status, CalcStatus::Pass);
    }

    #[test]
    fn test_cloud_spread_about_plane() {
        // z deviations -0.01 and +0.01 about z = 0: flatness 0.02
        let points = vec![
            [0.0, 0.0, 0.01],
            [10.0, 0.0, -0.01],
            [0.0, 10.0, -0.01],
            [10.0, 10.0, 0.01],
        ];
        let result = evaluate_flatness(&cloud_input(points, 0.05)).unwrap();
        assert!((result.measured_flatness - 0.02).abs() < 1e-6);
        assert_eq!(result.status, CalcStatus::Pass);
        assert!((result.tolerance_consumed_pct - 40.0).abs() < 0.01);
    }

    #[test]
    fn test_tilted_plane_is_still_flat() {
        // Points on an inclined plane z = 0.1x deviate zero from their own
        // best-fit plane even though raw z varies by 1.0
        let points = vec![
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 1.0],
            [0.0, 10.0, 0.0],
            [10.0, 10.0, 1.0],
        ];
        let result = evaluate_flatness(&cloud_input(points, 0.05)).unwrap();
        assert!(result.measured_flatness.abs() < 1e-9);
    }

    #[test]
    fn test_vertical_plane_fit() {
        // Surface parallel to the YZ plane exercises the dominant-axis
        // selection away from the z cofactor
        let points = vec![
            [1.0, 0.0, 0.0],
            [1.0, 10.0, 0.0],
            [1.0, 0.0, 10.0],
            [1.02, 10.0, 10.0],
        ];
        let result = evaluate_flatness(&cloud_input(points, 0.05)).unwrap();
        assert!(result.measured_flatness > 0.0);
        assert!(result.measured_flatness < 0.03);
    }

    #[test]
    fn test_cloud_failure() {
        let points = vec![
            [0.0, 0.0, 0.05],
            [10.0, 0.0, -0.05],
            [0.0, 10.0, -0.05],
            [10.0, 10.0, 0.05],
        ];
        let result = evaluate_flatness(&cloud_input(points, 0.05)).unwrap();
        assert!((result.measured_flatness - 0.1).abs() < 1e-6);
        assert_eq!(result.status, CalcStatus::Fail);
    }

    #[test]
    fn test_collinear_points_rejected() {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]];
        let err = evaluate_flatness(&cloud_input(points, 0.05)).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::DegenerateGeometry);
    }

    #[test]
    fn test_too_few_points_rejected() {
        let err = evaluate_flatness(&cloud_input(vec![[0.0, 0.0, 0.0]], 0.05)).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::InsufficientPoints);
    }

    #[test]
    fn test_no_measurements_rejected() {
        let input = FlatnessInput {
            tolerance: 0.05,
            total_indicator_reading: None,
            points: None,
            units: "mm".to_string(),
            precision: None,
        };
        let err = evaluate_flatness(&input).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::NoMeasurements);
    }

    #[test]
    fn test_zero_tolerance_rejected() {
        let mut input = cloud_input(vec![[0.0, 0.0, 0.0]; 3], 0.0);
        input.points = Some(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let err = evaluate_flatness(&input).unwrap_err();
        assert_eq!(err.issues[0].code, IssueCode::InvalidTolerance);
    }
}
