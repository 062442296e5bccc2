//! Profile-of-a-surface evaluation
//!
//! The tolerance zone straddles the true profile according to the zone
//! disposition: bilateral splits it evenly, unilateral assigns it all to
//! one side, and unequally-disposed takes an explicit outside amount with
//! the remainder inside. Each measured point carries a signed deviation
//! (positive = outside the true profile) and is checked against the
//! allowance on its own side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calc::{default_units, triage, CalcStatus};
use crate::core::error::{CalcError, IssueCode, Validator};
use crate::core::rounding::{resolve_precision, round_to};

/// Disposition of the profile tolerance zone about the true profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ProfileZone {
    /// Tolerance split evenly outside/inside
    #[default]
    Bilateral,
    /// Full tolerance outside the true profile
    UnilateralOutside,
    /// Full tolerance inside the true profile
    UnilateralInside,
    /// Explicit outside amount, remainder inside
    UnequallyDisposed,
}

impl std::fmt::Display for ProfileZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileZone::Bilateral => write!(f, "bilateral"),
            ProfileZone::UnilateralOutside => write!(f, "unilateral_outside"),
            ProfileZone::UnilateralInside => write!(f, "unilateral_inside"),
            ProfileZone::UnequallyDisposed => write!(f, "unequally_disposed"),
        }
    }
}

/// Input for a profile evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInput {
    /// Stated profile tolerance (total zone width)
    pub tolerance: f64,

    /// Zone disposition
    #[serde(default)]
    pub zone: ProfileZone,

    /// Portion of the tolerance outside the true profile, required for the
    /// unequally-disposed zone (the circled-U modifier value)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outside_amount: Option<f64>,

    /// Signed deviation of each measured point (positive = outside)
    pub deviations: Vec<f64>,

    /// Units (mm, in, etc.)
    #[serde(default = "default_units")]
    pub units: String,

    /// Decimal places for reported values (1-6, default 4)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

/// Result of a profile evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResult {
    pub status: CalcStatus,
    pub summary: String,
    pub evaluated: DateTime<Utc>,
    pub units: String,

    pub zone: ProfileZone,

    /// Allowance outside the true profile
    pub outside_allowance: f64,

    /// Allowance inside the true profile
    pub inside_allowance: f64,

    /// Largest outward deviation observed (0 when every point is inside)
    pub max_outside_deviation: f64,

    /// Largest inward deviation magnitude observed (0 when every point is outside)
    pub max_inside_deviation: f64,

    /// Indices into `deviations` of the points that violate their side
    pub nonconforming_indices: Vec<usize>,

    /// Worst-case ratio of deviation to allowance on either side, as a
    /// percentage. Sides with zero allowance do not contribute a ratio;
    /// violations there still fail the point.
    pub tolerance_consumed_pct: f64,
}

/// Split the stated tolerance into (outside, inside) allowances
fn zone_allowances(input: &ProfileInput) -> (f64, f64) {
    match input.zone {
        ProfileZone::Bilateral => (input.tolerance / 2.0, input.tolerance / 2.0),
        ProfileZone::UnilateralOutside => (input.tolerance, 0.0),
        ProfileZone::UnilateralInside => (0.0, input.tolerance),
        ProfileZone::UnequallyDisposed => {
            let outside = input.outside_amount.unwrap_or(0.0);
            (outside, input.tolerance - outside)
        }
    }
}

fn validate(input: &ProfileInput) -> Result<(), CalcError> {
    let mut v = Validator::new();

    v.require(
        input.tolerance > 0.0,
        IssueCode::InvalidTolerance,
        "tolerance",
        "profile tolerance must be greater than zero",
    );
    v.require(
        !input.deviations.is_empty(),
        IssueCode::NoMeasurements,
        "deviations",
        "at least one measured point deviation is required",
    );

    if input.zone == ProfileZone::UnequallyDisposed {
        match input.outside_amount {
            None => v.push(
                IssueCode::MissingOutsideAmount,
                "outside_amount",
                "unequally disposed zone requires an outside amount",
            ),
            Some(amount) => v.require(
                amount >= 0.0 && amount <= input.tolerance,
                IssueCode::InvalidOutsideAmount,
                "outside_amount",
                format!(
                    "outside amount {} must lie within [0, {}]",
                    amount, input.tolerance
                ),
            ),
        }
    }

    v.finish()
}

/// Evaluate a profile callout, stamping the result with the current time
pub fn evaluate_profile(input: &ProfileInput) -> Result<ProfileResult, CalcError> {
    evaluate_profile_at(input, Utc::now())
}

/// Evaluate a profile callout with an explicit timestamp
pub fn evaluate_profile_at(
    input: &ProfileInput,
    when: DateTime<Utc>,
) -> Result<ProfileResult, CalcError> {
    validate(input)?;

    let precision = resolve_precision(input.precision);
    let (outside_allow, inside_allow) = zone_allowances(input);

    let mut max_outside = 0.0f64;
    let mut max_inside = 0.0f64;
    let mut nonconforming = Vec::new();

    for (idx, &dev) in input.deviations.iter().enumerate() {
        if dev > 0.0 {
            max_outside = max_outside.max(dev);
            if dev > outside_allow {
                nonconforming.push(idx);
            }
        } else if dev < 0.0 {
            let magnitude = -dev;
            max_inside = max_inside.max(magnitude);
            if magnitude > inside_allow {
                nonconforming.push(idx);
            }
        }
    }

    let mut consumed = 0.0f64;
    if outside_allow > 0.0 {
        consumed = consumed.max(max_outside / outside_allow * 100.0);
    }
    if inside_allow > 0.0 {
        consumed = consumed.max(max_inside / inside_allow * 100.0);
    }

    // Triage on the rounded value so the status matches what is reported
    let consumed = round_to(consumed, precision);
    let conforms = nonconforming.is_empty();
    let status = triage(conforms, consumed);

    let summary = format!(
        "Profile {} ({} zone): {} of {} points out, worst {}% of allowance",
        status,
        input.zone,
        nonconforming.len(),
        input.deviations.len(),
        round_to(consumed, 1),
    );

    Ok(ProfileResult {
        status,
        summary,
        evaluated: when,
        units: input.units.clone(),
        zone: input.zone,
        outside_allowance: round_to(outside_allow, precision),
        inside_allowance: round_to(inside_allow, precision),
        max_outside_deviation: round_to(max_outside, precision),
        max_inside_deviation: round_to(max_inside, precision),
        nonconforming_indices: nonconforming,
        tolerance_consumed_pct: consumed,
    })
}
