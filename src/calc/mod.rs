//! Calculators - one module per GD&T characteristic plus stack-up analysis
//!
//! Every calculator is a pure function over an immutable input value. Each
//! has two entry points: `evaluate_*` stamps the result with `Utc::now()`,
//! and `evaluate_*_at` takes the timestamp explicitly so tests can freeze
//! the clock. Failures return a `CalcError` carrying every violated
//! precondition; no partial results are ever produced.

pub mod flatness;
pub mod perpendicularity;
pub mod position;
pub mod profile;
pub mod stackup;

use serde::{Deserialize, Serialize};

pub use flatness::{evaluate_flatness, evaluate_flatness_at, FlatnessInput, FlatnessResult};
pub use perpendicularity::{
    evaluate_perpendicularity, evaluate_perpendicularity_at, PerpendicularityInput,
    PerpendicularityResult,
};
pub use position::{evaluate_position, evaluate_position_at, PositionInput, PositionResult};
pub use profile::{evaluate_profile, evaluate_profile_at, ProfileInput, ProfileResult, ProfileZone};
pub use stackup::{
    check_acceptance, evaluate_stackup, evaluate_stackup_at, AcceptanceCheck, AcceptanceCriteria,
    AnalysisMethod, Direction, StackupAnalysis, StackupDimension, StackupResult,
};

/// Fraction of the allowable tolerance above which a conforming result is
/// flagged as a warning instead of a clean pass
pub const WARNING_CONSUMED_PCT: f64 = 90.0;

/// Result classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcStatus {
    /// Within tolerance with comfortable margin
    Pass,
    /// Within tolerance but close to the limit
    Warning,
    /// Out of tolerance
    Fail,
}

impl std::fmt::Display for CalcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalcStatus::Pass => write!(f, "pass"),
            CalcStatus::Warning => write!(f, "warning"),
            CalcStatus::Fail => write!(f, "fail"),
        }
    }
}

/// Classify a conformance outcome by how much of the allowable was consumed
pub(crate) fn triage(conforms: bool, consumed_pct: f64) -> CalcStatus {
    if !conforms {
        CalcStatus::Fail
    } else if consumed_pct >= WARNING_CONSUMED_PCT {
        CalcStatus::Warning
    } else {
        CalcStatus::Pass
    }
}

fn default_units() -> String {
    "mm".to_string()
}
