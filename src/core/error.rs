//! Structured validation errors shared by all calculators
//!
//! Calculators never panic on bad input. Every precondition that fails adds
//! a `ValidationIssue` with a stable code and the offending field path, and
//! the full list is returned at once so callers can report everything in a
//! single pass.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine-readable issue codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    /// Tolerance value is zero, negative, or otherwise unusable
    InvalidTolerance,
    /// Size value (nominal or actual) must be positive
    InvalidSize,
    /// A supplied measurement value is unusable (e.g. negative TIR)
    InvalidMeasurement,
    /// No measurement data of any supported kind was supplied
    NoMeasurements,
    /// Point cloud has fewer than the minimum number of points
    InsufficientPoints,
    /// Point cloud does not define a plane (collinear/coincident points)
    DegenerateGeometry,
    /// Material condition modifier requires a size dimension
    MissingSizeDimension,
    /// Material condition modifier requires a measured actual size
    MissingActualSize,
    /// Material condition modifier is not legal for this feature type
    InvalidMaterialCondition,
    /// Unequally-disposed profile zone requires an outside amount
    MissingOutsideAmount,
    /// Outside amount must lie within [0, tolerance]
    InvalidOutsideAmount,
    /// Angular deviation requires a measurement length
    MissingMeasurementLength,
    /// Stack-up needs at least two dimensions
    InsufficientDimensions,
    /// Process capability (Cp) must be positive
    InvalidProcessCapability,
}

impl std::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            IssueCode::InvalidTolerance => "INVALID_TOLERANCE",
            IssueCode::InvalidSize => "INVALID_SIZE",
            IssueCode::InvalidMeasurement => "INVALID_MEASUREMENT",
            IssueCode::NoMeasurements => "NO_MEASUREMENTS",
            IssueCode::InsufficientPoints => "INSUFFICIENT_POINTS",
            IssueCode::DegenerateGeometry => "DEGENERATE_GEOMETRY",
            IssueCode::MissingSizeDimension => "MISSING_SIZE_DIMENSION",
            IssueCode::MissingActualSize => "MISSING_ACTUAL_SIZE",
            IssueCode::InvalidMaterialCondition => "INVALID_MATERIAL_CONDITION",
            IssueCode::MissingOutsideAmount => "MISSING_OUTSIDE_AMOUNT",
            IssueCode::InvalidOutsideAmount => "INVALID_OUTSIDE_AMOUNT",
            IssueCode::MissingMeasurementLength => "MISSING_MEASUREMENT_LENGTH",
            IssueCode::InsufficientDimensions => "INSUFFICIENT_DIMENSIONS",
            IssueCode::InvalidProcessCapability => "INVALID_PROCESS_CAPABILITY",
        };
        write!(f, "{}", code)
    }
}

/// One violated precondition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Stable code for programmatic handling
    pub code: IssueCode,

    /// Path of the offending input field (e.g. "size.plus_tol")
    pub field: String,

    /// Human-readable description
    pub message: String,
}

impl ValidationIssue {
    pub fn new(code: IssueCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.code, self.field, self.message)
    }
}

/// Calculator failure: a non-empty list of validation issues
///
/// If any precondition fails, no partial result is computed; the caller
/// gets every issue found in one error value.
#[derive(Debug, Clone, Error, miette::Diagnostic)]
#[error("input validation failed ({} issue{})", .issues.len(), if .issues.len() == 1 { "" } else { "s" })]
#[diagnostic(code(gdtkit::validation))]
pub struct CalcError {
    pub issues: Vec<ValidationIssue>,
}

impl CalcError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        debug_assert!(!issues.is_empty());
        Self { issues }
    }
}

/// Accumulates validation issues across all preconditions before failing
#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue unconditionally
    pub fn push(&mut self, code: IssueCode, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(code, field, message));
    }

    /// Record an issue when `condition` is violated (i.e. false)
    pub fn require(
        &mut self,
        condition: bool,
        code: IssueCode,
        field: impl Into<String>,
        message: impl Into<String>,
    ) {
        if !condition {
            self.push(code, field, message);
        }
    }

    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Consume the validator: Ok(()) when clean, the full issue list otherwise
    pub fn finish(self) -> Result<(), CalcError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(CalcError::new(self.issues))
        }
    }
}
