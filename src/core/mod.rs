//! Core module - shared leaves of the GD&T calculators

pub mod error;
pub mod rounding;
pub mod size_limits;

pub use error::{CalcError, IssueCode, ValidationIssue, Validator};
pub use rounding::{resolve_precision, round_to, DEFAULT_PRECISION};
pub use size_limits::{
    bonus_tolerance, resolve_size_limits, resultant_condition, virtual_condition, FeatureClass,
    FeatureType, MaterialCondition, SizeDimension, SizeLimits,
};
