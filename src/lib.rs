//! gdtkit: GD&T conformance and tolerance stack-up calculators
//!
//! Deterministic evaluation of geometric tolerances per ASME Y14.5-2018
//! (position, flatness, perpendicularity, profile) plus linear tolerance
//! stack-up analysis (worst-case, RSS, six-sigma, Monte Carlo). Inputs are
//! plain YAML files; every calculator validates fully before computing and
//! reports all violated preconditions at once.

pub mod calc;
pub mod cli;
pub mod core;
