//! Decimal rounding for reported results
//!
//! All calculator outputs are rounded to a caller-requested number of
//! decimal places using round-half-away-from-zero via decimal scaling.
//! A single algorithm lives here so every calculator rounds identically.

/// Default number of decimal places for reported values
pub const DEFAULT_PRECISION: u32 = 4;

/// Smallest accepted precision
pub const MIN_PRECISION: u32 = 1;

/// Largest accepted precision
pub const MAX_PRECISION: u32 = 6;

/// Resolve a requested precision, clamping to the supported 1..=6 range
pub fn resolve_precision(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_PRECISION)
        .clamp(MIN_PRECISION, MAX_PRECISION)
}

/// Round a value to `precision` decimal places, half away from zero
///
/// `f64::round` rounds half away from zero, so scaling by a power of ten
/// gives the decimal behavior engineering reports expect (2.5 -> 3, -2.5 -> -3).
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}
