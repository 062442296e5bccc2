//! Size limits, bonus tolerance, and boundary conditions
//!
//! The shared leaves of the GD&T calculators, per ASME Y14.5-2018:
//! - MMC/LMC/upper/lower size limits from a plus/minus size dimension
//! - bonus tolerance earned as actual size departs from MMC/LMC
//! - Virtual Condition and Resultant Condition mating boundaries
//!
//! The key distinction is feature class:
//! - **Internal** (hole, slot): material is removed, MMC = smallest size
//! - **External** (pin, boss): material remains, MMC = largest size
//! - **Surface** (surface, plane, edge): no size-of-feature semantics,
//!   never eligible for MMC/LMC modifiers or bonus tolerance

use serde::{Deserialize, Serialize};

use crate::core::rounding::round_to;

/// Feature type as called out on the drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum FeatureType {
    #[default]
    Hole,
    Slot,
    Pin,
    Boss,
    Surface,
    Plane,
    Edge,
}

impl FeatureType {
    /// Classify for MMC/LMC behavior. Exhaustive so new feature types
    /// cannot be added without deciding their class.
    pub fn feature_class(self) -> FeatureClass {
        match self {
            FeatureType::Hole | FeatureType::Slot => FeatureClass::Internal,
            FeatureType::Pin | FeatureType::Boss => FeatureClass::External,
            FeatureType::Surface | FeatureType::Plane | FeatureType::Edge => FeatureClass::Surface,
        }
    }

    /// Feature-of-size check: only these may carry MMC/LMC modifiers
    pub fn is_feature_of_size(self) -> bool {
        self.feature_class() != FeatureClass::Surface
    }
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FeatureType::Hole => "hole",
            FeatureType::Slot => "slot",
            FeatureType::Pin => "pin",
            FeatureType::Boss => "boss",
            FeatureType::Surface => "surface",
            FeatureType::Plane => "plane",
            FeatureType::Edge => "edge",
        };
        write!(f, "{}", s)
    }
}

/// Material-condition class derived from the feature type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureClass {
    /// Material removed (hole, slot) - MMC is the smallest size
    Internal,
    /// Material remains (pin, boss) - MMC is the largest size
    External,
    /// No size-of-feature semantics (surface, plane, edge)
    Surface,
}

/// Material condition modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum MaterialCondition {
    /// Maximum Material Condition
    Mmc,
    /// Least Material Condition
    Lmc,
    /// Regardless of Feature Size - never earns bonus tolerance
    #[default]
    Rfs,
}

impl std::fmt::Display for MaterialCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterialCondition::Mmc => write!(f, "MMC"),
            MaterialCondition::Lmc => write!(f, "LMC"),
            MaterialCondition::Rfs => write!(f, "RFS"),
        }
    }
}

/// A size dimension with plus/minus tolerances
/// Uses plus_tol and minus_tol instead of the +/- symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeDimension {
    /// Nominal value
    pub nominal: f64,

    /// Plus tolerance (stored as positive number)
    pub plus_tol: f64,

    /// Minus tolerance (stored as positive number)
    pub minus_tol: f64,

    /// Feature type classification - determines feature class
    #[serde(default)]
    pub feature_type: FeatureType,
}

/// Derived size limits, immutable once computed
///
/// Invariant: lower_limit <= nominal <= upper_limit and {mmc, lmc} is
/// {upper_limit, lower_limit} ordered by the feature class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeLimits {
    pub nominal: f64,
    pub mmc: f64,
    pub lmc: f64,
    pub upper_limit: f64,
    pub lower_limit: f64,
}

impl SizeLimits {
    /// Whether an actual size lies within the limits
    pub fn contains(&self, actual: f64) -> bool {
        actual >= self.lower_limit && actual <= self.upper_limit
    }
}

/// Resolve MMC/LMC/upper/lower limits from a size dimension
///
/// Internal features: MMC = lower limit, LMC = upper limit.
/// External features: the assignment is swapped.
/// Surface-class features have no size-of-feature semantics; MMC and LMC
/// collapse to nominal so no bonus tolerance is ever possible.
pub fn resolve_size_limits(dim: &SizeDimension, precision: u32) -> SizeLimits {
    let upper = round_to(dim.nominal + dim.plus_tol, precision);
    let lower = round_to(dim.nominal - dim.minus_tol, precision);

    let (mmc, lmc) = match dim.feature_type.feature_class() {
        FeatureClass::Internal => (lower, upper),
        FeatureClass::External => (upper, lower),
        FeatureClass::Surface => (dim.nominal, dim.nominal),
    };

    SizeLimits {
        nominal: dim.nominal,
        mmc,
        lmc,
        upper_limit: upper,
        lower_limit: lower,
    }
}

/// Bonus tolerance earned at the actual produced size
///
/// RFS and surface-class features earn nothing. Otherwise the bonus is the
/// departure of the actual size from the modifier's limit, clamped to >= 0:
/// an actual size outside its own limits yields a negative raw departure,
/// which is floored to zero rather than rejected (size conformance is
/// reported separately by the calculators).
pub fn bonus_tolerance(
    actual_size: f64,
    limits: &SizeLimits,
    condition: MaterialCondition,
    class: FeatureClass,
) -> f64 {
    if class == FeatureClass::Surface {
        return 0.0;
    }

    let raw = match (condition, class) {
        (MaterialCondition::Rfs, _) => 0.0,
        (MaterialCondition::Mmc, FeatureClass::Internal) => actual_size - limits.mmc,
        (MaterialCondition::Mmc, FeatureClass::External) => limits.mmc - actual_size,
        (MaterialCondition::Lmc, FeatureClass::Internal) => limits.lmc - actual_size,
        (MaterialCondition::Lmc, FeatureClass::External) => actual_size - limits.lmc,
        (_, FeatureClass::Surface) => 0.0,
    };

    raw.max(0.0)
}

/// Virtual Condition: the worst-case mating boundary
///
/// At MMC the boundary is anchored at MMC (internal subtracts the
/// geometric tolerance, external adds); at LMC it is anchored at LMC with
/// the signs flipped. RFS has no fixed boundary; the MMC size limit is
/// returned as a reference value only.
pub fn virtual_condition(
    limits: &SizeLimits,
    geometric_tolerance: f64,
    condition: MaterialCondition,
    class: FeatureClass,
) -> f64 {
    match (condition, class) {
        (MaterialCondition::Rfs, _) | (_, FeatureClass::Surface) => limits.mmc,
        (MaterialCondition::Mmc, FeatureClass::Internal) => limits.mmc - geometric_tolerance,
        (MaterialCondition::Mmc, FeatureClass::External) => limits.mmc + geometric_tolerance,
        (MaterialCondition::Lmc, FeatureClass::Internal) => limits.lmc + geometric_tolerance,
        (MaterialCondition::Lmc, FeatureClass::External) => limits.lmc - geometric_tolerance,
    }
}

/// Resultant Condition: the opposite-extreme boundary from Virtual Condition
///
/// Anchored at the limit opposite the modifier (LMC for an MMC callout,
/// MMC for an LMC callout). RFS returns the LMC size limit as a reference.
pub fn resultant_condition(
    limits: &SizeLimits,
    geometric_tolerance: f64,
    condition: MaterialCondition,
    class: FeatureClass,
) -> f64 {
    match (condition, class) {
        (MaterialCondition::Rfs, _) | (_, FeatureClass::Surface) => limits.lmc,
        (MaterialCondition::Mmc, FeatureClass::Internal) => limits.lmc + geometric_tolerance,
        (MaterialCondition::Mmc, FeatureClass::External) => limits.lmc - geometric_tolerance,
        (MaterialCondition::Lmc, FeatureClass::Internal) => limits.mmc - geometric_tolerance,
        (MaterialCondition::Lmc, FeatureClass::External) => limits.mmc + geometric_tolerance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole(nominal: f64, plus: f64, minus: f64) -> SizeDimension {
        SizeDimension {
            nominal,
            plus_tol: plus,
            minus_tol: minus,
            feature_type: FeatureType::Hole,
        }
    }

    fn pin(nominal: f64, plus: f64, minus: f64) -> SizeDimension {
        SizeDimension {
            nominal,
            plus_tol: plus,
            minus_tol: minus,
            feature_type: FeatureType::Pin,
        }
    }

    #[test]
    fn test_limits_internal() {
        // Hole: MMC = smallest, LMC = largest
        let limits = resolve_size_limits(&hole(10.0, 0.1, 0.05), 4);
        assert_eq!(limits.upper_limit, 10.1);
        assert_eq!(limits.lower_limit, 9.95);
        assert_eq!(limits.mmc, 9.95);
        assert_eq!(limits.lmc, 10.1);
    }

    #[test]
    fn test_limits_external() {
        // Pin: MMC = largest, LMC = smallest
        let limits = resolve_size_limits(&pin(10.0, 0.1, 0.05), 4);
        assert_eq!(limits.mmc, 10.1);
        assert_eq!(limits.lmc, 9.95);
    }

    #[test]
    fn test_limits_surface_collapse_to_nominal() {
        let dim = SizeDimension {
            nominal: 25.0,
            plus_tol: 0.2,
            minus_tol: 0.2,
            feature_type: FeatureType::Plane,
        };
        let limits = resolve_size_limits(&dim, 4);
        assert_eq!(limits.mmc, 25.0);
        assert_eq!(limits.lmc, 25.0);
        assert_eq!(limits.upper_limit, 25.2);
        assert_eq!(limits.lower_limit, 24.8);
    }

    #[test]
    fn test_feature_class_mapping() {
        assert_eq!(FeatureType::Hole.feature_class(), FeatureClass::Internal);
        assert_eq!(FeatureType::Slot.feature_class(), FeatureClass::Internal);
        assert_eq!(FeatureType::Pin.feature_class(), FeatureClass::External);
        assert_eq!(FeatureType::Boss.feature_class(), FeatureClass::External);
        assert_eq!(FeatureType::Surface.feature_class(), FeatureClass::Surface);
        assert!(!FeatureType::Edge.is_feature_of_size());
        assert!(FeatureType::Slot.is_feature_of_size());
    }

    #[test]
    fn test_bonus_mmc_internal() {
        // Hole 10.0 +0.1/-0.0 => MMC = 10.0, LMC = 10.1
        let limits = resolve_size_limits(&hole(10.0, 0.1, 0.0), 4);

        // At MMC: no bonus
        let b = bonus_tolerance(10.0, &limits, MaterialCondition::Mmc, FeatureClass::Internal);
        assert!((b - 0.0).abs() < 1e-10);

        // At LMC: full bonus 0.1
        let b = bonus_tolerance(10.1, &limits, MaterialCondition::Mmc, FeatureClass::Internal);
        assert!((b - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_bonus_mmc_external() {
        // Pin 9.9 +0.0/-0.1 => MMC = 9.9, LMC = 9.8
        let limits = resolve_size_limits(&pin(9.9, 0.0, 0.1), 4);

        let b = bonus_tolerance(9.9, &limits, MaterialCondition::Mmc, FeatureClass::External);
        assert!((b - 0.0).abs() < 1e-10);

        let b = bonus_tolerance(9.8, &limits, MaterialCondition::Mmc, FeatureClass::External);
        assert!((b - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_bonus_lmc_inverts_roles() {
        // Hole 10.0 +0.1/-0.0 => LMC = 10.1; departure toward MMC earns bonus
        let limits = resolve_size_limits(&hole(10.0, 0.1, 0.0), 4);
        let b = bonus_tolerance(10.02, &limits, MaterialCondition::Lmc, FeatureClass::Internal);
        assert!((b - 0.08).abs() < 1e-10);

        // Pin 9.9 +0.0/-0.1 => LMC = 9.8
        let limits = resolve_size_limits(&pin(9.9, 0.0, 0.1), 4);
        let b = bonus_tolerance(9.85, &limits, MaterialCondition::Lmc, FeatureClass::External);
        assert!((b - 0.05).abs() < 1e-10);
    }

    #[test]
    fn test_bonus_never_negative() {
        // Actual size outside its own limits floors to zero, never negative
        let limits = resolve_size_limits(&hole(10.0, 0.1, 0.0), 4);
        let b = bonus_tolerance(9.5, &limits, MaterialCondition::Mmc, FeatureClass::Internal);
        assert_eq!(b, 0.0);

        let b = bonus_tolerance(12.0, &limits, MaterialCondition::Lmc, FeatureClass::Internal);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_bonus_rfs_and_surface_zero() {
        let limits = resolve_size_limits(&hole(10.0, 0.1, 0.0), 4);
        let b = bonus_tolerance(10.1, &limits, MaterialCondition::Rfs, FeatureClass::Internal);
        assert_eq!(b, 0.0);

        let b = bonus_tolerance(10.1, &limits, MaterialCondition::Mmc, FeatureClass::Surface);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_virtual_condition_four_cases() {
        // Hole 10.0 +0.1/-0.0, position 0.2: VC at MMC = 10.0 - 0.2 = 9.8
        let hole_limits = resolve_size_limits(&hole(10.0, 0.1, 0.0), 4);
        let vc = virtual_condition(&hole_limits, 0.2, MaterialCondition::Mmc, FeatureClass::Internal);
        assert!((vc - 9.8).abs() < 1e-10);

        // Same hole at LMC: VC = 10.1 + 0.2 = 10.3
        let vc = virtual_condition(&hole_limits, 0.2, MaterialCondition::Lmc, FeatureClass::Internal);
        assert!((vc - 10.3).abs() < 1e-10);

        // Pin 9.9 +0.0/-0.1, position 0.2: VC at MMC = 9.9 + 0.2 = 10.1
        let pin_limits = resolve_size_limits(&pin(9.9, 0.0, 0.1), 4);
        let vc = virtual_condition(&pin_limits, 0.2, MaterialCondition::Mmc, FeatureClass::External);
        assert!((vc - 10.1).abs() < 1e-10);

        // Same pin at LMC: VC = 9.8 - 0.2 = 9.6
        let vc = virtual_condition(&pin_limits, 0.2, MaterialCondition::Lmc, FeatureClass::External);
        assert!((vc - 9.6).abs() < 1e-10);
    }

    #[test]
    fn test_resultant_condition_opposite_extreme() {
        // Hole 10.0 +0.1/-0.0 at MMC: RC = LMC + tol = 10.1 + 0.2 = 10.3
        let hole_limits = resolve_size_limits(&hole(10.0, 0.1, 0.0), 4);
        let rc = resultant_condition(&hole_limits, 0.2, MaterialCondition::Mmc, FeatureClass::Internal);
        assert!((rc - 10.3).abs() < 1e-10);

        // Pin 9.9 +0.0/-0.1 at MMC: RC = LMC - tol = 9.8 - 0.2 = 9.6
        let pin_limits = resolve_size_limits(&pin(9.9, 0.0, 0.1), 4);
        let rc = resultant_condition(&pin_limits, 0.2, MaterialCondition::Mmc, FeatureClass::External);
        assert!((rc - 9.6).abs() < 1e-10);
    }

    #[test]
    fn test_rfs_boundaries_are_reference_only() {
        let limits = resolve_size_limits(&hole(10.0, 0.1, 0.0), 4);
        let vc = virtual_condition(&limits, 0.2, MaterialCondition::Rfs, FeatureClass::Internal);
        assert_eq!(vc, limits.mmc);
        let rc = resultant_condition(&limits, 0.2, MaterialCondition::Rfs, FeatureClass::Internal);
        assert_eq!(rc, limits.lmc);
    }

    #[test]
    fn test_feature_type_serialization() {
        let yaml = serde_yml::to_string(&FeatureType::Boss).unwrap();
        assert!(yaml.contains("boss"));
        let parsed: FeatureType = serde_yml::from_str("hole").unwrap();
        assert_eq!(parsed, FeatureType::Hole);
    }
}
