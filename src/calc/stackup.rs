//! Tolerance stack-up analysis
//!
//! Aggregates a chain of linear dimensions into a resultant value under
//! worst-case, RSS, six-sigma (Cp-weighted), or Monte Carlo methods.
//! Asymmetric tolerances shift the statistical center away from the drawing
//! nominal; the mean-shift correction accounts for that before the total
//! tolerance is applied. Per-dimension contributions identify the Pareto
//! drivers of the stack.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::calc::{default_units, CalcStatus};
use crate::core::error::{CalcError, IssueCode, Validator};
use crate::core::rounding::{resolve_precision, round_to};

/// Default process capability when a dimension does not specify one
pub const DEFAULT_PROCESS_CAPABILITY: f64 = 1.33;

/// Default Monte Carlo iteration count
pub const DEFAULT_MC_ITERATIONS: u32 = 10_000;

/// Positive margin below this fraction of the acceptance span is flagged
/// as a warning
const MARGIN_WARNING_FRACTION: f64 = 0.1;

/// Direction of a dimension's contribution to the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Direction {
    /// Adds to the stack
    #[default]
    Positive,
    /// Subtracts from the stack
    Negative,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
        }
    }
}

/// Analysis method for combining dimension tolerances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum AnalysisMethod {
    /// Linear sum of tolerance half-widths
    #[default]
    WorstCase,
    /// Root sum square of independent variances
    Rss,
    /// Cp-weighted statistical stacking at +/- 3 sigma
    SixSigma,
    /// Normal-sampling simulation (sigma from Cp, as six-sigma)
    MonteCarlo,
}

impl std::fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMethod::WorstCase => write!(f, "worst_case"),
            AnalysisMethod::Rss => write!(f, "rss"),
            AnalysisMethod::SixSigma => write!(f, "six_sigma"),
            AnalysisMethod::MonteCarlo => write!(f, "monte_carlo"),
        }
    }
}

/// One dimension in the tolerance chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackupDimension {
    /// Short identifier (drawing balloon, feature id, etc.)
    #[serde(default)]
    pub id: String,

    /// Dimension name/description
    pub name: String,

    /// Nominal value
    pub nominal: f64,

    /// Plus tolerance (stored as positive number)
    pub plus_tol: f64,

    /// Minus tolerance (stored as positive number)
    pub minus_tol: f64,

    /// Direction of contribution
    #[serde(default)]
    pub direction: Direction,

    /// Sensitivity coefficient (gearing/projection multiplier)
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    /// Process capability Cp for the producing process (default 1.33)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_capability: Option<f64>,
}

fn default_sensitivity() -> f64 {
    1.0
}

impl StackupDimension {
    /// Symmetric half-width of the tolerance band
    pub fn bilateral_tolerance(&self) -> f64 {
        (self.plus_tol + self.minus_tol) / 2.0
    }

    /// Center offset of an asymmetric tolerance band from nominal
    pub fn center_offset(&self) -> f64 {
        (self.plus_tol - self.minus_tol) / 2.0
    }

    fn cp(&self) -> f64 {
        self.process_capability.unwrap_or(DEFAULT_PROCESS_CAPABILITY)
    }

    /// One standard deviation implied by the bilateral tolerance and Cp
    fn sigma(&self) -> f64 {
        (self.sensitivity * self.bilateral_tolerance()).abs() / (3.0 * self.cp())
    }
}

/// Acceptance criteria: at least one bound is expected by convention, but
/// the calculator does not enforce that
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcceptanceCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

/// A stack-up analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackupAnalysis {
    /// Analysis title/name
    #[serde(default)]
    pub name: String,

    /// Ordered chain of contributing dimensions (2 or more)
    pub dimensions: Vec<StackupDimension>,

    /// Bounds the resultant must respect
    #[serde(default)]
    pub acceptance_criteria: AcceptanceCriteria,

    /// Method used for the total tolerance
    #[serde(default)]
    pub method: AnalysisMethod,

    /// Monte Carlo iteration count (monte_carlo method only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,

    /// Units (mm, in, etc.)
    #[serde(default = "default_units")]
    pub units: String,

    /// Decimal places for reported values (1-6, default 4)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
}

/// Per-dimension share of the stack variation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub id: String,
    pub name: String,
    pub direction: Direction,
    pub bilateral_tolerance: f64,

    /// Share of the method's variance (or linear sum for worst-case) as a
    /// percentage; shares over all dimensions sum to 100 (or all 0 when
    /// every tolerance is zero)
    pub share_pct: f64,
}

/// Outcome of checking a result window against acceptance criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceCheck {
    pub passes: bool,

    /// minimum_value - minimum bound (negative = violation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_to_minimum: Option<f64>,

    /// maximum bound - maximum_value (negative = violation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin_to_maximum: Option<f64>,
}

/// Monte Carlo sample statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloStats {
    pub iterations: u32,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,

    /// Percentage of samples inside the acceptance bounds
    pub yield_pct: f64,
}

/// Result of a stack-up analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackupResult {
    pub status: CalcStatus,
    pub summary: String,
    pub evaluated: DateTime<Utc>,
    pub units: String,

    pub method: AnalysisMethod,

    /// Signed sum of nominal x sensitivity
    pub nominal_result: f64,

    /// Correction for asymmetric tolerance bands
    pub mean_shift: f64,

    /// nominal_result + mean_shift: the statistical center of the stack
    pub center: f64,

    /// Total tolerance from the chosen method (half-width about center)
    pub total_tolerance: f64,

    pub minimum_value: f64,
    pub maximum_value: f64,

    pub contributions: Vec<Contribution>,

    pub acceptance: AcceptanceCheck,

    /// Populated for the monte_carlo method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monte_carlo: Option<MonteCarloStats>,
}

/// Signed sum of each dimension's nominal scaled by its sensitivity
pub fn nominal_result(dimensions: &[StackupDimension]) -> f64 {
    dimensions
        .iter()
        .map(|d| d.direction.sign() * d.nominal * d.sensitivity)
        .sum()
}

/// Mean-shift correction: the statistical center moves off nominal when a
/// dimension's tolerance band is asymmetric
pub fn mean_shift(dimensions: &[StackupDimension]) -> f64 {
    dimensions
        .iter()
        .map(|d| d.direction.sign() * d.center_offset() * d.sensitivity)
        .sum()
}

/// Worst-case total: linear, sign-independent sum of scaled half-widths
pub fn total_worst_case(dimensions: &[StackupDimension]) -> f64 {
    dimensions
        .iter()
        .map(|d| (d.sensitivity * d.bilateral_tolerance()).abs())
        .sum()
}

/// RSS total: root sum square of scaled half-widths
pub fn total_rss(dimensions: &[StackupDimension]) -> f64 {
    dimensions
        .iter()
        .map(|d| {
            let t = d.sensitivity * d.bilateral_tolerance();
            t * t
        })
        .sum::<f64>()
        .sqrt()
}

/// Six-sigma total: 3x the RSS of Cp-derived standard deviations
pub fn total_six_sigma(dimensions: &[StackupDimension]) -> f64 {
    let variance: f64 = dimensions
        .iter()
        .map(|d| {
            let s = d.sigma();
            s * s
        })
        .sum();
    3.0 * variance.sqrt()
}

/// Per-dimension contribution shares for a method
///
/// Worst-case shares are linear (|a| x t over the linear sum); statistical
/// methods use variance terms. Monte Carlo reuses the six-sigma variance
/// terms, since the simulation samples from those same sigmas.
pub fn contributions(dimensions: &[StackupDimension], method: AnalysisMethod) -> Vec<Contribution> {
    let terms: Vec<f64> = dimensions
        .iter()
        .map(|d| {
            let scaled = (d.sensitivity * d.bilateral_tolerance()).abs();
            match method {
                AnalysisMethod::WorstCase => scaled,
                AnalysisMethod::Rss => scaled * scaled,
                AnalysisMethod::SixSigma | AnalysisMethod::MonteCarlo => {
                    let s = d.sigma();
                    s * s
                }
            }
        })
        .collect();

    let total: f64 = terms.iter().sum();

    dimensions
        .iter()
        .zip(terms)
        .map(|(d, term)| Contribution {
            id: d.id.clone(),
            name: d.name.clone(),
            direction: d.direction,
            bilateral_tolerance: d.bilateral_tolerance(),
            share_pct: if total > 0.0 { term / total * 100.0 } else { 0.0 },
        })
        .collect()
}

/// Check a [minimum_value, maximum_value] window against acceptance criteria
///
/// Passes iff (no minimum bound or minimum_value >= minimum) and (no
/// maximum bound or maximum_value <= maximum). Margins are signed distances
/// to each configured bound; a negative margin signals the violation.
pub fn check_acceptance(
    minimum_value: f64,
    maximum_value: f64,
    criteria: &AcceptanceCriteria,
) -> AcceptanceCheck {
    let margin_to_minimum = criteria.minimum.map(|min| minimum_value - min);
    let margin_to_maximum = criteria.maximum.map(|max| max - maximum_value);

    let passes = margin_to_minimum.is_none_or(|m| m >= 0.0)
        && margin_to_maximum.is_none_or(|m| m >= 0.0);

    AcceptanceCheck {
        passes,
        margin_to_minimum,
        margin_to_maximum,
    }
}

fn validate(analysis: &StackupAnalysis) -> Result<(), CalcError> {
    let mut v = Validator::new();

    v.require(
        analysis.dimensions.len() >= 2,
        IssueCode::InsufficientDimensions,
        "dimensions",
        format!(
            "stack-up needs at least 2 dimensions, got {}",
            analysis.dimensions.len()
        ),
    );

    for (idx, dim) in analysis.dimensions.iter().enumerate() {
        v.require(
            dim.plus_tol >= 0.0,
            IssueCode::InvalidTolerance,
            format!("dimensions[{}].plus_tol", idx),
            "plus tolerance cannot be negative",
        );
        v.require(
            dim.minus_tol >= 0.0,
            IssueCode::InvalidTolerance,
            format!("dimensions[{}].minus_tol", idx),
            "minus tolerance cannot be negative",
        );
        if let Some(cp) = dim.process_capability {
            v.require(
                cp > 0.0,
                IssueCode::InvalidProcessCapability,
                format!("dimensions[{}].process_capability", idx),
                "process capability must be greater than zero",
            );
        }
    }

    v.finish()
}

/// Monte Carlo sampling about the statistical center
///
/// Each dimension is drawn from a normal distribution centered on its
/// tolerance-band center with sigma = scaled bilateral / (3 Cp), via the
/// Box-Muller transform.
fn run_monte_carlo(
    dimensions: &[StackupDimension],
    criteria: &AcceptanceCriteria,
    iterations: u32,
) -> MonteCarloStats {
    let mut rng = rand::rng();
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut in_spec = 0u32;

    for _ in 0..iterations {
        let mut result = 0.0;
        for dim in dimensions {
            let mean = (dim.nominal + dim.center_offset()) * dim.sensitivity;
            let sigma = dim.sigma();

            // 1 - u keeps the log argument in (0, 1]
            let u1: f64 = rng.random();
            let u2: f64 = rng.random();
            let z = (-2.0_f64 * (1.0 - u1).ln()).sqrt()
                * (2.0_f64 * std::f64::consts::PI * u2).cos();

            result += dim.direction.sign() * (mean + sigma * z);
        }

        sum += result;
        sum_sq += result * result;
        min = min.min(result);
        max = max.max(result);
        let below_min = criteria.minimum.is_some_and(|b| result < b);
        let above_max = criteria.maximum.is_some_and(|b| result > b);
        if !below_min && !above_max {
            in_spec += 1;
        }
    }

    let n = iterations as f64;
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);

    MonteCarloStats {
        iterations,
        mean,
        std_dev: variance.sqrt(),
        min,
        max,
        yield_pct: in_spec as f64 / n * 100.0,
    }
}

/// Classify the stack-up outcome: fail on violation, warning when the
/// tightest configured margin is under 10% of the acceptance span
fn triage_stackup(
    check: &AcceptanceCheck,
    criteria: &AcceptanceCriteria,
    total_tolerance: f64,
) -> CalcStatus {
    if !check.passes {
        return CalcStatus::Fail;
    }

    let span = match (criteria.minimum, criteria.maximum) {
        (Some(min), Some(max)) => max - min,
        // One-sided criteria: measure against the result window itself
        _ => 2.0 * total_tolerance,
    };
    let threshold = span * MARGIN_WARNING_FRACTION;

    let tightest = [check.margin_to_minimum, check.margin_to_maximum]
        .into_iter()
        .flatten()
        .fold(f64::INFINITY, f64::min);

    if tightest < threshold {
        CalcStatus::Warning
    } else {
        CalcStatus::Pass
    }
}

/// Run a stack-up analysis, stamping the result with the current time
pub fn evaluate_stackup(analysis: &StackupAnalysis) -> Result<StackupResult, CalcError> {
    evaluate_stackup_at(analysis, Utc::now())
}

/// Run a stack-up analysis with an explicit timestamp
pub fn evaluate_stackup_at(
    analysis: &StackupAnalysis,
    when: DateTime<Utc>,
) -> Result<StackupResult, CalcError> {
    validate(analysis)?;

    let precision = resolve_precision(analysis.precision);
    let dims = &analysis.dimensions;

    let nominal = nominal_result(dims);
    let shift = mean_shift(dims);
    let center = nominal + shift;

    let mut monte_carlo = None;
    let total = match analysis.method {
        AnalysisMethod::WorstCase => total_worst_case(dims),
        AnalysisMethod::Rss => total_rss(dims),
        AnalysisMethod::SixSigma => total_six_sigma(dims),
        AnalysisMethod::MonteCarlo => {
            let iterations = analysis.iterations.unwrap_or(DEFAULT_MC_ITERATIONS).max(1);
            let stats = run_monte_carlo(dims, &analysis.acceptance_criteria, iterations);
            let total = 3.0 * stats.std_dev;
            monte_carlo = Some(stats);
            total
        }
    };

    let minimum_value = center - total;
    let maximum_value = center + total;

    let acceptance = check_acceptance(minimum_value, maximum_value, &analysis.acceptance_criteria);
    let status = triage_stackup(&acceptance, &analysis.acceptance_criteria, total);

    let mut contribs = contributions(dims, analysis.method);
    for c in &mut contribs {
        c.bilateral_tolerance = round_to(c.bilateral_tolerance, precision);
        c.share_pct = round_to(c.share_pct, precision);
    }

    let summary = format!(
        "Stack-up {} ({}): result {} +/- {} over {} dimensions, window [{}, {}]",
        status,
        analysis.method,
        round_to(center, precision),
        round_to(total, precision),
        dims.len(),
        round_to(minimum_value, precision),
        round_to(maximum_value, precision),
    );

    Ok(StackupResult {
        status,
        summary,
        evaluated: when,
        units: analysis.units.clone(),
        method: analysis.method,
        nominal_result: round_to(nominal, precision),
        mean_shift: round_to(shift, precision),
        center: round_to(center, precision),
        total_tolerance: round_to(total, precision),
        minimum_value: round_to(minimum_value, precision),
        maximum_value: round_to(maximum_value, precision),
        contributions: contribs,
        acceptance: AcceptanceCheck {
            passes: acceptance.passes,
            margin_to_minimum: acceptance.margin_to_minimum.map(|m| round_to(m, precision)),
            margin_to_maximum: acceptance.margin_to_maximum.map(|m| round_to(m, precision)),
        },
        monte_carlo: monte_carlo.map(|mc| MonteCarloStats {
            iterations: mc.iterations,
            mean: round_to(mc.mean, precision),
            std_dev: round_to(mc.std_dev, precision),
            min: round_to(mc.min, precision),
            max: round_to(mc.max, precision),
            yield_pct: round_to(mc.yield_pct, precision),
        }),
    })
}
