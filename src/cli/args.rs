//! Command-line argument definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// GD&T conformance and tolerance stack-up calculators
#[derive(Parser, Debug)]
#[command(name = "gdtkit", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared by every command
#[derive(clap::Args, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Decimal places for reported values (1-6), overrides the input file
    #[arg(long, short = 'p', global = true)]
    pub precision: Option<u32>,
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Yaml,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a position tolerance from a YAML input file
    Position(CalcArgs),

    /// Evaluate a flatness tolerance (indicator reading or point cloud)
    Flatness(CalcArgs),

    /// Evaluate a perpendicularity tolerance
    Perp(CalcArgs),

    /// Evaluate a profile tolerance against surface deviations
    Profile(CalcArgs),

    /// Run a tolerance stack-up analysis
    Stackup(StackupArgs),
}

/// Arguments common to the single-characteristic calculators
#[derive(clap::Args, Debug)]
pub struct CalcArgs {
    /// Path to the YAML input file
    pub input: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct StackupArgs {
    /// Path to the YAML input file
    pub input: PathBuf,

    /// Override the analysis method from the input file
    #[arg(long, short = 'm', value_enum)]
    pub method: Option<MethodArg>,

    /// Monte Carlo iteration count (monte_carlo method only)
    #[arg(long, short = 'i')]
    pub iterations: Option<u32>,

    /// Write the contribution table to a CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// CLI spelling of the stack-up analysis methods
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    WorstCase,
    Rss,
    SixSigma,
    MonteCarlo,
}

impl From<MethodArg> for crate::calc::AnalysisMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::WorstCase => crate::calc::AnalysisMethod::WorstCase,
            MethodArg::Rss => crate::calc::AnalysisMethod::Rss,
            MethodArg::SixSigma => crate::calc::AnalysisMethod::SixSigma,
            MethodArg::MonteCarlo => crate::calc::AnalysisMethod::MonteCarlo,
        }
    }
}
