//! Command implementations

pub mod flatness;
pub mod perpendicularity;
pub mod position;
pub mod profile;
pub mod stackup;

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read and parse a YAML input file
pub(crate) fn load_input<T: DeserializeOwned + 'static>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_yml::from_str(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to parse {}", path.display()))
}
