pub mod analytical;
pub mod compare;
pub mod extract;
pub mod info;

use std::path::Path;

use anyhow::{Context, Result};
use jurin_post::JurinParams;
use tracing::debug;

/// Load parameters from `config`, or the reference-case defaults without one.
pub fn load_params(config: Option<&Path>) -> Result<JurinParams> {
    let params = match config {
        Some(path) => JurinParams::from_toml_file(path)
            .with_context(|| format!("Failed to load parameters from {:?}", path))?,
        None => JurinParams::default(),
    };
    debug!(
        config = ?config,
        field = params.extraction.field.as_str(),
        phase_limit = params.extraction.phase_limit,
        resolution = params.extraction.resolution,
        "Loaded parameters"
    );
    Ok(params)
}

/// Apply command-line overrides on top of the loaded extraction parameters.
pub fn apply_overrides(params: &mut JurinParams, phase_limit: Option<f64>, parallel: bool) {
    if let Some(limit) = phase_limit {
        params.extraction.phase_limit = limit;
    }
    if parallel {
        params.extraction.parallel = true;
    }
}
