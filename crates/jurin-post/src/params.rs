//! Physical and extraction parameters.
//!
//! Parameters can be built in code or loaded from a TOML file. Every key is
//! optional; missing keys take the values of the reference capillary-rise
//! case (water/air in a 2-D channel, probes at x = 1 and x = 2).
//!
//! ```toml
//! [physical]
//! g = 9.81        # gravity, m/s^2
//! mu = 1.0e-3     # liquid viscosity, Pa.s
//! sigma = 0.07    # surface tension, N/m
//! rho_l = 1000.0  # liquid density, kg/m^3
//! r = 5.0e-4      # capillary radius, m
//!
//! [extraction]
//! phase_limit = 0.5
//! field = "phase_order"
//! resolution = 1000
//! vertical_axis = "y"
//! parallel = false
//!
//! [extraction.meniscus]
//! name = "meniscus"
//! start = [1.0, 0.0, 0.0]
//! end = [1.0, 8.0, 0.0]
//!
//! [[extraction.side]]
//! name = "side"
//! start = [2.0, 0.0, 0.0]
//! end = [2.0, 8.0, 0.0]
//! ```

use std::path::Path;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{JurinError, JurinResult};
use crate::probe::ProbeLine;

/// Physical constants of the capillary-rise case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalParams {
    /// Gravitational acceleration.
    pub g: f64,
    /// Liquid dynamic viscosity. Not used by the equilibrium formula.
    pub mu: f64,
    /// Surface tension.
    pub sigma: f64,
    /// Liquid density.
    pub rho_l: f64,
    /// Capillary radius (half-width of the channel).
    pub r: f64,
}

impl Default for PhysicalParams {
    fn default() -> Self {
        Self {
            g: 9.81,
            mu: 1.0e-3,
            sigma: 0.07,
            rho_l: 1000.0,
            r: 5.0e-4,
        }
    }
}

impl PhysicalParams {
    /// Check that every value the formula divides by is usable.
    pub fn validate(&self) -> JurinResult<()> {
        for (name, value) in [
            ("physical.g", self.g),
            ("physical.rho_l", self.rho_l),
            ("physical.r", self.r),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(JurinError::invalid_parameter(
                    name,
                    format!("must be finite and positive, got {}", value),
                ));
            }
        }
        for (name, value) in [("physical.sigma", self.sigma), ("physical.mu", self.mu)] {
            if !value.is_finite() {
                return Err(JurinError::invalid_parameter(
                    name,
                    format!("must be finite, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

/// Coordinate axis used as "up" when measuring interface heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

impl Axis {
    /// The coordinate of `p` along this axis.
    #[inline]
    pub fn coord(self, p: &Point3<f64>) -> f64 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
            Axis::Z => p.z,
        }
    }
}

/// Parameters controlling interface-height extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractParams {
    /// Phase values strictly below this limit belong to fluid 1.
    pub phase_limit: f64,

    /// Name of the phase-indicator field.
    pub field: String,

    /// Number of segments each probe line is divided into.
    pub resolution: usize,

    /// Axis along which heights are measured.
    pub vertical_axis: Axis,

    /// Process snapshots in parallel. Output order is unaffected.
    pub parallel: bool,

    /// Probe line through the meniscus.
    pub meniscus: ProbeLine,

    /// Reference probe lines away from the meniscus; their heights are averaged.
    pub side: Vec<ProbeLine>,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            phase_limit: 0.5,
            field: "phase_order".to_string(),
            resolution: 1000,
            vertical_axis: Axis::Y,
            parallel: false,
            meniscus: ProbeLine::new("meniscus", [1.0, 0.0, 0.0], [1.0, 8.0, 0.0]),
            side: vec![ProbeLine::new("side", [2.0, 0.0, 0.0], [2.0, 8.0, 0.0])],
        }
    }
}

impl ExtractParams {
    /// Default parameters with a custom phase limit.
    pub fn with_phase_limit(phase_limit: f64) -> Self {
        Self {
            phase_limit,
            ..Default::default()
        }
    }

    /// Check the parameters before touching any file.
    pub fn validate(&self) -> JurinResult<()> {
        if !self.phase_limit.is_finite() {
            return Err(JurinError::invalid_parameter(
                "extraction.phase_limit",
                format!("must be finite, got {}", self.phase_limit),
            ));
        }
        if self.resolution == 0 {
            return Err(JurinError::invalid_parameter(
                "extraction.resolution",
                "must be at least 1",
            ));
        }
        if self.side.is_empty() {
            return Err(JurinError::invalid_parameter(
                "extraction.side",
                "at least one side probe line is required",
            ));
        }
        for line in std::iter::once(&self.meniscus).chain(self.side.iter()) {
            if line.length() == 0.0 {
                return Err(JurinError::invalid_parameter(
                    format!("probe line '{}'", line.name),
                    "start and end points coincide",
                ));
            }
        }
        Ok(())
    }
}

/// Everything a post-processing run needs, as stored in a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JurinParams {
    pub physical: PhysicalParams,
    pub extraction: ExtractParams,
}

impl JurinParams {
    /// Parse parameters from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load and validate parameters from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> JurinResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| JurinError::io_read(path, e))?;
        let params = Self::from_toml(&contents).map_err(|e| JurinError::Config {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Validate both parameter groups.
    pub fn validate(&self) -> JurinResult<()> {
        self.physical.validate()?;
        self.extraction.validate()
    }
}
