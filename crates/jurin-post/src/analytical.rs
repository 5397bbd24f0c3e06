//! Jurin's law reference value for the equilibrium rise height.
//!
//! The equilibrium height difference between the meniscus and the free
//! surface in a 2-D channel of half-width `r` is
//!
//! ```text
//! dh = sigma cos(t) / (rho_l g r) - (r / 2) cos(t) (2 - sin(t) - asin(cos(t)) / cos(t))
//! ```
//!
//! where the second term corrects for the liquid volume held in the curved
//! meniscus. The result is returned in millimetres.

use tracing::debug;

use crate::error::{JurinError, JurinResult};
use crate::params::PhysicalParams;

/// Below this magnitude `cos(angle)` is treated as zero.
const COS_EPSILON: f64 = 1e-12;

/// Equilibrium `delta_h` in millimetres for a contact angle in degrees.
///
/// # Errors
///
/// Returns [`JurinError::DomainError`] when `cos(angle)` vanishes (90 degrees
/// and its odd multiples) or the angle is not finite, and
/// [`JurinError::InvalidParameter`] when the physical parameters are unusable.
///
/// # Example
///
/// ```
/// use jurin_post::{PhysicalParams, analytical_delta_h};
///
/// let dh = analytical_delta_h(&PhysicalParams::default(), 30.0).unwrap();
/// assert!((dh - 12.2962).abs() < 1e-4);
/// assert!(analytical_delta_h(&PhysicalParams::default(), 90.0).is_err());
/// ```
pub fn analytical_delta_h(params: &PhysicalParams, angle_degrees: f64) -> JurinResult<f64> {
    params.validate()?;
    if !angle_degrees.is_finite() {
        return Err(JurinError::domain_error(format!(
            "contact angle must be finite, got {}",
            angle_degrees
        )));
    }

    let theta = angle_degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    if cos.abs() < COS_EPSILON {
        return Err(JurinError::domain_error(format!(
            "cos({} deg) is zero; the correction term is undefined",
            angle_degrees
        )));
    }

    let r = params.r;
    let correction = (r / 2.0 * cos) * (2.0 - sin - cos.asin() / cos);
    let rise = (params.sigma * cos) / (params.rho_l * params.g * r);
    let delta_h = (rise - correction) * 1000.0;

    debug!(
        angle = angle_degrees,
        rise_mm = rise * 1000.0,
        correction_mm = correction * 1000.0,
        delta_h_mm = delta_h,
        "Analytical deltaH"
    );

    Ok(delta_h)
}
