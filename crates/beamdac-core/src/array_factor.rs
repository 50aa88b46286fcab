//! Array factor and visible region for a uniform linear array
//!
//! ## Conventions
//!
//! Element `k` (k = 0..N-1) sits at `x = k·d` and is driven with phase `k·β`,
//! where `β` is the inter-element phase step. Steering angles `θ` are measured
//! from broadside, positive toward the side on which the progressive phase
//! `k·β` compensates the path difference. In ψ-space a physical direction `θ`
//! maps to
//!
//! ```text
//! ψ(θ) = β − (2π/λ)·d·sin θ
//! ```
//!
//! so the main lobe (ψ = 0) lands at `sin θ₀ = β·λ / (2π d)`. The visible
//! region is the image of θ ∈ [−π/2, π/2]:
//!
//! ```text
//!        ψ_low = β − 2π d/λ          ψ_high = β + 2π d/λ
//!   ──────────|────────────●───────────|──────────  ψ
//!                          β
//! ```
//!
//! The array factor itself is `AF(ψ) = |Σ a_k · e^{jkψ}|`.
//!
//! ## Example
//!
//! ```rust
//! use beamdac_core::array_factor::{ArrayFactorEngine, ArrayGeometry};
//!
//! let geometry = ArrayGeometry::uniform(0.11, 3e8 / 3.5e9, 4).unwrap();
//! let beta = ArrayFactorEngine::map_beam_angle_to_phase_step(10_f64.to_radians(), &geometry);
//! let theta = ArrayFactorEngine::phase_step_to_beam_angle(beta, &geometry).unwrap();
//! assert!((theta - 10_f64.to_radians()).abs() < 1e-9);
//! ```

use std::f64::consts::PI;

use serde::Serialize;

use crate::error::{BeamError, Result};
use crate::types::Complex;
use crate::units::wavelength_from_frequency;

/// Uniform linear array description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayGeometry {
    element_spacing: f64,
    wavelength: f64,
    element_amplitudes: Vec<f64>,
}

impl ArrayGeometry {
    /// Create a geometry with explicit per-element amplitude weights.
    ///
    /// The element count is `element_amplitudes.len()`.
    pub fn new(element_spacing: f64, wavelength: f64, element_amplitudes: Vec<f64>) -> Result<Self> {
        if !element_spacing.is_finite() || element_spacing <= 0.0 {
            return Err(BeamError::InvalidGeometry(format!(
                "element spacing must be positive, got {} m",
                element_spacing
            )));
        }
        if !wavelength.is_finite() || wavelength <= 0.0 {
            return Err(BeamError::InvalidGeometry(format!(
                "wavelength must be positive, got {} m",
                wavelength
            )));
        }
        if element_amplitudes.is_empty() {
            return Err(BeamError::InvalidGeometry(
                "array needs at least one element".to_string(),
            ));
        }
        if let Some(bad) = element_amplitudes.iter().find(|a| !a.is_finite()) {
            return Err(BeamError::InvalidGeometry(format!(
                "element amplitude must be finite, got {}",
                bad
            )));
        }
        Ok(Self {
            element_spacing,
            wavelength,
            element_amplitudes,
        })
    }

    /// Create a geometry and check the amplitude list against an element count.
    pub fn with_count(
        element_spacing: f64,
        wavelength: f64,
        element_count: usize,
        element_amplitudes: Vec<f64>,
    ) -> Result<Self> {
        if element_amplitudes.len() != element_count {
            return Err(BeamError::InvalidGeometry(format!(
                "{} amplitudes given for {} elements",
                element_amplitudes.len(),
                element_count
            )));
        }
        Self::new(element_spacing, wavelength, element_amplitudes)
    }

    /// Uniformly weighted array of `element_count` elements.
    pub fn uniform(element_spacing: f64, wavelength: f64, element_count: usize) -> Result<Self> {
        Self::new(element_spacing, wavelength, vec![1.0; element_count])
    }

    /// Geometry for a carrier frequency instead of a wavelength.
    pub fn from_carrier(element_spacing: f64, carrier_hz: f64, element_amplitudes: Vec<f64>) -> Result<Self> {
        if !carrier_hz.is_finite() || carrier_hz <= 0.0 {
            return Err(BeamError::InvalidGeometry(format!(
                "carrier frequency must be positive, got {} Hz",
                carrier_hz
            )));
        }
        Self::new(element_spacing, wavelength_from_frequency(carrier_hz), element_amplitudes)
    }

    pub fn element_spacing(&self) -> f64 {
        self.element_spacing
    }

    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }

    pub fn element_count(&self) -> usize {
        self.element_amplitudes.len()
    }

    pub fn element_amplitudes(&self) -> &[f64] {
        &self.element_amplitudes
    }

    /// `d / λ`
    pub fn spacing_ratio(&self) -> f64 {
        self.element_spacing / self.wavelength
    }

    /// Electrical length of one element spacing: `2π d / λ`
    pub fn electrical_spacing(&self) -> f64 {
        2.0 * PI * self.spacing_ratio()
    }
}

/// Bounds of the ψ interval reachable by real directions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisibleRegion {
    pub lower: f64,
    pub upper: f64,
}

impl VisibleRegion {
    pub fn contains(&self, psi: f64) -> bool {
        (self.lower..=self.upper).contains(&psi)
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Stateless array-factor computations.
pub struct ArrayFactorEngine;

impl ArrayFactorEngine {
    /// `|Σ a_k e^{jkψ}|` for every ψ in `psi`.
    pub fn compute_array_factor(psi: &[f64], geometry: &ArrayGeometry) -> Vec<f64> {
        psi.iter()
            .map(|&p| Self::array_factor_at(p, geometry).norm())
            .collect()
    }

    /// Complex array factor at a single ψ.
    pub fn array_factor_at(psi: f64, geometry: &ArrayGeometry) -> Complex {
        geometry
            .element_amplitudes
            .iter()
            .enumerate()
            .map(|(k, &a)| Complex::from_polar(a, k as f64 * psi))
            .sum()
    }

    /// Global maximum of |AF| over all ψ, `Σ |a_k|`.
    ///
    /// Reached at ψ = 0 when all weights share a sign.
    pub fn peak_array_factor(geometry: &ArrayGeometry) -> f64 {
        geometry.element_amplitudes.iter().map(|a| a.abs()).sum()
    }

    /// Visible region for phase step `β`: `[β − 2πd/λ, β + 2πd/λ]`.
    pub fn compute_visible_region(phase_step: f64, geometry: &ArrayGeometry) -> VisibleRegion {
        let half_width = geometry.electrical_spacing();
        VisibleRegion {
            lower: phase_step - half_width,
            upper: phase_step + half_width,
        }
    }

    /// Largest steering angle free of grating lobes (radians, > 0).
    ///
    /// Full ±90° when `λ/d > 2`, otherwise `asin((1 − d/λ) / (d/λ))`.
    /// With `d ≥ λ` the argument drops to zero or below: grating lobes are
    /// present even at broadside and the angle is reported as unrealizable.
    pub fn compute_max_scan_angle(geometry: &ArrayGeometry) -> Result<f64> {
        if geometry.wavelength / geometry.element_spacing > 2.0 {
            return Ok(PI / 2.0);
        }
        let ratio = geometry.spacing_ratio();
        let arg = (1.0 - ratio) / ratio;
        if arg <= 0.0 {
            return Err(BeamError::UnrealizableScanAngle(arg));
        }
        checked_asin(arg)
    }

    /// Phase step that steers the main lobe to `beam_angle`: `ψ = (2π/λ)·d·sin θ`.
    pub fn map_beam_angle_to_phase_step(beam_angle: f64, geometry: &ArrayGeometry) -> f64 {
        geometry.electrical_spacing() * beam_angle.sin()
    }

    /// Steering angle produced by `phase_step`, the inverse of
    /// [`map_beam_angle_to_phase_step`](Self::map_beam_angle_to_phase_step).
    pub fn phase_step_to_beam_angle(phase_step: f64, geometry: &ArrayGeometry) -> Result<f64> {
        checked_asin(phase_step / geometry.electrical_spacing())
    }

    /// Position of physical direction `angle` in ψ-space under `phase_step`.
    pub fn psi_for_angle(angle: f64, phase_step: f64, geometry: &ArrayGeometry) -> f64 {
        phase_step - geometry.electrical_spacing() * angle.sin()
    }
}

/// arcsin that reports domain violations instead of returning NaN.
fn checked_asin(x: f64) -> Result<f64> {
    if !(-1.0..=1.0).contains(&x) {
        return Err(BeamError::UnrealizableScanAngle(x));
    }
    Ok(x.asin())
}
