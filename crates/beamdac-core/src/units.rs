//! Unit conversions and small numeric helpers
//!
//! Angles are radians throughout the crate; degrees only appear at the edges
//! (configuration files, CLI flags).

use std::f64::consts::PI;

/// Propagation speed used to derive wavelengths from carrier frequencies (m/s)
pub const SPEED_OF_LIGHT: f64 = 3.0e8;

/// Amplitude ratios below this floor are treated as this floor before taking logs
const LOG_FLOOR: f64 = 1e-30;

/// Wavelength in metres for a carrier frequency in Hz: `c / f`.
#[inline]
pub fn wavelength_from_frequency(frequency_hz: f64) -> f64 {
    SPEED_OF_LIGHT / frequency_hz
}

/// Convert a linear amplitude ratio to dB: `20 * log10(|x|)`.
#[inline]
pub fn amplitude_to_db(ratio: f64) -> f64 {
    20.0 * ratio.abs().max(LOG_FLOOR).log10()
}

/// Convert dB back to a linear amplitude ratio: `10^(db/20)`.
#[inline]
pub fn db_to_amplitude(db: f64) -> f64 {
    10.0f64.powf(db / 20.0)
}

/// Wrap a phase into `[0, 2π)`.
#[inline]
pub fn wrap_phase(phase: f64) -> f64 {
    phase.rem_euclid(2.0 * PI)
}

/// Evenly spaced samples over `[start, stop]`, both ends included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wavelength_3_5_ghz() {
        let lambda = wavelength_from_frequency(3.5e9);
        assert!((lambda - 0.085_714_285_714).abs() < 1e-9);
    }

    #[test]
    fn test_db_conversions() {
        assert!((amplitude_to_db(1.0)).abs() < 1e-12);
        assert!((amplitude_to_db(0.1) + 20.0).abs() < 1e-12);
        assert!((db_to_amplitude(-6.0) - 0.501_187).abs() < 1e-6);
        // Zero is floored rather than producing -inf
        assert!(amplitude_to_db(0.0).is_finite());
    }

    #[test]
    fn test_wrap_phase() {
        assert!((wrap_phase(2.5 * PI) - 0.5 * PI).abs() < 1e-12);
        assert!((wrap_phase(-0.5 * PI) - 1.5 * PI).abs() < 1e-12);
        assert_eq!(wrap_phase(0.0), 0.0);
    }

    #[test]
    fn test_linspace() {
        let xs = linspace(-1.0, 1.0, 5);
        assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
