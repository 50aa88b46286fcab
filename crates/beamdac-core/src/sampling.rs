//! Sampling context for one buffer fill
//!
//! The output card runs its DAC clock at a fixed native rate (625 MS/s on the
//! M4i/M4x series) that cannot land exactly on arbitrary RF frequencies.
//! Synthesis therefore runs on a finer virtual grid (`output_sample_rate`),
//! and every frequency is scaled by the ratio between the two rates:
//!
//! ```text
//! correction_factor = output_sample_rate / native_sample_rate
//!                   = 1 GS/s / 625 MS/s = 1.6
//! ```

use serde::Serialize;

use crate::error::{BeamError, Result};

/// Tolerance for deciding that the rate ratio is an integer
const INTEGRAL_RATIO_EPS: f64 = 1e-9;

/// Sample-rate and length parameters that stay fixed for one buffer fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingContext {
    native_sample_rate: f64,
    output_sample_rate: f64,
    sample_count: usize,
}

impl SamplingContext {
    /// Create a validated context.
    ///
    /// Both rates must be finite and positive, `sample_count` must be at
    /// least one.
    pub fn new(native_sample_rate: f64, output_sample_rate: f64, sample_count: usize) -> Result<Self> {
        let ctx = Self {
            native_sample_rate,
            output_sample_rate,
            sample_count,
        };
        ctx.validate()?;
        Ok(ctx)
    }

    /// Re-check the invariants. Cheap; called at the top of every synthesis.
    pub fn validate(&self) -> Result<()> {
        if self.sample_count == 0 {
            return Err(BeamError::InvalidSampleCount(self.sample_count));
        }
        if !self.native_sample_rate.is_finite() || self.native_sample_rate <= 0.0 {
            return Err(BeamError::InvalidCorrectionFactor(self.correction_factor()));
        }
        let factor = self.correction_factor();
        if !factor.is_finite() || factor <= 0.0 {
            return Err(BeamError::InvalidCorrectionFactor(factor));
        }
        Ok(())
    }

    /// Native device clock in Hz
    pub fn native_sample_rate(&self) -> f64 {
        self.native_sample_rate
    }

    /// Virtual synthesis rate in Hz
    pub fn output_sample_rate(&self) -> f64 {
        self.output_sample_rate
    }

    /// Samples per channel
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// `output_sample_rate / native_sample_rate`
    pub fn correction_factor(&self) -> f64 {
        self.output_sample_rate / self.native_sample_rate
    }

    /// Time between consecutive synthesized samples (s)
    pub fn time_step(&self) -> f64 {
        1.0 / self.output_sample_rate
    }

    /// Highest effective frequency representable without aliasing (Hz)
    pub fn nyquist_hz(&self) -> f64 {
        self.output_sample_rate / 2.0
    }

    /// Same context with a different sample count.
    pub fn with_sample_count(&self, sample_count: usize) -> Result<Self> {
        Self::new(self.native_sample_rate, self.output_sample_rate, sample_count)
    }

    /// The rate ratio as a replication factor, if it is an integer.
    ///
    /// Returns `None` for fractional ratios such as 1.6.
    pub fn integral_replication(&self) -> Option<usize> {
        let factor = self.correction_factor();
        let rounded = factor.round();
        if rounded >= 1.0 && (factor - rounded).abs() < INTEGRAL_RATIO_EPS {
            Some(rounded as usize)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_defaults() {
        let ctx = SamplingContext::new(625e6, 1e9, 65_536).unwrap();
        assert!((ctx.correction_factor() - 1.6).abs() < 1e-12);
        assert!((ctx.time_step() - 1e-9).abs() < 1e-21);
        assert_eq!(ctx.nyquist_hz(), 5e8);
        assert_eq!(ctx.integral_replication(), None);
    }

    #[test]
    fn test_integral_replication() {
        let ctx = SamplingContext::new(250e6, 1e9, 16).unwrap();
        assert_eq!(ctx.integral_replication(), Some(4));

        let ctx = SamplingContext::new(1e9, 1e9, 16).unwrap();
        assert_eq!(ctx.integral_replication(), Some(1));

        // Downsampling ratios never replicate
        let ctx = SamplingContext::new(1e9, 250e6, 16).unwrap();
        assert_eq!(ctx.integral_replication(), None);
    }

    #[test]
    fn test_zero_sample_count() {
        assert_eq!(
            SamplingContext::new(625e6, 1e9, 0),
            Err(BeamError::InvalidSampleCount(0))
        );
    }

    #[test]
    fn test_invalid_rates() {
        assert!(matches!(
            SamplingContext::new(625e6, 0.0, 16),
            Err(BeamError::InvalidCorrectionFactor(_))
        ));
        assert!(matches!(
            SamplingContext::new(625e6, -1e9, 16),
            Err(BeamError::InvalidCorrectionFactor(_))
        ));
        assert!(matches!(
            SamplingContext::new(0.0, 1e9, 16),
            Err(BeamError::InvalidCorrectionFactor(_))
        ));
        assert!(matches!(
            SamplingContext::new(f64::NAN, 1e9, 16),
            Err(BeamError::InvalidCorrectionFactor(_))
        ));
    }

    #[test]
    fn test_with_sample_count() {
        let ctx = SamplingContext::new(625e6, 1e9, 16).unwrap();
        let longer = ctx.with_sample_count(1024).unwrap();
        assert_eq!(longer.sample_count(), 1024);
        assert_eq!(longer.correction_factor(), ctx.correction_factor());
        assert!(ctx.with_sample_count(0).is_err());
    }
}
