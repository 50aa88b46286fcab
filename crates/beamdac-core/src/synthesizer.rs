//! Per-channel sinusoid synthesis
//!
//! Each channel of the array is driven by a plain tone:
//!
//! ```text
//! x[i] = round(32768 · w · sin(2π · f · cf · i / fs_out + φ))
//! ```
//!
//! where `w` is the amplitude weight, `f` the requested RF frequency, `cf` the
//! sampling correction factor and `fs_out` the virtual output rate. Samples are
//! computed on the virtual grid and the packer maps them back onto the card's
//! native clock.
//!
//! ## Example
//!
//! ```rust
//! use beamdac_core::sampling::SamplingContext;
//! use beamdac_core::synthesizer::{ChannelSignalSpec, WaveformSynthesizer};
//!
//! let ctx = SamplingContext::new(625e6, 1e9, 1024).unwrap();
//! let spec = ChannelSignalSpec::new(0, 75e6, 1.0, 0.0).unwrap();
//!
//! let waveform = WaveformSynthesizer::synthesize(&spec, &ctx).unwrap();
//! assert_eq!(waveform.len(), 1024);
//! assert_eq!(waveform.samples()[0], 0);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{BeamError, Result};
use crate::sampling::SamplingContext;
use crate::types::{quantize, Sample};

/// Frequency, amplitude and phase for one output channel.
///
/// Built through [`ChannelSignalSpec::new`], which rejects values the
/// synthesizer cannot honour. Fields are read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelSignalSpec {
    channel_index: usize,
    frequency_hz: f64,
    amplitude_weight: f64,
    phase_radians: f64,
}

impl ChannelSignalSpec {
    /// Create a channel spec.
    ///
    /// `amplitude_weight` must lie in `[-1, 1]`; larger weights would wrap
    /// around the 16-bit sample range.
    pub fn new(channel_index: usize, frequency_hz: f64, amplitude_weight: f64, phase_radians: f64) -> Result<Self> {
        if !frequency_hz.is_finite() || frequency_hz < 0.0 {
            return Err(BeamError::InvalidFrequency(frequency_hz));
        }
        if !amplitude_weight.is_finite() || !(-1.0..=1.0).contains(&amplitude_weight) {
            return Err(BeamError::AmplitudeOutOfRange(amplitude_weight));
        }
        if !phase_radians.is_finite() {
            return Err(BeamError::InvalidPhase(phase_radians));
        }
        Ok(Self {
            channel_index,
            frequency_hz,
            amplitude_weight,
            phase_radians,
        })
    }

    pub fn channel_index(&self) -> usize {
        self.channel_index
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn amplitude_weight(&self) -> f64 {
        self.amplitude_weight
    }

    pub fn phase_radians(&self) -> f64 {
        self.phase_radians
    }

    /// Frequency actually synthesized on the virtual grid
    pub fn effective_frequency(&self, ctx: &SamplingContext) -> f64 {
        self.frequency_hz * ctx.correction_factor()
    }
}

/// Quantized samples for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitizedWaveform {
    channel_index: usize,
    samples: Vec<Sample>,
}

impl DigitizedWaveform {
    /// Wrap already-quantized samples (e.g. captured or hand-built test data).
    pub fn from_samples(channel_index: usize, samples: Vec<Sample>) -> Self {
        Self {
            channel_index,
            samples,
        }
    }

    pub fn channel_index(&self) -> usize {
        self.channel_index
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest absolute code in the waveform
    pub fn peak(&self) -> u16 {
        self.samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0)
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

/// Stateless sinusoid generator.
pub struct WaveformSynthesizer;

impl WaveformSynthesizer {
    /// Synthesize `ctx.sample_count()` quantized samples for one channel.
    ///
    /// Fails with [`BeamError::AliasingDetected`] when the corrected frequency
    /// is above the Nyquist limit of the output rate.
    pub fn synthesize(spec: &ChannelSignalSpec, ctx: &SamplingContext) -> Result<DigitizedWaveform> {
        let omega = Self::angular_step(spec, ctx)?;

        let samples = (0..ctx.sample_count())
            .map(|i| {
                let value = spec.amplitude_weight * (omega * i as f64 + spec.phase_radians).sin();
                quantize(value)
            })
            .collect();

        Ok(DigitizedWaveform {
            channel_index: spec.channel_index,
            samples,
        })
    }

    /// Synthesize every spec in order.
    pub fn synthesize_all(specs: &[ChannelSignalSpec], ctx: &SamplingContext) -> Result<Vec<DigitizedWaveform>> {
        specs.iter().map(|spec| Self::synthesize(spec, ctx)).collect()
    }

    /// Un-quantized `(t, value)` pairs for plotting, `len` samples long.
    ///
    /// Values are normalized to the amplitude weight (no 32768 scaling).
    pub fn synthesize_analog(spec: &ChannelSignalSpec, ctx: &SamplingContext, len: usize) -> Result<Vec<(f64, f64)>> {
        let omega = Self::angular_step(spec, ctx)?;
        let dt = ctx.time_step();

        Ok((0..len)
            .map(|i| {
                let t = i as f64 * dt;
                let value = spec.amplitude_weight * (omega * i as f64 + spec.phase_radians).sin();
                (t, value)
            })
            .collect())
    }

    /// Phase advance per synthesized sample, after all precondition checks.
    fn angular_step(spec: &ChannelSignalSpec, ctx: &SamplingContext) -> Result<f64> {
        Self::check_realizable(spec, ctx)?;
        Ok(2.0 * PI * spec.effective_frequency(ctx) * ctx.time_step())
    }

    /// Fails when `ctx` is invalid or the tone aliases on its output clock.
    pub fn check_realizable(spec: &ChannelSignalSpec, ctx: &SamplingContext) -> Result<()> {
        ctx.validate()?;

        let effective_hz = spec.effective_frequency(ctx);
        let nyquist_hz = ctx.nyquist_hz();
        if effective_hz > nyquist_hz {
            return Err(BeamError::AliasingDetected {
                effective_hz,
                nyquist_hz,
            });
        }
        Ok(())
    }
}
