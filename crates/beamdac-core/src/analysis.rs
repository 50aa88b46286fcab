//! Spectrum check for synthesized waveforms
//!
//! Runs a forward FFT over a real waveform and reports the strongest
//! positive-frequency bin. Used to confirm that a buffer really carries the
//! tone it was asked for once the sampling correction has been applied.

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

use crate::types::{Sample, FULL_SCALE};

/// Peak of a magnitude spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    /// FFT bin index (0..=N/2)
    pub bin: usize,
    /// Bin centre frequency in Hz
    pub frequency_hz: f64,
    /// Magnitude normalized by N/2, so a full-scale tone reads about 1.0
    pub magnitude: f64,
}

/// Strongest non-DC bin of a real signal sampled at `sample_rate` Hz.
///
/// Returns `None` for fewer than two samples or a non-positive rate.
pub fn dominant_frequency(signal: &[f64], sample_rate: f64) -> Option<SpectralPeak> {
    let n = signal.len();
    if n < 2 || sample_rate.is_nan() || sample_rate <= 0.0 {
        return None;
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);

    let mut buffer: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    fft.process(&mut buffer);

    let half = n / 2;
    let (bin, peak) = buffer[1..=half]
        .iter()
        .enumerate()
        .map(|(i, c)| (i + 1, c.norm()))
        .fold((0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

    Some(SpectralPeak {
        bin,
        frequency_hz: bin as f64 * sample_rate / n as f64,
        magnitude: peak / (n as f64 / 2.0),
    })
}

/// [`dominant_frequency`] over quantized DAC codes.
pub fn dominant_frequency_codes(samples: &[Sample], sample_rate: f64) -> Option<SpectralPeak> {
    let signal: Vec<f64> = samples.iter().map(|&s| s as f64 / FULL_SCALE).collect();
    dominant_frequency(&signal, sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::SamplingContext;
    use crate::synthesizer::{ChannelSignalSpec, WaveformSynthesizer};
    use std::f64::consts::PI;

    #[test]
    fn test_pure_tone_bin() {
        let n = 256;
        let fs = 1000.0;
        // bin 32 exactly
        let signal: Vec<f64> = (0..n).map(|i| (2.0 * PI * 125.0 * i as f64 / fs).sin()).collect();

        let peak = dominant_frequency(&signal, fs).unwrap();
        assert_eq!(peak.bin, 32);
        assert!((peak.frequency_hz - 125.0).abs() < 1e-9);
        assert!((peak.magnitude - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_synthesized_tone_peaks_at_effective_frequency() {
        // 75 MHz requested, corrected to 120 MHz on the 1 GS/s grid
        let ctx = SamplingContext::new(625e6, 1e9, 4096).unwrap();
        let spec = ChannelSignalSpec::new(0, 75e6, 1.0, 0.0).unwrap();
        let waveform = WaveformSynthesizer::synthesize(&spec, &ctx).unwrap();

        let peak = dominant_frequency_codes(waveform.samples(), ctx.output_sample_rate()).unwrap();
        let resolution = ctx.output_sample_rate() / ctx.sample_count() as f64;
        assert!((peak.frequency_hz - 120e6).abs() <= resolution);
    }

    #[test]
    fn test_degenerate_input() {
        assert!(dominant_frequency(&[], 1e6).is_none());
        assert!(dominant_frequency(&[1.0], 1e6).is_none());
        assert!(dominant_frequency(&[1.0, 0.0], 0.0).is_none());
    }
}
