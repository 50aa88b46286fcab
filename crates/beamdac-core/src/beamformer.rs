//! Beamformer orchestration
//!
//! Ties the pieces together for one steering setting: every array element
//! gets the same RF tone, weighted by its element amplitude and delayed by
//! `k·β`. The resulting channel waveforms are packed for the card and the
//! same parameters feed the three plot views.
//!
//! ```text
//!   BeamdacConfig ──▶ Beamformer ──fill()──────────▶ InterleavedBuffer
//!                         │
//!                         └──visualization()──────▶ VisualizationData
//! ```

use tracing::{debug, info};

use crate::array_factor::{ArrayFactorEngine, ArrayGeometry};
use crate::config::BeamdacConfig;
use crate::error::Result;
use crate::packer::{ChannelBufferPacker, InterleavedBuffer, PackingStrategy};
use crate::sampling::SamplingContext;
use crate::synthesizer::{ChannelSignalSpec, DigitizedWaveform, WaveformSynthesizer};
use crate::types::Sample;
use crate::units::wrap_phase;
use crate::visualization::{self, PlotSettings, VisualizationData};

/// Phase for each of `channel_count` channels under phase step `β`.
///
/// Channel `k` gets `k·β` wrapped to `[0, 2π)`.
pub fn channel_phases(phase_step: f64, channel_count: usize) -> Vec<f64> {
    (0..channel_count)
        .map(|k| wrap_phase(k as f64 * phase_step))
        .collect()
}

/// One steering setting, ready to fill buffers.
#[derive(Debug, Clone)]
pub struct Beamformer {
    ctx: SamplingContext,
    geometry: ArrayGeometry,
    specs: Vec<ChannelSignalSpec>,
    strategy: PackingStrategy,
    phase_step: f64,
    target_angle: Option<f64>,
    plot: PlotSettings,
}

impl Beamformer {
    /// Build a beamformer driving one channel per array element.
    ///
    /// Element amplitudes double as channel amplitude weights, so they must
    /// lie in `[-1, 1]`.
    pub fn new(
        ctx: SamplingContext,
        geometry: ArrayGeometry,
        rf_frequency_hz: f64,
        phase_step: f64,
        strategy: PackingStrategy,
    ) -> Result<Self> {
        let channel_count = geometry.element_count();
        strategy.required_len(ctx.sample_count(), channel_count)?;

        let specs = channel_phases(phase_step, channel_count)
            .into_iter()
            .zip(geometry.element_amplitudes())
            .enumerate()
            .map(|(k, (phase, &weight))| ChannelSignalSpec::new(k, rf_frequency_hz, weight, phase))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            ctx,
            geometry,
            specs,
            strategy,
            phase_step,
            target_angle: None,
            plot: PlotSettings::default(),
        })
    }

    /// Build from a configuration.
    ///
    /// Run [`BeamdacConfig::validate`] first for readable messages; anything
    /// it misses is still rejected here by the typed constructors.
    pub fn from_config(config: &BeamdacConfig) -> Result<Self> {
        let device = &config.device;
        let ctx = SamplingContext::new(device.native_sample_rate, device.output_sample_rate, device.sample_count)?;

        let geometry = ArrayGeometry::with_count(
            config.array.element_spacing,
            config.array.wavelength(),
            device.channel_count,
            config.array.amplitudes(device.channel_count),
        )?;

        let (phase_step, target_angle) = match config.steering.beam_angle_deg {
            Some(deg) => {
                let angle = deg.to_radians();
                (ArrayFactorEngine::map_beam_angle_to_phase_step(angle, &geometry), Some(angle))
            }
            None => (config.steering.phase_step_deg.to_radians(), None),
        };

        let mut beamformer = Self::new(
            ctx,
            geometry,
            config.signal.rf_frequency_hz,
            phase_step,
            config.signal.packing,
        )?
        .with_plot_settings(config.plot);
        beamformer.target_angle = target_angle;
        Ok(beamformer)
    }

    /// Direction marked as the target in the visible-region view.
    pub fn with_target_angle(mut self, angle: f64) -> Self {
        self.target_angle = Some(angle);
        self
    }

    pub fn with_plot_settings(mut self, plot: PlotSettings) -> Self {
        self.plot = plot;
        self
    }

    pub fn context(&self) -> &SamplingContext {
        &self.ctx
    }

    pub fn geometry(&self) -> &ArrayGeometry {
        &self.geometry
    }

    pub fn specs(&self) -> &[ChannelSignalSpec] {
        &self.specs
    }

    pub fn strategy(&self) -> PackingStrategy {
        self.strategy
    }

    /// Inter-element phase step in radians
    pub fn phase_step(&self) -> f64 {
        self.phase_step
    }

    /// Steered main-lobe direction in radians.
    pub fn beam_angle(&self) -> Result<f64> {
        ArrayFactorEngine::phase_step_to_beam_angle(self.phase_step, &self.geometry)
    }

    /// Target direction: the configured one, else the steered direction.
    pub fn target_angle(&self) -> Result<f64> {
        match self.target_angle {
            Some(angle) => Ok(angle),
            None => self.beam_angle(),
        }
    }

    /// Interleaved buffer length in samples.
    pub fn required_len(&self) -> Result<usize> {
        self.strategy.required_len(self.ctx.sample_count(), self.specs.len())
    }

    /// Per-channel quantized waveforms.
    pub fn synthesize(&self) -> Result<Vec<DigitizedWaveform>> {
        for spec in &self.specs {
            debug!(
                "Channel {}: {:.3} MHz (effective {:.3} MHz), weight {:.3}, phase {:.2} deg",
                spec.channel_index(),
                spec.frequency_hz() / 1e6,
                spec.effective_frequency(&self.ctx) / 1e6,
                spec.amplitude_weight(),
                spec.phase_radians().to_degrees()
            );
        }
        WaveformSynthesizer::synthesize_all(&self.specs, &self.ctx)
    }

    /// Synthesize and pack into a new buffer.
    pub fn fill(&self) -> Result<InterleavedBuffer> {
        let waveforms = self.synthesize()?;
        let buffer = ChannelBufferPacker::pack(&waveforms, self.strategy)?;
        info!(
            "Filled {} samples ({} bytes) from {} channels, {:?}",
            buffer.len(),
            buffer.byte_len(),
            buffer.channel_count(),
            self.strategy
        );
        Ok(buffer)
    }

    /// Synthesize and pack into caller-owned storage of [`required_len`](Self::required_len) samples.
    pub fn fill_into(&self, out: &mut [Sample]) -> Result<()> {
        let waveforms = self.synthesize()?;
        ChannelBufferPacker::pack_into(&waveforms, self.strategy, out)?;
        info!("Filled {} caller-owned samples, {:?}", out.len(), self.strategy);
        Ok(())
    }

    /// The three plot views for this setting.
    pub fn visualization(&self) -> Result<VisualizationData> {
        let target = self.target_angle()?;
        Ok(VisualizationData {
            angular_sector: visualization::angular_sector(&self.geometry, self.phase_step, &self.plot)?,
            visible_region: visualization::visible_region(&self.geometry, self.phase_step, target, &self.plot),
            generated_signals: visualization::generated_signals(&self.specs, &self.ctx, &self.plot)?,
        })
    }
}
