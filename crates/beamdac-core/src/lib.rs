//! # Phased-Array Beamformer Core
//!
//! This crate computes everything a multi-channel arbitrary waveform card
//! needs to steer a uniform linear antenna array:
//!
//! - **Synthesis**: one quantized 16-bit tone per channel, with the sampling
//!   correction between the virtual synthesis grid and the card's DAC clock
//! - **Packing**: per-channel waveforms laid out in the card's buffer order
//!   (round-robin or sample-replicated)
//! - **Array factor**: pattern, visible region and steering limits
//! - **Visualization**: labelled plot series for the sector, visible region
//!   and per-channel signals
//!
//! Device I/O stays outside: the crate produces plain buffers and series.
//!
//! ## Signal Flow
//!
//! ```text
//! β / beam angle → channel phases → WaveformSynthesizer → ChannelBufferPacker → i16 buffer
//!                        │
//!                        └→ ArrayFactorEngine → plot series
//! ```
//!
//! ## Example
//!
//! ```rust
//! use beamdac_core::prelude::*;
//!
//! let ctx = SamplingContext::new(625e6, 1e9, 1024).unwrap();
//! let geometry = ArrayGeometry::from_carrier(0.04, 3.5e9, vec![1.0; 4]).unwrap();
//! let beta = ArrayFactorEngine::map_beam_angle_to_phase_step(20_f64.to_radians(), &geometry);
//!
//! let beamformer = Beamformer::new(ctx, geometry, 75e6, beta, PackingStrategy::RoundRobin).unwrap();
//! let buffer = beamformer.fill().unwrap();
//! assert_eq!(buffer.len(), 4 * 1024);
//! ```

pub mod analysis;
pub mod array_factor;
pub mod beamformer;
pub mod config;
pub mod error;
pub mod packer;
pub mod sampling;
pub mod synthesizer;
pub mod types;
pub mod units;
pub mod visualization;

// Re-export main types
pub use array_factor::{ArrayFactorEngine, ArrayGeometry, VisibleRegion};
pub use beamformer::{channel_phases, Beamformer};
pub use config::{BeamdacConfig, ConfigError};
pub use error::{BeamError, Result};
pub use packer::{ChannelBufferPacker, InterleavedBuffer, PackingStrategy};
pub use sampling::SamplingContext;
pub use synthesizer::{ChannelSignalSpec, DigitizedWaveform, WaveformSynthesizer};
pub use types::{Complex, Sample};
pub use visualization::{PlotFigure, PlotSeries, PlotSettings, SeriesColor, VisualizationData};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::array_factor::{ArrayFactorEngine, ArrayGeometry};
    pub use crate::beamformer::Beamformer;
    pub use crate::error::{BeamError, Result};
    pub use crate::packer::{ChannelBufferPacker, PackingStrategy};
    pub use crate::sampling::SamplingContext;
    pub use crate::synthesizer::{ChannelSignalSpec, WaveformSynthesizer};
}
