//! Error types for the beamformer core.

use thiserror::Error;

/// Beamformer core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BeamError {
    /// Sample count must be at least one
    #[error("invalid sample count: {0}. Must be greater than 0")]
    InvalidSampleCount(usize),

    /// Output/native sample-rate ratio is not a positive finite number
    #[error("invalid correction factor: {0}. Must be finite and greater than 0")]
    InvalidCorrectionFactor(f64),

    /// Effective synthesized frequency is above the Nyquist limit of the output rate
    #[error("aliasing detected: effective frequency {effective_hz} Hz exceeds Nyquist limit {nyquist_hz} Hz")]
    AliasingDetected { effective_hz: f64, nyquist_hz: f64 },

    /// Channel waveforms handed to the packer differ in length
    #[error("mismatched channel length: channel {channel} has {actual} samples, expected {expected}")]
    MismatchedChannelLength {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    /// Scan angle has no physical solution (arcsin argument out of domain)
    #[error("unrealizable scan angle: arcsin argument {0} has no realizable solution")]
    UnrealizableScanAngle(f64),

    /// Amplitude weight outside [-1, 1] or not finite
    #[error("amplitude out of range: {0}. Must lie within [-1, 1]")]
    AmplitudeOutOfRange(f64),

    /// Frequency negative or not finite
    #[error("invalid frequency: {0} Hz")]
    InvalidFrequency(f64),

    /// Phase not finite
    #[error("invalid phase: {0} rad")]
    InvalidPhase(f64),

    /// Replication factor must be at least one
    #[error("invalid replication factor: {0}. Must be at least 1")]
    InvalidReplicationFactor(usize),

    /// Wrong number of channels for the selected packing strategy
    #[error("invalid channel count {count}: {reason}")]
    InvalidChannelCount { count: usize, reason: &'static str },

    /// Caller-supplied output buffer has the wrong size
    #[error("buffer size mismatch: expected {expected} samples, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Interleaved buffer length does not fit in `usize`
    #[error("buffer too large: {sample_count} samples x {multiplier} overflows")]
    BufferTooLarge { sample_count: usize, multiplier: usize },

    /// Array geometry violates its invariants
    #[error("invalid array geometry: {0}")]
    InvalidGeometry(String),
}

/// Result type alias for beamformer operations
pub type Result<T> = std::result::Result<T, BeamError>;
