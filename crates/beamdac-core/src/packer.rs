//! Channel buffer packing
//!
//! The card reads one flat buffer of 16-bit codes. How the per-channel
//! waveforms are laid out in that buffer depends on the mode the card runs in:
//!
//! ```text
//! Replicated { factor: 4 }       RoundRobin (4 channels)
//!
//!   a0 a0 a0 a0 a1 a1 a1 a1 ...    c0[0] c1[0] c2[0] c3[0] c0[1] c1[1] ...
//! ```
//!
//! Packing is a pure transform. It either allocates a fresh
//! [`InterleavedBuffer`] or writes into storage the caller already owns
//! (typically the page-aligned DMA buffer handed out by the transfer layer).

use serde::{Deserialize, Serialize};

use crate::error::{BeamError, Result};
use crate::synthesizer::DigitizedWaveform;
use crate::types::{Sample, BYTES_PER_SAMPLE};

/// Layout policy for the interleaved buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PackingStrategy {
    /// One waveform, every sample repeated `factor` times back to back.
    Replicated {
        /// Physical DAC ticks per logical sample
        factor: usize,
    },
    /// All channels' samples for time index `i` before any sample of `i + 1`.
    RoundRobin,
}

impl Default for PackingStrategy {
    fn default() -> Self {
        PackingStrategy::RoundRobin
    }
}

impl PackingStrategy {
    /// Output length for `channel_count` waveforms of `sample_count` samples.
    pub fn required_len(&self, sample_count: usize, channel_count: usize) -> Result<usize> {
        self.check_channel_count(channel_count)?;
        let multiplier = match *self {
            PackingStrategy::Replicated { factor } => {
                if factor == 0 {
                    return Err(BeamError::InvalidReplicationFactor(factor));
                }
                factor
            }
            PackingStrategy::RoundRobin => channel_count,
        };
        sample_count
            .checked_mul(multiplier)
            .ok_or(BeamError::BufferTooLarge {
                sample_count,
                multiplier,
            })
    }

    fn check_channel_count(&self, count: usize) -> Result<()> {
        match self {
            PackingStrategy::Replicated { .. } if count != 1 => Err(BeamError::InvalidChannelCount {
                count,
                reason: "replicated mode takes exactly one waveform",
            }),
            PackingStrategy::RoundRobin if count == 0 => Err(BeamError::InvalidChannelCount {
                count,
                reason: "round-robin mode needs at least one waveform",
            }),
            _ => Ok(()),
        }
    }
}

/// Flat, device-ordered sample buffer ready for transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterleavedBuffer {
    samples: Vec<Sample>,
    channel_count: usize,
    strategy: PackingStrategy,
}

impl InterleavedBuffer {
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of source waveforms packed into this buffer
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn strategy(&self) -> PackingStrategy {
        self.strategy
    }

    /// Size of the buffer in device memory
    pub fn byte_len(&self) -> usize {
        self.samples.len() * BYTES_PER_SAMPLE
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

/// Stateless packer for the two layouts in [`PackingStrategy`].
pub struct ChannelBufferPacker;

impl ChannelBufferPacker {
    /// Pack `waveforms` into a newly allocated buffer.
    pub fn pack(waveforms: &[DigitizedWaveform], strategy: PackingStrategy) -> Result<InterleavedBuffer> {
        let sample_count = Self::common_len(waveforms)?;
        let len = strategy.required_len(sample_count, waveforms.len())?;

        let mut samples = vec![0; len];
        Self::write(waveforms, strategy, &mut samples);

        Ok(InterleavedBuffer {
            samples,
            channel_count: waveforms.len(),
            strategy,
        })
    }

    /// Pack `waveforms` into caller-owned storage.
    ///
    /// `out` must be exactly [`PackingStrategy::required_len`] samples long.
    pub fn pack_into(waveforms: &[DigitizedWaveform], strategy: PackingStrategy, out: &mut [Sample]) -> Result<()> {
        let sample_count = Self::common_len(waveforms)?;
        let expected = strategy.required_len(sample_count, waveforms.len())?;
        if out.len() != expected {
            return Err(BeamError::BufferSizeMismatch {
                expected,
                actual: out.len(),
            });
        }

        Self::write(waveforms, strategy, out);
        Ok(())
    }

    /// Shared sample count of all waveforms.
    fn common_len(waveforms: &[DigitizedWaveform]) -> Result<usize> {
        let first = waveforms.first().ok_or(BeamError::InvalidChannelCount {
            count: 0,
            reason: "no waveforms to pack",
        })?;
        let expected = first.len();

        for (channel, waveform) in waveforms.iter().enumerate().skip(1) {
            if waveform.len() != expected {
                return Err(BeamError::MismatchedChannelLength {
                    channel,
                    expected,
                    actual: waveform.len(),
                });
            }
        }
        Ok(expected)
    }

    // Lengths are checked by the callers.
    fn write(waveforms: &[DigitizedWaveform], strategy: PackingStrategy, out: &mut [Sample]) {
        match strategy {
            PackingStrategy::Replicated { factor } => {
                let source = waveforms[0].samples();
                for (chunk, &value) in out.chunks_exact_mut(factor).zip(source) {
                    chunk.fill(value);
                }
            }
            PackingStrategy::RoundRobin => {
                let channels = waveforms.len();
                for (i, frame) in out.chunks_exact_mut(channels).enumerate() {
                    for (slot, waveform) in frame.iter_mut().zip(waveforms) {
                        *slot = waveform.samples()[i];
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wf(channel: usize, samples: &[Sample]) -> DigitizedWaveform {
        DigitizedWaveform::from_samples(channel, samples.to_vec())
    }

    #[test]
    fn test_round_robin_two_channels() {
        let buffer = ChannelBufferPacker::pack(
            &[wf(0, &[1, 2, 3]), wf(1, &[10, 20, 30])],
            PackingStrategy::RoundRobin,
        )
        .unwrap();
        assert_eq!(buffer.samples(), &[1, 10, 2, 20, 3, 30]);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.byte_len(), 12);
    }

    #[test]
    fn test_round_robin_four_channels() {
        let waveforms: Vec<_> = (0..4)
            .map(|c| wf(c, &[c as Sample, 100 + c as Sample]))
            .collect();
        let buffer = ChannelBufferPacker::pack(&waveforms, PackingStrategy::RoundRobin).unwrap();
        assert_eq!(buffer.samples(), &[0, 1, 2, 3, 100, 101, 102, 103]);
    }

    #[test]
    fn test_replicated() {
        let buffer = ChannelBufferPacker::pack(&[wf(0, &[5, 6])], PackingStrategy::Replicated { factor: 4 }).unwrap();
        assert_eq!(buffer.samples(), &[5, 5, 5, 5, 6, 6, 6, 6]);
        assert_eq!(buffer.len(), 8);
    }

    #[test]
    fn test_replicated_factor_one_is_identity() {
        let buffer = ChannelBufferPacker::pack(&[wf(0, &[-7, 3, 9])], PackingStrategy::Replicated { factor: 1 }).unwrap();
        assert_eq!(buffer.samples(), &[-7, 3, 9]);
    }

    #[test]
    fn test_mismatched_length_by_one() {
        let result = ChannelBufferPacker::pack(
            &[wf(0, &[1, 2, 3]), wf(1, &[1, 2, 3]), wf(2, &[1, 2])],
            PackingStrategy::RoundRobin,
        );
        assert_eq!(
            result,
            Err(BeamError::MismatchedChannelLength {
                channel: 2,
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_replicated_rejects_multiple_channels() {
        let result = ChannelBufferPacker::pack(
            &[wf(0, &[1]), wf(1, &[2])],
            PackingStrategy::Replicated { factor: 4 },
        );
        assert!(matches!(result, Err(BeamError::InvalidChannelCount { count: 2, .. })));
    }

    #[test]
    fn test_zero_factor_rejected() {
        let result = ChannelBufferPacker::pack(&[wf(0, &[1])], PackingStrategy::Replicated { factor: 0 });
        assert_eq!(result, Err(BeamError::InvalidReplicationFactor(0)));
    }

    #[test]
    fn test_empty_input_rejected() {
        let result = ChannelBufferPacker::pack(&[], PackingStrategy::RoundRobin);
        assert!(matches!(result, Err(BeamError::InvalidChannelCount { count: 0, .. })));
    }

    #[test]
    fn test_pack_into_caller_storage() {
        let mut storage = [0 as Sample; 6];
        ChannelBufferPacker::pack_into(
            &[wf(0, &[1, 2, 3]), wf(1, &[10, 20, 30])],
            PackingStrategy::RoundRobin,
            &mut storage,
        )
        .unwrap();
        assert_eq!(storage, [1, 10, 2, 20, 3, 30]);
    }

    #[test]
    fn test_pack_into_wrong_size() {
        let mut storage = [0 as Sample; 5];
        let result = ChannelBufferPacker::pack_into(
            &[wf(0, &[1, 2, 3]), wf(1, &[10, 20, 30])],
            PackingStrategy::RoundRobin,
            &mut storage,
        );
        assert_eq!(
            result,
            Err(BeamError::BufferSizeMismatch {
                expected: 6,
                actual: 5,
            })
        );
    }

    #[test]
    fn test_pack_into_replicated() {
        let mut storage = [0 as Sample; 6];
        ChannelBufferPacker::pack_into(&[wf(0, &[4, -4])], PackingStrategy::Replicated { factor: 3 }, &mut storage)
            .unwrap();
        assert_eq!(storage, [4, 4, 4, -4, -4, -4]);

        let mut short = [0 as Sample; 5];
        let result =
            ChannelBufferPacker::pack_into(&[wf(0, &[4, -4])], PackingStrategy::Replicated { factor: 3 }, &mut short);
        assert_eq!(
            result,
            Err(BeamError::BufferSizeMismatch {
                expected: 6,
                actual: 5,
            })
        );
    }

    #[test]
    fn test_length_overflow_rejected() {
        let result = ChannelBufferPacker::pack(&[wf(0, &[1, 2])], PackingStrategy::Replicated { factor: usize::MAX });
        assert_eq!(
            result,
            Err(BeamError::BufferTooLarge {
                sample_count: 2,
                multiplier: usize::MAX,
            })
        );
        assert!(matches!(
            PackingStrategy::RoundRobin.required_len(usize::MAX, 2),
            Err(BeamError::BufferTooLarge { .. })
        ));
    }

    #[test]
    fn test_required_len() {
        assert_eq!(PackingStrategy::RoundRobin.required_len(65_536, 4).unwrap(), 262_144);
        assert_eq!(
            PackingStrategy::Replicated { factor: 4 }.required_len(65_536, 1).unwrap(),
            262_144
        );
    }

    #[test]
    fn test_strategy_serde() {
        let json = serde_json::to_string(&PackingStrategy::Replicated { factor: 4 }).unwrap();
        assert_eq!(json, r#"{"mode":"replicated","factor":4}"#);
        let parsed: PackingStrategy = serde_json::from_str(r#"{"mode":"round_robin"}"#).unwrap();
        assert_eq!(parsed, PackingStrategy::RoundRobin);
    }
}
