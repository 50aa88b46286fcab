//! Core types shared by the synthesis and array-factor code
//!
//! The output device takes signed 16-bit two's-complement samples. Everything
//! upstream of quantization works in `f64`.

use num_complex::Complex64;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single device sample (signed 16-bit DAC code)
pub type Sample = i16;

/// Magnitude that a normalized value of 1.0 maps to before quantization.
///
/// `+FULL_SCALE` is one code above `i16::MAX` and saturates; `-FULL_SCALE`
/// is exactly `i16::MIN`.
pub const FULL_SCALE: f64 = 32768.0;

/// Bytes occupied by one [`Sample`] in device memory
pub const BYTES_PER_SAMPLE: usize = std::mem::size_of::<Sample>();

/// Quantize a normalized value to a device sample.
///
/// Rounds to the nearest code and saturates the one value (`+FULL_SCALE`)
/// that does not fit in `i16`.
#[inline]
pub fn quantize(normalized: f64) -> Sample {
    let code = (FULL_SCALE * normalized).round();
    code.clamp(i16::MIN as f64, i16::MAX as f64) as Sample
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_extremes() {
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(1.0), i16::MAX);
        assert_eq!(quantize(-1.0), i16::MIN);
    }

    #[test]
    fn test_quantize_rounds_to_nearest() {
        // 0.5 / 32768 rounds away from zero
        assert_eq!(quantize(0.5 / FULL_SCALE), 1);
        assert_eq!(quantize(0.49 / FULL_SCALE), 0);
        assert_eq!(quantize(-1.6 / FULL_SCALE), -2);
    }

    #[test]
    fn test_bytes_per_sample() {
        assert_eq!(BYTES_PER_SAMPLE, 2);
    }
}
