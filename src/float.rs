//! IEEE-754 floating point payload writers (spec.md §4.4).

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::encoding::WordOrder;
use crate::error::{MSError, MSResult};

#[derive(Debug, Clone, PartialEq)]
pub struct FloatOutput {
    pub bytes: Vec<u8>,
    pub samples_packed: usize,
}

/// Packs `samples` as IEEE_FP_SP (single precision).
pub fn encode_float_sp(samples: &[f32], max_bytes: usize, word_order: WordOrder) -> MSResult<FloatOutput> {
    if samples.is_empty() {
        return Err(MSError::invalid_argument("no samples to encode"));
    }
    let n = samples.len().min(max_bytes / 4);
    let mut bytes = vec![0u8; n * 4];
    for (i, &s) in samples[..n].iter().enumerate() {
        let dst = &mut bytes[i * 4..(i + 1) * 4];
        match word_order {
            WordOrder::BigEndian => BigEndian::write_f32(dst, s),
            WordOrder::LittleEndian => LittleEndian::write_f32(dst, s),
        }
    }
    Ok(FloatOutput {
        bytes,
        samples_packed: n,
    })
}

/// Packs `samples` as IEEE_FP_DP (double precision).
pub fn encode_float_dp(samples: &[f64], max_bytes: usize, word_order: WordOrder) -> MSResult<FloatOutput> {
    if samples.is_empty() {
        return Err(MSError::invalid_argument("no samples to encode"));
    }
    let n = samples.len().min(max_bytes / 8);
    let mut bytes = vec![0u8; n * 8];
    for (i, &s) in samples[..n].iter().enumerate() {
        let dst = &mut bytes[i * 8..(i + 1) * 8];
        match word_order {
            WordOrder::BigEndian => BigEndian::write_f64(dst, s),
            WordOrder::LittleEndian => LittleEndian::write_f64(dst, s),
        }
    }
    Ok(FloatOutput {
        bytes,
        samples_packed: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn float_sp_round_trips_through_byteorder() {
        let samples = [1.5f32, -2.25, 0.0];
        let out = encode_float_sp(&samples, 1024, WordOrder::BigEndian).unwrap();
        assert_eq!(out.samples_packed, 3);
        assert_eq!(BigEndian::read_f32(&out.bytes[0..4]), 1.5);
        assert_eq!(BigEndian::read_f32(&out.bytes[4..8]), -2.25);
    }

    #[test]
    fn float_dp_truncates_to_capacity() {
        let samples = [1.0f64, 2.0, 3.0];
        let out = encode_float_dp(&samples, 16, WordOrder::LittleEndian).unwrap();
        assert_eq!(out.samples_packed, 2);
        assert_eq!(out.bytes.len(), 16);
    }
}
