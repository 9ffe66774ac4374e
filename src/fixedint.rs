//! Fixed-width integer payload writers (spec.md §4.3).

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::encoding::WordOrder;
use crate::error::{MSError, MSResult};

/// The outcome of packing fixed-width integer samples into a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedIntOutput {
    pub bytes: Vec<u8>,
    pub samples_packed: usize,
}

fn pack<const WIDTH: usize>(
    samples: &[i32],
    max_bytes: usize,
    word_order: WordOrder,
    write: fn(&mut [u8], i32, WordOrder) -> MSResult<()>,
) -> MSResult<FixedIntOutput> {
    if samples.is_empty() {
        return Err(MSError::invalid_argument("no samples to encode"));
    }
    let max_samples = max_bytes / WIDTH;
    let n = samples.len().min(max_samples);
    let mut bytes = vec![0u8; n * WIDTH];
    for (i, &s) in samples[..n].iter().enumerate() {
        write(&mut bytes[i * WIDTH..(i + 1) * WIDTH], s, word_order)?;
    }
    Ok(FixedIntOutput {
        bytes,
        samples_packed: n,
    })
}

fn write_i16(dst: &mut [u8], v: i32, word_order: WordOrder) -> MSResult<()> {
    if v < i16::MIN as i32 || v > i16::MAX as i32 {
        return Err(MSError::compress("sample does not fit INT_16"));
    }
    match word_order {
        WordOrder::BigEndian => BigEndian::write_i16(dst, v as i16),
        WordOrder::LittleEndian => LittleEndian::write_i16(dst, v as i16),
    }
    Ok(())
}

fn write_i24(dst: &mut [u8], v: i32, word_order: WordOrder) -> MSResult<()> {
    const MIN24: i32 = -(1 << 23);
    const MAX24: i32 = (1 << 23) - 1;
    if v < MIN24 || v > MAX24 {
        return Err(MSError::compress("sample does not fit INT_24"));
    }
    match word_order {
        WordOrder::BigEndian => BigEndian::write_i24(dst, v),
        WordOrder::LittleEndian => LittleEndian::write_i24(dst, v),
    }
    Ok(())
}

fn write_i32(dst: &mut [u8], v: i32, word_order: WordOrder) -> MSResult<()> {
    match word_order {
        WordOrder::BigEndian => BigEndian::write_i32(dst, v),
        WordOrder::LittleEndian => LittleEndian::write_i32(dst, v),
    }
    Ok(())
}

/// Packs `samples` as INT_16, truncating to whatever fits in `max_bytes`.
pub fn encode_int16(samples: &[i32], max_bytes: usize, word_order: WordOrder) -> MSResult<FixedIntOutput> {
    pack::<2>(samples, max_bytes, word_order, write_i16)
}

/// Packs `samples` as INT_24.
pub fn encode_int24(samples: &[i32], max_bytes: usize, word_order: WordOrder) -> MSResult<FixedIntOutput> {
    pack::<3>(samples, max_bytes, word_order, write_i24)
}

/// Packs `samples` as INT_32.
pub fn encode_int32(samples: &[i32], max_bytes: usize, word_order: WordOrder) -> MSResult<FixedIntOutput> {
    pack::<4>(samples, max_bytes, word_order, write_i32)
}
