//! The fixed SDR header, blockette chain, and time arithmetic.
//!
//! spec.md §1 treats this as an external collaborator consumed by the
//! packing core through six opaque operations (`init_header`,
//! `update_header`, `find_blockette`, `duplicate`, `time_interval`,
//! `add_time`/`add_dtime`). Since this crate has no external header library
//! to link against, those operations live here instead — see SPEC_FULL.md §4.6.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use time::{Duration, OffsetDateTime};

use crate::encoding::{DataEncoding, WordOrder};
use crate::error::{MSError, MSResult};
use crate::trace::TraceHeader;

/// Size in bytes of the fixed SDR header, not including the blockette chain.
pub const FIXED_HEADER_SIZE: usize = 48;

/// Offset of the number-of-samples field within the fixed header.
const OFFSET_NUM_SAMPLES: usize = 30;
/// Offset of the number-of-blockettes-that-follow field.
const OFFSET_NUM_BLOCKETTES: usize = 39;
/// Offset of the "beginning of data" field within the fixed header.
const OFFSET_FIRST_DATA: usize = 44;
/// Offset of the "first blockette" field within the fixed header.
const OFFSET_FIRST_BLOCKETTE: usize = 46;

/// A blockette in a trace's blockette chain (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
pub enum Blockette {
    /// Blockette 100: supplies a measured `actual_rate` overriding the
    /// nominal rate for time arithmetic.
    Blockette100 { actual_rate: f32 },
    /// Blockette 1000: the required encoding descriptor.
    Blockette1000 {
        encoding: DataEncoding,
        word_order: WordOrder,
        rec_length_exp: u8,
    },
    /// Any other SEED blockette, carried opaquely.
    Other { code: u16, body: Vec<u8> },
}

impl Blockette {
    /// The SEED blockette type code.
    pub fn code(&self) -> u16 {
        match self {
            Self::Blockette100 { .. } => 100,
            Self::Blockette1000 { .. } => 1000,
            Self::Other { code, .. } => *code,
        }
    }

    /// Total encoded length in bytes, including the 4-byte blockette header
    /// (type + next-blockette offset).
    fn encoded_len(&self) -> usize {
        match self {
            Self::Blockette100 { .. } => 12,
            Self::Blockette1000 { .. } => 8,
            Self::Other { body, .. } => 4 + body.len(),
        }
    }

    fn write<O: ByteOrder>(&self, dst: &mut [u8], next_blockette: u16) {
        O::write_u16(&mut dst[0..2], self.code());
        O::write_u16(&mut dst[2..4], next_blockette);

        match self {
            Self::Blockette100 { actual_rate } => {
                O::write_f32(&mut dst[4..8], *actual_rate);
                dst[8..12].copy_from_slice(&[0, 0, 0, 0]);
            }
            Self::Blockette1000 {
                encoding,
                word_order,
                rec_length_exp,
            } => {
                dst[4] = encoding.format_code();
                dst[5] = match word_order {
                    WordOrder::BigEndian => 1,
                    WordOrder::LittleEndian => 0,
                };
                dst[6] = *rec_length_exp;
                dst[7] = 0;
            }
            Self::Other { body, .. } => {
                dst[4..4 + body.len()].copy_from_slice(body);
            }
        }
    }
}

/// Writes the fixed SDR header and blockette chain into `dst`, returning the
/// byte offset at which the payload begins (`first_data`).
///
/// Ensures a blockette 1000 (encoding descriptor) is present, synthesizing
/// one from `trace`'s encoding/word-order/block-size if the caller did not
/// supply one via `trace`'s own chain or `extra_blockettes`.
fn build_chain<'a>(trace: &'a TraceHeader, extra_blockettes: &'a [Blockette], synthesized: &'a Blockette) -> Vec<&'a Blockette> {
    let mut chain: Vec<&Blockette> = trace.blockettes.iter().chain(extra_blockettes).collect();
    if !chain.iter().any(|b| b.code() == 1000) {
        chain.push(synthesized);
    }
    chain
}

fn synthesize_blockette_1000(trace: &TraceHeader) -> Blockette {
    Blockette::Blockette1000 {
        encoding: trace.data_type,
        word_order: trace.data_wordorder,
        rec_length_exp: trace.blksize.trailing_zeros() as u8,
    }
}

/// The number of bytes the fixed header plus blockette chain would occupy
/// for `trace`, without writing anything. Used by the packing driver to
/// learn how much of a record is left over for the payload.
pub fn header_size(trace: &TraceHeader, extra_blockettes: &[Blockette]) -> usize {
    let synthesized = synthesize_blockette_1000(trace);
    let chain = build_chain(trace, extra_blockettes, &synthesized);
    FIXED_HEADER_SIZE + chain.iter().map(|b| b.encoded_len()).sum::<usize>()
}

pub fn init_header(
    dst: &mut [u8],
    trace: &TraceHeader,
    extra_blockettes: &[Blockette],
) -> MSResult<u32> {
    if dst.len() < FIXED_HEADER_SIZE {
        return Err(MSError::invalid_argument(
            "destination buffer too small for fixed header",
        ));
    }

    let synthesized = synthesize_blockette_1000(trace);
    let chain = build_chain(trace, extra_blockettes, &synthesized);

    let chain_len: usize = chain.iter().map(|b| b.encoded_len()).sum();
    let first_data = FIXED_HEADER_SIZE + chain_len;
    if dst.len() < first_data {
        return Err(MSError::invalid_argument(
            "destination buffer too small for header + blockette chain",
        ));
    }

    write_fixed_header(dst, trace, chain.len() as u8, first_data);

    let mut offset = FIXED_HEADER_SIZE;
    for (i, b) in chain.iter().enumerate() {
        let len = b.encoded_len();
        let next = if i + 1 < chain.len() {
            (offset + len) as u16
        } else {
            0
        };
        match trace.data_wordorder {
            WordOrder::BigEndian => b.write::<BigEndian>(&mut dst[offset..offset + len], next),
            WordOrder::LittleEndian => {
                b.write::<LittleEndian>(&mut dst[offset..offset + len], next)
            }
        }
        offset += len;
    }

    Ok(first_data as u32)
}

fn write_fixed_header(dst: &mut [u8], trace: &TraceHeader, num_blockettes: u8, first_data: usize) {
    let seq = format!("{:06}", trace.seq_no % 1_000_000);
    dst[0..6].copy_from_slice(seq.as_bytes());
    dst[6] = b'D';
    dst[7] = b' ';

    write_padded(&mut dst[8..13], &trace.station);
    write_padded(&mut dst[13..15], &trace.location);
    write_padded(&mut dst[15..18], &trace.channel);
    write_padded(&mut dst[18..20], &trace.network);

    write_btime(&mut dst[20..30], trace.begtime, trace.data_wordorder);

    macro_rules! w16 {
        ($range:expr, $val:expr) => {
            match trace.data_wordorder {
                WordOrder::BigEndian => BigEndian::write_u16(&mut dst[$range], $val),
                WordOrder::LittleEndian => LittleEndian::write_u16(&mut dst[$range], $val),
            }
        };
    }
    macro_rules! w_i16 {
        ($range:expr, $val:expr) => {
            match trace.data_wordorder {
                WordOrder::BigEndian => BigEndian::write_i16(&mut dst[$range], $val),
                WordOrder::LittleEndian => LittleEndian::write_i16(&mut dst[$range], $val),
            }
        };
    }

    w16!(OFFSET_NUM_SAMPLES..OFFSET_NUM_SAMPLES + 2, 0u16);
    w_i16!(32..34, trace.sample_rate as i16);
    w_i16!(34..36, trace.sample_rate_mult);

    dst[36] = 0; // activity flags
    dst[37] = 0; // I/O flags
    dst[38] = 0; // data quality flags
    dst[OFFSET_NUM_BLOCKETTES] = num_blockettes;

    match trace.data_wordorder {
        WordOrder::BigEndian => BigEndian::write_i32(&mut dst[40..44], 0),
        WordOrder::LittleEndian => LittleEndian::write_i32(&mut dst[40..44], 0),
    }

    w16!(OFFSET_FIRST_DATA..OFFSET_FIRST_DATA + 2, first_data as u16);
    w16!(
        OFFSET_FIRST_BLOCKETTE..OFFSET_FIRST_BLOCKETTE + 2,
        FIXED_HEADER_SIZE as u16
    );
}

fn write_padded(dst: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(dst.len());
    dst[..n].copy_from_slice(&bytes[..n]);
    for b in dst[n..].iter_mut() {
        *b = b' ';
    }
}

fn write_btime(dst: &mut [u8], t: OffsetDateTime, word_order: WordOrder) {
    let year = t.year() as u16;
    let day = t.ordinal();
    let hour = t.hour();
    let minute = t.minute();
    let second = t.second();
    let fract = (t.microsecond() / 100) as u16; // 0.0001s ticks

    dst[4] = hour;
    dst[5] = minute;
    dst[6] = second;
    dst[7] = 0;
    match word_order {
        WordOrder::BigEndian => {
            BigEndian::write_u16(&mut dst[0..2], year);
            BigEndian::write_u16(&mut dst[2..4], day);
            BigEndian::write_u16(&mut dst[8..10], fract);
        }
        WordOrder::LittleEndian => {
            LittleEndian::write_u16(&mut dst[0..2], year);
            LittleEndian::write_u16(&mut dst[2..4], day);
            LittleEndian::write_u16(&mut dst[8..10], fract);
        }
    }
}

/// Patches the final sample count into a previously-initialized header
/// (spec.md §4.1 step 6).
pub fn update_header(dst: &mut [u8], trace: &TraceHeader) {
    let count = trace.num_samples.clamp(0, u16::MAX as i64) as u16;
    match trace.data_wordorder {
        WordOrder::BigEndian => {
            BigEndian::write_u16(&mut dst[OFFSET_NUM_SAMPLES..OFFSET_NUM_SAMPLES + 2], count)
        }
        WordOrder::LittleEndian => {
            LittleEndian::write_u16(&mut dst[OFFSET_NUM_SAMPLES..OFFSET_NUM_SAMPLES + 2], count)
        }
    }
}

/// Searches `trace`'s blockette chain for one with the given type code.
pub fn find_blockette(trace: &TraceHeader, code: u16) -> Option<&Blockette> {
    trace.blockettes.iter().find(|b| b.code() == code)
}

/// Deep-clones a trace header, including its blockette chain.
pub fn duplicate(trace: &TraceHeader) -> TraceHeader {
    trace.clone()
}

/// Computes the effective sample rate in Hz from the nominal rational rate.
///
/// Follows the classic SEED factor/multiplier convention used by
/// `ms_pack2.c`'s `time_interval2`: a positive value multiplies/divides
/// directly; a negative value means "reciprocal" (period in seconds).
fn effective_rate(sample_rate: i32, sample_rate_mult: i16) -> f64 {
    let rate = match sample_rate.cmp(&0) {
        std::cmp::Ordering::Greater => sample_rate as f64,
        std::cmp::Ordering::Less => -1.0 / sample_rate as f64,
        std::cmp::Ordering::Equal => 0.0,
    };
    let mult = match sample_rate_mult.cmp(&0) {
        std::cmp::Ordering::Greater => sample_rate_mult as f64,
        std::cmp::Ordering::Less => -1.0 / sample_rate_mult as f64,
        std::cmp::Ordering::Equal => 1.0,
    };
    rate * mult
}

/// Computes the `(seconds, microseconds)` interval spanned by `n` samples at
/// the given nominal rate (spec.md §4.6).
pub fn time_interval(n: i64, sample_rate: i32, sample_rate_mult: i16) -> (i64, i64) {
    let rate = effective_rate(sample_rate, sample_rate_mult);
    if rate == 0.0 {
        return (0, 0);
    }
    let total_usecs = (n as f64 / rate * 1_000_000.0).round() as i64;
    (
        total_usecs.div_euclid(1_000_000),
        total_usecs.rem_euclid(1_000_000),
    )
}

/// Adds a whole-seconds + microseconds interval to a time.
pub fn add_time(t: OffsetDateTime, seconds: i64, microseconds: i64) -> OffsetDateTime {
    t + Duration::seconds(seconds) + Duration::microseconds(microseconds)
}

/// Adds a fractional-microsecond interval to a time.
pub fn add_dtime(t: OffsetDateTime, microseconds: f64) -> OffsetDateTime {
    t + Duration::nanoseconds((microseconds * 1_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    #[test]
    fn time_interval_nominal_rate() {
        let (s, us) = time_interval(100, 100, 1);
        assert_eq!((s, us), (1, 0));
    }

    #[test]
    fn time_interval_reciprocal_rate() {
        // sample_rate == -10 means "period is 10 seconds per sample".
        let (s, us) = time_interval(3, -10, 1);
        assert_eq!((s, us), (30, 0));
    }

    #[test]
    fn add_time_rolls_over_seconds() {
        let t = datetime!(2012-01-01 00:00:00 UTC);
        let rv = add_time(t, 0, 1_500_000);
        assert_eq!(rv, datetime!(2012-01-01 00:00:01.5 UTC));
    }
}
