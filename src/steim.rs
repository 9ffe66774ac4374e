//! Steim-1 and Steim-2 differential compressors.
//!
//! Each 64-byte frame is a 4-byte control word (16 two-bit nibbles, read
//! most-significant-first) followed by 15 four-byte data words. Frame 0
//! reserves its first two data words for the forward (`x0`) and reverse
//! (`xn`) integration constants; every other data word holds one or more
//! packed sample differences, selected greedily for the widest bucket that
//! fits (grounded in the by-fours greedy packer used by the Steim-1
//! reference implementation in this pack).

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::encoding::WordOrder;
use crate::error::{MSError, MSResult};

const WORDS_PER_FRAME: usize = 16;
const DATA_WORDS_PER_FRAME: usize = WORDS_PER_FRAME - 1;
pub const FRAME_SIZE: usize = WORDS_PER_FRAME * 4;

/// The result of a single Steim encode call.
#[derive(Debug, Clone, PartialEq)]
pub struct SteimOutput {
    pub bytes: Vec<u8>,
    /// Number of leading `samples` actually consumed.
    pub samples_packed: usize,
    /// Forward integration constant (the first packed sample, raw).
    pub x0: i32,
    /// Reverse integration constant (the last packed sample, raw).
    pub xn: i32,
    /// The second-to-last consumed sample, raw. Feeds the next call's `xm2`
    /// once `xn` becomes that call's `xm1`. Equal to `xn` when only one
    /// sample was consumed.
    pub xm2: i32,
}

fn diff(prev: i32, cur: i32) -> MSResult<i32> {
    let d = cur as i64 - prev as i64;
    if d < i32::MIN as i64 || d > i32::MAX as i64 {
        return Err(MSError::compress(
            "sample difference does not fit a 32-bit integer",
        ));
    }
    Ok(d as i32)
}

fn fits_signed(v: i32, bits: u32) -> bool {
    let v = v as i64;
    let lo = -(1i64 << (bits - 1));
    let hi = (1i64 << (bits - 1)) - 1;
    v >= lo && v <= hi
}

/// Greedily packs the widest Steim-1 bucket that fits the head of `diffs`.
/// Returns `(word, control_nibble, consumed)`.
fn pack_steim1_word(diffs: &[i32]) -> (u32, u8, usize) {
    if diffs.len() >= 4 && diffs[..4].iter().all(|&d| fits_signed(d, 8)) {
        let b: Vec<u8> = diffs[..4].iter().map(|&d| d as i8 as u8).collect();
        (u32::from_be_bytes([b[0], b[1], b[2], b[3]]), 1, 4)
    } else if diffs.len() == 3 && diffs.iter().all(|&d| fits_signed(d, 8)) {
        let b: Vec<u8> = diffs.iter().map(|&d| d as i8 as u8).collect();
        (u32::from_be_bytes([b[0], b[1], b[2], 0]), 1, 3)
    } else if diffs.len() >= 2 && diffs[..2].iter().all(|&d| fits_signed(d, 16)) {
        let a = (diffs[0] as i16).to_be_bytes();
        let b = (diffs[1] as i16).to_be_bytes();
        (u32::from_be_bytes([a[0], a[1], b[0], b[1]]), 2, 2)
    } else {
        (diffs[0] as u32, 3, 1)
    }
}

fn pack_field(values: &[i32], bits: u32) -> u32 {
    let mask = (1u32 << bits) - 1;
    let mut acc = 0u32;
    for &v in values {
        acc = (acc << bits) | ((v as u32) & mask);
    }
    acc
}

/// Greedily packs the widest Steim-2 bucket that fits the head of `diffs`.
/// Returns `(word, control_nibble, consumed)`, or `None` if even a single
/// 30-bit difference does not fit (the difference does not fit Steim-2 at
/// all, even though it fit the 32-bit `i32` computed by [`diff`]).
fn pack_steim2_word(diffs: &[i32]) -> Option<(u32, u8, usize)> {
    const FAMILY_B: u8 = 3;
    const FAMILY_A: u8 = 2;

    if diffs.len() >= 7 && diffs[..7].iter().all(|&d| fits_signed(d, 4)) {
        let payload = pack_field(&diffs[..7], 4) << 2; // 28 used bits, 2 pad bits
        Some(((3u32 << 30) | payload, FAMILY_B, 7))
    } else if diffs.len() >= 6 && diffs[..6].iter().all(|&d| fits_signed(d, 5)) {
        let payload = pack_field(&diffs[..6], 5);
        Some(((2u32 << 30) | payload, FAMILY_B, 6))
    } else if diffs.len() >= 5 && diffs[..5].iter().all(|&d| fits_signed(d, 6)) {
        let payload = pack_field(&diffs[..5], 6);
        Some(((1u32 << 30) | payload, FAMILY_B, 5))
    } else if diffs.len() >= 3 && diffs[..3].iter().all(|&d| fits_signed(d, 10)) {
        let payload = pack_field(&diffs[..3], 10);
        Some(((3u32 << 30) | payload, FAMILY_A, 3))
    } else if diffs.len() >= 2 && diffs[..2].iter().all(|&d| fits_signed(d, 15)) {
        let payload = pack_field(&diffs[..2], 15);
        Some(((2u32 << 30) | payload, FAMILY_A, 2))
    } else if fits_signed(diffs[0], 30) {
        let payload = pack_field(&diffs[..1], 30);
        Some(((1u32 << 30) | payload, FAMILY_A, 1))
    } else {
        None
    }
}

enum Kind {
    Steim1,
    Steim2,
}

fn encode(
    kind: Kind,
    samples: &[i32],
    xm1: i32,
    max_frames: usize,
    word_order: WordOrder,
) -> MSResult<SteimOutput> {
    if samples.is_empty() {
        return Err(MSError::invalid_argument("no samples to encode"));
    }
    if max_frames == 0 {
        return Err(MSError::invalid_argument("max_frames must be at least 1"));
    }

    // diffs[0] carries the predictor across the call boundary (diff against
    // the previous record's last sample); diffs[1..] are the usual
    // consecutive differences. This keeps diffs.len() == samples.len().
    let mut diffs = Vec::with_capacity(samples.len());
    diffs.push(diff(xm1, samples[0])?);
    for w in samples.windows(2) {
        diffs.push(diff(w[0], w[1])?);
    }

    let mut frames: Vec<[u32; DATA_WORDS_PER_FRAME]> = Vec::new();
    let mut nibbles: Vec<[u8; DATA_WORDS_PER_FRAME]> = Vec::new();

    let mut cur_words = [0u32; DATA_WORDS_PER_FRAME];
    let mut cur_nibbles = [0u8; DATA_WORDS_PER_FRAME];
    // Frame 0 reserves its first two data words for x0/xn; xn is patched in
    // once the final packed sample is known.
    cur_words[0] = samples[0] as u32;
    let mut idx = 2usize;

    let mut diff_pos = 0usize;
    let mut frame_full_break = false;
    loop {
        if idx == DATA_WORDS_PER_FRAME {
            frames.push(cur_words);
            nibbles.push(cur_nibbles);
            if frames.len() == max_frames {
                frame_full_break = true;
                break;
            }
            cur_words = [0u32; DATA_WORDS_PER_FRAME];
            cur_nibbles = [0u8; DATA_WORDS_PER_FRAME];
            idx = 0;
        }
        if diff_pos >= diffs.len() {
            break;
        }
        let remaining = &diffs[diff_pos..];
        let (word, nibble, consumed) = match kind {
            Kind::Steim1 => pack_steim1_word(remaining),
            Kind::Steim2 => match pack_steim2_word(remaining) {
                Some(v) => v,
                None => {
                    return Err(MSError::compress(
                        "sample difference does not fit the widest Steim-2 bucket",
                    ))
                }
            },
        };
        cur_words[idx] = word;
        cur_nibbles[idx] = nibble;
        idx += 1;
        diff_pos += consumed;
    }
    if !frame_full_break && idx > 0 {
        frames.push(cur_words);
        nibbles.push(cur_nibbles);
    }

    // diff_pos now counts consumed diffs, which is 1:1 with consumed samples
    // since diffs[0] already accounts for the first sample.
    let samples_packed = diff_pos;
    let xn = samples[samples_packed - 1];
    let xm2 = if samples_packed >= 2 {
        samples[samples_packed - 2]
    } else {
        xn
    };
    frames[0][1] = xn as u32;

    let mut bytes = vec![0u8; frames.len() * FRAME_SIZE];
    for (f, (words, nibs)) in frames.iter().zip(nibbles.iter()).enumerate() {
        let base = f * FRAME_SIZE;
        let mut control = 0u32;
        for (i, &n) in nibs.iter().enumerate() {
            control |= (n as u32) << (28 - 2 * i);
        }
        match word_order {
            WordOrder::BigEndian => {
                BigEndian::write_u32(&mut bytes[base..base + 4], control);
                for (i, &w) in words.iter().enumerate() {
                    let off = base + 4 + i * 4;
                    BigEndian::write_u32(&mut bytes[off..off + 4], w);
                }
            }
            WordOrder::LittleEndian => {
                LittleEndian::write_u32(&mut bytes[base..base + 4], control);
                for (i, &w) in words.iter().enumerate() {
                    let off = base + 4 + i * 4;
                    LittleEndian::write_u32(&mut bytes[off..off + 4], w);
                }
            }
        }
    }

    Ok(SteimOutput {
        bytes,
        samples_packed,
        x0: samples[0],
        xn,
        xm2,
    })
}

/// Packs `samples` as Steim-1, writing up to `max_frames` 64-byte frames.
///
/// `xm1` is the last sample of the previous call (0 for the first call on a
/// trace); `diffs[0]` is computed against it so the predictor carries across
/// record boundaries.
pub fn encode_steim1(
    samples: &[i32],
    xm1: i32,
    max_frames: usize,
    word_order: WordOrder,
) -> MSResult<SteimOutput> {
    encode(Kind::Steim1, samples, xm1, max_frames, word_order)
}

/// Packs `samples` as Steim-2, writing up to `max_frames` 64-byte frames.
/// See [`encode_steim1`] for the `xm1` carry-in.
pub fn encode_steim2(
    samples: &[i32],
    xm1: i32,
    max_frames: usize,
    word_order: WordOrder,
) -> MSResult<SteimOutput> {
    encode(Kind::Steim2, samples, xm1, max_frames, word_order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn steim1_small_run_fits_one_frame() {
        let samples = [1, -1, -1, -1, 20, -300, 160, -18000];
        let out = encode_steim1(&samples, 0, 63, WordOrder::BigEndian).unwrap();
        assert_eq!(out.samples_packed, samples.len());
        assert_eq!(out.x0, 1);
        assert_eq!(out.xn, -18000);
        assert_eq!(out.bytes.len(), FRAME_SIZE);
        assert_eq!(&out.bytes[4..8], &1i32.to_be_bytes());
        assert_eq!(&out.bytes[8..12], &(-18000i32).to_be_bytes());
    }

    #[test]
    fn steim1_seeds_first_diff_from_xm1() {
        // spec scenario 1: xm1=99 makes diff[0] = 100 - 99 = 1, so all 8
        // samples (not 7) are represented by a diff and consumed.
        let samples = [100, 101, 103, 106, 110, 115, 121, 128];
        let out = encode_steim1(&samples, 99, 63, WordOrder::BigEndian).unwrap();
        assert_eq!(out.samples_packed, 8);
        assert_eq!(out.x0, 100);
        assert_eq!(out.xn, 128);
        assert_eq!(out.xm2, 121);
        // diffs [1,1,2,3] pack into the first 4x8bit data word.
        assert_eq!(&out.bytes[12..16], &[1u8, 1, 2, 3]);
    }

    #[test]
    fn steim1_thousand_zero_samples_packs_fully() {
        // A thousand identical samples differ by zero; the 4x8bit bucket
        // packs 4 zero diffs per word, needing ceil(999/4) = 250 data words
        // spread across frame 0 (13 usable slots) and full 15-slot frames.
        let samples = vec![7; 1000];
        let out = encode_steim1(&samples, 7, 63, WordOrder::BigEndian).unwrap();
        assert_eq!(out.samples_packed, 1000);
        assert_eq!(out.x0, 7);
        assert_eq!(out.xn, 7);
        assert_eq!(out.bytes.len(), 17 * FRAME_SIZE);
    }

    #[test]
    fn steim1_saturating_difference_errors() {
        let samples = [i32::MAX, i32::MIN];
        let err = encode_steim1(&samples, 0, 63, WordOrder::BigEndian).unwrap_err();
        assert_eq!(err.code(), crate::error::MSErrorCode::Compress);
    }

    #[test]
    fn steim1_split_across_max_frames_consumes_partial() {
        let samples: Vec<i32> = (0..2000).map(|i| i * 100_000).collect();
        let out = encode_steim1(&samples, 0, 1, WordOrder::BigEndian).unwrap();
        assert!(out.samples_packed < samples.len());
        assert_eq!(out.bytes.len(), FRAME_SIZE);
    }

    #[test]
    fn steim2_packs_six_bit_bucket() {
        let samples: Vec<i32> = (0..8).map(|i| i * 3).collect();
        let out = encode_steim2(&samples, 0, 63, WordOrder::BigEndian).unwrap();
        assert_eq!(out.samples_packed, 8);
        assert_eq!(out.x0, 0);
        assert_eq!(out.xn, 21);
    }

    #[test]
    fn split_call_continuity_matches_single_call() {
        let samples: Vec<i32> = (0..20).map(|i| i * 2).collect();
        let whole = encode_steim1(&samples, 0, 63, WordOrder::BigEndian).unwrap();

        let first = encode_steim1(&samples[..10], 0, 63, WordOrder::BigEndian).unwrap();
        // The second call picks up immediately after the first and seeds
        // its first diff from the first call's xn, exactly as pack_data
        // threads xm1 from trace.xm1 between records.
        let second = encode_steim1(&samples[10..], first.xn, 63, WordOrder::BigEndian).unwrap();

        assert_eq!(first.samples_packed + second.samples_packed, samples.len());
        assert_eq!(second.x0, samples[10]);
        assert_eq!(whole.xn, second.xn);
    }
}
