//! The packing driver: chunks samples into fixed-size miniSEED records.
//!
//! This is the crate's single outer loop, generalizing the four
//! near-identical per-encoding loops (`ms_pack2_steim`/`ms_pack2_int`/
//! `ms_pack2_float`/`ms_pack2_text`) of the original packing driver into one
//! driver over a [`SampleSource`].

use crate::encoding::{DataEncoding, WordOrder};
use crate::error::{MSError, MSResult};
use crate::header::{self, Blockette};
use crate::trace::TraceHeader;
use crate::{fixedint, float, steim, text};

/// How many additional records' worth of capacity an [`PackTarget::Owned`]
/// buffer reserves at once, mirroring the original driver's
/// `MALLOC_INCREMENT` geometric growth.
const MALLOC_INCREMENT: usize = 1000;

/// The samples to be packed, borrowed for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub enum Samples<'a> {
    Int(&'a [i32]),
    FloatSp(&'a [f32]),
    FloatDp(&'a [f64]),
    Text(&'a [u8]),
}

/// Where packed record bytes are written.
pub enum PackTarget<'a> {
    /// A caller-owned, capacity-bounded buffer. Running out of room is not
    /// an error: packing simply stops and the caller gets back the partial
    /// count of what fit.
    Borrowed(&'a mut [u8]),
    /// A library-owned buffer that grows in `MALLOC_INCREMENT`-record
    /// batches as needed.
    Owned(Vec<u8>),
}

/// Packing options independent of the trace or the samples.
#[derive(Debug, Clone, Copy)]
pub struct PackConfig {
    /// If `false` (the default), a final record that would not completely
    /// fill its payload is held back rather than emitted; call again with
    /// `flush: true` (or once more data has accumulated) to emit it.
    pub flush: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self { flush: false }
    }
}

/// The result of a [`pack_data`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackOutcome {
    pub records_packed: usize,
    pub samples_packed: usize,
    pub bytes_written: usize,
}

struct EncodedChunk {
    bytes: Vec<u8>,
    samples_packed: usize,
    x0: i32,
    xn: i32,
    /// The second-to-last consumed sample, raw; becomes the next call's
    /// `xm2` once `xn` becomes that call's `xm1`.
    xm2: i32,
}

enum SampleSource<'a> {
    Int(&'a [i32]),
    FloatSp(&'a [f32]),
    FloatDp(&'a [f64]),
    Text(&'a [u8]),
}

impl<'a> SampleSource<'a> {
    fn remaining(&self) -> usize {
        match self {
            Self::Int(s) => s.len(),
            Self::FloatSp(s) => s.len(),
            Self::FloatDp(s) => s.len(),
            Self::Text(s) => s.len(),
        }
    }

    fn pack_next(
        &self,
        data_type: DataEncoding,
        xm1: i32,
        payload_cap: usize,
        word_order: WordOrder,
    ) -> MSResult<EncodedChunk> {
        use crate::encoding::DataEncoding::*;

        match (self, data_type) {
            (Self::Int(s), Steim1) => {
                let max_frames = payload_cap / steim::FRAME_SIZE;
                let out = steim::encode_steim1(s, xm1, max_frames.max(1), word_order)?;
                Ok(EncodedChunk {
                    bytes: out.bytes,
                    samples_packed: out.samples_packed,
                    x0: out.x0,
                    xn: out.xn,
                    xm2: out.xm2,
                })
            }
            (Self::Int(s), Steim2) => {
                let max_frames = payload_cap / steim::FRAME_SIZE;
                let out = steim::encode_steim2(s, xm1, max_frames.max(1), word_order)?;
                Ok(EncodedChunk {
                    bytes: out.bytes,
                    samples_packed: out.samples_packed,
                    x0: out.x0,
                    xn: out.xn,
                    xm2: out.xm2,
                })
            }
            (Self::Int(s), Int16) => {
                let out = fixedint::encode_int16(s, payload_cap, word_order)?;
                Ok(EncodedChunk {
                    bytes: out.bytes,
                    samples_packed: out.samples_packed,
                    x0: 0,
                    xn: 0,
                    xm2: 0,
                })
            }
            (Self::Int(s), Int24) => {
                let out = fixedint::encode_int24(s, payload_cap, word_order)?;
                Ok(EncodedChunk {
                    bytes: out.bytes,
                    samples_packed: out.samples_packed,
                    x0: 0,
                    xn: 0,
                    xm2: 0,
                })
            }
            (Self::Int(s), Int32) => {
                let out = fixedint::encode_int32(s, payload_cap, word_order)?;
                Ok(EncodedChunk {
                    bytes: out.bytes,
                    samples_packed: out.samples_packed,
                    x0: 0,
                    xn: 0,
                    xm2: 0,
                })
            }
            (Self::FloatSp(s), FloatSp) => {
                let out = float::encode_float_sp(s, payload_cap, word_order)?;
                Ok(EncodedChunk {
                    bytes: out.bytes,
                    samples_packed: out.samples_packed,
                    x0: 0,
                    xn: 0,
                    xm2: 0,
                })
            }
            (Self::FloatDp(s), FloatDp) => {
                let out = float::encode_float_dp(s, payload_cap, word_order)?;
                Ok(EncodedChunk {
                    bytes: out.bytes,
                    samples_packed: out.samples_packed,
                    x0: 0,
                    xn: 0,
                    xm2: 0,
                })
            }
            (Self::Text(s), Text) | (Self::Text(s), Unknown) => {
                let out = text::encode_text(s, payload_cap)?;
                Ok(EncodedChunk {
                    bytes: out.bytes,
                    samples_packed: out.bytes_packed,
                    x0: 0,
                    xn: 0,
                    xm2: 0,
                })
            }
            _ => Err(MSError::invalid_argument(
                "sample buffer variant does not match trace data_type",
            )),
        }
    }

    fn advance(&mut self, n: usize) {
        match self {
            Self::Int(s) => *s = &s[n..],
            Self::FloatSp(s) => *s = &s[n..],
            Self::FloatDp(s) => *s = &s[n..],
            Self::Text(s) => *s = &s[n..],
        }
    }
}

impl<'a> From<Samples<'a>> for SampleSource<'a> {
    fn from(s: Samples<'a>) -> Self {
        match s {
            Samples::Int(s) => Self::Int(s),
            Samples::FloatSp(s) => Self::FloatSp(s),
            Samples::FloatDp(s) => Self::FloatDp(s),
            Samples::Text(s) => Self::Text(s),
        }
    }
}

/// Packs `samples` into fixed-size miniSEED records, advancing `trace`'s
/// time, sequence number, and Steim predictor state as it goes.
///
/// Each completed record is handed to `record_handler` as well as copied
/// into `target`. On a caller-owned [`PackTarget::Borrowed`] buffer running
/// out of room, packing stops early and the partial counts packed so far are
/// returned — this is not an error.
pub fn pack_data<F>(
    trace: &mut TraceHeader,
    samples: Samples,
    mut record_handler: F,
    target: &mut PackTarget,
    config: &PackConfig,
) -> MSResult<PackOutcome>
where
    F: FnMut(&[u8]),
{
    let blksize = trace.blksize as usize;
    if !blksize.is_power_of_two() || blksize < 128 {
        return Err(MSError::invalid_argument(
            "block size must be a power of two of at least 128 bytes",
        ));
    }
    if trace.data_type == DataEncoding::Unknown && trace.sample_rate != 0 {
        return Err(MSError::invalid_argument(
            "Unknown data encoding requires sample_rate == 0",
        ));
    }

    let mut source = SampleSource::from(samples);
    if source.remaining() == 0 {
        return Err(MSError::invalid_argument("no samples to pack"));
    }

    let header_len = header::header_size(trace, &[]);
    if blksize <= header_len {
        return Err(MSError::invalid_argument(
            "block size too small to hold the fixed header and blockette chain",
        ));
    }
    let payload_cap = blksize - header_len;

    let mut outcome = PackOutcome {
        records_packed: 0,
        samples_packed: 0,
        bytes_written: 0,
    };

    while source.remaining() > 0 {
        let chunk =
            source.pack_next(trace.data_type, trace.xm1, payload_cap, trace.data_wordorder)?;
        if chunk.samples_packed == 0 {
            break;
        }
        if !config.flush
            && chunk.bytes.len() < payload_cap
            && source.remaining() == chunk.samples_packed
        {
            // This would be the final record and it does not fill the
            // payload; hold it back until flush or more data arrives.
            break;
        }

        let mut record_buf = vec![0u8; blksize];
        let first_data = header::init_header(&mut record_buf, trace, &[])?;
        debug_assert_eq!(first_data as usize, header_len);
        record_buf[header_len..header_len + chunk.bytes.len()].copy_from_slice(&chunk.bytes);

        trace.first_data = first_data;
        trace.num_samples = chunk.samples_packed as i64;
        header::update_header(&mut record_buf, trace);

        match target {
            PackTarget::Borrowed(dst) => {
                if dst.len() < outcome.bytes_written + blksize {
                    break;
                }
                dst[outcome.bytes_written..outcome.bytes_written + blksize]
                    .copy_from_slice(&record_buf);
            }
            PackTarget::Owned(buf) => {
                if buf.capacity() - buf.len() < blksize {
                    buf.reserve(MALLOC_INCREMENT * blksize);
                }
                buf.extend_from_slice(&record_buf);
            }
        }

        record_handler(&record_buf);

        source.advance(chunk.samples_packed);
        outcome.records_packed += 1;
        outcome.samples_packed += chunk.samples_packed;
        outcome.bytes_written += blksize;

        trace.hdrtime = trace.begtime;
        trace.begtime = match header::find_blockette(trace, 100) {
            Some(Blockette::Blockette100 { actual_rate }) if *actual_rate != 0.0 => {
                let usecs = chunk.samples_packed as f64 / *actual_rate as f64 * 1_000_000.0;
                header::add_dtime(trace.begtime, usecs)
            }
            _ => {
                let (secs, usecs) = header::time_interval(
                    chunk.samples_packed as i64,
                    trace.sample_rate,
                    trace.sample_rate_mult,
                );
                header::add_time(trace.begtime, secs, usecs)
            }
        };
        trace.seq_no = trace.seq_no.wrapping_add(1);

        if trace.data_type.is_predictor_relevant() {
            match chunk.samples_packed {
                1 => trace.xm2 = trace.xm1,
                _ => trace.xm2 = chunk.xm2,
            }
            trace.xm1 = chunk.xn;
            trace.x0 = chunk.x0;
            trace.xn = chunk.xn;
        } else {
            trace.reset_predictor();
        }
    }

    Ok(outcome)
}

/// Convenience wrapper equivalent to [`pack_data`] with `PackTarget::Owned`
/// and no per-record callback, returning the concatenated record bytes.
pub fn pack_to_vec(
    trace: &mut TraceHeader,
    samples: Samples,
    config: &PackConfig,
) -> MSResult<(Vec<u8>, PackOutcome)> {
    let mut target = PackTarget::Owned(Vec::new());
    let outcome = pack_data(trace, samples, |_| {}, &mut target, config)?;
    match target {
        PackTarget::Owned(buf) => Ok((buf, outcome)),
        PackTarget::Borrowed(_) => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::DataEncoding;
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    fn trace(data_type: DataEncoding, blksize: u32) -> TraceHeader {
        TraceHeader::new(
            "XX",
            "TEST",
            "00",
            "LHZ",
            datetime!(2012-01-01 00:00:00 UTC),
            100,
            1,
            data_type,
            blksize,
        )
    }

    #[test]
    fn sample_count_is_conserved_across_records() {
        let mut t = trace(DataEncoding::Steim2, 512);
        let samples: Vec<i32> = (0..2000).map(|i| (i % 50) - 25).collect();
        let (_, outcome) =
            pack_to_vec(&mut t, Samples::Int(&samples), &PackConfig { flush: true }).unwrap();
        assert_eq!(outcome.samples_packed, samples.len());
        assert_eq!(outcome.bytes_written, outcome.records_packed * 512);
    }

    #[test]
    fn sequence_number_increments_once_per_record() {
        let mut t = trace(DataEncoding::Steim2, 512);
        let samples: Vec<i32> = (0..2000).map(|i| (i % 50) - 25).collect();
        let start_seq = t.seq_no;
        let (_, outcome) =
            pack_to_vec(&mut t, Samples::Int(&samples), &PackConfig { flush: true }).unwrap();
        assert_eq!(t.seq_no, start_seq + outcome.records_packed as u32);
    }

    #[test]
    fn begtime_advances_by_packed_duration() {
        let mut t = trace(DataEncoding::Int32, 512);
        let samples: Vec<i32> = (0..112).collect();
        let begin = t.begtime;
        pack_to_vec(&mut t, Samples::Int(&samples), &PackConfig { flush: true }).unwrap();
        let expected = header::add_time(begin, 1, 120_000);
        assert_eq!(t.begtime, expected);
    }

    #[test]
    fn caller_owned_buffer_too_small_returns_partial_without_error() {
        let mut t = trace(DataEncoding::Int32, 512);
        let samples: Vec<i32> = (0..112).collect();
        let mut dst = vec![0u8; 256];
        let mut target = PackTarget::Borrowed(&mut dst);
        let outcome = pack_data(
            &mut t,
            Samples::Int(&samples),
            |_| {},
            &mut target,
            &PackConfig { flush: true },
        )
        .unwrap();
        assert_eq!(
            outcome,
            PackOutcome {
                records_packed: 0,
                samples_packed: 0,
                bytes_written: 0
            }
        );
    }

    #[test]
    fn fixed_width_int_encoding_zeros_predictor_state() {
        // INT_32 has no Steim integration constants; a single-sample record
        // must not carry a stale xm1 forward like a Steim encoding would.
        let mut t = trace(DataEncoding::Int32, 512);
        t.xm1 = 7;
        t.xm2 = 9;
        let samples = [42i32];
        pack_to_vec(&mut t, Samples::Int(&samples), &PackConfig { flush: true }).unwrap();
        assert_eq!((t.xm1, t.xm2, t.x0, t.xn), (0, 0, 0, 0));
    }

    #[test]
    fn float_and_text_encodings_zero_predictor_state() {
        let mut t = trace(DataEncoding::FloatSp, 512);
        t.xm1 = 7;
        t.xm2 = 9;
        let samples = [1.0f32, 2.0, 3.0];
        pack_to_vec(&mut t, Samples::FloatSp(&samples), &PackConfig { flush: true }).unwrap();
        assert_eq!((t.xm1, t.xm2, t.x0, t.xn), (0, 0, 0, 0));
    }

    #[test]
    fn unfilled_final_record_is_held_back_without_flush() {
        let mut t = trace(DataEncoding::Int32, 512);
        let samples: Vec<i32> = (0..10).collect();
        let (_, outcome) =
            pack_to_vec(&mut t, Samples::Int(&samples), &PackConfig { flush: false }).unwrap();
        assert_eq!(
            outcome,
            PackOutcome {
                records_packed: 0,
                samples_packed: 0,
                bytes_written: 0
            }
        );
    }

    #[test]
    fn unknown_encoding_with_nonzero_sample_rate_is_rejected() {
        let mut t = trace(DataEncoding::Unknown, 512);
        let samples = [1i32, 2, 3];
        let err = pack_to_vec(&mut t, Samples::Int(&samples), &PackConfig { flush: true })
            .unwrap_err();
        assert_eq!(err.code(), crate::error::MSErrorCode::InvalidArgument);
    }

    #[test]
    fn unknown_encoding_with_zero_sample_rate_packs_as_text() {
        let mut t = trace(DataEncoding::Unknown, 512);
        t.sample_rate = 0;
        let bytes = b"hello world".to_vec();
        let (_, outcome) =
            pack_to_vec(&mut t, Samples::Text(&bytes), &PackConfig { flush: true }).unwrap();
        assert_eq!(outcome.samples_packed, bytes.len());
    }

    #[test]
    fn blksize_must_be_power_of_two_and_at_least_128() {
        let mut t = trace(DataEncoding::Int32, 100);
        let samples = [1i32, 2, 3];
        let err = pack_to_vec(&mut t, Samples::Int(&samples), &PackConfig { flush: true })
            .unwrap_err();
        assert_eq!(err.code(), crate::error::MSErrorCode::InvalidArgument);

        let mut t = trace(DataEncoding::Int32, 64);
        let err = pack_to_vec(&mut t, Samples::Int(&samples), &PackConfig { flush: true })
            .unwrap_err();
        assert_eq!(err.code(), crate::error::MSErrorCode::InvalidArgument);
    }

    #[test]
    fn empty_sample_buffer_is_rejected() {
        let mut t = trace(DataEncoding::Int32, 512);
        let samples: [i32; 0] = [];
        let err = pack_to_vec(&mut t, Samples::Int(&samples), &PackConfig { flush: true })
            .unwrap_err();
        assert_eq!(err.code(), crate::error::MSErrorCode::InvalidArgument);
    }

    #[test]
    fn blockette_100_actual_rate_overrides_nominal_for_time_advance() {
        let mut t = trace(DataEncoding::Int32, 512);
        t.blockettes.push(Blockette::Blockette100 { actual_rate: 50.0 });
        let samples: Vec<i32> = (0..112).collect();
        let begin = t.begtime;
        pack_to_vec(&mut t, Samples::Int(&samples), &PackConfig { flush: true }).unwrap();
        // 112 samples at the blockette-100 rate of 50 Hz, not the nominal 100 Hz.
        let expected = header::add_dtime(begin, 112.0 / 50.0 * 1_000_000.0);
        assert_eq!(t.begtime, expected);
    }

    #[test]
    fn xm2_is_the_penultimate_consumed_sample_for_multi_sample_records() {
        let mut t = trace(DataEncoding::Steim1, 512);
        let samples: Vec<i32> = (0..20).map(|i| i * 2).collect();
        pack_to_vec(&mut t, Samples::Int(&samples), &PackConfig { flush: true }).unwrap();
        assert_eq!(t.xm1, samples[samples.len() - 1]);
        assert_eq!(t.xm2, samples[samples.len() - 2]);
    }
}
