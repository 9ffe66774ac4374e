//! Per-trace packing state carried across calls (spec.md §3, "Trace State").

use time::OffsetDateTime;

use crate::encoding::{DataEncoding, WordOrder};
use crate::header::Blockette;

/// Mutable state describing one trace's packing progress.
///
/// A caller builds one `TraceHeader` per channel and feeds it to
/// [`crate::pack::pack_data`] repeatedly as new samples arrive; the packer
/// advances `begtime`, `seq_no`, `num_samples`, and the Steim predictor
/// fields (`xm1`/`xm2`) in place so the next call continues the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceHeader {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,

    /// Start time of the record currently being (or about to be) written.
    pub begtime: OffsetDateTime,
    /// Start time of the most recently completed header, kept for
    /// diagnostics; updated alongside `begtime`.
    pub hdrtime: OffsetDateTime,

    /// Nominal sample rate, qlib2 sign convention: positive multiplies
    /// directly, negative means reciprocal (period in seconds).
    pub sample_rate: i32,
    /// Nominal sample rate multiplier, same sign convention as `sample_rate`.
    pub sample_rate_mult: i16,

    /// Total number of samples packed for the trace so far.
    pub num_samples: i64,

    /// Next record sequence number to stamp.
    pub seq_no: u32,

    pub data_type: DataEncoding,
    pub data_wordorder: WordOrder,
    /// Target record size in bytes; always a power of two.
    pub blksize: u32,

    /// Byte offset of the payload in the most recently written record.
    pub first_data: u32,

    /// Last two samples of the previous emission, seeding the next
    /// difference sequence. Zeroed for non-integer encodings.
    pub xm1: i32,
    pub xm2: i32,
    /// Forward integration constant of the most recent Steim frame.
    pub x0: i32,
    /// Reverse integration constant of the most recent Steim frame.
    pub xn: i32,

    /// Additional blockettes stamped into every record for this trace,
    /// besides the synthesized blockette 1000.
    pub blockettes: Vec<Blockette>,
}

impl TraceHeader {
    /// Creates a new trace header with zeroed predictor state and sequence
    /// number 1, matching `init_miniseed_hdr`'s defaults in the original
    /// packing driver.
    pub fn new(
        network: impl Into<String>,
        station: impl Into<String>,
        location: impl Into<String>,
        channel: impl Into<String>,
        begtime: OffsetDateTime,
        sample_rate: i32,
        sample_rate_mult: i16,
        data_type: DataEncoding,
        blksize: u32,
    ) -> Self {
        Self {
            network: network.into(),
            station: station.into(),
            location: location.into(),
            channel: channel.into(),
            begtime,
            hdrtime: begtime,
            sample_rate,
            sample_rate_mult,
            num_samples: 0,
            seq_no: 1,
            data_type,
            data_wordorder: WordOrder::default(),
            blksize,
            first_data: 0,
            xm1: 0,
            xm2: 0,
            x0: 0,
            xn: 0,
            blockettes: Vec::new(),
        }
    }

    /// Resets the Steim predictor state, as done whenever a gap or an
    /// encoding change breaks continuity.
    pub fn reset_predictor(&mut self) {
        self.xm1 = 0;
        self.xm2 = 0;
        self.x0 = 0;
        self.xn = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use time::macros::datetime;

    #[test]
    fn new_sets_sane_defaults() {
        let t = TraceHeader::new(
            "XX",
            "TEST",
            "00",
            "LHZ",
            datetime!(2012-01-01 00:00:00 UTC),
            100,
            1,
            DataEncoding::Steim2,
            512,
        );
        assert_eq!(t.seq_no, 1);
        assert_eq!(t.num_samples, 0);
        assert_eq!((t.xm1, t.xm2, t.x0, t.xn), (0, 0, 0, 0));
        assert!(t.blockettes.is_empty());
    }
}
