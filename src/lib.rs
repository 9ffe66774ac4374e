//! A pure-Rust packer for miniSEED v2 data records.
//!
//! This crate turns scientific time-series samples into fixed-size
//! miniSEED v2 binary data records: it chunks samples into record-sized
//! pieces, materializes the fixed SDR header and blockette chain at
//! byte-exact offsets, invokes the encoding-specific payload writer
//! (Steim-1/Steim-2 differential compression, fixed-width integers, IEEE
//! floats, or opaque text), and advances the trace's time, sequence number,
//! and Steim predictor state so the next call continues the stream.
//!
//! ## Packing raw samples
//!
//! ```
//! use time::macros::datetime;
//!
//! use mseed_pack::{DataEncoding, PackConfig, Samples, TraceHeader};
//!
//! let mut trace = TraceHeader::new(
//!     "XX",
//!     "TEST",
//!     "00",
//!     "LHZ",
//!     datetime!(2012-01-01 00:00:00 UTC),
//!     100,
//!     1,
//!     DataEncoding::Steim2,
//!     512,
//! );
//!
//! let samples: Vec<i32> = (0..2000).map(|i| (i % 50) - 25).collect();
//! let (records, outcome) =
//!     mseed_pack::pack_to_vec(&mut trace, Samples::Int(&samples), &PackConfig { flush: true })
//!         .unwrap();
//!
//! assert_eq!(outcome.samples_packed, samples.len());
//! assert_eq!(records.len(), outcome.records_packed * 512);
//! ```
//!
//! Streaming to a file works by passing a `record_handler` closure to
//! [`pack_data`]:
//!
//! ```no_run
//! use std::fs::OpenOptions;
//! use std::io::{BufWriter, Write};
//!
//! use time::macros::datetime;
//!
//! use mseed_pack::{DataEncoding, PackConfig, PackTarget, Samples, TraceHeader};
//!
//! let mut trace = TraceHeader::new(
//!     "XX", "TEST", "00", "LHZ",
//!     datetime!(2012-01-01 00:00:00 UTC),
//!     100, 1, DataEncoding::Steim2, 512,
//! );
//!
//! let file = OpenOptions::new().create(true).write(true).open("out.mseed").unwrap();
//! let mut writer = BufWriter::new(file);
//! let record_handler = move |rec: &[u8]| {
//!     let _ = writer.write(rec);
//! };
//!
//! let samples: Vec<i32> = (1..1000).collect();
//! let mut target = PackTarget::Owned(Vec::new());
//! mseed_pack::pack_data(
//!     &mut trace,
//!     Samples::Int(&samples),
//!     record_handler,
//!     &mut target,
//!     &PackConfig { flush: true },
//! )
//! .unwrap();
//! ```

pub use crate::encoding::{DataEncoding, WordOrder};
pub use crate::error::{MSError, MSErrorCode, MSResult};
pub use crate::header::{
    add_dtime, add_time, duplicate, find_blockette, header_size, init_header, time_interval,
    update_header, Blockette, FIXED_HEADER_SIZE,
};
pub use crate::pack::{pack_data, pack_to_vec, PackConfig, PackOutcome, PackTarget, Samples};
pub use crate::trace::TraceHeader;

mod encoding;
mod error;
mod fixedint;
mod float;
mod header;
mod pack;
mod steim;
mod text;
mod trace;
