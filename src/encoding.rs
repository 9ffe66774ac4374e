use std::fmt;

/// An enumeration of the on-disk sample encodings a [`crate::TraceHeader`] may request.
///
/// Mirrors the `data_type` tag of the original `DATA_HDR` struct (spec.md §3).
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub enum DataEncoding {
    /// Steim-1 differential compression.
    Steim1,
    /// Steim-2 differential compression.
    Steim2,
    /// 16-bit fixed-width integer.
    Int16,
    /// 24-bit fixed-width integer.
    Int24,
    /// 32-bit fixed-width integer.
    Int32,
    /// IEEE-754 single precision float.
    FloatSp,
    /// IEEE-754 double precision float.
    FloatDp,
    /// Opaque text/byte payload. Only valid with `sample_rate == 0`.
    Text,
    /// Unknown datatype; valid only when paired with `sample_rate == 0`
    /// (in which case it behaves as [`DataEncoding::Text`]).
    Unknown,
}

impl DataEncoding {
    /// Whether this encoding carries Steim predictor state (`xm1`/`xm2`)
    /// across calls. Only the Steim codecs compute integration constants;
    /// fixed-width integers and floats carry no continuity state.
    pub fn is_predictor_relevant(&self) -> bool {
        matches!(self, Self::Steim1 | Self::Steim2)
    }

    /// The miniSEED blockette 1000 encoding format code for this encoding.
    ///
    /// Codes taken from the SEED manual's registered data encoding formats.
    pub fn format_code(&self) -> u8 {
        match self {
            Self::Text => 0,
            Self::Int16 => 1,
            Self::Int24 => 2,
            Self::Int32 => 3,
            Self::FloatSp => 4,
            Self::FloatDp => 5,
            Self::Steim1 => 10,
            Self::Steim2 => 11,
            Self::Unknown => 0xff,
        }
    }
}

impl fmt::Display for DataEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Steim1 => "STEIM1",
            Self::Steim2 => "STEIM2",
            Self::Int16 => "INT_16",
            Self::Int24 => "INT_24",
            Self::Int32 => "INT_32",
            Self::FloatSp => "IEEE_FP_SP",
            Self::FloatDp => "IEEE_FP_DP",
            Self::Text => "TEXT",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Byte order of multi-byte fields.
///
/// Header fields and payload are independently orderable in the SDR format
/// (spec.md §6); the core passes `WordOrder` verbatim to the payload
/// encoders.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash)]
pub enum WordOrder {
    /// "SEED order" — the default.
    BigEndian,
    LittleEndian,
}

impl Default for WordOrder {
    fn default() -> Self {
        Self::BigEndian
    }
}
