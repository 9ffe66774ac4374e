use std::error;
use std::fmt;

/// An enumeration of the packing library's stable error codes.
///
/// These correspond to the negative integer codes in spec.md §6:
/// `MS_ERROR`, `MS_COMPRESS`, and `MALLOC_ERROR`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MSErrorCode {
    /// Invalid argument (bad `block_size`, `n <= 0`, unimplemented data
    /// format) or a failure while materializing the record header.
    InvalidArgument,
    /// A Steim difference could not be represented in the encoding's widest
    /// bucket (overflow/saturation artifact), or a fixed-width sample did
    /// not fit its target width.
    Compress,
    /// Allocation of a library-owned output buffer failed.
    OutOfMemory,
}

impl MSErrorCode {
    /// The stable negative integer code, matching spec.md §6.
    pub fn as_raw(&self) -> i32 {
        match self {
            Self::InvalidArgument => -1,
            Self::Compress => -2,
            Self::OutOfMemory => -3,
        }
    }
}

/// A structure representing a packing error.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MSError {
    code: MSErrorCode,
    message: String,
}

impl MSError {
    /// Creates a new error with the given code and message.
    pub fn new(code: MSErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an `MSErrorCode::InvalidArgument` error from the given message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(MSErrorCode::InvalidArgument, message)
    }

    /// Creates an `MSErrorCode::Compress` error from the given message.
    pub fn compress(message: impl Into<String>) -> Self {
        Self::new(MSErrorCode::Compress, message)
    }

    /// Creates an `MSErrorCode::OutOfMemory` error from the given message.
    pub fn out_of_memory(message: impl Into<String>) -> Self {
        Self::new(MSErrorCode::OutOfMemory, message)
    }

    /// Returns the error code associated with this error.
    pub fn code(&self) -> MSErrorCode {
        self.code
    }

    /// Returns the message associated with this error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl error::Error for MSError {}

impl fmt::Display for MSError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; code={:?} ({})",
            self.message,
            self.code,
            self.code.as_raw()
        )
    }
}

/// A specialized library `Result` type.
pub type MSResult<T> = std::result::Result<T, MSError>;
