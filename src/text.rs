//! Opaque text/byte payload writer (spec.md §4.5).
//!
//! Text data carries no predictor state and no sample rate semantics: it is
//! copied verbatim, truncated to whatever fits in the record.

use crate::error::{MSError, MSResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TextOutput {
    pub bytes: Vec<u8>,
    pub bytes_packed: usize,
}

/// Copies as much of `data` as fits in `max_bytes`.
pub fn encode_text(data: &[u8], max_bytes: usize) -> MSResult<TextOutput> {
    if data.is_empty() {
        return Err(MSError::invalid_argument("no data to encode"));
    }
    let n = data.len().min(max_bytes);
    Ok(TextOutput {
        bytes: data[..n].to_vec(),
        bytes_packed: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn copies_verbatim_when_it_fits() {
        let out = encode_text(b"hello world", 1024).unwrap();
        assert_eq!(out.bytes, b"hello world");
        assert_eq!(out.bytes_packed, 11);
    }

    #[test]
    fn truncates_to_capacity() {
        let out = encode_text(b"hello world", 5).unwrap();
        assert_eq!(out.bytes, b"hello");
        assert_eq!(out.bytes_packed, 5);
    }
}
