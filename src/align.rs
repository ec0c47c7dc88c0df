use alloy_primitives::B256;
use byteorder::{BigEndian, ByteOrder};

use crate::error::{CodecError, Result};

/// A single 32-byte ABI word.
pub type Word = B256;

/// Size of one ABI word in bytes.
pub const WORD_SIZE: usize = 32;

/// Rounds `offset` up to the next multiple of `ALIGN`.
///
/// `ALIGN` must be a power of two.
#[inline(always)]
pub const fn align_up<const ALIGN: usize>(offset: usize) -> usize {
    (offset + ALIGN - 1) & !(ALIGN - 1)
}

/// Number of words needed to hold `len` bytes.
#[inline(always)]
pub const fn words_for(len: usize) -> usize {
    align_up::<WORD_SIZE>(len) / WORD_SIZE
}

/// Builds a word holding `value` as a big-endian integer, left-padded with zeros.
pub fn usize_word(value: usize) -> Word {
    let mut word = Word::ZERO;
    BigEndian::write_u64(&mut word[WORD_SIZE - 8..], value as u64);
    word
}

/// Reads a length or offset word back into a `usize`.
///
/// Returns `None` when the value does not fit, so the caller can pick the error
/// that matches the context (a length that is too large truncates, a pointer that
/// is too large is invalid).
pub fn word_to_usize(word: &[u8]) -> Option<usize> {
    debug_assert_eq!(word.len(), WORD_SIZE);
    if word[..WORD_SIZE - 8].iter().any(|&b| b != 0) {
        return None;
    }
    usize::try_from(BigEndian::read_u64(&word[WORD_SIZE - 8..])).ok()
}

/// Splits `data` into words, right-padding the last one with zeros.
pub fn padded_words(data: &[u8]) -> impl Iterator<Item = Word> + '_ {
    data.chunks(WORD_SIZE).map(|chunk| {
        let mut word = Word::ZERO;
        word[..chunk.len()].copy_from_slice(chunk);
        word
    })
}

/// Returns the word starting at `offset`, or a truncation error naming `what`.
pub fn read_word<'a>(buf: &'a [u8], offset: usize, what: &str) -> Result<&'a [u8]> {
    let end = offset
        .checked_add(WORD_SIZE)
        .ok_or_else(|| CodecError::truncated(usize::MAX, buf.len(), what))?;
    buf.get(offset..end).ok_or_else(|| {
        CodecError::truncated(end, buf.len(), format!("buf too small to read {what}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up::<32>(0), 0);
        assert_eq!(align_up::<32>(1), 32);
        assert_eq!(align_up::<32>(32), 32);
        assert_eq!(align_up::<32>(33), 64);
        assert_eq!(words_for(0), 0);
        assert_eq!(words_for(40), 2);
    }

    #[test]
    fn test_usize_word_roundtrip() {
        let word = usize_word(0x1234);
        assert_eq!(word[30..], [0x12, 0x34]);
        assert!(word[..30].iter().all(|&b| b == 0));
        assert_eq!(word_to_usize(word.as_slice()), Some(0x1234));
    }

    #[test]
    fn test_word_to_usize_rejects_high_bits() {
        let mut word = Word::ZERO;
        word[0] = 1;
        assert_eq!(word_to_usize(word.as_slice()), None);
    }

    #[test]
    fn test_padded_words() {
        let words: Vec<Word> = padded_words(&[0xaa; 33]).collect();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], Word::repeat_byte(0xaa));
        assert_eq!(words[1][0], 0xaa);
        assert!(words[1][1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_word_truncated() {
        let buf = [0u8; 40];
        assert!(read_word(&buf, 0, "head").is_ok());
        let err = read_word(&buf, 32, "head").unwrap_err();
        assert!(matches!(
            err,
            CodecError::Decoding(crate::error::DecodingError::TruncatedInput {
                expected: 64,
                found: 40,
                ..
            })
        ));
    }
}
