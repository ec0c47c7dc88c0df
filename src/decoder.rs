use alloy_primitives::{Address, Bytes, B256, I256, U256};

use crate::{
    align::{read_word, word_to_usize, words_for, WORD_SIZE},
    encoder::int_fits,
    error::{CodecError, Result},
    types::{AbiType, AbiValue},
};

/// Reads values back out of a parameter region.
///
/// Pointers are followed wherever they lead, so a block shared by several slots
/// is decoded once per slot into independent values. The decoder is strict:
/// offsets must be word-aligned and inside the buffer, and padding and unused
/// high bits must be zero.
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Decodes a parameter list laid out as an implicit tuple at offset 0.
    pub fn decode_params(&self, types: &[AbiType]) -> Result<Vec<AbiValue>> {
        types.iter().try_for_each(AbiType::validate)?;
        self.decode_sequence(types.iter(), 0)
    }

    /// Decodes consecutive head entries starting at `base`; dynamic entries are
    /// offsets relative to `base`.
    fn decode_sequence<'t>(
        &self,
        types: impl Iterator<Item = &'t AbiType>,
        base: usize,
    ) -> Result<Vec<AbiValue>> {
        let mut head = base;
        let mut values = Vec::new();
        for ty in types {
            values.push(self.decode_head(ty, head, base)?);
            head += ty.head_size();
        }
        Ok(values)
    }

    fn decode_head(&self, ty: &AbiType, head: usize, base: usize) -> Result<AbiValue> {
        if ty.is_dynamic() {
            let start = self.follow_pointer(head, base)?;
            return self.decode_block(ty, start);
        }
        match ty {
            AbiType::FixedArray(element, len) => Ok(AbiValue::Array(
                self.decode_sequence(core::iter::repeat(element.as_ref()).take(*len), head)?,
            )),
            AbiType::Tuple(fields) => {
                Ok(AbiValue::Tuple(self.decode_sequence(fields.iter(), head)?))
            }
            _ => self.decode_word(ty, head),
        }
    }

    /// Reads the pointer at `head` and returns the absolute position it targets.
    fn follow_pointer(&self, head: usize, base: usize) -> Result<usize> {
        let word = read_word(self.buf, head, "pointer")?;
        let offset = word_to_usize(word)
            .ok_or_else(|| CodecError::invalid_pointer(head, "offset does not fit in usize"))?;
        if offset % WORD_SIZE != 0 {
            return Err(CodecError::invalid_pointer(
                head,
                format!("offset {offset:#x} is not word-aligned"),
            ));
        }
        let target = base
            .checked_add(offset)
            .filter(|&target| target <= self.buf.len())
            .ok_or_else(|| {
                CodecError::invalid_pointer(
                    head,
                    format!("offset {offset:#x} points outside of {} bytes", self.buf.len()),
                )
            })?;
        Ok(target)
    }

    /// Decodes a relocatable block that starts at `start`.
    fn decode_block(&self, ty: &AbiType, start: usize) -> Result<AbiValue> {
        match ty {
            AbiType::Bytes => {
                Ok(AbiValue::Bytes(Bytes::copy_from_slice(self.read_payload(start)?)))
            }
            AbiType::String => {
                let payload = self.read_payload(start)?;
                let text = core::str::from_utf8(payload)
                    .map_err(|err| {
                        CodecError::invalid_data(format!("invalid utf-8 string: {err}"))
                    })?;
                Ok(AbiValue::String(text.to_owned()))
            }
            AbiType::Array(element) => {
                let len = self.read_length(start)?;
                let body = start + WORD_SIZE;
                self.ensure_available(body, len, element.head_size(), "array elements")?;
                Ok(AbiValue::Array(
                    self.decode_sequence(core::iter::repeat(element.as_ref()).take(len), body)?,
                ))
            }
            AbiType::FixedArray(element, len) => Ok(AbiValue::Array(
                self.decode_sequence(core::iter::repeat(element.as_ref()).take(*len), start)?,
            )),
            AbiType::Tuple(fields) => {
                Ok(AbiValue::Tuple(self.decode_sequence(fields.iter(), start)?))
            }
            _ => self.decode_word(ty, start),
        }
    }

    fn read_length(&self, start: usize) -> Result<usize> {
        let word = read_word(self.buf, start, "length")?;
        word_to_usize(word).ok_or_else(|| {
            CodecError::truncated(usize::MAX, self.buf.len(), "length exceeds any buffer")
        })
    }

    /// Checks that `count` items of `item_size` bytes fit after `start`.
    fn ensure_available(
        &self,
        start: usize,
        count: usize,
        item_size: usize,
        what: &str,
    ) -> Result<()> {
        let end = count
            .checked_mul(item_size)
            .and_then(|size| size.checked_add(start))
            .unwrap_or(usize::MAX);
        if end > self.buf.len() {
            return Err(CodecError::truncated(
                end,
                self.buf.len(),
                format!("buf too small to read {count} {what}"),
            ));
        }
        Ok(())
    }

    /// Returns the payload of a length-prefixed byte string, checking its padding.
    fn read_payload(&self, start: usize) -> Result<&'a [u8]> {
        let len = self.read_length(start)?;
        let data = start + WORD_SIZE;
        // len is bounded by the buffer before it is rounded up
        self.ensure_available(data, len, 1, "payload bytes")?;
        let padded = words_for(len) * WORD_SIZE;
        self.ensure_available(data, padded, 1, "payload padding")?;
        let (payload, padding) = self.buf[data..data + padded].split_at(len);
        if padding.iter().any(|&b| b != 0) {
            return Err(CodecError::invalid_data("non-zero padding after payload"));
        }
        Ok(payload)
    }

    fn decode_word(&self, ty: &AbiType, at: usize) -> Result<AbiValue> {
        let word = B256::from_slice(read_word(self.buf, at, "value")?);
        match ty {
            AbiType::Bool => match U256::from_be_bytes(word.0) {
                value if value == U256::ZERO => Ok(AbiValue::Bool(false)),
                value if value == U256::from(1) => Ok(AbiValue::Bool(true)),
                value => Err(CodecError::invalid_data(format!("invalid bool {value}"))),
            },
            AbiType::Uint(bits) => {
                let value = U256::from_be_bytes(word.0);
                if value.bit_len() > *bits {
                    return Err(CodecError::invalid_data(format!("{value} overflows {ty}")));
                }
                Ok(AbiValue::Uint(value))
            }
            AbiType::Int(bits) => {
                let value = I256::from_raw(U256::from_be_bytes(word.0));
                if !int_fits(&value, *bits) {
                    return Err(CodecError::invalid_data(format!(
                        "{value} is not a sign-extended {ty}"
                    )));
                }
                Ok(AbiValue::Int(value))
            }
            AbiType::Address => {
                if word[..12].iter().any(|&b| b != 0) {
                    return Err(CodecError::invalid_data("dirty high bytes in address"));
                }
                Ok(AbiValue::Address(Address::from_word(word)))
            }
            AbiType::FixedBytes(size) => {
                if word[*size..].iter().any(|&b| b != 0) {
                    return Err(CodecError::invalid_data(format!("non-zero padding in {ty}")));
                }
                Ok(AbiValue::FixedBytes(word, *size))
            }
            _ => Err(CodecError::invalid_data(format!("{ty} is not an elementary type"))),
        }
    }
}
