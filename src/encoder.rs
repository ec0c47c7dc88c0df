use alloy_primitives::{I256, U256};

use crate::{
    align::{padded_words, usize_word, Word, WORD_SIZE},
    block::{Block, BlockArena, BlockId},
    error::{CodecError, Result},
    types::{AbiType, AbiValue},
};

/// Walks a schema together with its values and builds the block tree.
///
/// Static values are written straight into the parent's head. Every dynamic
/// value becomes its own relocatable block, referenced from a pointer slot.
pub struct BlockBuilder {
    arena: BlockArena,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self {
            arena: BlockArena::new(),
        }
    }

    /// Builds the root block for a parameter list, treated as an implicit tuple.
    pub fn build_params(
        mut self,
        types: &[AbiType],
        values: &[AbiValue],
    ) -> Result<(BlockArena, BlockId)> {
        types.iter().try_for_each(AbiType::validate)?;
        if types.len() != values.len() {
            return Err(CodecError::schema_mismatch(
                format!("{} parameters", types.len()),
                format!("{} values", values.len()),
            ));
        }
        let mut root = Block::default();
        for (ty, value) in types.iter().zip(values) {
            self.encode_head(&mut root, ty, value)?;
        }
        let root = self.arena.push(root);
        Ok((self.arena, root))
    }

    /// Appends `value` to `parent`'s head: inline words for static types, a
    /// pointer slot to a new block for dynamic ones.
    fn encode_head(&mut self, parent: &mut Block, ty: &AbiType, value: &AbiValue) -> Result<()> {
        if ty.is_dynamic() {
            let child = self.build_block(ty, value)?;
            parent.push_pointer(child);
            return Ok(());
        }
        match (ty, value) {
            (AbiType::FixedArray(element, len), AbiValue::Array(items)) => {
                check_arity(ty, value, *len, items.len())?;
                for item in items {
                    self.encode_head(parent, element, item)?;
                }
                Ok(())
            }
            (AbiType::Tuple(fields), AbiValue::Tuple(items)) => {
                check_arity(ty, value, fields.len(), items.len())?;
                for (field, item) in fields.iter().zip(items) {
                    self.encode_head(parent, field, item)?;
                }
                Ok(())
            }
            _ => {
                parent.words.push(encode_word(ty, value)?);
                Ok(())
            }
        }
    }

    /// Builds the relocatable block of a dynamic value.
    fn build_block(&mut self, ty: &AbiType, value: &AbiValue) -> Result<BlockId> {
        let block = match (ty, value) {
            (AbiType::Bytes, AbiValue::Bytes(data)) => bytes_block(data),
            (AbiType::String, AbiValue::String(text)) => bytes_block(text.as_bytes()),
            (AbiType::Array(element), AbiValue::Array(items)) => {
                let mut block = Block::relocatable(WORD_SIZE);
                block.words.push(usize_word(items.len()));
                for item in items {
                    self.encode_head(&mut block, element, item)?;
                }
                block
            }
            (AbiType::FixedArray(element, len), AbiValue::Array(items)) => {
                check_arity(ty, value, *len, items.len())?;
                let mut block = Block::relocatable(0);
                for item in items {
                    self.encode_head(&mut block, element, item)?;
                }
                block
            }
            (AbiType::Tuple(fields), AbiValue::Tuple(items)) => {
                check_arity(ty, value, fields.len(), items.len())?;
                let mut block = Block::relocatable(0);
                for (field, item) in fields.iter().zip(items) {
                    self.encode_head(&mut block, field, item)?;
                }
                block
            }
            _ => return Err(CodecError::schema_mismatch(ty, value.kind())),
        };
        Ok(self.arena.push(block))
    }
}

impl Default for BlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn check_arity(ty: &AbiType, value: &AbiValue, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(CodecError::schema_mismatch(
            format!("{ty} with {expected} items"),
            value.kind(),
        ));
    }
    Ok(())
}

/// Length word followed by the payload, right-padded to a word boundary.
fn bytes_block(data: &[u8]) -> Block {
    let mut block = Block::relocatable(0);
    block.words.push(usize_word(data.len()));
    block.words.extend(padded_words(data));
    block
}

/// Encodes an elementary value into its single word.
pub fn encode_word(ty: &AbiType, value: &AbiValue) -> Result<Word> {
    match (ty, value) {
        (AbiType::Bool, AbiValue::Bool(flag)) => Ok(Word::with_last_byte(*flag as u8)),
        (AbiType::Uint(bits), AbiValue::Uint(number)) => {
            if number.bit_len() > *bits {
                return Err(CodecError::out_of_range(
                    ty,
                    format!("{number} needs {} bits", number.bit_len()),
                ));
            }
            Ok(Word::from(number.to_be_bytes::<32>()))
        }
        (AbiType::Int(bits), AbiValue::Int(number)) => {
            if !int_fits(number, *bits) {
                return Err(CodecError::out_of_range(ty, format!("{number} does not fit")));
            }
            Ok(Word::from(number.into_raw().to_be_bytes::<32>()))
        }
        (AbiType::Address, AbiValue::Address(address)) => Ok(address.into_word()),
        (AbiType::FixedBytes(size), AbiValue::FixedBytes(word, len)) => {
            ty.validate()?;
            if size != len {
                return Err(CodecError::out_of_range(ty, format!("got {len} bytes")));
            }
            if word[*size..].iter().any(|&b| b != 0) {
                return Err(CodecError::out_of_range(ty, "non-zero bytes past the declared size"));
            }
            Ok(*word)
        }
        _ => Err(CodecError::schema_mismatch(ty, value.kind())),
    }
}

/// Whether a signed value lies in `[-2^(bits-1), 2^(bits-1))`.
pub(crate) fn int_fits(number: &I256, bits: usize) -> bool {
    let raw = number.into_raw();
    let magnitude: U256 = if number.is_negative() { !raw } else { raw };
    magnitude.bit_len() < bits
}
