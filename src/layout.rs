use bytes::{BufMut, BytesMut};
use tracing::debug;

use crate::{
    align::usize_word,
    block::{BlockArena, BlockId},
    error::{EncodingError, Result},
    optimizer::DuplicateIndex,
};

/// Places the blocks of one encode call and writes them out.
///
/// Emission order is a pre-order walk of the block tree: a block's head comes
/// before its children, and each child's subtree is finished before the next
/// sibling starts. This is the canonical ABI tail order.
pub struct LayoutEngine {
    arena: BlockArena,
    root: BlockId,
    index: Option<DuplicateIndex>,
}

impl LayoutEngine {
    pub fn new(arena: BlockArena, root: BlockId) -> Self {
        Self {
            arena,
            root,
            index: None,
        }
    }

    /// Collapses duplicated relocatable blocks before layout.
    pub fn optimized(mut self) -> Self {
        self.index = Some(DuplicateIndex::build(&self.arena, self.root));
        self
    }

    fn resolve(&self, id: BlockId) -> BlockId {
        match &self.index {
            Some(index) => index.resolve(id),
            None => id,
        }
    }

    /// Assigns offsets, patches pointer slots and returns the parameter region.
    pub fn finish(mut self) -> Result<BytesMut> {
        let order = match &self.index {
            Some(index) => self.arena.preorder(self.root, |id| index.is_alias(id)),
            None => self.arena.preorder(self.root, |_| false),
        };

        let mut cursor = 0;
        for &id in &order {
            let block = &mut self.arena[id];
            debug_assert!(block.offset.is_none(), "block {} placed twice", id.0);
            block.offset = Some(cursor);
            cursor += block.byte_len();
        }

        let mut buf = BytesMut::with_capacity(cursor);
        for &id in &order {
            self.patch_pointers(id)?;
            for word in &self.arena[id].words {
                buf.put_slice(word.as_slice());
            }
        }

        debug!(
            emitted = order.len(),
            total = self.arena.len(),
            size = buf.len(),
            optimized = self.index.is_some(),
            "laid out calldata"
        );
        Ok(buf)
    }

    /// Writes each child's offset, relative to this block's pointer base, into its slot.
    fn patch_pointers(&mut self, id: BlockId) -> Result<()> {
        let parent = &self.arena[id];
        let origin = placed(parent.offset, id)? + parent.base;
        let mut patches = Vec::with_capacity(parent.children.len());
        for child in &parent.children {
            let target = self.resolve(child.block);
            let offset = placed(self.arena[target].offset, target)?;
            // surviving copies are never placed before a slot that points at them
            debug_assert!(offset >= origin);
            patches.push((child.slot, usize_word(offset - origin)));
        }
        let parent = &mut self.arena[id];
        for (slot, word) in patches {
            parent.words[slot] = word;
        }
        Ok(())
    }
}

fn placed(offset: Option<usize>, id: BlockId) -> Result<usize> {
    offset.ok_or_else(|| EncodingError::UnplacedBlock(id.0).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        encoder::BlockBuilder,
        types::{AbiType, AbiValue},
    };

    fn layout(types: &[AbiType], values: &[AbiValue], optimize: bool) -> Vec<u8> {
        let (arena, root) = BlockBuilder::new().build_params(types, values).unwrap();
        let engine = LayoutEngine::new(arena, root);
        let engine = if optimize { engine.optimized() } else { engine };
        engine.finish().unwrap().to_vec()
    }

    #[test]
    fn test_offsets_are_relative_to_base() {
        // string[] ["a"]: head 0x20, length 1, element offset 0x20 measured after the length
        let out = layout(&[AbiType::array(AbiType::String)], &[AbiValue::from(vec!["a"])], false);
        assert_eq!(out.len(), 5 * 32);
        assert_eq!(out[31], 0x20);
        assert_eq!(out[63], 1);
        assert_eq!(out[95], 0x20);
        assert_eq!(out[127], 1);
        assert_eq!(out[128], b'a');
    }

    #[test]
    fn test_tuple_pointers_relative_to_tuple_start() {
        // ((uint256,string)): head 0x20, tuple = [7, 0x40], string at tuple + 0x40
        let ty = AbiType::Tuple(vec![AbiType::Uint(256), AbiType::String]);
        let value = AbiValue::Tuple(vec![AbiValue::uint(7), "x".into()]);
        let out = layout(&[ty], &[value], false);
        assert_eq!(out.len(), 5 * 32);
        assert_eq!(out[31], 0x20);
        assert_eq!(out[63], 7);
        assert_eq!(out[95], 0x40);
        assert_eq!(out[127], 1);
        assert_eq!(out[128], b'x');
    }

    #[test]
    fn test_optimized_skips_aliased_subtrees() {
        let ty = AbiType::array(AbiType::String);
        let value = AbiValue::from(vec!["Hello", "World"]);
        let plain = layout(&[ty.clone(), ty.clone()], &[value.clone(), value.clone()], false);
        let optimized = layout(&[ty.clone(), ty], &[value.clone(), value], true);
        // two head slots + one array (length, two pointers) + two strings
        assert_eq!(optimized.len(), (2 + 3 + 4) * 32);
        assert_eq!(plain.len(), (2 + 2 * (3 + 4)) * 32);
        assert_eq!(optimized[..32], optimized[32..64]);
    }

    #[test]
    fn test_empty_parameter_list() {
        assert!(layout(&[], &[], true).is_empty());
    }
}
