use core::ops::{Index, IndexMut};

use crate::align::{Word, WORD_SIZE};

/// Index of a block inside a [`BlockArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// A pointer slot in a block's head and the block it refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildRef {
    /// Word index of the slot inside the parent's content.
    pub slot: usize,
    pub block: BlockId,
}

/// One output unit of the encoder.
///
/// The content is kept as whole words, so its byte length is always a multiple
/// of 32. Pointer slots hold zero until the layout engine patches them.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub words: Vec<Word>,
    pub children: Vec<ChildRef>,
    /// Byte position, relative to the block start, that child offsets are measured from.
    pub base: usize,
    pub relocatable: bool,
    /// Absolute position in the parameter region. Set once, when placed.
    pub offset: Option<usize>,
}

impl Block {
    pub fn relocatable(base: usize) -> Self {
        Self {
            base,
            relocatable: true,
            ..Default::default()
        }
    }

    pub fn byte_len(&self) -> usize {
        self.words.len() * WORD_SIZE
    }

    /// Appends a zeroed pointer slot referring to `block`.
    pub fn push_pointer(&mut self, block: BlockId) {
        self.children.push(ChildRef {
            slot: self.words.len(),
            block,
        });
        self.words.push(Word::ZERO);
    }
}

/// Owner of every block produced by one encode call.
#[derive(Debug, Default)]
pub struct BlockArena {
    blocks: Vec<Block>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: Block) -> BlockId {
        self.blocks.push(block);
        BlockId(self.blocks.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Pre-order walk from `root`: a block comes before its children, and a
    /// child's whole subtree comes before its next sibling.
    ///
    /// Children for which `skip` returns true are left out together with their
    /// subtrees.
    pub fn preorder(&self, root: BlockId, mut skip: impl FnMut(BlockId) -> bool) -> Vec<BlockId> {
        let mut order = Vec::with_capacity(self.blocks.len());
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            for child in self[id].children.iter().rev() {
                if !skip(child.block) {
                    stack.push(child.block);
                }
            }
        }
        order
    }
}

impl Index<BlockId> for BlockArena {
    type Output = Block;

    fn index(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }
}

impl IndexMut<BlockId> for BlockArena {
    fn index_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(arena: &mut BlockArena) -> BlockId {
        let mut block = Block::relocatable(0);
        block.words.push(Word::ZERO);
        arena.push(block)
    }

    #[test]
    fn test_push_pointer_records_slot() {
        let mut block = Block::relocatable(WORD_SIZE);
        block.words.push(Word::ZERO);
        block.push_pointer(BlockId(7));
        assert_eq!(block.children, vec![ChildRef { slot: 1, block: BlockId(7) }]);
        assert_eq!(block.byte_len(), 64);
    }

    #[test]
    fn test_preorder_visits_subtree_before_sibling() {
        let mut arena = BlockArena::new();
        let a1 = leaf(&mut arena);
        let mut a = Block::relocatable(0);
        a.push_pointer(a1);
        let a = arena.push(a);
        let b = leaf(&mut arena);
        let mut root = Block::default();
        root.push_pointer(a);
        root.push_pointer(b);
        let root = arena.push(root);

        assert_eq!(arena.preorder(root, |_| false), vec![root, a, a1, b]);
        assert_eq!(arena.preorder(root, |id| id == a), vec![root, b]);
    }
}
