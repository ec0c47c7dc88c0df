use hashbrown::{hash_map::Entry, HashMap};
use tracing::{debug, trace};

use crate::{
    align::Word,
    block::{BlockArena, BlockId},
};

/// Everything that determines a relocatable block's bytes once placed.
///
/// Pointer slots are cleared in `words` and described by `pointers` instead,
/// with each child already resolved to its surviving block. Two blocks with
/// equal keys produce byte-identical output wherever the surviving copy lands,
/// regardless of the types or value instances they came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct BlockKey {
    words: Vec<Word>,
    base: usize,
    pointers: Vec<(usize, BlockId)>,
}

/// Maps resolved block content to the block that will be emitted for it.
///
/// Scoped to a single encode call.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    seen: HashMap<BlockKey, BlockId>,
    aliases: HashMap<BlockId, BlockId>,
}

impl DuplicateIndex {
    /// Finds every relocatable block under `root` that duplicates another one.
    ///
    /// Blocks are visited in reverse emission order. Children are therefore keyed
    /// before their parents, and the copy that survives is always the last one
    /// in the output, so redirected offsets never point backwards.
    pub fn build(arena: &BlockArena, root: BlockId) -> Self {
        let mut index = Self::default();
        let order = arena.preorder(root, |_| false);
        for &id in order.iter().rev() {
            if arena[id].relocatable {
                index.insert(arena, id);
            }
        }
        debug!(
            blocks = order.len(),
            distinct = index.seen.len(),
            aliased = index.aliases.len(),
            "built duplicate index"
        );
        index
    }

    fn insert(&mut self, arena: &BlockArena, id: BlockId) {
        let key = self.key(arena, id);
        match self.seen.entry(key) {
            Entry::Occupied(entry) => {
                trace!(block = id.0, target = entry.get().0, "aliasing duplicate block");
                self.aliases.insert(id, *entry.get());
            }
            Entry::Vacant(entry) => {
                entry.insert(id);
            }
        }
    }

    fn key(&self, arena: &BlockArena, id: BlockId) -> BlockKey {
        let block = &arena[id];
        let mut words = block.words.clone();
        let pointers: Vec<_> = block
            .children
            .iter()
            .map(|child| {
                words[child.slot] = Word::ZERO;
                (child.slot, self.resolve(child.block))
            })
            .collect();
        // the base only shapes pointer values
        let base = if pointers.is_empty() { 0 } else { block.base };
        BlockKey {
            words,
            base,
            pointers,
        }
    }

    /// The block that is emitted in place of `id`.
    pub fn resolve(&self, id: BlockId) -> BlockId {
        self.aliases.get(&id).copied().unwrap_or(id)
    }

    pub fn is_alias(&self, id: BlockId) -> bool {
        self.aliases.contains_key(&id)
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}
