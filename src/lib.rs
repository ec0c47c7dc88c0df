//! Contract ABI calldata codec with optional deduplication of repeated dynamic
//! sub-encodings.
//!
//! Values are turned into a tree of blocks: static values live inline in their
//! parent's head, dynamic ones become relocatable blocks addressed by a 32-byte
//! offset. The layout engine writes blocks in canonical ABI order. With
//! [`EncodingOptions::optimize`] set, relocatable blocks whose bytes would be
//! identical are emitted once and every pointer to them is redirected to that
//! single copy. Decoding does not care whether the input was optimized.
//!
//! ```text
//! f(string,string) with ("Hello", "Hello"), optimized:
//! 0x00 0000..0040   // offset of a
//! 0x20 0000..0040   // offset of b, same block
//! 0x40 0000..0005   // length
//! 0x60 48656c6c6f.. // "Hello"
//! ```

use alloy_primitives::Bytes;
use tracing::debug;

pub mod align;
pub mod block;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod layout;
pub mod method;
pub mod optimizer;
pub mod types;


pub use decoder::Decoder;
pub use encoder::BlockBuilder;
pub use error::{CodecError, DecodingError, EncodingError, Result};
pub use layout::LayoutEngine;
pub use method::{Method, Param};
pub use optimizer::DuplicateIndex;
pub use types::{AbiType, AbiValue};

/// Options for a single encode call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodingOptions {
    /// Emit byte-identical relocatable blocks only once.
    pub optimize: bool,
}

impl EncodingOptions {
    /// Turns deduplication of repeated relocatable blocks on or off.
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }
}

/// Encodes a parameter list, without a function selector.
pub fn encode_params(
    types: &[AbiType],
    values: &[AbiValue],
    options: &EncodingOptions,
) -> Result<Bytes> {
    let (arena, root) = BlockBuilder::new().build_params(types, values)?;
    debug!(params = types.len(), blocks = arena.len(), optimize = options.optimize, "encoding");
    let mut engine = LayoutEngine::new(arena, root);
    if options.optimize {
        engine = engine.optimized();
    }
    Ok(Bytes::from(engine.finish()?.freeze()))
}

/// Decodes a parameter list, without a function selector.
pub fn decode_params(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>> {
    Decoder::new(data).decode_params(types)
}
