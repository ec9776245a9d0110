//! Address decomposition.
//!
//! This module splits flat 64-bit addresses into the fields a set-associative
//! cache indexes by. It provides the following:
//! 1. **Layout:** `AddressLayout` captures the block-offset and set-index widths.
//! 2. **Decoding:** `DecodedAddr` holds the tag, set index and block offset of one address.
//! 3. **Reconstruction:** Helpers to rebuild full block addresses for fully-associative
//!    structures (the victim cache) that have no implicit set index.

/// Bit layout of an address for one cache geometry.
///
/// Both the block size and the set count are powers of two, so every field is a
/// shift and a mask. The layout is derived once from a validated
/// [`Geometry`](crate::config::Geometry) and is immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddressLayout {
    block_bits: u32,
    set_bits: u32,
}

/// An address split into cache indexing fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedAddr {
    /// Bits above the set index.
    pub tag: u64,
    /// Set the address maps to.
    pub set: usize,
    /// Byte offset inside the block. Carried for completeness; no data is modeled.
    pub offset: u64,
}

impl AddressLayout {
    /// Creates a layout from `log2(block size)` and `log2(set count)`.
    ///
    /// # Arguments
    ///
    /// * `block_bits` - Width of the block-offset field.
    /// * `set_bits` - Width of the set-index field.
    #[inline]
    pub const fn new(block_bits: u32, set_bits: u32) -> Self {
        debug_assert!(block_bits + set_bits < u64::BITS);
        Self {
            block_bits,
            set_bits,
        }
    }

    /// Width of the block-offset field in bits.
    #[inline(always)]
    pub const fn offset_width(&self) -> u32 {
        self.block_bits
    }

    /// Width of the set-index field in bits.
    #[inline(always)]
    pub const fn index_width(&self) -> u32 {
        self.set_bits
    }

    /// Width of the tag field in bits.
    #[inline(always)]
    pub const fn tag_width(&self) -> u32 {
        u64::BITS - self.set_bits - self.block_bits
    }

    /// Splits `addr` into tag, set index and block offset.
    #[inline]
    pub const fn decode(&self, addr: u64) -> DecodedAddr {
        let block = addr >> self.block_bits;
        let set_mask = (1u64 << self.set_bits) - 1;
        DecodedAddr {
            tag: block >> self.set_bits,
            set: (block & set_mask) as usize,
            offset: addr & ((1u64 << self.block_bits) - 1),
        }
    }

    /// Returns the block address (address with the offset stripped).
    ///
    /// This is the tag used by fully-associative structures.
    #[inline(always)]
    pub const fn block_address(&self, addr: u64) -> u64 {
        addr >> self.block_bits
    }

    /// Rebuilds a block address from a primary tag and the set it lived in.
    ///
    /// Inverse of [`decode`](Self::decode) restricted to the tag and index
    /// fields: `rebuild(d.tag, d.set) == block_address(addr)` for `d = decode(addr)`.
    #[inline(always)]
    pub const fn rebuild_block(&self, tag: u64, set: usize) -> u64 {
        (tag << self.set_bits) | set as u64
    }

    /// Splits a block address back into (primary tag, set index).
    #[inline(always)]
    pub const fn split_block(&self, block: u64) -> (u64, usize) {
        let set_mask = (1u64 << self.set_bits) - 1;
        (block >> self.set_bits, (block & set_mask) as usize)
    }
}

impl DecodedAddr {
    /// Column a tag canonically predicts to under multi-column way prediction.
    ///
    /// # Arguments
    ///
    /// * `ways` - Associativity; must be a power of two.
    #[inline(always)]
    pub const fn major_location(&self, ways: usize) -> usize {
        (self.tag & (ways as u64 - 1)) as usize
    }
}
