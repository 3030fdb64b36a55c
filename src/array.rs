//! Block-allocated storage.
//!
//! `BlockVec<T>` is a sequence stored in fixed-capacity blocks. Growing
//! appends a new block and never moves the existing ones, so an element's
//! address and index stay stable for as long as it is stored. Clearing keeps
//! the blocks around, so repeated fill/clear cycles stop allocating once the
//! high-water mark has been reached.

// ============================================================================
// BlockVec
// ============================================================================

/// Append-only sequence stored in blocks of `1 << block_shift` elements.
///
/// An optional block limit caps the total capacity. Pushing past it is
/// rejected (the element is dropped and `push` returns `false`).
pub struct BlockVec<T> {
    blocks: Vec<Vec<T>>,
    block_shift: u32,
    block_limit: usize,
    len: usize,
}

impl<T> BlockVec<T> {
    /// Create an empty vector with `1 << block_shift` elements per block and
    /// no block limit.
    pub fn new(block_shift: u32) -> Self {
        Self::with_block_limit(block_shift, usize::MAX)
    }

    /// Create an empty vector that will never hold more than `block_limit`
    /// blocks.
    pub fn with_block_limit(block_shift: u32, block_limit: usize) -> Self {
        Self {
            blocks: Vec::new(),
            block_shift,
            block_limit,
            len: 0,
        }
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        1 << self.block_shift
    }

    #[inline]
    fn block_mask(&self) -> usize {
        self.block_size() - 1
    }

    #[inline]
    pub fn block_limit(&self) -> usize {
        self.block_limit
    }

    pub fn set_block_limit(&mut self, limit: usize) {
        self.block_limit = limit;
    }

    /// Number of blocks allocated so far (used or not).
    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append an element. Returns `false` if the block limit is reached.
    pub fn push(&mut self, val: T) -> bool {
        let nb = self.len >> self.block_shift;
        if self.len & self.block_mask() == 0 {
            if nb >= self.block_limit {
                return false;
            }
            if nb == self.blocks.len() {
                self.blocks.push(Vec::with_capacity(self.block_size()));
            }
        }
        self.blocks[nb].push(val);
        self.len += 1;
        true
    }

    /// Remove all elements, keeping every allocated block for reuse.
    pub fn clear(&mut self) {
        for block in &mut self.blocks {
            block.clear();
        }
        self.len = 0;
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&T> {
        if idx >= self.len {
            return None;
        }
        Some(&self.blocks[idx >> self.block_shift][idx & self.block_mask()])
    }

    /// Iterate over all elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.blocks.iter().flat_map(|b| b.iter())
    }
}

impl<T> core::ops::Index<usize> for BlockVec<T> {
    type Output = T;

    fn index(&self, idx: usize) -> &T {
        match self.get(idx) {
            Some(v) => v,
            None => panic!("BlockVec index {} out of range (len {})", idx, self.len),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
