//! Fixed-capacity storage blocks.

/// A fixed-capacity, append-only chunk of backlog storage.
///
/// The storage region is allocated once at creation and never resized.
/// Bytes are only ever appended at the write cursor; nothing already
/// written is overwritten or removed.
#[derive(Debug)]
pub struct Block {
    data: Box<[u8]>,
    used: usize,
}

impl Block {
    /// Allocates an empty block with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            used: 0,
        }
    }

    /// Returns the fixed capacity of this block.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Returns the number of bytes still free.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.used
    }

    /// Returns true if no more bytes fit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.used == self.data.len()
    }

    /// Returns the written region.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.used]
    }

    /// Appends `src` at the write cursor.
    ///
    /// # Panics
    ///
    /// Panics if `src` does not fit in the remaining space. The backlog
    /// sizes its writes so this never happens.
    pub fn append(&mut self, src: &[u8]) {
        let end = self.used + src.len();
        assert!(
            end <= self.data.len(),
            "block overflow: {} + {} > {}",
            self.used,
            src.len(),
            self.data.len()
        );
        self.data[self.used..end].copy_from_slice(src);
        self.used = end;
    }
}
