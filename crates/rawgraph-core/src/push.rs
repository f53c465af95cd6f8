//! Push-constant blocks attached to node dispatches.
//!
//! A push-constant block is a short, tightly packed array of 32-bit words.
//! Modules describe each block as a `#[repr(C)]` struct deriving
//! [`bytemuck::Pod`]; field order is the word order the kernel reads. Floats
//! are carried bit-for-bit.

use core::fmt;

use bytemuck::Pod;

use crate::graph::GraphError;

/// Maximum number of 32-bit words in one push-constant block (128 bytes).
pub const MAX_PUSH_WORDS: usize = 32;

/// Fixed-capacity push-constant storage.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PushConstants {
    words: [u32; MAX_PUSH_WORDS],
    len: usize,
}

impl PushConstants {
    /// An empty block.
    pub const fn empty() -> Self {
        Self {
            words: [0; MAX_PUSH_WORDS],
            len: 0,
        }
    }

    /// Packs a fixed-layout struct into words.
    ///
    /// Fails if the struct is not a whole number of words or does not fit.
    pub fn from_pod<T: Pod>(block: &T) -> Result<Self, GraphError> {
        let words: &[u32] = bytemuck::try_cast_slice(core::slice::from_ref(block)).map_err(
            |_| GraphError::PushConstantLayout {
                bytes: core::mem::size_of::<T>(),
            },
        )?;
        Self::from_words(words)
    }

    /// Copies raw words into a block.
    pub fn from_words(words: &[u32]) -> Result<Self, GraphError> {
        if words.len() > MAX_PUSH_WORDS {
            return Err(GraphError::PushConstantsTooLarge {
                words: words.len(),
                max: MAX_PUSH_WORDS,
            });
        }
        let mut block = Self::empty();
        block.words[..words.len()].copy_from_slice(words);
        block.len = words.len();
        Ok(block)
    }

    /// The packed words.
    pub fn words(&self) -> &[u32] {
        &self.words[..self.len]
    }

    /// The packed words as bytes, native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.words())
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the block holds no words.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for PushConstants {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for PushConstants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, w) in self.words().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{w:#010x}")?;
        }
        f.write_str("]")
    }
}
