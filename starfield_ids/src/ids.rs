//! Type-safe generational identifiers (slotmap-style) for arenas.
//! All IDs use u64 = index (low 32 bits) | generation (high 32 bits). Index 0 = nil.
//! IDs are created by their owning arena/store; slot reuse bumps generation so stale IDs are invalid.

use std::fmt;
use std::hash::Hash;

// ---- Generational ID: base encoding ----
// u64 layout: low 32 = index (0 = nil, 1.. = slot), high 32 = generation.
// When a slot is reused, generation is bumped so old IDs no longer match.

/// Defines a generational ID type (NodeID, MeshID, MaterialID).
/// All such IDs use index + generation for safe arena slot reuse.
macro_rules! define_generational_id {
    ($type_name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $type_name(pub u64);

        impl $type_name {
            #[inline]
            pub const fn nil() -> Self {
                Self(0)
            }

            #[inline]
            pub const fn index(self) -> u32 {
                (self.0 & 0xFFFF_FFFF) as u32
            }

            #[inline]
            pub const fn generation(self) -> u32 {
                (self.0 >> 32) as u32
            }

            #[inline]
            pub const fn from_parts(index: u32, generation: u32) -> Self {
                Self((index as u64) | ((generation as u64) << 32))
            }

            #[inline]
            pub const fn as_u64(self) -> u64 {
                self.0
            }

            #[inline]
            pub const fn from_u64(value: u64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn is_nil(self) -> bool {
                self.0 == 0
            }
        }

        impl Default for $type_name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl fmt::Debug for $type_name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!(stringify!($type_name), "({}:{})"),
                    self.index(),
                    self.generation()
                )
            }
        }

        impl fmt::Display for $type_name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", self.index(), self.generation())
            }
        }
    };
}

define_generational_id!(
    NodeID,
    "Node ID allocated by NodeArena. Index + generation."
);
define_generational_id!(
    MeshID,
    "Mesh ID allocated by the scene resource store. Index + generation."
);
define_generational_id!(
    MaterialID,
    "Material ID allocated by the scene resource store. Index + generation."
);

/// Slot allocator shared by every generational store: hands out `(index, generation)`
/// pairs, reusing freed slots with a bumped generation.
#[derive(Debug, Clone)]
pub struct SlotAllocator {
    generations: Vec<u32>,
    occupied: Vec<bool>,
    free_indices: Vec<u32>,
}

impl SlotAllocator {
    pub fn new() -> Self {
        // Reserve index 0 as invalid/nil sentinel so the first real slot is 1.
        Self {
            generations: vec![0],
            occupied: vec![false],
            free_indices: Vec::new(),
        }
    }

    pub fn alloc(&mut self) -> (u32, u32) {
        if let Some(index) = self.free_indices.pop() {
            self.occupied[index as usize] = true;
            return (index, self.generations[index as usize]);
        }
        let index = self.generations.len() as u32;
        self.generations.push(0);
        self.occupied.push(true);
        (index, 0)
    }

    pub fn is_live(&self, index: u32, generation: u32) -> bool {
        index != 0
            && (index as usize) < self.generations.len()
            && self.occupied[index as usize]
            && self.generations[index as usize] == generation
    }

    /// Frees a slot; returns false if `(index, generation)` was already stale.
    pub fn free(&mut self, index: u32, generation: u32) -> bool {
        if !self.is_live(index, generation) {
            return false;
        }
        let slot = index as usize;
        self.occupied[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free_indices.push(index);
        true
    }

    pub fn live_count(&self) -> usize {
        self.occupied.iter().filter(|o| **o).count()
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}
