// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! BitSet type backing the dense crisp tubes.
//!
//! Bit i (counting from the LSB of word i / 64) is set if element i of the
//! tube's dimension is fully in the relation.
//!
//! # Examples
//!
//! ```
//! use closed_nsets::relation::BitSet;
//!
//! let mut set = BitSet::new(70);
//! set.insert(3);
//! set.insert(65);
//!
//! assert_eq!(set.len(), 2);
//! assert!(set.contains(65));
//! assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, 65]);
//! ```

/// A fixed-capacity set of small integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    words: Vec<u64>,
    capacity: usize,
}

impl BitSet {
    /// Create an empty set able to hold `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            capacity,
        }
    }

    /// Check if the set contains an element.
    #[inline]
    pub fn contains(&self, element: u32) -> bool {
        let element = element as usize;
        element < self.capacity && (self.words[element / 64] >> (element % 64)) & 1 != 0
    }

    /// Insert an element.
    ///
    /// # Panics
    ///
    /// Panics if the element is not below the capacity.
    pub fn insert(&mut self, element: u32) {
        let element = element as usize;
        assert!(element < self.capacity, "element {} out of bitset capacity {}", element, self.capacity);
        self.words[element / 64] |= 1 << (element % 64);
    }

    /// Remove an element.
    pub fn remove(&mut self, element: u32) {
        let element = element as usize;
        if element < self.capacity {
            self.words[element / 64] &= !(1 << (element % 64));
        }
    }

    /// Get the number of elements in the set (population count).
    pub fn len(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// Number of elements the set can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over all elements in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &word)| {
            BitIter { bits: word }.map(move |bit| (index * 64 + bit) as u32)
        })
    }
}

/// Iterator over the set bits of one word.
struct BitIter {
    bits: u64,
}

impl Iterator for BitIter {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bits == 0 {
            return None;
        }
        let bit = self.bits.trailing_zeros() as usize;
        self.bits &= self.bits - 1;
        Some(bit)
    }
}
