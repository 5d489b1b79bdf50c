// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the [`VisitedSet`] type.

/// The number of offsets a [`VisitedSet`] can hold: one for every octet
/// of the largest possible DNS message, plus one.
pub const CAPACITY: usize = 65536;

const WORD_BITS: usize = u64::BITS as usize;
const N_WORDS: usize = CAPACITY / WORD_BITS;

/// A fixed-capacity set of message offsets, stored as one bit per
/// offset.
///
/// Besides the bitmap, the set remembers which offsets were inserted
/// since the last call to [`VisitedSet::forget_touched`], so that the
/// marks made while expanding one name can be undone in time
/// proportional to their number instead of the size of the bitmap.
pub struct VisitedSet {
    words: Box<[u64]>,
    touched: Vec<u16>,
}

impl VisitedSet {
    /// Allocates an empty set, returning `None` if the allocation
    /// fails.
    pub fn try_new() -> Option<Self> {
        let mut words = Vec::new();
        words.try_reserve_exact(N_WORDS).ok()?;
        words.resize(N_WORDS, 0);
        let mut touched = Vec::new();
        touched.try_reserve(64).ok()?;
        Some(Self {
            words: words.into_boxed_slice(),
            touched,
        })
    }

    /// Returns whether `offset` is in the set. Offsets beyond the
    /// capacity are never in the set.
    pub fn contains(&self, offset: usize) -> bool {
        offset < CAPACITY && self.words[offset / WORD_BITS] & bit(offset) != 0
    }

    /// Adds `offset` to the set, returning whether it was newly added.
    ///
    /// Panics if `offset` is not less than [`CAPACITY`].
    pub fn insert(&mut self, offset: usize) -> bool {
        let word = &mut self.words[offset / WORD_BITS];
        if *word & bit(offset) != 0 {
            false
        } else {
            *word |= bit(offset);
            self.touched.push(offset as u16);
            true
        }
    }

    /// Removes every offset inserted since the last call to this method
    /// or to [`VisitedSet::clear`].
    pub fn forget_touched(&mut self) {
        for offset in self.touched.drain(..) {
            let offset = offset as usize;
            self.words[offset / WORD_BITS] &= !bit(offset);
        }
    }

    /// Removes every offset from the set.
    pub fn clear(&mut self) {
        self.words.fill(0);
        self.touched.clear();
    }

    /// Returns the number of offsets in the set.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }
}

fn bit(offset: usize) -> u64 {
    1 << (offset % WORD_BITS)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
