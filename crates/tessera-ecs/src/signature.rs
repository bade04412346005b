use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign},
};

use bitvec::prelude::*;

use crate::MAX_COMPONENT_TYPES;

type SignatureBits = BitArr!(for MAX_COMPONENT_TYPES, in u64, Lsb0);

/// Slot assigned to a component type on registration. Slots are handed out in registration order
/// starting at zero and index directly into a [`Signature`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentBit(u32);

/// A fixed-width set of component slots. An entity's signature has a bit set for every component
/// it owns. A system's signature has a bit set for every component it requires.
#[derive(Copy, Clone)]
pub struct Signature(SignatureBits);

impl Signature {
    /// Signature with no bits set.
    pub const EMPTY: Signature = Signature(SignatureBits::ZERO);

    #[inline]
    pub const fn new() -> Signature {
        Signature::EMPTY
    }

    /// Sets the bit for `bit`.
    #[inline]
    pub fn set(&mut self, bit: ComponentBit) {
        self.0.set(usize::from(bit), true);
    }

    /// Clears the bit for `bit`.
    #[inline]
    pub fn reset(&mut self, bit: ComponentBit) {
        self.0.set(usize::from(bit), false);
    }

    #[inline]
    pub fn test(&self, bit: ComponentBit) -> bool {
        self.0[usize::from(bit)]
    }

    /// Builder form of [`Signature::set`].
    #[inline]
    pub fn with(mut self, bit: ComponentBit) -> Signature {
        self.set(bit);
        self
    }

    /// Clears every bit.
    #[inline]
    pub fn clear(&mut self) {
        self.0 = SignatureBits::ZERO;
    }

    /// Returns `true` if every bit of `required` is also set in `self`, i.e.
    /// `(self & required) == required`.
    #[inline]
    pub fn contains(&self, required: &Signature) -> bool {
        self.0
            .data
            .iter()
            .zip(required.0.data.iter())
            .all(|(have, need)| have & need == *need)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.not_any()
    }

    /// Number of bits set.
    #[inline]
    pub fn count(&self) -> usize {
        self.0.count_ones()
    }

    /// Iterates over the set bits in ascending order.
    #[inline]
    pub fn bits(&self) -> impl Iterator<Item = ComponentBit> + '_ {
        self.0.iter_ones().map(ComponentBit::from)
    }
}

impl Default for Signature {
    #[inline]
    fn default() -> Self {
        Signature::EMPTY
    }
}

impl PartialEq for Signature {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.data == other.0.data
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.data.hash(state);
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter_ones()).finish()
    }
}

impl BitAndAssign for Signature {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        for (word, other) in self.0.data.iter_mut().zip(rhs.0.data.iter()) {
            *word &= *other;
        }
    }
}

impl BitAnd for Signature {
    type Output = Signature;

    #[inline]
    fn bitand(mut self, rhs: Self) -> Self::Output {
        self &= rhs;
        self
    }
}

impl BitOrAssign for Signature {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        for (word, other) in self.0.data.iter_mut().zip(rhs.0.data.iter()) {
            *word |= *other;
        }
    }
}

impl BitOr for Signature {
    type Output = Signature;

    #[inline]
    fn bitor(mut self, rhs: Self) -> Self::Output {
        self |= rhs;
        self
    }
}

impl FromIterator<ComponentBit> for Signature {
    fn from_iter<I: IntoIterator<Item = ComponentBit>>(iter: I) -> Self {
        let mut signature = Signature::EMPTY;
        for bit in iter {
            signature.set(bit);
        }
        signature
    }
}

impl From<u32> for ComponentBit {
    #[inline]
    fn from(item: u32) -> Self {
        ComponentBit(item)
    }
}

impl From<usize> for ComponentBit {
    #[inline]
    fn from(item: usize) -> Self {
        ComponentBit(item as u32)
    }
}

impl From<ComponentBit> for u32 {
    #[inline]
    fn from(item: ComponentBit) -> Self {
        item.0
    }
}

impl From<ComponentBit> for usize {
    #[inline]
    fn from(item: ComponentBit) -> Self {
        item.0 as usize
    }
}

impl fmt::Display for ComponentBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
