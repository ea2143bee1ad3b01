/*!

A `NatSet` is a set of (small) natural numbers backed by a bit vector. The client code only sees
insert/remove/contains and a handful of set-algebra operations, so the backing implementation can
be swapped out without ceremony.

*/

use std::fmt::{Debug, Formatter};

use bit_set::BitSet;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct NatSet(BitSet);

impl NatSet {
  #[inline(always)]
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts the value, returning `true` if it was not already present.
  #[inline(always)]
  pub fn insert(&mut self, value: usize) -> bool {
    self.0.insert(value)
  }

  #[inline(always)]
  pub fn remove(&mut self, value: usize) -> bool {
    self.0.remove(value)
  }

  #[inline(always)]
  pub fn contains(&self, value: usize) -> bool {
    self.0.contains(value)
  }

  #[inline(always)]
  pub fn clear(&mut self) {
    self.0.clear()
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  #[inline(always)]
  pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
    self.0.iter()
  }

  #[inline(always)]
  pub fn union_with(&mut self, other: &NatSet) {
    self.0.union_with(&other.0)
  }

  /// Is `self` a subset of `other`?
  #[inline(always)]
  pub fn is_subset(&self, other: &NatSet) -> bool {
    self.0.is_subset(&other.0)
  }
}

impl Debug for NatSet {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_set().entries(self.0.iter()).finish()
  }
}

impl FromIterator<usize> for NatSet {
  fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
    let mut set = NatSet::new();
    for value in iter {
      set.insert(value);
    }
    set
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insert_and_query() {
    let mut set = NatSet::new();
    assert!(set.insert(3));
    assert!(!set.insert(3));
    assert!(set.contains(3));
    assert!(!set.contains(4));
    assert_eq!(set.len(), 1);
  }

  #[test]
  fn subset() {
    let small: NatSet = [1usize, 2].into_iter().collect();
    let large: NatSet = [0usize, 1, 2, 5].into_iter().collect();
    assert!(small.is_subset(&large));
    assert!(!large.is_subset(&small));
  }
}
