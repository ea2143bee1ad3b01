/*!

Literals: a predicate applied to argument terms, tagged with a polarity bit. Predicate 0 is
equality, whose two arguments are unordered (the commutativity bit). Literals participate in the
same sharing pool as terms: structurally equal literals have exactly one representative, and a
literal and its complement hash-cons to different representatives.

For an equality literal whose both sides are variables the equality sort cannot be recovered from
the arguments, so it is stored explicitly.

*/

use std::cell::Cell;
use std::fmt::{Display, Formatter};

use sable_abs::{NatSet, SmallVec};

use crate::core::sort::SortId;
use crate::core::symbol::{PredicateIndex, Signature, EQUALITY};
use crate::core::term::{ArgumentOrder, TermAttribute, TermAttributes, TermId, TermStore};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct LiteralId(pub(crate) u32);

impl LiteralId {
  #[inline(always)]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct LiteralKey {
  pub predicate: PredicateIndex,
  pub polarity : bool,
  pub args     : SmallVec<[TermId; 2]>,
  pub eq_sort  : Option<SortId>,
}

pub struct SharedLiteral {
  pub predicate    : PredicateIndex,
  pub polarity     : bool,
  pub args         : SmallVec<[TermId; 2]>,
  pub weight       : u32,
  pub distinct_vars: u32,
  pub attributes   : TermAttributes,
  /// Only for equalities whose both sides are variables.
  pub eq_sort      : Option<SortId>,
  pub(crate) argument_order: Cell<ArgumentOrder>,
}

impl SharedLiteral {
  #[inline(always)]
  pub fn is_equality(&self) -> bool {
    self.predicate == EQUALITY
  }

  #[inline(always)]
  pub fn is_positive(&self) -> bool {
    self.polarity
  }

  #[inline(always)]
  pub fn is_negative(&self) -> bool {
    !self.polarity
  }

  /// The commutativity bit: equality is the only commutative predicate.
  #[inline(always)]
  pub fn is_commutative(&self) -> bool {
    self.is_equality()
  }

  #[inline(always)]
  pub fn is_ground(&self) -> bool {
    self.attributes.contains(TermAttribute::Ground)
  }

  #[inline(always)]
  pub fn argument_order(&self) -> ArgumentOrder {
    self.argument_order.get()
  }

  #[inline(always)]
  pub(crate) fn set_argument_order(&self, order: ArgumentOrder) {
    self.argument_order.set(order);
  }
}

impl TermStore {
  pub fn mk_literal(
    &mut self,
    predicate: PredicateIndex,
    polarity: bool,
    args: &[TermId],
    eq_sort: Option<SortId>,
  ) -> LiteralId {
    let eq_sort = if predicate == EQUALITY { eq_sort } else { None };
    debug_assert!(
      predicate != EQUALITY
          || !args.iter().all(|&a| self.term(a).is_variable())
          || eq_sort.is_some(),
      "two-variable equality requires an explicit sort"
    );

    let key = LiteralKey {
      predicate,
      polarity,
      args: SmallVec::from_slice(args),
      eq_sort,
    };
    if let Some(&id) = self.literal_canon.get(&key) {
      return id;
    }

    let mut weight = 1u32;
    let mut ground = true;
    for &arg in args {
      weight = weight.saturating_add(self.term(arg).weight);
      ground = ground && self.term(arg).is_ground();
    }
    let mut attributes = TermAttributes::empty();
    if ground {
      attributes |= TermAttribute::Ground;
    }

    let distinct_vars = if ground {
      0
    } else {
      let mut set = NatSet::new();
      for &arg in args {
        self.collect_variables(arg, &mut set);
      }
      set.iter().count() as u32
    };

    let id = LiteralId(self.literals.len() as u32);
    self.literals.push(SharedLiteral {
      predicate,
      polarity,
      args: SmallVec::from_slice(args),
      weight,
      distinct_vars,
      attributes,
      eq_sort,
      argument_order: Cell::new(ArgumentOrder::Unknown),
    });
    self.literal_canon.insert(key, id);
    id
  }

  #[inline(always)]
  pub fn mk_equality(
    &mut self,
    polarity: bool,
    lhs: TermId,
    rhs: TermId,
    eq_sort: Option<SortId>,
  ) -> LiteralId {
    self.mk_literal(EQUALITY, polarity, &[lhs, rhs], eq_sort)
  }

  #[inline(always)]
  pub fn literal(&self, id: LiteralId) -> &SharedLiteral {
    &self.literals[id.index()]
  }

  #[inline(always)]
  pub fn literal_count(&self) -> usize {
    self.literals.len()
  }

  /// The opposite-polarity representative of the same atom.
  pub fn complement(&mut self, id: LiteralId) -> LiteralId {
    let literal = self.literal(id);
    let (predicate, polarity, eq_sort) = (literal.predicate, literal.polarity, literal.eq_sort);
    let args: SmallVec<[TermId; 2]> = literal.args.clone();
    self.mk_literal(predicate, !polarity, &args, eq_sort)
  }

  pub fn literal_variable_set(&self, id: LiteralId) -> NatSet {
    let mut set = NatSet::new();
    for &arg in self.literal(id).args.iter() {
      self.collect_variables(arg, &mut set);
    }
    set
  }

  #[inline(always)]
  pub fn display_literal<'s>(&'s self, signature: &'s Signature, id: LiteralId) -> LiteralDisplay<'s> {
    LiteralDisplay { store: self, signature, id }
  }
}

pub struct LiteralDisplay<'s> {
  store    : &'s TermStore,
  signature: &'s Signature,
  id       : LiteralId,
}

impl Display for LiteralDisplay<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let literal = self.store.literal(self.id);
    if literal.is_equality() {
      let connective = if literal.polarity { "=" } else { "!=" };
      write!(
        f,
        "{} {} {}",
        self.store.display_term(self.signature, literal.args[0]),
        connective,
        self.store.display_term(self.signature, literal.args[1]),
      )
    } else {
      if !literal.polarity {
        write!(f, "~")?;
      }
      write!(f, "{}", self.signature.predicate(literal.predicate).name)?;
      if !literal.args.is_empty() {
        write!(f, "(")?;
        for (i, &arg) in literal.args.iter().enumerate() {
          if i > 0 {
            write!(f, ",")?;
          }
          write!(f, "{}", self.store.display_term(self.signature, arg))?;
        }
        write!(f, ")")?;
      }
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::symbol::Signature;
  use crate::core::term::TermBuilder;
  use sable_abs::IString;

  #[test]
  fn complement_round_trip() {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    let p = signature.add_predicate(IString::from("p"), &[sort]);
    let a = signature.add_constant(IString::from("a"), sort);

    let mut store = TermStore::new();
    let ta = store.share(&TermBuilder::constant(a));
    let positive = store.mk_literal(p, true, &[ta], None);
    let negative = store.complement(positive);

    assert_ne!(positive, negative);
    assert_eq!(store.complement(negative), positive);
    assert!(store.literal(positive).polarity);
    assert!(!store.literal(negative).polarity);
  }

  #[test]
  fn two_variable_equality_keeps_sort() {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    let _ = signature;

    let mut store = TermStore::new();
    let x = store.mk_variable(crate::core::term::VariableIndex(0));
    let y = store.mk_variable(crate::core::term::VariableIndex(1));
    let eq = store.mk_equality(true, x, y, Some(sort));
    assert_eq!(store.literal(eq).eq_sort, Some(sort));
  }
}
