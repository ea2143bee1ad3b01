/*!

The lexicographic path ordering: the alternative simplification ordering behind the same
interface as KBO. Precedence is functor registration order. The recursion is the textbook one:
a term dominates if one of its arguments already does, or if its head outranks the other head and
it dominates every argument of the other term.

*/

use sable_abs::RcCell;

use crate::core::ordering::{OrderingResult, SimplificationOrdering};
use crate::core::symbol::{PredicateIndex, Signature, SymbolIndex};
use crate::core::term::{TermData, TermId, TermStore};

pub struct LexicographicPathOrdering {
  signature: RcCell<Signature>,
}

impl LexicographicPathOrdering {
  pub fn new(signature: RcCell<Signature>) -> Self {
    LexicographicPathOrdering { signature }
  }

  #[inline(always)]
  fn precedence(&self, symbol: SymbolIndex) -> u32 {
    symbol.0
  }

  /// Is `s` strictly greater than `t`?
  fn greater(&self, store: &TermStore, s: TermId, t: TermId) -> bool {
    if s == t {
      return false;
    }
    match (&store.term(s).data, &store.term(t).data) {
      (_, TermData::Variable(y)) => store.occurs(*y, s) && s != t,
      (TermData::Variable(_), _) => false,
      (
        TermData::Function { symbol: f, args: s_args },
        TermData::Function { symbol: g, args: t_args },
      ) => {
        let (f, g) = (*f, *g);
        let s_args = s_args.clone();
        let t_args = t_args.clone();

        // (1) Some argument of s already dominates t.
        if s_args.iter().any(|&arg| arg == t || self.greater(store, arg, t)) {
          return true;
        }
        if self.precedence(f) > self.precedence(g) {
          // (2) Head wins; s must dominate every argument of t.
          return t_args.iter().all(|&arg| self.greater(store, s, arg));
        }
        if f == g {
          // (3) Equal heads: first differing argument decides, s dominates the rest.
          for (i, (&s_arg, &t_arg)) in s_args.iter().zip(t_args.iter()).enumerate() {
            if s_arg == t_arg {
              continue;
            }
            return self.greater(store, s_arg, t_arg)
                && t_args[i + 1..].iter().all(|&arg| self.greater(store, s, arg));
          }
        }
        false
      }
      // Special variables are not ordered.
      _ => false,
    }
  }
}

impl SimplificationOrdering for LexicographicPathOrdering {
  fn compare(&self, store: &TermStore, s: TermId, t: TermId) -> OrderingResult {
    if s == t {
      return OrderingResult::Equal;
    }
    if self.greater(store, s, t) {
      return OrderingResult::Greater;
    }
    if self.greater(store, t, s) {
      return OrderingResult::Less;
    }
    OrderingResult::Incomparable
  }

  fn predicate_level(&self, predicate: PredicateIndex) -> u32 {
    self.signature.borrow().predicate(predicate).level
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::term::TermBuilder;
  use sable_abs::{rc_cell, IString};

  #[test]
  fn subterm_and_precedence() {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    let f = signature.add_function(IString::from("f"), &[sort], sort);
    let g = signature.add_function(IString::from("g"), &[sort], sort);
    let a = signature.add_constant(IString::from("a"), sort);
    let mut store = TermStore::new();
    let lpo = LexicographicPathOrdering::new(rc_cell(signature));

    let ca = store.share(&TermBuilder::constant(a));
    let fa = store.mk_function(f, &[ca]);
    let ga = store.mk_function(g, &[ca]);

    assert_eq!(lpo.compare(&store, fa, ca), OrderingResult::Greater);
    // g was registered after f, so it has the higher precedence.
    assert_eq!(lpo.compare(&store, ga, fa), OrderingResult::Greater);

    let x  = store.share(&TermBuilder::var(0));
    let fx = store.mk_function(f, &[x]);
    assert_eq!(lpo.compare(&store, fx, x), OrderingResult::Greater);

    let y = store.share(&TermBuilder::var(1));
    assert_eq!(lpo.compare(&store, fx, y), OrderingResult::Incomparable);
  }
}
