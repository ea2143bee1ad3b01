/*!

The Knuth–Bendix ordering, parameterised by a precedence on functors (registration order), a
weight function mapping each functor to a positive integer (numeral constants share one weight
slot), and a per-predicate level for literal comparison.

Comparison first settles the variable-occurrence balance and the weights; ties fall through to
the precedence and finally to a lexicographic descent into equal-top terms. The variable balance
makes the result stable under substitution: a `Greater` verdict can only become `Greater` again
after instantiation.

*/

use sable_abs::{HashMap, RcCell};

use crate::core::ordering::{OrderingResult, SimplificationOrdering};
use crate::core::symbol::{PredicateIndex, Signature, SymbolIndex};
use crate::core::term::{TermData, TermId, TermStore, VariableIndex};

pub struct KnuthBendixOrdering {
  signature: RcCell<Signature>,
  /// Weight of every variable occurrence.
  variable_weight: u64,
}

impl KnuthBendixOrdering {
  pub fn new(signature: RcCell<Signature>) -> Self {
    KnuthBendixOrdering {
      signature,
      variable_weight: 1,
    }
  }

  fn symbol_weight(&self, signature: &Signature, symbol: SymbolIndex) -> u64 {
    let function = signature.function(symbol);
    if function.is_numeral() {
      signature.numeral_weight as u64
    } else {
      function.kbo_weight as u64
    }
  }

  fn term_weight(&self, signature: &Signature, store: &TermStore, id: TermId) -> u64 {
    match &store.term(id).data {
      TermData::Variable(_) | TermData::SpecialVariable(_) => self.variable_weight,
      TermData::Function { symbol, args } => {
        let mut weight = self.symbol_weight(signature, *symbol);
        for &arg in args.iter() {
          weight += self.term_weight(signature, store, arg);
        }
        weight
      }
    }
  }

  /// Precedence on functors: registration order, which puts constructors and input symbols below
  /// the Skolems induction introduces later.
  #[inline(always)]
  fn precedence(&self, symbol: SymbolIndex) -> u32 {
    symbol.0
  }

  fn variable_balance(
    &self,
    store: &TermStore,
    balance: &mut HashMap<VariableIndex, i64>,
    id: TermId,
    delta: i64,
  ) {
    match &store.term(id).data {
      TermData::Variable(v) => {
        *balance.entry(*v).or_insert(0) += delta;
      }
      TermData::SpecialVariable(_) => {}
      TermData::Function { args, .. } => {
        for &arg in args.iter() {
          self.variable_balance(store, balance, arg, delta);
        }
      }
    }
  }
}

impl SimplificationOrdering for KnuthBendixOrdering {
  fn compare(&self, store: &TermStore, s: TermId, t: TermId) -> OrderingResult {
    use OrderingResult::*;

    if s == t {
      return Equal;
    }

    let s_data = &store.term(s).data;
    let t_data = &store.term(t).data;

    match (s_data, t_data) {
      (TermData::Variable(x), TermData::Variable(y)) => {
        if x == y { Equal } else { Incomparable }
      }
      (TermData::Variable(x), TermData::Function { .. }) => {
        if store.occurs(*x, t) { Less } else { Incomparable }
      }
      (TermData::Function { .. }, TermData::Variable(y)) => {
        if store.occurs(*y, s) { Greater } else { Incomparable }
      }
      (
        TermData::Function { symbol: f, args: s_args },
        TermData::Function { symbol: g, args: t_args },
      ) => {
        let (f, g) = (*f, *g);
        let (s_args, t_args) = (s_args.clone(), t_args.clone());

        let mut balance: HashMap<VariableIndex, i64> = HashMap::new();
        self.variable_balance(store, &mut balance, s, 1);
        self.variable_balance(store, &mut balance, t, -1);
        let surplus_s = balance.values().any(|&count| count > 0);
        let surplus_t = balance.values().any(|&count| count < 0);

        let signature = self.signature.borrow();
        let weight_s = self.term_weight(&signature, store, s);
        let weight_t = self.term_weight(&signature, store, t);

        if weight_s > weight_t {
          return if surplus_t { Incomparable } else { Greater };
        }
        if weight_s < weight_t {
          return if surplus_s { Incomparable } else { Less };
        }

        if f != g {
          // The precedence is total on functors, so one side wins outright.
          return if self.precedence(f) > self.precedence(g) {
            if surplus_t { Incomparable } else { Greater }
          } else if surplus_s {
            Incomparable
          } else {
            Less
          };
        }
        drop(signature);

        // Equal tops and weights: lexicographic descent.
        for (&s_arg, &t_arg) in s_args.iter().zip(t_args.iter()) {
          match self.compare(store, s_arg, t_arg) {
            Equal   => continue,
            Greater => return if surplus_t { Incomparable } else { Greater },
            Less    => return if surplus_s { Incomparable } else { Less },
            _ => return Incomparable,
          }
        }
        Equal
      }
      // Special variables only meet the ordering inside debug assertions.
      _ => Incomparable,
    }
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

  fn setup() -> (RcCell<Signature>, TermStore, SymbolIndex, SymbolIndex, SymbolIndex) {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    let f = signature.add_function(IString::from("f"), &[sort], sort);
    let g = signature.add_function(IString::from("g"), &[sort, sort], sort);
    let a = signature.add_constant(IString::from("a"), sort);
    (rc_cell(signature), TermStore::new(), f, g, a)
  }

  #[test]
  fn subterm_is_smaller() {
    let (signature, mut store, f, _, a) = setup();
    let kbo = KnuthBendixOrdering::new(signature);

    let ca = store.share(&TermBuilder::constant(a));
    let fa = store.mk_function(f, &[ca]);
    assert_eq!(kbo.compare(&store, fa, ca), OrderingResult::Greater);
    assert_eq!(kbo.compare(&store, ca, fa), OrderingResult::Less);
  }

  #[test]
  fn ground_terms_always_comparable() {
    let (signature, mut store, f, g, a) = setup();
    let kbo = KnuthBendixOrdering::new(signature);

    let ca  = store.share(&TermBuilder::constant(a));
    let fa  = store.mk_function(f, &[ca]);
    let gaa = store.mk_function(g, &[ca, ca]);
    let result = kbo.compare(&store, fa, gaa);
    assert_ne!(result, OrderingResult::Incomparable);
    assert_ne!(result, OrderingResult::Equal);
  }

  #[test]
  fn disjoint_variables_incomparable() {
    let (signature, mut store, f, _, _) = setup();
    let kbo = KnuthBendixOrdering::new(signature);

    let x  = store.share(&TermBuilder::var(0));
    let y  = store.share(&TermBuilder::var(1));
    let fx = store.mk_function(f, &[x]);
    assert_eq!(kbo.compare(&store, fx, y), OrderingResult::Incomparable);
    assert_eq!(kbo.compare(&store, fx, x), OrderingResult::Greater);
  }

  #[test]
  fn stability_under_grounding() {
    // f(X0) > X0 must stay Greater when X0 is instantiated.
    let (signature, mut store, f, _, a) = setup();
    let kbo = KnuthBendixOrdering::new(signature);

    let x  = store.share(&TermBuilder::var(0));
    let fx = store.mk_function(f, &[x]);
    assert_eq!(kbo.compare(&store, fx, x), OrderingResult::Greater);

    let ca  = store.mk_function(a, &[]);
    let fca = store.mk_function(f, &[ca]);
    assert_eq!(kbo.compare(&store, fca, ca), OrderingResult::Greater);
  }
}
