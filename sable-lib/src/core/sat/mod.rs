/*!

The subsumption solver: the oracle behind multi-literal subsumption and subsumption resolution.

The engines hand it two literal arrays and ask a yes/no question; everything behind the public
interface is private to the solver. Internally each base literal gets a list of match candidates
(instance literal, orientation, complementary flag); the solver searches assignments of base
literals to candidates DPLL-style: decide a candidate, propagate the substitution bindings it
forces, and on conflict backtrack the binding trail to the decision point and try the next
candidate. The usage map enforces that distinct base literals consume distinct instance literals
(the multiset reading of `Cσ ⊆ D`), and in the resolution variant every complementary match must
aim at one single instance literal, which becomes the literal resolved away.

*/

use crate::core::literal::LiteralId;
use crate::core::substitution::{BankIndex, RobSubstitution};
use crate::core::term::{TermId, TermStore};

#[derive(Copy, Clone)]
struct Candidate {
  instance: usize,
  /// Equality orientation: match against the swapped argument list.
  swap: bool,
  /// Matches the complement of the instance literal (subsumption resolution only).
  complementary: bool,
}

#[derive(Default)]
pub struct SubsumptionSolver {
  subst: RobSubstitution,
}

impl SubsumptionSolver {
  pub fn new() -> Self {
    Self::default()
  }

  /// Is there a substitution σ with `base σ` a sub-multiset of `instance`?
  pub fn subsumes(&mut self, store: &TermStore, base: &[LiteralId], instance: &[LiteralId]) -> bool {
    if base.len() > instance.len() {
      return false;
    }
    self.subst.clear();
    let candidates = self.collect_candidates(store, base, instance, false);
    if candidates.iter().any(|c| c.is_empty()) {
      return false;
    }
    let mut used = vec![false; instance.len()];
    self.search(store, base, instance, &candidates, 0, &mut used, &mut None)
  }

  /// Subsumption resolution: find the literal of `instance` that can be cut because `base σ`
  /// fits into `instance` with that one literal taken complemented. Returns its index.
  pub fn subsumption_resolution(
    &mut self,
    store: &TermStore,
    base: &[LiteralId],
    instance: &[LiteralId],
  ) -> Option<usize> {
    self.subst.clear();
    let candidates = self.collect_candidates(store, base, instance, true);
    if candidates.iter().any(|c| c.is_empty()) {
      return None;
    }
    // At least one complementary match must exist at all for the rule to apply.
    if candidates.iter().all(|c| c.iter().all(|cand| !cand.complementary)) {
      return None;
    }
    let mut used = vec![false; instance.len()];
    let mut resolved = None;
    if self.search(store, base, instance, &candidates, 0, &mut used, &mut resolved) {
      resolved
    } else {
      None
    }
  }

  fn collect_candidates(
    &self,
    store: &TermStore,
    base: &[LiteralId],
    instance: &[LiteralId],
    with_complements: bool,
  ) -> Vec<Vec<Candidate>> {
    base.iter()
        .map(|&b| {
          let b_lit = store.literal(b);
          let mut row = Vec::new();
          for (j, &i) in instance.iter().enumerate() {
            let i_lit = store.literal(i);
            if b_lit.predicate != i_lit.predicate {
              continue;
            }
            let orientations: &[bool] = if b_lit.is_commutative() { &[false, true] } else { &[false] };
            for &swap in orientations {
              if b_lit.polarity == i_lit.polarity {
                row.push(Candidate { instance: j, swap, complementary: false });
              } else if with_complements {
                row.push(Candidate { instance: j, swap, complementary: true });
              }
            }
          }
          row
        })
        .collect()
  }

  fn search(
    &mut self,
    store: &TermStore,
    base: &[LiteralId],
    instance: &[LiteralId],
    candidates: &[Vec<Candidate>],
    depth: usize,
    used: &mut Vec<bool>,
    resolved: &mut Option<usize>,
  ) -> bool {
    if depth == base.len() {
      // In the resolution variant a model only counts once some literal is actually resolved.
      return resolved.is_some() || !candidates.iter().flatten().any(|c| c.complementary);
    }

    for &candidate in candidates[depth].iter() {
      if candidate.complementary {
        // All complementary matches must aim at one single instance literal.
        if resolved.map_or(false, |r| r != candidate.instance) {
          continue;
        }
      } else if used[candidate.instance] || *resolved == Some(candidate.instance) {
        continue;
      }

      let mark = self.subst.mark();
      if self.decide(store, base[depth], instance[candidate.instance], candidate.swap) {
        let previous_resolved = *resolved;
        if candidate.complementary {
          *resolved = Some(candidate.instance);
        } else {
          used[candidate.instance] = true;
        }

        if self.search(store, base, instance, candidates, depth + 1, used, resolved) {
          return true;
        }

        // Conflict below: undo the decision.
        if candidate.complementary {
          *resolved = previous_resolved;
        } else {
          used[candidate.instance] = false;
        }
      }
      self.subst.rollback(mark);
    }
    false
  }

  /// Propagates one decision: match the base literal's arguments (possibly swapped) onto the
  /// instance literal's.
  fn decide(&mut self, store: &TermStore, base: LiteralId, instance: LiteralId, swap: bool) -> bool {
    let base_args: Vec<TermId> = store.literal(base).args.to_vec();
    let mut instance_args: Vec<TermId> = store.literal(instance).args.to_vec();
    if swap {
      instance_args.reverse();
    }
    debug_assert_eq!(base_args.len(), instance_args.len());

    let mark = self.subst.mark();
    for (&b, &i) in base_args.iter().zip(instance_args.iter()) {
      if !self.subst.match_terms(store, b, BankIndex::RESULT, i, BankIndex::QUERY) {
        self.subst.rollback(mark);
        return false;
      }
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::symbol::Signature;
  use crate::core::term::TermBuilder;
  use sable_abs::IString;

  fn setup() -> (Signature, TermStore) {
    let signature = Signature::new();
    (signature, TermStore::new())
  }

  #[test]
  fn multiset_subsumption_with_shared_variable() {
    // { p(X0), q(X0) } subsumes { p(a), q(a), r(b) } via X0 ↦ a.
    let (mut signature, mut store) = setup();
    let sort = signature.default_sort();
    let p = signature.add_predicate(IString::from("p"), &[sort]);
    let q = signature.add_predicate(IString::from("q"), &[sort]);
    let r = signature.add_predicate(IString::from("r"), &[sort]);
    let a = signature.add_constant(IString::from("a"), sort);
    let b = signature.add_constant(IString::from("b"), sort);

    let x  = store.share(&TermBuilder::var(0));
    let ca = store.mk_function(a, &[]);
    let cb = store.mk_function(b, &[]);

    let px = store.mk_literal(p, true, &[x], None);
    let qx = store.mk_literal(q, true, &[x], None);
    let pa = store.mk_literal(p, true, &[ca], None);
    let qa = store.mk_literal(q, true, &[ca], None);
    let rb = store.mk_literal(r, true, &[cb], None);

    let mut solver = SubsumptionSolver::new();
    assert!(solver.subsumes(&store, &[px, qx], &[pa, qa, rb]));

    // { p(X0), q(b) } does not: X0 ↦ a forces q(a), and q(b) has no target.
    let qb = store.mk_literal(q, true, &[cb], None);
    assert!(!solver.subsumes(&store, &[px, qb], &[pa, qa, rb]));
  }

  #[test]
  fn multiset_discipline_blocks_double_use() {
    // { p(X0), p(X1) } must not subsume { p(a) }: two base literals, one target.
    let (mut signature, mut store) = setup();
    let sort = signature.default_sort();
    let p = signature.add_predicate(IString::from("p"), &[sort]);
    let a = signature.add_constant(IString::from("a"), sort);

    let x0 = store.share(&TermBuilder::var(0));
    let x1 = store.share(&TermBuilder::var(1));
    let ca = store.mk_function(a, &[]);

    let px0 = store.mk_literal(p, true, &[x0], None);
    let px1 = store.mk_literal(p, true, &[x1], None);
    let pa  = store.mk_literal(p, true, &[ca], None);

    let mut solver = SubsumptionSolver::new();
    assert!(!solver.subsumes(&store, &[px0, px1], &[pa]));
  }

  #[test]
  fn equality_orientation_is_searched() {
    // { a = X0 } subsumes { b = a } with the swapped orientation, X0 ↦ b.
    let (mut signature, mut store) = setup();
    let sort = signature.default_sort();
    let a = signature.add_constant(IString::from("a"), sort);
    let b = signature.add_constant(IString::from("b"), sort);

    let x  = store.share(&TermBuilder::var(0));
    let ca = store.mk_function(a, &[]);
    let cb = store.mk_function(b, &[]);

    let base     = store.mk_equality(true, ca, x, None);
    let instance = store.mk_equality(true, cb, ca, None);

    let mut solver = SubsumptionSolver::new();
    assert!(solver.subsumes(&store, &[base], &[instance]));
  }

  #[test]
  fn subsumption_resolution_identifies_the_cut_literal() {
    // { p(X0), q(X0) } against { ~p(a), q(a), r(a) }: p(X0) matches the complement of ~p(a),
    // q(X0) matches q(a); the first literal is resolved away.
    let (mut signature, mut store) = setup();
    let sort = signature.default_sort();
    let p = signature.add_predicate(IString::from("p"), &[sort]);
    let q = signature.add_predicate(IString::from("q"), &[sort]);
    let r = signature.add_predicate(IString::from("r"), &[sort]);
    let a = signature.add_constant(IString::from("a"), sort);

    let x  = store.share(&TermBuilder::var(0));
    let ca = store.mk_function(a, &[]);

    let px  = store.mk_literal(p, true, &[x], None);
    let qx  = store.mk_literal(q, true, &[x], None);
    let npa = store.mk_literal(p, false, &[ca], None);
    let qa  = store.mk_literal(q, true, &[ca], None);
    let ra  = store.mk_literal(r, true, &[ca], None);

    let mut solver = SubsumptionSolver::new();
    assert_eq!(solver.subsumption_resolution(&store, &[px, qx], &[npa, qa, ra]), Some(0));
    assert_eq!(solver.subsumption_resolution(&store, &[px, qx], &[qa, ra]), None);
  }
}
