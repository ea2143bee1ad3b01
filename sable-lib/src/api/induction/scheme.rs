/*!

Induction schema instantiation.

Both schema families produce clauses in the resolved form: the axiom's conclusion literal is cut
against the premise immediately, so every emitted clause is the union of one selection of case
literals with the premise's remaining literals.

Structural induction over an inductive sort with constructors `c1 … cn` Skolemises one constant
per constructor argument, builds per-constructor case conjunctions (hypotheses for the recursive
arguments, the negated case conclusion), and distributes the disjunction of conjunctions into
CNF: a cross product, capped to keep pathological constructor sets from exploding.

Integer induction instantiates the upward or downward schema from a bound literal `¬(t < b)`
(resp. `¬(b < t)`): base clause at `b`, a Skolem `k` for the step, guard `¬(k < b)` (resp.
`¬(b < k)`), hypothesis at `k`, and the negated step at `k ± 1`; the finite interval adds the
second bound's guard.

*/

use sable_abs::{NatSet, SmallVec};

use crate::core::clause::{ClauseId, InductionInfo};
use crate::core::context::RunContext;
use crate::core::inference::InferenceRule;
use crate::core::literal::LiteralId;
use crate::core::symbol::SymbolIndex;
use crate::core::term::{TermId, TermStore, VariableIndex};

/// Bound on the CNF cross product of one structural schema.
const MAX_CASE_PRODUCT: usize = 64;

/// Replaces occurrences of `from` (all, or the selected subset counted preorder across the
/// argument list) inside a literal.
fn replace_in_literal(
  store: &mut TermStore,
  literal: LiteralId,
  from: TermId,
  to: TermId,
  occurrences: Option<&NatSet>,
) -> LiteralId {
  let shared = store.literal(literal);
  let (predicate, polarity, eq_sort) = (shared.predicate, shared.polarity, shared.eq_sort);
  let args: Vec<TermId> = shared.args.to_vec();

  let mut counter = 0usize;
  let new_args: Vec<TermId> = args
      .iter()
      .map(|&arg| match occurrences {
        None => store.replace_all(arg, from, to),
        Some(selected) => store.replace_selected(arg, from, to, selected, &mut counter),
      })
      .collect();
  let eq_sort = if new_args.iter().all(|&a| store.term(a).is_variable()) {
    eq_sort.or(Some(crate::core::sort::SortId(0)))
  } else {
    None
  };
  store.mk_literal(predicate, polarity, &new_args, eq_sort)
}

/// Universally quantifies the other Skolem constants of a hypothesis literal by replacing them
/// with fresh variables (`induction_strengthen_hypothesis`).
fn strengthen_hypothesis(
  ctx: &RunContext,
  store: &mut TermStore,
  literal: LiteralId,
  induction_term: TermId,
) -> LiteralId {
  let skolems: Vec<TermId> = {
    let signature = ctx.signature.borrow();
    let shared = store.literal(literal);
    let args: Vec<TermId> = shared.args.to_vec();
    let mut result = Vec::new();
    for arg in args {
      for (subterm, _) in store.subterms(arg) {
        if subterm == induction_term || result.contains(&subterm) {
          continue;
        }
        if let Some(symbol) = store.term(subterm).symbol() {
          let function = signature.function(symbol);
          if function.is_skolem() && function.arity() == 0 {
            result.push(subterm);
          }
        }
      }
    }
    result
  };

  let mut current = literal;
  for (i, skolem) in skolems.into_iter().enumerate() {
    // Variable indices above any the (ground) literal could contain.
    let fresh = store.mk_variable(VariableIndex(1 + i as u32));
    current = replace_in_literal(store, current, skolem, fresh, None);
  }
  current
}

/// Emits the clauses of one structural schema; `None` when the schema is inapplicable or too
/// large. The caller has already checked readiness and vacuousness.
pub fn structural_induction_clauses(
  ctx: &RunContext,
  premise: ClauseId,
  literal: LiteralId,
  term: TermId,
  occurrences: Option<&NatSet>,
) -> Option<Vec<ClauseId>> {
  let constructors: Vec<(SymbolIndex, SmallVec<[crate::core::sort::SortId; 4]>)> = {
    let store = ctx.terms.borrow();
    let signature = ctx.signature.borrow();
    let sort = store.sort_of(&signature, term)?;
    let sort_entry = signature.sort(sort);
    if !sort_entry.is_inductive() {
      return None;
    }
    sort_entry
        .constructors
        .iter()
        .map(|&c| (c, signature.function(c).arg_sorts.clone()))
        .collect()
  };
  let term_sort = {
    let store = ctx.terms.borrow();
    let signature = ctx.signature.borrow();
    store.sort_of(&signature, term)?
  };

  let rest: Vec<LiteralId> = {
    let arena = ctx.clauses.borrow();
    arena.get(premise).literals.iter().copied().filter(|&l| l != literal).collect()
  };

  // Per-constructor case conjunctions.
  let mut cases: Vec<Vec<LiteralId>> = Vec::new();
  let mut hypothesis_literals: Vec<LiteralId> = Vec::new();
  {
    let store = &mut *ctx.terms.borrow_mut();
    let goal = store.complement(literal);

    for (constructor, arg_sorts) in constructors {
      let mut skolem_args: Vec<TermId> = Vec::new();
      for &arg_sort in arg_sorts.iter() {
        let skolem = ctx.signature.borrow_mut().fresh_skolem_function(&[], arg_sort);
        skolem_args.push(store.mk_function(skolem, &[]));
      }
      let case_term = store.mk_function(constructor, &skolem_args);

      let mut conjunction: Vec<LiteralId> = Vec::new();
      for (i, &arg_sort) in arg_sorts.iter().enumerate() {
        if arg_sort == term_sort {
          // Hypothesis at the recursive argument's Skolem.
          let mut hypothesis =
              replace_in_literal(store, goal, term, skolem_args[i], occurrences);
          if ctx.options.induction_strengthen_hypothesis {
            hypothesis = strengthen_hypothesis(ctx, store, hypothesis, skolem_args[i]);
          }
          hypothesis_literals.push(hypothesis);
          conjunction.push(hypothesis);
        }
      }
      // The negated case conclusion is the premise literal at the constructor term.
      conjunction.push(replace_in_literal(store, literal, term, case_term, occurrences));
      cases.push(conjunction);
    }
  }

  let product: usize = cases.iter().map(|c| c.len()).product();
  if product == 0 || product > MAX_CASE_PRODUCT {
    return None;
  }

  // Distribute the disjunction of conjunctions: one clause per selection.
  let mut selections: Vec<Vec<LiteralId>> = vec![Vec::new()];
  for case in &cases {
    let mut next = Vec::with_capacity(selections.len() * case.len());
    for selection in &selections {
      for &pick in case {
        let mut extended = selection.clone();
        extended.push(pick);
        next.push(extended);
      }
    }
    selections = next;
  }

  let mut derived = Vec::new();
  for mut literals in selections {
    literals.extend(rest.iter().copied());
    let id = ctx.derive_clause(InferenceRule::StructuralInduction, &[premise], &literals);
    let hypothesis = literals.iter().any(|l| hypothesis_literals.contains(l));
    ctx.clauses.borrow_mut().get_mut(id).extras_mut().induction = Some(InductionInfo {
      hypothesis,
      induction_term: Some(term),
    });
    derived.push(id);
  }
  ctx.statistics.borrow_mut().structural_induction_applications += 1;
  Some(derived)
}

/// Emits the clauses of one integer schema driven by the bound literal of `bound_clause`;
/// `upward` distinguishes `¬(t < b)` from `¬(b < t)` bounds. `second_bound` closes the interval
/// for the finite variants.
pub fn integer_induction_clauses(
  ctx: &RunContext,
  premise: ClauseId,
  literal: LiteralId,
  term: TermId,
  bound_clause: ClauseId,
  bound_term: TermId,
  upward: bool,
  second_bound: Option<TermId>,
) -> Option<Vec<ClauseId>> {
  let rest: Vec<LiteralId> = {
    let arena = ctx.clauses.borrow();
    arena.get(premise).literals.iter().copied().filter(|&l| l != literal).collect()
  };

  let mut literal_sets: Vec<Vec<LiteralId>> = Vec::new();
  {
    let store = &mut *ctx.terms.borrow_mut();
    let (less, step_term, skolem_term) = {
      let mut signature = ctx.signature.borrow_mut();
      let int = signature.integer_sort();
      let less = signature.integer_less();
      let sum  = signature.integer_sum();
      let step_numeral = if upward {
        signature.numeral(sable_abs::numeric::int_one())
      } else {
        signature.numeral(-sable_abs::numeric::int_one())
      };
      let skolem = signature.fresh_skolem_function(&[], int);
      drop(signature);

      let skolem_term = store.mk_function(skolem, &[]);
      let step_value  = store.mk_function(step_numeral, &[]);
      let step_term   = store.mk_function(sum, &[skolem_term, step_value]);
      (less, step_term, skolem_term)
    };

    let goal = store.complement(literal);
    // Base case at the bound: the negated goal instance.
    let negated_base = replace_in_literal(store, literal, term, bound_term, None);
    // Guard keeping the step Skolem inside the interval.
    let guard = if upward {
      store.mk_literal(less, false, &[skolem_term, bound_term], None)
    } else {
      store.mk_literal(less, false, &[bound_term, skolem_term], None)
    };
    let hypothesis = replace_in_literal(store, goal, term, skolem_term, None);
    let negated_step = replace_in_literal(store, literal, term, step_term, None);

    literal_sets.push(vec![negated_base, guard]);
    literal_sets.push(vec![negated_base, hypothesis]);
    literal_sets.push(vec![negated_base, negated_step]);
    if let Some(upper) = second_bound {
      // Finite interval: the step Skolem also stays below (resp. above) the far bound.
      let far_guard = if upward {
        store.mk_literal(less, true, &[skolem_term, upper], None)
      } else {
        store.mk_literal(less, true, &[upper, skolem_term], None)
      };
      literal_sets.push(vec![negated_base, far_guard]);
    }
  }

  let bound_rest: Vec<LiteralId> = {
    let arena = ctx.clauses.borrow();
    arena
        .get(bound_clause)
        .literals
        .iter()
        .copied()
        .filter(|&l| {
          let store = ctx.terms.borrow();
          let shared = store.literal(l);
          !(shared.args.len() == 2 && (shared.args[0] == term || shared.args[1] == term))
        })
        .collect()
  };

  let mut derived = Vec::new();
  for mut literals in literal_sets {
    literals.extend(rest.iter().copied());
    literals.extend(bound_rest.iter().copied());
    let id = ctx.derive_clause(
      InferenceRule::IntegerInduction,
      &[premise, bound_clause],
      &literals,
    );
    ctx.clauses.borrow_mut().get_mut(id).extras_mut().induction = Some(InductionInfo {
      hypothesis: false,
      induction_term: Some(term),
    });
    derived.push(id);
  }
  ctx.statistics.borrow_mut().integer_induction_applications += 1;
  Some(derived)
}

/// Enumerates the occurrence subsets for the generalisation variants: every non-empty subset of
/// the occurrences of `term` in `literal`, capped at four occurrences. Without `induction_gen`
/// only the full set (replace everywhere) is inducted on.
pub fn occurrence_subsets(
  ctx: &RunContext,
  literal: LiteralId,
  term: TermId,
) -> Vec<Option<NatSet>> {
  if !ctx.options.induction_gen {
    return vec![None];
  }
  let count = {
    let store = ctx.terms.borrow();
    let shared = store.literal(literal);
    shared
        .args
        .iter()
        .map(|&arg| store.count_occurrences(arg, term))
        .sum::<u32>()
  } as usize;
  if count == 0 || count > 4 {
    return vec![None];
  }

  let mut subsets = Vec::new();
  for mask in 1u32..(1 << count) {
    let subset: NatSet = (0..count).filter(|&i| mask & (1 << i) != 0).collect();
    subsets.push(Some(subset));
  }
  subsets
}
