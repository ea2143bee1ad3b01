/*!

Literal selection. When a clause is activated, a selection function picks the literals that may
participate in generating inferences; they are moved to the front of the literal array and the
clause's selected count is set. Selection ids follow the option table:

- `0`: select everything;
- `1`: select all maximal literals under the simplification ordering;
- `2`: select one best negative literal (lightest first) if there is one, else all maximal;
- `3`: select the unique maximal literal if it exists, else fall back to `2`.

Every selection is *complete* in the sense required by the saturation loop: at least one literal
is always selected.

*/

use crate::core::clause::Clause;
use crate::core::literal::LiteralId;
use crate::core::ordering::{OrderingResult, SimplificationOrdering};
use crate::core::term::TermStore;

pub fn select_literals(
  store: &TermStore,
  ordering: &dyn SimplificationOrdering,
  selection: u32,
  clause: &mut Clause,
) {
  if clause.is_empty() {
    clause.selected = 0;
    return;
  }

  let chosen: Vec<LiteralId> = match selection {
    0 => clause.literals.to_vec(),
    1 => maximal_literals(store, ordering, &clause.literals),
    2 => best_negative(store, &clause.literals)
        .map(|l| vec![l])
        .unwrap_or_else(|| maximal_literals(store, ordering, &clause.literals)),
    _ => {
      let maximal = maximal_literals(store, ordering, &clause.literals);
      if maximal.len() == 1 {
        maximal
      } else {
        best_negative(store, &clause.literals)
            .map(|l| vec![l])
            .unwrap_or(maximal)
      }
    }
  };

  reorder_selected(clause, &chosen);
  clause.selected = chosen.len() as u32;
}

/// Literals that no other literal of the clause strictly dominates.
fn maximal_literals(
  store: &TermStore,
  ordering: &dyn SimplificationOrdering,
  literals: &[LiteralId],
) -> Vec<LiteralId> {
  let mut result = Vec::new();
  'outer: for (i, &candidate) in literals.iter().enumerate() {
    for (j, &other) in literals.iter().enumerate() {
      if i == j {
        continue;
      }
      if ordering.compare_literals(store, other, candidate) == OrderingResult::Greater {
        continue 'outer;
      }
      // A duplicate literal is kept only once, at its first position.
      if j < i && other == candidate {
        continue 'outer;
      }
    }
    result.push(candidate);
  }
  debug_assert!(!result.is_empty(), "no maximal literal");
  result
}

fn best_negative(store: &TermStore, literals: &[LiteralId]) -> Option<LiteralId> {
  literals
      .iter()
      .copied()
      .filter(|&l| store.literal(l).is_negative())
      .min_by_key(|&l| (store.literal(l).weight, l))
}

fn reorder_selected(clause: &mut Clause, chosen: &[LiteralId]) {
  let mut reordered = Vec::with_capacity(clause.literals.len());
  let mut rest      = Vec::new();
  let mut remaining = chosen.to_vec();
  for &literal in clause.literals.iter() {
    if let Some(at) = remaining.iter().position(|&c| c == literal) {
      remaining.swap_remove(at);
      reordered.push(literal);
    } else {
      rest.push(literal);
    }
  }
  reordered.extend(rest);
  clause.literals = reordered.into();
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::clause::ClauseArena;
  use crate::core::inference::Inference;
  use crate::core::ordering::KnuthBendixOrdering;
  use crate::core::symbol::Signature;
  use crate::core::term::TermBuilder;
  use sable_abs::{rc_cell, IString};

  #[test]
  fn negative_selection_prefers_light_literals() {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    let p = signature.add_predicate(IString::from("p"), &[sort]);
    let q = signature.add_predicate(IString::from("q"), &[sort]);
    let f = signature.add_function(IString::from("f"), &[sort], sort);
    let a = signature.add_constant(IString::from("a"), sort);

    let mut store = TermStore::new();
    let ca  = store.share(&TermBuilder::constant(a));
    let fa  = store.mk_function(f, &[ca]);
    let light = store.mk_literal(p, false, &[ca], None);
    let heavy = store.mk_literal(q, false, &[fa], None);
    let positive = store.mk_literal(p, true, &[ca], None);

    let mut arena = ClauseArena::new();
    let id = arena.create(&store, &[positive, heavy, light], Inference::input(), 0);

    let ordering = KnuthBendixOrdering::new(rc_cell(signature));
    select_literals(&store, &ordering, 2, arena.get_mut(id));

    let clause = arena.get(id);
    assert_eq!(clause.selected, 1);
    assert_eq!(clause.literals[0], light);
    assert_eq!(clause.len(), 3);
  }

  #[test]
  fn some_literal_is_always_selected() {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    let p = signature.add_predicate(IString::from("p"), &[sort]);
    let a = signature.add_constant(IString::from("a"), sort);

    let mut store = TermStore::new();
    let ca = store.share(&TermBuilder::constant(a));
    let lit = store.mk_literal(p, true, &[ca], None);

    let mut arena = ClauseArena::new();
    let id = arena.create(&store, &[lit], Inference::input(), 0);

    let ordering = KnuthBendixOrdering::new(rc_cell(signature));
    for selection in [0u32, 1, 2, 3] {
      select_literals(&store, &ordering, selection, arena.get_mut(id));
      assert!(arena.get(id).selected >= 1);
    }
  }
}
