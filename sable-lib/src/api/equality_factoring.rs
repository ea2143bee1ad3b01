/*!

Equality factoring: from two positive equalities `s = t` and `u = v` in the given clause whose
left-hand sides unify, derive `t != v ∨ s = v` together with the remaining literals under the
unifier. The side condition keeps the rule from factoring into the smaller side of an oriented
equation: the factored side must not be ordering-smaller than its partner after instantiation.

*/

use crate::api::{assemble_conclusion, GeneratingInferenceEngine};
use crate::core::clause::ClauseId;
use crate::core::context::RunContext;
use crate::core::indexing::IndexManager;
use crate::core::inference::InferenceRule;
use crate::core::literal::LiteralId;
use crate::core::ordering::OrderingResult;
use crate::core::saturation::limits::LimitReached;
use crate::core::substitution::{BankIndex, RobSubstitution};
use crate::core::term::TermId;

#[derive(Default)]
pub struct EqualityFactoring;

impl EqualityFactoring {
  pub fn new() -> Self {
    Self::default()
  }
}

impl GeneratingInferenceEngine for EqualityFactoring {
  fn attach(&mut self, _ctx: &RunContext, _indices: &mut IndexManager) {}

  fn detach(&mut self, _indices: &mut IndexManager) {}

  fn generate_clauses(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<Vec<ClauseId>, LimitReached> {
    let (selected, all): (Vec<LiteralId>, Vec<LiteralId>) = {
      let arena = ctx.clauses.borrow();
      let clause = arena.get(premise);
      (clause.selected_literals().to_vec(), clause.literals.to_vec())
    };
    if all.len() < 2 {
      return Ok(Vec::new());
    }
    ctx.check_limits(0)?;

    // Both orientations of both equalities are candidates for the unified side.
    let sides = |store: &crate::core::term::TermStore, l: LiteralId| -> Vec<(TermId, TermId)> {
      let shared = store.literal(l);
      if shared.is_equality() && shared.is_positive() {
        vec![
          (shared.args[0], shared.args[1]),
          (shared.args[1], shared.args[0]),
        ]
      } else {
        Vec::new()
      }
    };

    let mut conclusions: Vec<Vec<LiteralId>> = Vec::new();
    {
      let store = &mut *ctx.terms.borrow_mut();
      for &first in selected.iter() {
        for &second in all.iter() {
          if first == second {
            continue;
          }
          for (s, t) in sides(store, first) {
            for (u, v) in sides(store, second) {
              let mut subst = RobSubstitution::new();
              if !subst.unify(store, s, BankIndex::QUERY, u, BankIndex::QUERY) {
                continue;
              }

              // s must still be able to top its equation after instantiation.
              let s_image = subst.apply_term(store, s, BankIndex::QUERY);
              let t_image = subst.apply_term(store, t, BankIndex::QUERY);
              if matches!(
                ctx.ordering.compare(store, s_image, t_image),
                OrderingResult::Less | OrderingResult::Equal
              ) {
                continue;
              }

              let v_image = subst.apply_term(store, v, BankIndex::QUERY);
              // Sort for the case where both factored sides come out as variables.
              let eq_sort = {
                let signature = ctx.signature.borrow();
                store
                    .sort_of(&signature, t_image)
                    .or_else(|| store.sort_of(&signature, v_image))
                    .or_else(|| store.literal(first).eq_sort)
                    .or_else(|| store.literal(second).eq_sort)
                    .or(Some(signature.default_sort()))
              };
              let mut literals = Vec::with_capacity(all.len());
              literals.push(store.mk_equality(false, t_image, v_image, eq_sort));
              literals.push(store.mk_equality(true, s_image, v_image, eq_sort));
              for &l in all.iter() {
                if l != first && l != second {
                  literals.push(subst.apply_literal(store, l, BankIndex::QUERY));
                }
              }
              conclusions.push(literals);
            }
          }
        }
      }
    }

    let mut derived = Vec::new();
    for literals in conclusions {
      let Some(literals) = assemble_conclusion(&ctx.terms.borrow(), literals) else {
        continue;
      };
      derived.push(ctx.derive_clause(InferenceRule::EqualityFactoring, &[premise], &literals));
      ctx.statistics.borrow_mut().equality_factorings += 1;
    }
    Ok(derived)
  }
}
