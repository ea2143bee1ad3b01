/*!

Factoring: two selected literals of the same polarity in the given clause are unified; the
conclusion keeps one of them and the remaining literals under the unifier.

*/

use crate::api::{assemble_conclusion, GeneratingInferenceEngine};
use crate::core::clause::ClauseId;
use crate::core::context::RunContext;
use crate::core::indexing::IndexManager;
use crate::core::inference::InferenceRule;
use crate::core::literal::LiteralId;
use crate::core::saturation::limits::LimitReached;
use crate::core::substitution::{BankIndex, RobSubstitution};

#[derive(Default)]
pub struct Factoring;

impl Factoring {
  pub fn new() -> Self {
    Self::default()
  }
}

impl GeneratingInferenceEngine for Factoring {
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

    let mut derived = Vec::new();
    let mut conclusions: Vec<Vec<LiteralId>> = Vec::new();
    {
      let store = &mut *ctx.terms.borrow_mut();
      for (i, &first) in selected.iter().enumerate() {
        for &second in all.iter() {
          if second == first {
            continue;
          }
          // Avoid producing the same factor twice when both literals are selected.
          if selected[..i].contains(&second) {
            continue;
          }
          let (p1, pol1) = {
            let shared = store.literal(first);
            (shared.predicate, shared.polarity)
          };
          let (p2, pol2) = {
            let shared = store.literal(second);
            (shared.predicate, shared.polarity)
          };
          if p1 != p2 || pol1 != pol2 {
            continue;
          }

          let mut subst = RobSubstitution::new();
          if !subst.unify_literal_arguments(store, first, BankIndex::QUERY, second, BankIndex::QUERY) {
            continue;
          }

          let literals: Vec<LiteralId> = all
              .iter()
              .filter(|&&l| l != second)
              .map(|&l| subst.apply_literal(store, l, BankIndex::QUERY))
              .collect();
          conclusions.push(literals);
        }
      }
    }

    for literals in conclusions {
      let Some(literals) = assemble_conclusion(&ctx.terms.borrow(), literals) else {
        continue;
      };
      derived.push(ctx.derive_clause(InferenceRule::Factoring, &[premise], &literals));
      ctx.statistics.borrow_mut().factorings += 1;
    }
    Ok(derived)
  }
}
