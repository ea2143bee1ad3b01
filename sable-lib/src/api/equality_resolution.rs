/*!

Equality resolution: a selected negative equality whose sides unify is removed; the conclusion is
the remaining literal array under the unifier.

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
pub struct EqualityResolution;

impl EqualityResolution {
  pub fn new() -> Self {
    Self::default()
  }
}

impl GeneratingInferenceEngine for EqualityResolution {
  fn attach(&mut self, _ctx: &RunContext, _indices: &mut IndexManager) {}

  fn detach(&mut self, _indices: &mut IndexManager) {}

  fn generate_clauses(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<Vec<ClauseId>, LimitReached> {
    let (selected, all): (Vec<LiteralId>, Vec<LiteralId>) = {
      let arena = ctx.clauses.borrow();
      let clause = arena.get(premise);
      (clause.selected_literals().to_vec(), clause.literals.to_vec())
    };
    ctx.check_limits(0)?;

    let mut conclusions: Vec<Vec<LiteralId>> = Vec::new();
    {
      let store = &mut *ctx.terms.borrow_mut();
      for &literal in selected.iter() {
        let (is_candidate, lhs, rhs) = {
          let shared = store.literal(literal);
          (
            shared.is_equality() && shared.is_negative(),
            shared.args.first().copied(),
            shared.args.get(1).copied(),
          )
        };
        if !is_candidate {
          continue;
        }
        let (lhs, rhs) = (lhs.unwrap(), rhs.unwrap());

        let mut subst = RobSubstitution::new();
        if !subst.unify(store, lhs, BankIndex::QUERY, rhs, BankIndex::QUERY) {
          continue;
        }

        let literals: Vec<LiteralId> = all
            .iter()
            .filter(|&&l| l != literal)
            .map(|&l| subst.apply_literal(store, l, BankIndex::QUERY))
            .collect();
        conclusions.push(literals);
      }
    }

    let mut derived = Vec::new();
    for literals in conclusions {
      let Some(literals) = assemble_conclusion(&ctx.terms.borrow(), literals) else {
        continue;
      };
      derived.push(ctx.derive_clause(InferenceRule::EqualityResolution, &[premise], &literals));
      ctx.statistics.borrow_mut().equality_resolutions += 1;
    }
    Ok(derived)
  }
}
