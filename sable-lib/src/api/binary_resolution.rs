/*!

Binary resolution: a selected literal of the given clause is unified with a complementary
selected literal of an Active clause; the conclusion is the union of the two remaining literal
arrays under the unifier. Equality literals are left to the superposition machinery.

*/

use sable_abs::RcCell;

use crate::api::{assemble_conclusion, GeneratingInferenceEngine};
use crate::core::clause::ClauseId;
use crate::core::context::RunContext;
use crate::core::indexing::{AnyIndex, IndexManager, IndexType, RetrievalMode};
use crate::core::inference::InferenceRule;
use crate::core::literal::LiteralId;
use crate::core::saturation::limits::LimitReached;
use crate::core::substitution::BankIndex;

#[derive(Default)]
pub struct BinaryResolution {
  index: Option<RcCell<AnyIndex>>,
}

impl BinaryResolution {
  pub fn new() -> Self {
    Self::default()
  }
}

impl GeneratingInferenceEngine for BinaryResolution {
  fn attach(&mut self, _ctx: &RunContext, indices: &mut IndexManager) {
    self.index = Some(indices.request(IndexType::BinaryResolutionSubstTree));
  }

  fn detach(&mut self, indices: &mut IndexManager) {
    self.index = None;
    indices.release(IndexType::BinaryResolutionSubstTree);
  }

  fn generate_clauses(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<Vec<ClauseId>, LimitReached> {
    let index = self.index.as_ref().expect("engine not attached").clone();

    let selected: Vec<LiteralId> = {
      let store = ctx.terms.borrow();
      let arena = ctx.clauses.borrow();
      arena
          .get(premise)
          .selected_literals()
          .iter()
          .copied()
          .filter(|&l| !store.literal(l).is_equality())
          .collect()
    };

    let mut conclusions: Vec<(Vec<LiteralId>, ClauseId)> = Vec::new();
    for literal in selected {
      ctx.check_limits(0)?;

      let index_ref = index.borrow();
      let literal_index = index_ref.literals();
      let store = &mut *ctx.terms.borrow_mut();
      let Some(mut cursor) = literal_index.query_complement(store, literal, RetrievalMode::Unifications)
      else {
        continue;
      };

      while let Some(entry) = cursor.next(store) {
        let side_literals: Vec<LiteralId> = {
          let arena = ctx.clauses.borrow();
          arena.get(entry.clause).literals.to_vec()
        };
        let premise_literals: Vec<LiteralId> = {
          let arena = ctx.clauses.borrow();
          arena.get(premise).literals.to_vec()
        };

        let subst = cursor.substitution_mut();
        let mut literals = Vec::with_capacity(premise_literals.len() + side_literals.len() - 2);
        for &l in premise_literals.iter() {
          if l != literal {
            literals.push(subst.apply_literal(store, l, BankIndex::QUERY));
          }
        }
        for &l in side_literals.iter() {
          if l != entry.literal {
            literals.push(subst.apply_literal(store, l, BankIndex::RESULT));
          }
        }
        conclusions.push((literals, entry.clause));
      }
    }

    let mut derived = Vec::new();
    for (literals, side_clause) in conclusions {
      let Some(literals) = assemble_conclusion(&ctx.terms.borrow(), literals) else {
        continue;
      };
      derived.push(ctx.derive_clause(
        InferenceRule::BinaryResolution,
        &[premise, side_clause],
        &literals,
      ));
      ctx.statistics.borrow_mut().resolutions += 1;
    }
    Ok(derived)
  }
}
