/*!

Induction hypothesis rewriting: the one preserved mechanism of the experimental
hypothesis/goal-rewriting family.

An equational induction hypothesis sits in Active as a positive equality inside a hypothesis
clause. The rule rewrites induction literals of the given goal clause with such equalities, in
either direction (a hypothesis often needs to be applied against the ordering to line up the
goal with the step case), producing new goals with an incremented rewrite-depth bound. When
the rewrite happens to be reductive the premise goal is redundant and reported as such through
the simplifying-generating interface.

*/

use sable_abs::RcCell;

use crate::api::{rewrite_literal, SgiResult, SimplifyingGeneratingInference};
use crate::core::clause::{ClauseId, ClauseStore, InductionInfo};
use crate::core::context::RunContext;
use crate::core::indexing::{AnyIndex, IndexManager, IndexType, RetrievalMode};
use crate::core::inference::InferenceRule;
use crate::core::literal::LiteralId;
use crate::core::ordering::OrderingResult;
use crate::core::saturation::limits::LimitReached;
use crate::core::substitution::BankIndex;
use crate::core::term::TermId;

/// How many hypothesis-rewriting steps a clause may accumulate.
const REWRITE_BOUND_LIMIT: u32 = 8;

#[derive(Default)]
pub struct InductionHypothesisRewriting {
  lhs_index: Option<RcCell<AnyIndex>>,
}

impl InductionHypothesisRewriting {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SimplifyingGeneratingInference for InductionHypothesisRewriting {
  fn attach(&mut self, _ctx: &RunContext, indices: &mut IndexManager) {
    self.lhs_index = Some(indices.request(IndexType::SuperpositionLhsSubstTree));
  }

  fn detach(&mut self, indices: &mut IndexManager) {
    self.lhs_index = None;
    indices.release(IndexType::SuperpositionLhsSubstTree);
  }

  fn generate_and_simplify(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<SgiResult, LimitReached> {
    let mut result = SgiResult {
      clauses          : Vec::new(),
      premise_redundant: false,
    };
    if !ctx.options.induction.enabled() {
      return Ok(result);
    }

    let (eligible, bound) = {
      let store = ctx.terms.borrow();
      let signature = ctx.signature.borrow();
      let arena = ctx.clauses.borrow();
      let clause = arena.get(premise);
      let goal = !clause.is_induction_hypothesis()
          && super::InductionHelper::is_induction_clause(&store, &signature, ctx.options.as_ref(), clause);
      (goal, clause.rewrite_bound())
    };
    if !eligible || bound >= REWRITE_BOUND_LIMIT {
      return Ok(result);
    }
    ctx.check_limits(0)?;

    let index = self.lhs_index.as_ref().expect("engine not attached").clone();
    let literals: Vec<LiteralId> = ctx.clauses.borrow().get(premise).literals.to_vec();

    // (rewritten literal slot, new literal, hypothesis clause, reductive)
    let mut rewrites: Vec<(usize, LiteralId, ClauseId, bool)> = Vec::new();
    {
      let index_ref = index.borrow();
      let term_index = index_ref.terms();
      let store = &mut *ctx.terms.borrow_mut();

      for (slot, &literal) in literals.iter().enumerate() {
        let subterms: Vec<TermId> = {
          let shared = store.literal(literal);
          let args: Vec<TermId> = shared.args.to_vec();
          let mut collected = Vec::new();
          for arg in args {
            for (subterm, _) in store.subterms(arg) {
              if store.term(subterm).is_function() && !collected.contains(&subterm) {
                collected.push(subterm);
              }
            }
          }
          collected
        };

        for target in subterms {
          let Some(mut cursor) = term_index.query(store, RetrievalMode::Generalizations, target)
          else {
            continue;
          };
          while let Some(entry) = cursor.next(store) {
            let from_hypothesis = {
              let arena = ctx.clauses.borrow();
              let clause = arena.get(entry.clause);
              clause.store == ClauseStore::Active && clause.is_induction_hypothesis()
            };
            if !from_hypothesis {
              continue;
            }
            let Some(rhs) = entry.extra else {
              continue;
            };

            let subst = cursor.substitution_mut();
            let rhs_image = subst.apply_term(store, rhs, BankIndex::RESULT);
            let reductive =
                ctx.ordering.compare(store, target, rhs_image) == OrderingResult::Greater;
            let sort_hint = store.sort_of(&ctx.signature.borrow(), target);
            let rewritten = rewrite_literal(store, literal, target, rhs_image, sort_hint);
            if rewritten != literal {
              rewrites.push((slot, rewritten, entry.clause, reductive));
            }
          }
        }
      }
    }

    for (slot, rewritten, hypothesis, reductive) in rewrites {
      let mut new_literals = literals.clone();
      new_literals[slot] = rewritten;
      let conclusion = ctx.derive_clause(
        InferenceRule::InductionHypothesisRewriting,
        &[premise, hypothesis],
        &new_literals,
      );
      {
        let mut arena = ctx.clauses.borrow_mut();
        let induction_term = arena
            .get(premise)
            .extras
            .as_ref()
            .and_then(|e| e.induction.as_ref())
            .and_then(|i| i.induction_term);
        let extras = arena.get_mut(conclusion).extras_mut();
        extras.rewrite_bound = bound + 1;
        extras.induction = Some(InductionInfo {
          hypothesis: false,
          induction_term,
        });
      }
      ctx.statistics.borrow_mut().hypothesis_rewritings += 1;
      if reductive {
        // The goal simplified: the premise is subsumed by the rewritten goal.
        result.premise_redundant = true;
        let mut arena = ctx.clauses.borrow_mut();
        arena.get_mut(premise).extras_mut().rewriting_redundant = true;
      }
      result.clauses.push(conclusion);
    }
    Ok(result)
  }
}
