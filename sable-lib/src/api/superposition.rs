/*!

Superposition: the principal generating rule for equational reasoning.

Given an oriented equation `s = t` (with `s` not smaller than `t` after instantiation) in one
clause and a non-variable subterm position unifying with `s` in another, the conclusion rewrites
that position to `t` under the unifier and unions the remaining literals of both premises. The
rule fires in both directions from the given clause: with the given clause supplying the
equation (rewriting into Active) and with the given clause being rewritten (equations from
Active). Side conditions: the equation must sit in a selected literal, only rewritable subterm
positions are targeted, the instantiated equation must not be inverted by the ordering, and
conclusions that are tautologies modulo trivial equality are pruned.

*/

use sable_abs::RcCell;

use crate::api::{assemble_conclusion, rewrite_literal, GeneratingInferenceEngine};
use crate::core::clause::ClauseId;
use crate::core::context::RunContext;
use crate::core::indexing::term_index::{equation_lhs_candidates, rewritable_subterms};
use crate::core::indexing::{AnyIndex, IndexManager, IndexType, RetrievalMode};
use crate::core::inference::InferenceRule;
use crate::core::literal::LiteralId;
use crate::core::ordering::OrderingResult;
use crate::core::saturation::limits::LimitReached;
use crate::core::substitution::BankIndex;
use crate::core::term::TermId;

pub struct Superposition {
  subterm_index: Option<RcCell<AnyIndex>>,
  lhs_index    : Option<RcCell<AnyIndex>>,
}

impl Superposition {
  pub fn new() -> Self {
    Superposition {
      subterm_index: None,
      lhs_index    : None,
    }
  }
}

struct PendingConclusion {
  literals   : Vec<LiteralId>,
  side_clause: ClauseId,
}

impl GeneratingInferenceEngine for Superposition {
  fn attach(&mut self, _ctx: &RunContext, indices: &mut IndexManager) {
    self.subterm_index = Some(indices.request(IndexType::SuperpositionSubtermSubstTree));
    self.lhs_index    = Some(indices.request(IndexType::SuperpositionLhsSubstTree));
  }

  fn detach(&mut self, indices: &mut IndexManager) {
    self.subterm_index = None;
    self.lhs_index = None;
    indices.release(IndexType::SuperpositionSubtermSubstTree);
    indices.release(IndexType::SuperpositionLhsSubstTree);
  }

  fn generate_clauses(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<Vec<ClauseId>, LimitReached> {
    let mut pending = Vec::new();
    self.rewrite_into_active(ctx, premise, &mut pending)?;
    self.rewritten_by_active(ctx, premise, &mut pending)?;

    let mut derived = Vec::new();
    for conclusion in pending {
      let Some(literals) = assemble_conclusion(&ctx.terms.borrow(), conclusion.literals) else {
        continue;
      };
      derived.push(ctx.derive_clause(
        InferenceRule::Superposition,
        &[premise, conclusion.side_clause],
        &literals,
      ));
      ctx.statistics.borrow_mut().superpositions += 1;
    }
    Ok(derived)
  }
}

impl Superposition {
  /// The given clause supplies the equation; Active supplies the rewritten positions.
  fn rewrite_into_active(
    &self,
    ctx: &RunContext,
    premise: ClauseId,
    pending: &mut Vec<PendingConclusion>,
  ) -> Result<(), LimitReached> {
    let index = self.subterm_index.as_ref().expect("engine not attached").clone();

    let equations: Vec<(LiteralId, TermId, TermId)> = {
      let store = ctx.terms.borrow();
      let arena = ctx.clauses.borrow();
      let mut result = Vec::new();
      for &literal in arena.get(premise).selected_literals() {
        let shared = store.literal(literal);
        if shared.is_equality() && shared.is_positive() {
          for (s, t) in equation_lhs_candidates(&store, ctx.ordering.as_ref(), literal) {
            result.push((literal, s, t));
          }
        }
      }
      result
    };

    for (equation_literal, s, t) in equations {
      ctx.check_limits(0)?;

      let index_ref = index.borrow();
      let term_index = index_ref.terms();
      let store = &mut *ctx.terms.borrow_mut();
      let Some(mut cursor) = term_index.query(store, RetrievalMode::Unifications, s) else {
        continue;
      };

      while let Some(entry) = cursor.next(store) {
        if entry.clause == premise {
          continue;
        }
        let side_literals: Vec<LiteralId> = ctx.clauses.borrow().get(entry.clause).literals.to_vec();
        let premise_literals: Vec<LiteralId> = ctx.clauses.borrow().get(premise).literals.to_vec();

        let subst = cursor.substitution_mut();
        let s_image = subst.apply_term(store, s, BankIndex::QUERY);
        let t_image = subst.apply_term(store, t, BankIndex::QUERY);
        if matches!(
          ctx.ordering.compare(store, s_image, t_image),
          OrderingResult::Less | OrderingResult::Equal
        ) {
          continue;
        }

        let target_image = subst.apply_literal(store, entry.literal, BankIndex::RESULT);
        let sort_hint = store.sort_of(&ctx.signature.borrow(), s_image);
        let rewritten = rewrite_literal(store, target_image, s_image, t_image, sort_hint);

        let mut literals = Vec::new();
        literals.push(rewritten);
        for &l in premise_literals.iter() {
          if l != equation_literal {
            literals.push(subst.apply_literal(store, l, BankIndex::QUERY));
          }
        }
        for &l in side_literals.iter() {
          if l != entry.literal {
            literals.push(subst.apply_literal(store, l, BankIndex::RESULT));
          }
        }
        pending.push(PendingConclusion { literals, side_clause: entry.clause });
      }
    }
    Ok(())
  }

  /// Active supplies the equation; the given clause is rewritten.
  fn rewritten_by_active(
    &self,
    ctx: &RunContext,
    premise: ClauseId,
    pending: &mut Vec<PendingConclusion>,
  ) -> Result<(), LimitReached> {
    let index = self.lhs_index.as_ref().expect("engine not attached").clone();

    let targets: Vec<(LiteralId, TermId)> = {
      let store = ctx.terms.borrow();
      let arena = ctx.clauses.borrow();
      let mut result = Vec::new();
      for &literal in arena.get(premise).selected_literals() {
        for subterm in rewritable_subterms(&store, ctx.ordering.as_ref(), literal) {
          result.push((literal, subterm));
        }
      }
      result
    };

    for (target_literal, subterm) in targets {
      ctx.check_limits(0)?;

      let index_ref = index.borrow();
      let term_index = index_ref.terms();
      let store = &mut *ctx.terms.borrow_mut();
      let Some(mut cursor) = term_index.query(store, RetrievalMode::Unifications, subterm) else {
        continue;
      };

      while let Some(entry) = cursor.next(store) {
        if entry.clause == premise {
          continue;
        }
        let Some(rhs) = entry.extra else {
          debug_assert!(false, "equation side missing from the LHS index");
          continue;
        };
        let side_literals: Vec<LiteralId> = ctx.clauses.borrow().get(entry.clause).literals.to_vec();
        let premise_literals: Vec<LiteralId> = ctx.clauses.borrow().get(premise).literals.to_vec();

        let subst = cursor.substitution_mut();
        let s_image = subst.apply_term(store, entry.term.unwrap(), BankIndex::RESULT);
        let t_image = subst.apply_term(store, rhs, BankIndex::RESULT);
        if matches!(
          ctx.ordering.compare(store, s_image, t_image),
          OrderingResult::Less | OrderingResult::Equal
        ) {
          continue;
        }

        let target_image = subst.apply_literal(store, target_literal, BankIndex::QUERY);
        let sort_hint = store.sort_of(&ctx.signature.borrow(), s_image);
        let rewritten = rewrite_literal(store, target_image, s_image, t_image, sort_hint);

        let mut literals = Vec::new();
        literals.push(rewritten);
        for &l in premise_literals.iter() {
          if l != target_literal {
            literals.push(subst.apply_literal(store, l, BankIndex::QUERY));
          }
        }
        for &l in side_literals.iter() {
          if l != entry.literal {
            literals.push(subst.apply_literal(store, l, BankIndex::RESULT));
          }
        }
        pending.push(PendingConclusion { literals, side_clause: entry.clause });
      }
    }
    Ok(())
  }
}
