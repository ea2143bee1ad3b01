/*!

Demodulation: rewriting with oriented unit equations.

Forward demodulation rewrites a subterm of the premise using a unit equation `s = t` from Active
with `sσ ≻ tσ`; the premise is then redundant and replaced. Backward demodulation runs the other
way: a freshly activated unit equation rewrites Active clauses. Both require the rewrite to be a
strict simplification in the ordering, and in `Preordered` mode only equations the ordering had
already oriented may fire.

A redundancy-preserving side condition guards top-level rewrites: when the rewritten subterm is
the larger side of the premise's own equality literal, the replacement must not outgrow the
literal's other side, otherwise the step would not be a simplification of that equation.

*/

use sable_abs::RcCell;

use crate::api::{rewrite_literal, BackwardSimplificationEngine, BackwardSimplificationRecord,
                 ForwardSimplificationEngine, ForwardSimplificationResult};
use crate::core::clause::{ClauseId, ClauseStore};
use crate::core::context::RunContext;
use crate::core::indexing::term_index::equation_lhs_candidates;
use crate::core::indexing::{AnyIndex, IndexManager, IndexType, RetrievalMode};
use crate::core::inference::InferenceRule;
use crate::core::literal::LiteralId;
use crate::core::options::DemodulationMode;
use crate::core::ordering::OrderingResult;
use crate::core::saturation::limits::LimitReached;
use crate::core::substitution::BankIndex;
use crate::core::term::{ArgumentOrder, TermId, TermStore};

/// Was the equation already oriented before instantiation? Required by `Preordered` mode.
fn equation_preordered(ctx: &RunContext, store: &TermStore, equation: LiteralId, lhs: TermId) -> bool {
  let shared = store.literal(equation);
  match ctx.ordering.equality_argument_order(store, equation) {
    ArgumentOrder::Greater => shared.args[0] == lhs,
    ArgumentOrder::Less    => shared.args[1] == lhs,
    _ => false,
  }
}

// region Forward demodulation

#[derive(Default)]
pub struct ForwardDemodulation {
  index: Option<RcCell<AnyIndex>>,
}

impl ForwardDemodulation {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ForwardSimplificationEngine for ForwardDemodulation {
  fn attach(&mut self, _ctx: &RunContext, indices: &mut IndexManager) {
    self.index = Some(indices.request(IndexType::DemodulationLhsCodeTree));
  }

  fn detach(&mut self, indices: &mut IndexManager) {
    self.index = None;
    indices.release(IndexType::DemodulationLhsCodeTree);
  }

  fn perform(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<ForwardSimplificationResult, LimitReached> {
    let mode = ctx.options.forward_demodulation;
    if mode == DemodulationMode::Off {
      return Ok(ForwardSimplificationResult::NotApplied);
    }
    ctx.check_limits(0)?;

    let index = self.index.as_ref().expect("engine not attached").clone();
    let literals: Vec<LiteralId> = ctx.clauses.borrow().get(premise).literals.to_vec();

    let mut replacement: Option<(usize, LiteralId, ClauseId)> = None;
    {
      let index_ref = index.borrow();
      let code_index = index_ref.term_code();
      if code_index.is_empty() {
        return Ok(ForwardSimplificationResult::NotApplied);
      }
      let store = &mut *ctx.terms.borrow_mut();

      'literals: for (slot, &literal) in literals.iter().enumerate() {
        let shared = store.literal(literal);
        let args: Vec<TermId> = shared.args.to_vec();
        let (is_positive_equality, other_side_of) = (
          shared.is_equality() && shared.is_positive(),
          [shared.args.get(1).copied(), shared.args.first().copied()],
        );

        for (arg_slot, &arg) in args.iter().enumerate() {
          let subterms: Vec<TermId> = store
              .subterms(arg)
              .map(|(t, _)| t)
              .filter(|&t| store.term(t).is_function())
              .collect();
          for target in subterms {
            let mut cursor = code_index.retrieve_generalizations(store, target);
            while let Some(entry) = cursor.next(store) {
              if entry.clause == premise {
                continue;
              }
              // The demodulator must come from Active.
              if ctx.clauses.borrow().get(entry.clause).store != ClauseStore::Active {
                continue;
              }
              if mode == DemodulationMode::Preordered
                  && !equation_preordered(ctx, store, entry.literal, entry.term.unwrap())
              {
                continue;
              }

              let bindings = cursor.bindings().to_vec();
              let rhs = entry.extra.expect("demodulation entry without a right-hand side");
              let rhs_image = store.instantiate(rhs, &bindings);

              // The rewrite must be a strict simplification.
              if ctx.ordering.compare(store, target, rhs_image) != OrderingResult::Greater {
                continue;
              }
              // Top-level rewrite of the larger side of the premise's own equality: the result
              // must stay below the other side.
              if is_positive_equality && target == arg {
                let other = other_side_of[arg_slot].unwrap();
                let top_level_larger = ctx.ordering.compare(store, target, other) == OrderingResult::Greater;
                if top_level_larger
                    && ctx.ordering.compare(store, other, rhs_image) == OrderingResult::Less
                {
                  continue;
                }
              }

              let sort_hint = store.sort_of(&ctx.signature.borrow(), target);
              let rewritten = rewrite_literal(store, literal, target, rhs_image, sort_hint);
              replacement = Some((slot, rewritten, entry.clause));
              break 'literals;
            }
          }
        }
      }
    }

    let Some((slot, rewritten, demodulator)) = replacement else {
      return Ok(ForwardSimplificationResult::NotApplied);
    };

    let mut new_literals = literals;
    new_literals[slot] = rewritten;
    let conclusion = ctx.derive_clause(
      InferenceRule::ForwardDemodulation,
      &[premise, demodulator],
      &new_literals,
    );
    ctx.statistics.borrow_mut().forward_demodulations += 1;
    Ok(ForwardSimplificationResult::Simplified {
      replacement: Some(conclusion),
      premises   : vec![demodulator],
    })
  }
}

// endregion

// region Backward demodulation

#[derive(Default)]
pub struct BackwardDemodulation {
  index: Option<RcCell<AnyIndex>>,
}

impl BackwardDemodulation {
  pub fn new() -> Self {
    Self::default()
  }
}

impl BackwardSimplificationEngine for BackwardDemodulation {
  fn attach(&mut self, _ctx: &RunContext, indices: &mut IndexManager) {
    self.index = Some(indices.request(IndexType::DemodulationSubtermSubstTree));
  }

  fn detach(&mut self, indices: &mut IndexManager) {
    self.index = None;
    indices.release(IndexType::DemodulationSubtermSubstTree);
  }

  fn perform(&mut self, ctx: &RunContext, premise: ClauseId) -> Vec<BackwardSimplificationRecord> {
    let mode = ctx.options.backward_demodulation;
    if mode == DemodulationMode::Off {
      return Vec::new();
    }

    // Only a unit positive equation demodulates backwards.
    let equation: Option<LiteralId> = {
      let store = ctx.terms.borrow();
      let arena = ctx.clauses.borrow();
      let clause = arena.get(premise);
      if clause.is_unit() {
        let literal = clause.literals[0];
        let shared = store.literal(literal);
        (shared.is_equality() && shared.is_positive()).then_some(literal)
      } else {
        None
      }
    };
    let Some(equation) = equation else {
      return Vec::new();
    };

    let index = self.index.as_ref().expect("engine not attached").clone();
    let sides: Vec<(TermId, TermId)> = {
      let store = ctx.terms.borrow();
      equation_lhs_candidates(&store, ctx.ordering.as_ref(), equation)
    };

    // (rewritten clause, literal, matched subterm, replacement term)
    let mut rewrites: Vec<(ClauseId, LiteralId, TermId, TermId)> = Vec::new();
    {
      let index_ref = index.borrow();
      let term_index = index_ref.terms();
      let store = &mut *ctx.terms.borrow_mut();

      for (lhs, rhs) in sides {
        if mode == DemodulationMode::Preordered && !equation_preordered(ctx, store, equation, lhs) {
          continue;
        }
        let Some(mut cursor) = term_index.query(store, RetrievalMode::Instances, lhs) else {
          continue;
        };
        while let Some(entry) = cursor.next(store) {
          if entry.clause == premise {
            continue;
          }
          if rewrites.iter().any(|(c, _, _, _)| *c == entry.clause) {
            continue;
          }

          // The matched clause is the instance side: σ never binds its variables, so the
          // rewritten subterm is the stored occurrence itself and the replacement is built with
          // the identity application.
          let target = entry.term.unwrap();
          let subst = cursor.substitution_mut();
          let rhs_image = subst.apply_term_identity(store, rhs, BankIndex::QUERY);

          if ctx.ordering.compare(store, target, rhs_image) != OrderingResult::Greater {
            continue;
          }
          rewrites.push((entry.clause, entry.literal, target, rhs_image));
        }
      }
    }

    let mut records = Vec::new();
    for (clause, literal, from, to) in rewrites {
      let literals: Vec<LiteralId> = ctx.clauses.borrow().get(clause).literals.to_vec();
      let new_literals: Vec<LiteralId> = {
        let store = &mut *ctx.terms.borrow_mut();
        let sort_hint = store.sort_of(&ctx.signature.borrow(), from);
        literals
            .iter()
            .map(|&l| if l == literal { rewrite_literal(store, l, from, to, sort_hint) } else { l })
            .collect()
      };
      let conclusion = ctx.derive_clause(
        InferenceRule::BackwardDemodulation,
        &[clause, premise],
        &new_literals,
      );
      ctx.statistics.borrow_mut().backward_demodulations += 1;
      records.push(BackwardSimplificationRecord {
        removed    : clause,
        replacement: Some(conclusion),
      });
    }
    records
  }
}

// endregion
