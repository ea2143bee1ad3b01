/*!

Immediate simplification engines: the canonicalisation every derived clause goes through before
it may enter Passive. Duplicate literals and trivial inequalities are removed, tautologies are
deleted outright. All three are idempotent, and the composite runs them to a fixpoint anyway.

*/

use crate::api::{ImmediateSimplificationEngine, ImmediateSimplificationResult};
use crate::core::clause::ClauseId;
use crate::core::context::RunContext;
use crate::core::inference::InferenceRule;
use crate::core::literal::LiteralId;

#[derive(Default)]
pub struct DuplicateLiteralRemoval;

impl DuplicateLiteralRemoval {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ImmediateSimplificationEngine for DuplicateLiteralRemoval {
  fn simplify(&mut self, ctx: &RunContext, clause: ClauseId) -> ImmediateSimplificationResult {
    let literals: Vec<LiteralId> = ctx.clauses.borrow().get(clause).literals.to_vec();
    // Sharing makes duplicates identical ids.
    let mut deduped: Vec<LiteralId> = Vec::with_capacity(literals.len());
    for literal in literals.iter().copied() {
      if !deduped.contains(&literal) {
        deduped.push(literal);
      }
    }
    if deduped.len() == literals.len() {
      return ImmediateSimplificationResult::Unchanged;
    }
    ctx.statistics.borrow_mut().duplicate_literals += 1;
    let replacement =
        ctx.derive_clause(InferenceRule::DuplicateLiteralRemoval, &[clause], &deduped);
    ImmediateSimplificationResult::Replaced(replacement)
  }
}

#[derive(Default)]
pub struct TrivialInequalityRemoval;

impl TrivialInequalityRemoval {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ImmediateSimplificationEngine for TrivialInequalityRemoval {
  fn simplify(&mut self, ctx: &RunContext, clause: ClauseId) -> ImmediateSimplificationResult {
    let literals: Vec<LiteralId> = ctx.clauses.borrow().get(clause).literals.to_vec();
    let kept: Vec<LiteralId> = {
      let store = ctx.terms.borrow();
      literals
          .iter()
          .copied()
          .filter(|&l| {
            let shared = store.literal(l);
            !(shared.is_equality() && shared.is_negative() && shared.args[0] == shared.args[1])
          })
          .collect()
    };
    if kept.len() == literals.len() {
      return ImmediateSimplificationResult::Unchanged;
    }
    ctx.statistics.borrow_mut().trivial_inequalities += 1;
    let replacement =
        ctx.derive_clause(InferenceRule::TrivialInequalityRemoval, &[clause], &kept);
    ImmediateSimplificationResult::Replaced(replacement)
  }
}

#[derive(Default)]
pub struct TautologyDeletion;

impl TautologyDeletion {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ImmediateSimplificationEngine for TautologyDeletion {
  fn simplify(&mut self, ctx: &RunContext, clause: ClauseId) -> ImmediateSimplificationResult {
    let literals: Vec<LiteralId> = ctx.clauses.borrow().get(clause).literals.to_vec();
    let tautology = {
      let store = &mut *ctx.terms.borrow_mut();
      let mut found = false;
      for &literal in literals.iter() {
        let shared = store.literal(literal);
        if shared.is_equality() && shared.is_positive() && shared.args[0] == shared.args[1] {
          found = true;
          break;
        }
        let complement = store.complement(literal);
        if literals.contains(&complement) {
          found = true;
          break;
        }
      }
      found
    };
    if tautology {
      ctx.statistics.borrow_mut().tautologies_deleted += 1;
      ImmediateSimplificationResult::Deleted
    } else {
      ImmediateSimplificationResult::Unchanged
    }
  }
}

/// Tautology detection modulo the symmetry of equality: `s = t` together with `t != s` closes
/// the clause even though the two literals are not complements in the sharing pool.
#[derive(Default)]
pub struct EquationalTautologyRemoval;

impl EquationalTautologyRemoval {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ImmediateSimplificationEngine for EquationalTautologyRemoval {
  fn simplify(&mut self, ctx: &RunContext, clause: ClauseId) -> ImmediateSimplificationResult {
    let literals: Vec<LiteralId> = ctx.clauses.borrow().get(clause).literals.to_vec();
    let tautology = {
      let store = ctx.terms.borrow();
      literals.iter().any(|&positive| {
        let p = store.literal(positive);
        if !(p.is_equality() && p.is_positive()) {
          return false;
        }
        literals.iter().any(|&negative| {
          let n = store.literal(negative);
          n.is_equality()
              && n.is_negative()
              && ((n.args[0] == p.args[0] && n.args[1] == p.args[1])
                  || (n.args[0] == p.args[1] && n.args[1] == p.args[0]))
        })
      })
    };
    if tautology {
      ctx.statistics.borrow_mut().tautologies_deleted += 1;
      ImmediateSimplificationResult::Deleted
    } else {
      ImmediateSimplificationResult::Unchanged
    }
  }
}
