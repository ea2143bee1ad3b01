/*!

Subsumption engines.

Forward subsumption asks whether some Active clause subsumes the premise; candidates come from
the forward-subsumption code tree (an Active clause qualifies only if one of its literals
generalises a premise literal), and multi-literal verification is delegated to the subsumption
solver. The resolution variant additionally tries to cut one premise literal using a
complementary match. Backward subsumption finds the Active clauses the freshly activated premise
subsumes; candidates come from instance retrieval on the literal tree.

*/

use sable_abs::RcCell;

use crate::api::{BackwardSimplificationEngine, BackwardSimplificationRecord,
                 ForwardSimplificationEngine, ForwardSimplificationResult};
use crate::core::clause::{ClauseId, ClauseStore};
use crate::core::context::RunContext;
use crate::core::indexing::{AnyIndex, IndexManager, IndexType, RetrievalMode};
use crate::core::inference::InferenceRule;
use crate::core::literal::LiteralId;
use crate::core::options::SubsumptionMode;
use crate::core::sat::SubsumptionSolver;
use crate::core::saturation::limits::LimitReached;

// region Forward subsumption and subsumption resolution

pub struct ForwardSubsumptionAndResolution {
  index : Option<RcCell<AnyIndex>>,
  solver: SubsumptionSolver,
  /// Whether the resolution variant runs after plain subsumption fails.
  with_resolution: bool,
}

impl ForwardSubsumptionAndResolution {
  pub fn new(with_resolution: bool) -> Self {
    ForwardSubsumptionAndResolution {
      index : None,
      solver: SubsumptionSolver::new(),
      with_resolution,
    }
  }

  /// Active clauses with a literal generalising some premise literal (or, with complements, the
  /// complement of one).
  fn candidates(&self, ctx: &RunContext, premise_literals: &[LiteralId], complements: bool) -> Vec<ClauseId> {
    let index = self.index.as_ref().expect("engine not attached").clone();
    let index_ref = index.borrow();
    let code_index = index_ref.literal_code();

    let mut result: Vec<ClauseId> = Vec::new();
    let store = &mut *ctx.terms.borrow_mut();
    for &literal in premise_literals {
      let query = if complements { store.complement(literal) } else { literal };
      let Some(mut cursor) = code_index.retrieve_generalizations(store, query) else {
        continue;
      };
      while let Some(entry) = cursor.next(store) {
        if ctx.clauses.borrow().get(entry.clause).store == ClauseStore::Active
            && !result.contains(&entry.clause)
        {
          result.push(entry.clause);
        }
      }
    }
    result
  }
}

impl ForwardSimplificationEngine for ForwardSubsumptionAndResolution {
  fn attach(&mut self, _ctx: &RunContext, indices: &mut IndexManager) {
    self.index = Some(indices.request(IndexType::FwSubsumptionCodeTree));
  }

  fn detach(&mut self, indices: &mut IndexManager) {
    self.index = None;
    indices.release(IndexType::FwSubsumptionCodeTree);
  }

  fn perform(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<ForwardSimplificationResult, LimitReached> {
    ctx.check_limits(0)?;
    let premise_literals: Vec<LiteralId> = ctx.clauses.borrow().get(premise).literals.to_vec();

    // Plain subsumption: the premise is deleted outright.
    for candidate in self.candidates(ctx, &premise_literals, false) {
      let candidate_literals: Vec<LiteralId> = ctx.clauses.borrow().get(candidate).literals.to_vec();
      if candidate_literals.len() > premise_literals.len() {
        continue;
      }
      let subsumed = {
        let store = ctx.terms.borrow();
        self.solver.subsumes(&store, &candidate_literals, &premise_literals)
      };
      if subsumed {
        ctx.statistics.borrow_mut().forward_subsumed += 1;
        return Ok(ForwardSimplificationResult::Simplified {
          replacement: None,
          premises   : vec![candidate],
        });
      }
    }

    if !self.with_resolution {
      return Ok(ForwardSimplificationResult::NotApplied);
    }

    // Subsumption resolution: one premise literal is cut.
    for candidate in self.candidates(ctx, &premise_literals, true) {
      let candidate_literals: Vec<LiteralId> = ctx.clauses.borrow().get(candidate).literals.to_vec();
      let resolved = {
        let store = ctx.terms.borrow();
        self.solver.subsumption_resolution(&store, &candidate_literals, &premise_literals)
      };
      if let Some(cut) = resolved {
        let mut literals = premise_literals.clone();
        literals.remove(cut);
        let replacement = ctx.derive_clause(
          InferenceRule::SubsumptionResolution,
          &[premise, candidate],
          &literals,
        );
        ctx.statistics.borrow_mut().subsumption_resolutions += 1;
        return Ok(ForwardSimplificationResult::Simplified {
          replacement: Some(replacement),
          premises   : vec![candidate],
        });
      }
    }

    Ok(ForwardSimplificationResult::NotApplied)
  }
}

// endregion

// region Backward subsumption

pub struct BackwardSubsumption {
  index : Option<RcCell<AnyIndex>>,
  solver: SubsumptionSolver,
  /// `UnitOnly` restricts the subsuming premise to unit clauses.
  mode: SubsumptionMode,
}

impl BackwardSubsumption {
  pub fn new(mode: SubsumptionMode) -> Self {
    BackwardSubsumption {
      index : None,
      solver: SubsumptionSolver::new(),
      mode,
    }
  }
}

impl BackwardSimplificationEngine for BackwardSubsumption {
  fn attach(&mut self, _ctx: &RunContext, indices: &mut IndexManager) {
    self.index = Some(indices.request(IndexType::BackwardSubsumptionSubstTree));
  }

  fn detach(&mut self, indices: &mut IndexManager) {
    self.index = None;
    indices.release(IndexType::BackwardSubsumptionSubstTree);
  }

  fn perform(&mut self, ctx: &RunContext, premise: ClauseId) -> Vec<BackwardSimplificationRecord> {
    if self.mode == SubsumptionMode::Off {
      return Vec::new();
    }
    let premise_literals: Vec<LiteralId> = ctx.clauses.borrow().get(premise).literals.to_vec();
    if premise_literals.is_empty() {
      return Vec::new();
    }
    if self.mode == SubsumptionMode::UnitOnly && premise_literals.len() != 1 {
      return Vec::new();
    }

    let index = self.index.as_ref().expect("engine not attached").clone();

    // Candidate clauses: instances of the premise's first literal narrow the search best.
    let mut candidates: Vec<ClauseId> = Vec::new();
    {
      let index_ref = index.borrow();
      let literal_index = index_ref.literals();
      let store = &mut *ctx.terms.borrow_mut();
      let shared = store.literal(premise_literals[0]);
      let (predicate, polarity) = (shared.predicate, shared.polarity);
      let args: Vec<_> = shared.args.to_vec();
      if let Some(mut cursor) =
          literal_index.query(store, predicate, polarity, &args, RetrievalMode::Instances)
      {
        while let Some(entry) = cursor.next(store) {
          if entry.clause != premise && !candidates.contains(&entry.clause) {
            candidates.push(entry.clause);
          }
        }
      }
    }

    let mut records = Vec::new();
    for candidate in candidates {
      let candidate_literals: Vec<LiteralId> = ctx.clauses.borrow().get(candidate).literals.to_vec();
      if premise_literals.len() > candidate_literals.len() {
        continue;
      }
      let subsumed = {
        let store = ctx.terms.borrow();
        self.solver.subsumes(&store, &premise_literals, &candidate_literals)
      };
      if subsumed {
        ctx.statistics.borrow_mut().backward_subsumed += 1;
        records.push(BackwardSimplificationRecord {
          removed    : candidate,
          replacement: None,
        });
      }
    }
    records
  }
}

// endregion
