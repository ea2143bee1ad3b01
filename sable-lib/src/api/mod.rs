/*!

The inference engines.

Three engine kinds drive the saturation loop: generating engines combine the given clause with
Active through the indices and emit new clauses; simplifying engines delete or replace clauses
(forward: the premise itself, backward: Active clauses made redundant by the premise); immediate
simplification engines canonicalise every clause before it reaches Passive. Composites chain
children of one kind; the simplifying-and-generating composite additionally tracks whether some
child discovered the premise itself to be redundant.

Engines are stateless across calls. They acquire their indices from the index manager on attach
and release them on detach, so a strategy pays only for what its rules subscribe to.

*/

pub mod binary_resolution;
pub mod demodulation;
pub mod equality_factoring;
pub mod equality_resolution;
pub mod factoring;
pub mod immediate;
pub mod induction;
pub mod subsumption;
pub mod superposition;

use crate::core::clause::ClauseId;
use crate::core::context::RunContext;
use crate::core::indexing::IndexManager;
use crate::core::literal::LiteralId;
use crate::core::saturation::limits::LimitReached;
use crate::core::term::TermStore;

// region Engine interfaces

pub trait GeneratingInferenceEngine {
  fn attach(&mut self, ctx: &RunContext, indices: &mut IndexManager);
  fn detach(&mut self, indices: &mut IndexManager);
  /// All conclusions derivable from the premise against the current Active set. Implementations
  /// poll the limiter between candidate batches.
  fn generate_clauses(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<Vec<ClauseId>, LimitReached>;
}

pub enum ForwardSimplificationResult {
  NotApplied,
  /// The premise is redundant: deleted outright (`replacement: None`) or replaced. `premises`
  /// lists the side clauses that justify the step.
  Simplified {
    replacement: Option<ClauseId>,
    premises   : Vec<ClauseId>,
  },
}

pub trait ForwardSimplificationEngine {
  fn attach(&mut self, ctx: &RunContext, indices: &mut IndexManager);
  fn detach(&mut self, indices: &mut IndexManager);
  fn perform(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<ForwardSimplificationResult, LimitReached>;
}

pub struct BackwardSimplificationRecord {
  pub removed    : ClauseId,
  pub replacement: Option<ClauseId>,
}

pub trait BackwardSimplificationEngine {
  fn attach(&mut self, ctx: &RunContext, indices: &mut IndexManager);
  fn detach(&mut self, indices: &mut IndexManager);
  /// Active clauses the new premise makes redundant, with their replacements.
  fn perform(&mut self, ctx: &RunContext, premise: ClauseId) -> Vec<BackwardSimplificationRecord>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum ImmediateSimplificationResult {
  Unchanged,
  Replaced(ClauseId),
  Deleted,
}

pub trait ImmediateSimplificationEngine {
  fn simplify(&mut self, ctx: &RunContext, clause: ClauseId) -> ImmediateSimplificationResult;
}

/// A generating engine that may also discover the premise to be redundant while generating.
pub struct SgiResult {
  pub clauses          : Vec<ClauseId>,
  pub premise_redundant: bool,
}

pub trait SimplifyingGeneratingInference {
  fn attach(&mut self, ctx: &RunContext, indices: &mut IndexManager);
  fn detach(&mut self, indices: &mut IndexManager);
  fn generate_and_simplify(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<SgiResult, LimitReached>;
}

// endregion

// region Composites

#[derive(Default)]
pub struct CompositeGIE {
  engines: Vec<Box<dyn GeneratingInferenceEngine>>,
}

impl CompositeGIE {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_front(&mut self, engine: Box<dyn GeneratingInferenceEngine>) {
    self.engines.insert(0, engine);
  }
}

impl GeneratingInferenceEngine for CompositeGIE {
  fn attach(&mut self, ctx: &RunContext, indices: &mut IndexManager) {
    for engine in self.engines.iter_mut() {
      engine.attach(ctx, indices);
    }
  }

  fn detach(&mut self, indices: &mut IndexManager) {
    for engine in self.engines.iter_mut() {
      engine.detach(indices);
    }
  }

  fn generate_clauses(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<Vec<ClauseId>, LimitReached> {
    let mut all = Vec::new();
    for engine in self.engines.iter_mut() {
      all.extend(engine.generate_clauses(ctx, premise)?);
    }
    Ok(all)
  }
}

/// Chains generating engines and simplifying generators; remembers whether any child found the
/// premise redundant so the loop can retire it after generation.
#[derive(Default)]
pub struct CompositeSGI {
  generators : Vec<Box<dyn GeneratingInferenceEngine>>,
  simplifiers: Vec<Box<dyn SimplifyingGeneratingInference>>,
}

impl CompositeSGI {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push_generator(&mut self, engine: Box<dyn GeneratingInferenceEngine>) {
    self.generators.push(engine);
  }

  pub fn push_simplifier(&mut self, engine: Box<dyn SimplifyingGeneratingInference>) {
    self.simplifiers.push(engine);
  }

  pub fn attach(&mut self, ctx: &RunContext, indices: &mut IndexManager) {
    for engine in self.generators.iter_mut() {
      engine.attach(ctx, indices);
    }
    for engine in self.simplifiers.iter_mut() {
      engine.attach(ctx, indices);
    }
  }

  pub fn detach(&mut self, indices: &mut IndexManager) {
    for engine in self.generators.iter_mut() {
      engine.detach(indices);
    }
    for engine in self.simplifiers.iter_mut() {
      engine.detach(indices);
    }
  }

  pub fn generate_and_simplify(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<SgiResult, LimitReached> {
    let mut clauses = Vec::new();
    let mut premise_redundant = false;
    for engine in self.generators.iter_mut() {
      clauses.extend(engine.generate_clauses(ctx, premise)?);
    }
    for engine in self.simplifiers.iter_mut() {
      let result = engine.generate_and_simplify(ctx, premise)?;
      clauses.extend(result.clauses);
      premise_redundant = premise_redundant || result.premise_redundant;
    }
    Ok(SgiResult { clauses, premise_redundant })
  }
}

#[derive(Default)]
pub struct CompositeISE {
  engines: Vec<Box<dyn ImmediateSimplificationEngine>>,
}

impl CompositeISE {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_front(&mut self, engine: Box<dyn ImmediateSimplificationEngine>) {
    self.engines.insert(0, engine);
  }
}

impl ImmediateSimplificationEngine for CompositeISE {
  /// Runs the chain to a fixpoint: a replacement restarts the chain on the new clause, so every
  /// child sees the fully simplified form. Idempotent by construction.
  fn simplify(&mut self, ctx: &RunContext, clause: ClauseId) -> ImmediateSimplificationResult {
    let mut current = clause;
    let mut changed = false;
    'restart: loop {
      for engine in self.engines.iter_mut() {
        match engine.simplify(ctx, current) {
          ImmediateSimplificationResult::Unchanged => {}
          ImmediateSimplificationResult::Deleted => return ImmediateSimplificationResult::Deleted,
          ImmediateSimplificationResult::Replaced(next) => {
            current = next;
            changed = true;
            continue 'restart;
          }
        }
      }
      break;
    }
    if changed {
      ImmediateSimplificationResult::Replaced(current)
    } else {
      ImmediateSimplificationResult::Unchanged
    }
  }
}

// endregion

// region Rewriting helpers shared by superposition and the demodulation engines

/// Rebuilds a literal with every occurrence of `from` replaced by `to` in its arguments.
/// `sort_hint` supplies the equality sort for the case where the rewrite leaves an equality
/// with two variable sides (callers know the sort of the replaced subterm).
pub(crate) fn rewrite_literal(
  store: &mut TermStore,
  literal: LiteralId,
  from: crate::core::term::TermId,
  to: crate::core::term::TermId,
  sort_hint: Option<crate::core::sort::SortId>,
) -> LiteralId {
  let shared = store.literal(literal);
  let (predicate, polarity, eq_sort) = (shared.predicate, shared.polarity, shared.eq_sort);
  let args: Vec<crate::core::term::TermId> = shared.args.to_vec();

  let new_args: Vec<crate::core::term::TermId> =
      args.iter().map(|&arg| store.replace_all(arg, from, to)).collect();
  let eq_sort = if new_args.iter().all(|&a| store.term(a).is_variable()) {
    eq_sort.or(sort_hint)
  } else {
    None
  };
  store.mk_literal(predicate, polarity, &new_args, eq_sort)
}

// endregion

// region Conclusion assembly shared by the generating rules

/// Builds the literal array of a conclusion clause, enforcing the immediate invariants the rules
/// rely on: a true literal (`s = s`) prunes the clause entirely (`None`), false literals
/// (`s != s`) and duplicates are dropped.
pub(crate) fn assemble_conclusion(store: &TermStore, literals: Vec<LiteralId>) -> Option<Vec<LiteralId>> {
  let mut result: Vec<LiteralId> = Vec::with_capacity(literals.len());
  for literal in literals {
    let shared = store.literal(literal);
    if shared.is_equality() && shared.args[0] == shared.args[1] {
      if shared.is_positive() {
        return None;
      }
      continue;
    }
    if !result.contains(&literal) {
      result.push(literal);
    }
  }
  Some(result)
}

// endregion
