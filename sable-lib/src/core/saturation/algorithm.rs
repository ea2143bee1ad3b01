/*!

The given-clause saturation algorithm.

Preprocessed clauses enter Unprocessed, get immediately simplified, and sink into Passive. Each
iteration selects a given clause by the fairness policy, forward-simplifies it against Active
(dropping it entirely if something fires), activates it (literal selection, container
membership, index updates), backward-simplifies Active against it, generates new clauses with
the composite engine, and drains Unprocessed again. The loop ends with `Refutation` when the
empty clause appears, `Satisfiable` (or `Unknown` under an incomplete strategy) when Passive
runs dry, or a limit reason when the cooperative limiter trips.

Engine wiring from the option table happens in `create`; it mirrors which rules a strategy pays
for: nothing is attached, and no index is built, unless its option is on.

*/

use sable_abs::{rc_cell, RcCell};

use crate::api::binary_resolution::BinaryResolution;
use crate::api::demodulation::{BackwardDemodulation, ForwardDemodulation};
use crate::api::equality_factoring::EqualityFactoring;
use crate::api::equality_resolution::EqualityResolution;
use crate::api::factoring::Factoring;
use crate::api::immediate::{
  DuplicateLiteralRemoval,
  EquationalTautologyRemoval,
  TautologyDeletion,
  TrivialInequalityRemoval,
};
use crate::api::induction::hypothesis_rewriting::InductionHypothesisRewriting;
use crate::api::induction::Induction;
use crate::api::subsumption::{BackwardSubsumption, ForwardSubsumptionAndResolution};
use crate::api::superposition::Superposition;
use crate::api::{
  BackwardSimplificationEngine,
  CompositeGIE,
  CompositeISE,
  CompositeSGI,
  ForwardSimplificationEngine,
  ForwardSimplificationResult,
  ImmediateSimplificationEngine,
  ImmediateSimplificationResult,
};
use crate::core::clause::{ClauseId, ClauseStore};
use crate::core::context::RunContext;
use crate::core::indexing::IndexManager;
use crate::core::inference::Derivation;
use crate::core::options::{DemodulationMode, Options, SubsumptionMode};
use crate::core::problem::Problem;
use crate::core::saturation::containers::{ActiveClauseContainer, ContainerEvent, UnprocessedClauseContainer};
use crate::core::saturation::limits::LimitReached;
use crate::core::saturation::passive::PassiveClauseContainer;
use crate::core::selection::select_literals;
use crate::core::symbol::Signature;

use sable_abs::log::{debug, info, trace};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TerminationReason {
  Refutation,
  Satisfiable,
  TimeLimit,
  MemoryLimit,
  /// The strategy was incomplete, so an empty Passive proves nothing.
  Unknown,
}

pub struct SaturationResult {
  pub reason    : TerminationReason,
  pub refutation: Option<ClauseId>,
}

pub struct SaturationAlgorithm {
  ctx          : RunContext,
  index_manager: RcCell<IndexManager>,

  unprocessed: UnprocessedClauseContainer,
  passive    : PassiveClauseContainer,
  active     : ActiveClauseContainer,

  generating           : CompositeSGI,
  forward_simplifiers  : Vec<Box<dyn ForwardSimplificationEngine>>,
  backward_simplifiers : Vec<Box<dyn BackwardSimplificationEngine>>,
  immediate            : CompositeISE,

  refutation       : Option<ClauseId>,
  complete_strategy: bool,
}

impl SaturationAlgorithm {
  /// Builds the algorithm with the engines the options ask for.
  pub fn create(signature: Signature, options: Options, has_equality: bool) -> Self {
    assert!(
      options.forward_subsumption || !options.forward_subsumption_resolution,
      "forward subsumption resolution requires forward subsumption"
    );

    let ctx = RunContext::new(signature, options.clone());
    let index_manager = rc_cell(IndexManager::new());
    let passive = PassiveClauseContainer::new(&ctx);

    let mut gie = CompositeGIE::new();
    if has_equality {
      gie.add_front(Box::new(EqualityFactoring::new()));
      gie.add_front(Box::new(EqualityResolution::new()));
      if options.superposition {
        gie.add_front(Box::new(Superposition::new()));
      }
    }
    gie.add_front(Box::new(Factoring::new()));
    if options.binary_resolution {
      gie.add_front(Box::new(BinaryResolution::new()));
    }
    if options.induction.enabled() {
      gie.add_front(Box::new(Induction::new()));
    }

    let mut generating = CompositeSGI::new();
    generating.push_generator(Box::new(gie));
    if options.induction.enabled() && has_equality {
      generating.push_simplifier(Box::new(InductionHypothesisRewriting::new()));
    }

    let mut forward_simplifiers: Vec<Box<dyn ForwardSimplificationEngine>> = Vec::new();
    if options.forward_subsumption {
      forward_simplifiers.push(Box::new(ForwardSubsumptionAndResolution::new(
        options.forward_subsumption_resolution,
      )));
    }
    if has_equality && options.forward_demodulation != DemodulationMode::Off {
      forward_simplifiers.push(Box::new(ForwardDemodulation::new()));
    }

    let mut backward_simplifiers: Vec<Box<dyn BackwardSimplificationEngine>> = Vec::new();
    if has_equality && options.backward_demodulation != DemodulationMode::Off {
      backward_simplifiers.push(Box::new(BackwardDemodulation::new()));
    }
    if options.backward_subsumption != SubsumptionMode::Off {
      backward_simplifiers.push(Box::new(BackwardSubsumption::new(options.backward_subsumption)));
    }

    let mut immediate = CompositeISE::new();
    if has_equality && options.equational_tautology_removal {
      immediate.add_front(Box::new(EquationalTautologyRemoval::new()));
    }
    if has_equality {
      immediate.add_front(Box::new(TrivialInequalityRemoval::new()));
    }
    immediate.add_front(Box::new(TautologyDeletion::new()));
    immediate.add_front(Box::new(DuplicateLiteralRemoval::new()));

    let complete_strategy = options.binary_resolution && (!has_equality || options.superposition);

    let mut algorithm = SaturationAlgorithm {
      ctx,
      index_manager,
      unprocessed: UnprocessedClauseContainer::new(),
      passive,
      active: ActiveClauseContainer::new(),
      generating,
      forward_simplifiers,
      backward_simplifiers,
      immediate,
      refutation: None,
      complete_strategy,
    };
    algorithm.attach_engines();
    algorithm
  }

  fn attach_engines(&mut self) {
    let manager = &mut *self.index_manager.borrow_mut();
    self.generating.attach(&self.ctx, manager);
    for engine in self.forward_simplifiers.iter_mut() {
      engine.attach(&self.ctx, manager);
    }
    for engine in self.backward_simplifiers.iter_mut() {
      engine.attach(&self.ctx, manager);
    }
  }

  #[inline(always)]
  pub fn context(&self) -> &RunContext {
    &self.ctx
  }

  /// Feeds the preprocessed input clauses into Unprocessed.
  pub fn add_input(&mut self, problem: &Problem) {
    for input in problem.clauses.iter() {
      let id = {
        let store = self.ctx.terms.borrow();
        self.ctx.clauses.borrow_mut().create(
          &store,
          &input.literals,
          crate::core::inference::Inference::input(),
          0,
        )
      };
      if let Some(split_set) = input.split_set {
        self.ctx.clauses.borrow_mut().get_mut(id).extras_mut().split_set = Some(split_set);
      }
      self.ctx.statistics.borrow_mut().input_clauses += 1;
      self.unprocessed.push(id);
    }
  }

  /// Runs saturation to one of the termination reasons.
  pub fn run(&mut self) -> SaturationResult {
    let reason = match self.saturate() {
      Ok(reason) => reason,
      Err(LimitReached::Time) => TerminationReason::TimeLimit,
      Err(LimitReached::Memory) | Err(LimitReached::Unprocessed) => TerminationReason::MemoryLimit,
    };
    info!("saturation finished: {:?}", reason);
    SaturationResult {
      reason,
      refutation: self.refutation,
    }
  }

  /// The refutation's derivation DAG, once the empty clause was found.
  pub fn refutation(&self) -> Option<Derivation> {
    self.refutation.map(|empty| Derivation::of(&self.ctx.clauses.borrow(), empty))
  }

  fn saturate(&mut self) -> Result<TerminationReason, LimitReached> {
    self.drain_unprocessed()?;
    if self.refutation.is_some() {
      return Ok(TerminationReason::Refutation);
    }

    loop {
      if self.passive.is_empty() {
        return Ok(if self.complete_strategy {
          TerminationReason::Satisfiable
        } else {
          TerminationReason::Unknown
        });
      }
      self.ctx.check_limits(self.unprocessed.len())?;

      let given = self.passive.pop_selected().expect("non-empty Passive");
      self.index_manager.borrow_mut().on_active_event(&self.ctx, given, ContainerEvent::Selected);
      debug!("given clause {}", given);

      if !self.forward_simplify(given)? {
        continue;
      }

      self.activate(given);
      self.backward_simplify(given)?;

      let generated = self.generating.generate_and_simplify(&self.ctx, given)?;
      for clause in generated.clauses {
        self.unprocessed.push(clause);
      }
      if generated.premise_redundant {
        self.remove_from_active(given);
      }

      self.drain_unprocessed()?;
      if self.refutation.is_some() {
        return Ok(TerminationReason::Refutation);
      }
    }
  }

  /// Returns whether the clause survived unchanged. A fired simplification retires the premise;
  /// any replacement re-enters through Unprocessed.
  fn forward_simplify(&mut self, clause: ClauseId) -> Result<bool, LimitReached> {
    for engine in self.forward_simplifiers.iter_mut() {
      match engine.perform(&self.ctx, clause)? {
        ForwardSimplificationResult::NotApplied => {}
        ForwardSimplificationResult::Simplified { replacement, premises: _ } => {
          self.ctx.clauses.borrow_mut().get_mut(clause).store = ClauseStore::Removed;
          if let Some(replacement) = replacement {
            self.unprocessed.push(replacement);
          }
          return Ok(false);
        }
      }
    }
    Ok(true)
  }

  fn activate(&mut self, clause: ClauseId) {
    {
      let mut arena = self.ctx.clauses.borrow_mut();
      let entry = arena.get_mut(clause);
      entry.store = ClauseStore::Active;
      let store = self.ctx.terms.borrow();
      select_literals(&store, self.ctx.ordering.as_ref(), self.ctx.options.selection, entry);
    }
    self.active.add(clause);
    self.index_manager.borrow_mut().on_active_event(&self.ctx, clause, ContainerEvent::Added);
    self.ctx.statistics.borrow_mut().activations += 1;
  }

  fn remove_from_active(&mut self, clause: ClauseId) {
    if !self.active.contains(clause) {
      return;
    }
    self.index_manager.borrow_mut().on_active_event(&self.ctx, clause, ContainerEvent::Removed);
    self.active.remove(clause);
    self.ctx.clauses.borrow_mut().get_mut(clause).store = ClauseStore::Removed;
  }

  fn backward_simplify(&mut self, premise: ClauseId) -> Result<(), LimitReached> {
    for i in 0..self.backward_simplifiers.len() {
      let records = self.backward_simplifiers[i].perform(&self.ctx, premise);
      for record in records {
        if record.removed == premise || !self.active.contains(record.removed) {
          continue;
        }
        self.remove_from_active(record.removed);
        if let Some(replacement) = record.replacement {
          self.unprocessed.push(replacement);
        }
      }
    }
    Ok(())
  }

  fn drain_unprocessed(&mut self) -> Result<(), LimitReached> {
    while let Some(clause) = self.unprocessed.pop() {
      self.ctx.check_limits(self.unprocessed.len())?;

      let settled = match self.immediate.simplify(&self.ctx, clause) {
        ImmediateSimplificationResult::Deleted => {
          self.ctx.clauses.borrow_mut().get_mut(clause).store = ClauseStore::Removed;
          continue;
        }
        ImmediateSimplificationResult::Replaced(replacement) => {
          self.ctx.clauses.borrow_mut().get_mut(clause).store = ClauseStore::Removed;
          replacement
        }
        ImmediateSimplificationResult::Unchanged => clause,
      };

      if self.ctx.clauses.borrow().get(settled).is_empty() {
        self.refutation = Some(settled);
        return Ok(());
      }

      {
        let arena = self.ctx.clauses.borrow();
        let store = self.ctx.terms.borrow();
        let signature = self.ctx.signature.borrow();
        trace!("to passive: {}: {}", settled, arena.display(&store, &signature, settled));
      }
      self.ctx.clauses.borrow_mut().get_mut(settled).store = ClauseStore::Passive;
      self.passive.add(&self.ctx, settled);
    }
    Ok(())
  }
}
