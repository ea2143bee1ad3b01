/*!

The induction engine.

For a ground goal-derived clause and an induction term inside it, the engine instantiates a
structural or integer schema, emitting the base, step, and conclusion clauses already resolved
against the premise. Candidate literals and terms are recognised by `InductionHelper`; a schema
whose constructor cases lack activating clauses is parked in the postponement registry and
retried when a suitable clause arrives; a schema that cannot affect its literal is marked
vacuous and dropped. The formula index keeps any schema from being instantiated twice.

Integer induction pairs the induction literal with unit comparison bounds from the dedicated
index, in both pairing directions: a new induction literal looks bounds up, and a new bound
looks already-indexed induction terms up.

*/

pub mod hypothesis_rewriting;
pub mod postponement;
pub mod scheme;

use sable_abs::{HashSet, RcCell};

use crate::api::GeneratingInferenceEngine;
use crate::core::clause::{Clause, ClauseId};
use crate::core::context::RunContext;
use crate::core::indexing::{AnyIndex, IndexManager, IndexType, RetrievalMode};
use crate::core::literal::LiteralId;
use crate::core::options::{
  IntInductionInterval,
  IntInductionStrictnessComp,
  IntInductionStrictnessEq,
  IntInductionStrictnessTerm,
  Options,
};
use crate::core::saturation::limits::LimitReached;
use crate::core::sort::SortKind;
use crate::core::symbol::{Signature, SymbolAttribute};
use crate::core::term::{TermId, TermStore, VariableIndex};

use postponement::{InductionPostponement, SchemeState};

// region InductionHelper

/// Recognisers for induction candidates, shared with the passive queue's value heuristic.
pub struct InductionHelper;

impl InductionHelper {
  fn term_contains_skolem(store: &TermStore, signature: &Signature, term: TermId) -> bool {
    store.subterms(term).any(|(subterm, _)| {
      store
          .term(subterm)
          .symbol()
          .map_or(false, |symbol| signature.function(symbol).is_skolem())
    })
  }

  pub fn literal_contains_term(store: &TermStore, literal: LiteralId, term: TermId) -> bool {
    store
        .literal(literal)
        .args
        .iter()
        .any(|&arg| store.contains_subterm(arg, term))
  }

  /// Ground, goal-derived (contains a Skolem), and within the unit restriction.
  pub fn is_induction_clause(
    store: &TermStore,
    signature: &Signature,
    options: &Options,
    clause: &Clause,
  ) -> bool {
    if clause.is_empty() {
      return false;
    }
    if !clause.is_unit() && !options.non_unit_induction {
      return false;
    }
    clause.literals.iter().all(|&l| store.literal(l).is_ground())
        && clause
            .literals
            .iter()
            .any(|&l| Self::is_induction_literal(store, signature, l))
  }

  pub fn is_induction_literal(store: &TermStore, signature: &Signature, literal: LiteralId) -> bool {
    let shared = store.literal(literal);
    shared.is_ground()
        && shared
            .args
            .iter()
            .any(|&arg| Self::term_contains_skolem(store, signature, arg))
  }

  /// A ground term headed by a Skolem constant, or any ground complex term containing one
  /// when inducting on complex terms is enabled.
  pub fn is_induction_term(
    store: &TermStore,
    signature: &Signature,
    options: &Options,
    term: TermId,
  ) -> bool {
    let shared = store.term(term);
    if !shared.is_ground() {
      return false;
    }
    let Some(symbol) = shared.symbol() else {
      return false;
    };
    let function = signature.function(symbol);
    if function.is_numeral() {
      return false;
    }
    if function.is_skolem() && function.arity() == 0 {
      return true;
    }
    options.induction_on_complex_terms && Self::term_contains_skolem(store, signature, term)
  }

  /// The distinct induction-term candidates inside a literal.
  pub fn candidate_terms(
    store: &TermStore,
    signature: &Signature,
    options: &Options,
    literal: LiteralId,
  ) -> Vec<TermId> {
    let mut result = Vec::new();
    for &arg in store.literal(literal).args.iter() {
      for (subterm, _) in store.subterms(arg) {
        if Self::is_induction_term(store, signature, options, subterm)
            && !result.contains(&subterm)
        {
          result.push(subterm);
        }
      }
    }
    result
  }

  /// Integer induction additionally restricts the term by the strictness options.
  pub fn is_integer_induction_term(
    store: &TermStore,
    signature: &Signature,
    options: &Options,
    term: TermId,
  ) -> bool {
    let Some(symbol) = store.term(term).symbol() else {
      return false;
    };
    let function = signature.function(symbol);
    if signature.sort(function.result_sort).kind != SortKind::Integer {
      return false;
    }
    match options.int_induction_strictness_term {
      IntInductionStrictnessTerm::InterpretedConstant => !function.is_numeral(),
      IntInductionStrictnessTerm::NoSkolems => {
        !function.is_numeral() && Self::term_contains_skolem(store, signature, term)
      }
    }
  }
}

// endregion

// region VacuousnessChecker

/// Static vacuousness: a schema whose context cannot be affected by any constructor case.
pub struct VacuousnessChecker;

impl VacuousnessChecker {
  pub fn is_vacuous(
    store: &TermStore,
    _signature: &Signature,
    literal: LiteralId,
    term: TermId,
  ) -> bool {
    !InductionHelper::literal_contains_term(store, literal, term)
  }
}

// endregion

// region The engine

/// One instantiated schema, for deduplication: the formula index of the original.
type FormulaKey = (LiteralId, TermId, u8);

const KIND_STRUCTURAL : u8 = 0;
const KIND_INT_UP     : u8 = 1;
const KIND_INT_DOWN   : u8 = 2;

pub struct Induction {
  term_index      : Option<RcCell<AnyIndex>>,
  comparison_index: Option<RcCell<AnyIndex>>,
  active_literals : Option<RcCell<AnyIndex>>,
  formula_index   : HashSet<FormulaKey>,
  postponement    : InductionPostponement,
}

impl Induction {
  pub fn new() -> Self {
    Induction {
      term_index      : None,
      comparison_index: None,
      active_literals : None,
      formula_index   : HashSet::new(),
      postponement    : InductionPostponement::new(),
    }
  }
}

impl Default for Induction {
  fn default() -> Self {
    Self::new()
  }
}

impl GeneratingInferenceEngine for Induction {
  fn attach(&mut self, ctx: &RunContext, indices: &mut IndexManager) {
    self.term_index = Some(indices.request(IndexType::InductionTermIndex));
    self.active_literals = Some(indices.request(IndexType::BackwardSubsumptionSubstTree));
    if ctx.options.induction.integer() {
      self.comparison_index = Some(indices.request(IndexType::UnitIntComparisonIndex));
    }
  }

  fn detach(&mut self, indices: &mut IndexManager) {
    self.term_index = None;
    self.active_literals = None;
    indices.release(IndexType::InductionTermIndex);
    indices.release(IndexType::BackwardSubsumptionSubstTree);
    if self.comparison_index.take().is_some() {
      indices.release(IndexType::UnitIntComparisonIndex);
    }
  }

  fn generate_clauses(&mut self, ctx: &RunContext, premise: ClauseId) -> Result<Vec<ClauseId>, LimitReached> {
    let mut derived = Vec::new();
    if !ctx.options.induction.enabled() {
      return Ok(derived);
    }
    ctx.check_limits(0)?;

    self.reactivate_postponed(ctx, premise, &mut derived);

    let is_induction_clause = {
      let store = ctx.terms.borrow();
      let signature = ctx.signature.borrow();
      let arena = ctx.clauses.borrow();
      InductionHelper::is_induction_clause(&store, &signature, ctx.options.as_ref(), arena.get(premise))
    };

    if is_induction_clause {
      let literals: Vec<LiteralId> = ctx.clauses.borrow().get(premise).literals.to_vec();
      for literal in literals {
        let eligible = {
          let store = ctx.terms.borrow();
          let signature = ctx.signature.borrow();
          InductionHelper::is_induction_literal(&store, &signature, literal)
        };
        if !eligible {
          continue;
        }
        let candidates = {
          let store = ctx.terms.borrow();
          let signature = ctx.signature.borrow();
          InductionHelper::candidate_terms(&store, &signature, ctx.options.as_ref(), literal)
        };
        for term in candidates {
          if ctx.options.induction.structural() {
            self.structural(ctx, premise, literal, term, &mut derived);
          }
          if ctx.options.induction.integer() {
            self.integer_from_literal(ctx, premise, literal, term, &mut derived);
          }
        }
      }
    }

    if ctx.options.induction.integer() {
      self.integer_from_bound(ctx, premise, &mut derived)?;
    }

    Ok(derived)
  }
}

impl Induction {
  // region Structural induction

  fn structural(
    &mut self,
    ctx: &RunContext,
    premise: ClauseId,
    literal: LiteralId,
    term: TermId,
    derived: &mut Vec<ClauseId>,
  ) {
    let sort_is_inductive = {
      let store = ctx.terms.borrow();
      let signature = ctx.signature.borrow();
      store
          .sort_of(&signature, term)
          .map_or(false, |sort| signature.sort(sort).is_inductive())
    };
    if !sort_is_inductive {
      return;
    }
    if !self.formula_index.insert((literal, term, KIND_STRUCTURAL)) {
      return;
    }

    {
      let store = ctx.terms.borrow();
      let signature = ctx.signature.borrow();
      if VacuousnessChecker::is_vacuous(&store, &signature, literal, term) {
        ctx.statistics.borrow_mut().vacuous_schemata += 1;
        return;
      }
    }

    match self.missing_case(ctx, literal, term) {
      Some(waiting_for) => {
        self.postponement.postpone(premise, literal, term, waiting_for);
        ctx.statistics.borrow_mut().postponed_schemata += 1;
      }
      None => {
        for occurrences in scheme::occurrence_subsets(ctx, literal, term) {
          if let Some(clauses) =
              scheme::structural_induction_clauses(ctx, premise, literal, term, occurrences.as_ref())
          {
            derived.extend(clauses);
          }
        }
      }
    }
  }

  /// Looks for a constructor case without any activating Active clause; returns the literal
  /// pattern the schema would wait for.
  fn missing_case(
    &self,
    ctx: &RunContext,
    literal: LiteralId,
    term: TermId,
  ) -> Option<(crate::core::symbol::PredicateIndex, bool)> {
    let index = self.active_literals.as_ref().expect("engine not attached").clone();
    let index_ref = index.borrow();
    let literal_index = index_ref.literals();

    let constructors: Vec<(crate::core::symbol::SymbolIndex, usize)> = {
      let store = ctx.terms.borrow();
      let signature = ctx.signature.borrow();
      let sort = store.sort_of(&signature, term)?;
      signature
          .sort(sort)
          .constructors
          .iter()
          .map(|&c| (c, signature.function(c).arity()))
          .collect()
    };

    let store = &mut *ctx.terms.borrow_mut();
    let goal = store.complement(literal);

    for (constructor, arity) in constructors {
      // Case pattern: the goal literal with the induction term replaced by c(X0 … Xn).
      let vars: Vec<TermId> = (0..arity)
          .map(|i| store.mk_variable(VariableIndex(i as u32)))
          .collect();
      let case_term = store.mk_function(constructor, &vars);
      let pattern = {
        let shared = store.literal(goal);
        let (predicate, polarity) = (shared.predicate, shared.polarity);
        let args: Vec<TermId> = shared.args.to_vec();
        let new_args: Vec<TermId> =
            args.iter().map(|&arg| store.replace_all(arg, term, case_term)).collect();
        store.mk_literal(predicate, polarity, &new_args, None)
      };

      let shared = store.literal(pattern);
      let (predicate, polarity) = (shared.predicate, shared.polarity);
      let args: Vec<TermId> = shared.args.to_vec();
      let activated = match literal_index.query(store, predicate, polarity, &args, RetrievalMode::Unifications) {
        Some(mut cursor) => cursor.next(store).is_some(),
        None => false,
      };
      if !activated {
        return Some((predicate, polarity));
      }
    }
    None
  }

  fn reactivate_postponed(&mut self, ctx: &RunContext, premise: ClauseId, derived: &mut Vec<ClauseId>) {
    let literals: Vec<LiteralId> = ctx.clauses.borrow().get(premise).literals.to_vec();
    let candidates = {
      let store = ctx.terms.borrow();
      self.postponement.reactivation_candidates(&store, &literals)
    };
    for id in candidates {
      let (scheme_premise, scheme_literal, scheme_term) = {
        let scheme = self.postponement.scheme(id);
        (scheme.premise, scheme.literal, scheme.term)
      };
      if self.missing_case(ctx, scheme_literal, scheme_term).is_some() {
        continue; // Still missing some other case.
      }
      self.postponement.settle(id, SchemeState::Active);
      ctx.statistics.borrow_mut().reactivated_schemata += 1;
      for occurrences in scheme::occurrence_subsets(ctx, scheme_literal, scheme_term) {
        if let Some(clauses) = scheme::structural_induction_clauses(
          ctx,
          scheme_premise,
          scheme_literal,
          scheme_term,
          occurrences.as_ref(),
        ) {
          derived.extend(clauses);
        }
      }
      self.postponement.settle(id, SchemeState::Exhausted);
    }
  }

  // endregion

  // region Integer induction

  fn literal_passes_strictness(&self, ctx: &RunContext, literal: LiteralId, term: TermId) -> bool {
    let store = ctx.terms.borrow();
    let signature = ctx.signature.borrow();
    let shared = store.literal(literal);

    if shared.is_equality() {
      return ctx.options.int_induction_strictness_eq == IntInductionStrictnessEq::None;
    }
    let interpreted = signature
        .predicate(shared.predicate)
        .attributes
        .contains(SymbolAttribute::Interpreted);
    if interpreted {
      return match ctx.options.int_induction_strictness_comp {
        IntInductionStrictnessComp::None => true,
        IntInductionStrictnessComp::Always => false,
        IntInductionStrictnessComp::ToplevelNotInOther => {
          let top_left  = shared.args[0] == term && !store.contains_subterm(shared.args[1], term);
          let top_right = shared.args[1] == term && !store.contains_subterm(shared.args[0], term);
          top_left || top_right
        }
      };
    }
    true
  }

  fn integer_from_literal(
    &mut self,
    ctx: &RunContext,
    premise: ClauseId,
    literal: LiteralId,
    term: TermId,
    derived: &mut Vec<ClauseId>,
  ) {
    let eligible = {
      let store = ctx.terms.borrow();
      let signature = ctx.signature.borrow();
      InductionHelper::is_integer_induction_term(&store, &signature, ctx.options.as_ref(), term)
    };
    if !eligible || !self.literal_passes_strictness(ctx, literal, term) {
      return;
    }

    let Some(comparison_index) = self.comparison_index.as_ref().map(|i| i.clone()) else {
      return;
    };

    // Lower bounds ¬(term < b) drive upward induction; upper bounds ¬(b < term) downward.
    let lower_bounds = self.find_bounds(ctx, &comparison_index, term, true);
    let upper_bounds = self.find_bounds(ctx, &comparison_index, term, false);

    let interval = ctx.options.int_induction_interval;
    for &(bound_clause, bound_term) in lower_bounds.iter() {
      if bound_clause == premise {
        continue;
      }
      self.emit_integer(
        ctx, premise, literal, term, bound_clause, bound_term, true,
        &upper_bounds, interval, derived,
      );
    }
    for &(bound_clause, bound_term) in upper_bounds.iter() {
      if bound_clause == premise {
        continue;
      }
      self.emit_integer(
        ctx, premise, literal, term, bound_clause, bound_term, false,
        &lower_bounds, interval, derived,
      );
    }
  }

  #[allow(clippy::too_many_arguments)]
  fn emit_integer(
    &mut self,
    ctx: &RunContext,
    premise: ClauseId,
    literal: LiteralId,
    term: TermId,
    bound_clause: ClauseId,
    bound_term: TermId,
    upward: bool,
    far_bounds: &[(ClauseId, TermId)],
    interval: IntInductionInterval,
    derived: &mut Vec<ClauseId>,
  ) {
    // One schema per (literal, term, direction).
    let kind = if upward { KIND_INT_UP } else { KIND_INT_DOWN };
    if !self.formula_index.insert((literal, term, kind)) {
      return;
    }

    if matches!(interval, IntInductionInterval::Infinite | IntInductionInterval::Both) {
      if let Some(clauses) = scheme::integer_induction_clauses(
        ctx, premise, literal, term, bound_clause, bound_term, upward, None,
      ) {
        derived.extend(clauses);
      }
    }
    if matches!(interval, IntInductionInterval::Finite | IntInductionInterval::Both) {
      if let Some(&(_, far_term)) = far_bounds.first() {
        if let Some(clauses) = scheme::integer_induction_clauses(
          ctx, premise, literal, term, bound_clause, bound_term, upward, Some(far_term),
        ) {
          derived.extend(clauses);
        }
      }
    }
  }

  /// Unit comparison clauses bounding `term`: `¬(term < b)` when `lower`, `¬(b < term)`
  /// otherwise.
  fn find_bounds(
    &self,
    ctx: &RunContext,
    comparison_index: &RcCell<AnyIndex>,
    term: TermId,
    lower: bool,
  ) -> Vec<(ClauseId, TermId)> {
    let index_ref = comparison_index.borrow();
    let literal_index = index_ref.literals();

    let less = {
      let mut signature = ctx.signature.borrow_mut();
      signature.integer_less()
    };

    let mut bounds = Vec::new();
    let store = &mut *ctx.terms.borrow_mut();
    let wildcard = store.mk_variable(VariableIndex(0));
    let args = if lower { [term, wildcard] } else { [wildcard, term] };

    if let Some(mut cursor) =
        literal_index.query(store, less, false, &args, RetrievalMode::Unifications)
    {
      while let Some(entry) = cursor.next(store) {
        let shared = store.literal(entry.literal);
        let (stored_term, bound_term) = if lower {
          (shared.args[0], shared.args[1])
        } else {
          (shared.args[1], shared.args[0])
        };
        // Both sides are ground; the match must be exact on the induction term.
        if stored_term == term && !bounds.iter().any(|&(c, _)| c == entry.clause) {
          bounds.push((entry.clause, bound_term));
        }
      }
    }
    bounds
  }

  /// The other pairing direction: a freshly activated unit comparison looks up induction terms
  /// already indexed and retries integer induction for their literals.
  fn integer_from_bound(
    &mut self,
    ctx: &RunContext,
    premise: ClauseId,
    derived: &mut Vec<ClauseId>,
  ) -> Result<(), LimitReached> {
    let compared: Option<Vec<TermId>> = {
      let store = ctx.terms.borrow();
      let signature = ctx.signature.borrow();
      let arena = ctx.clauses.borrow();
      let clause = arena.get(premise);
      if clause.is_unit() {
        let shared = store.literal(clause.literals[0]);
        let interpreted = signature
            .predicate(shared.predicate)
            .attributes
            .contains(SymbolAttribute::Interpreted);
        (interpreted && shared.is_negative()).then(|| shared.args.to_vec())
      } else {
        None
      }
    };
    let Some(compared) = compared else {
      return Ok(());
    };
    ctx.check_limits(0)?;

    let term_index = self.term_index.as_ref().expect("engine not attached").clone();
    let mut targets: Vec<(ClauseId, LiteralId, TermId)> = Vec::new();
    {
      let index_ref = term_index.borrow();
      let typed = index_ref.typed_terms();
      let store = &mut *ctx.terms.borrow_mut();
      let signature_sorts = ctx.signature.borrow();
      for &side in compared.iter() {
        let Some(mut cursor) = typed.query(store, &signature_sorts, RetrievalMode::Unifications, side)
        else {
          continue;
        };
        while let Some(entry) = cursor.next(store) {
          if entry.clause != premise
              && !targets.iter().any(|&(c, l, t)| (c, l, t) == (entry.clause, entry.literal, entry.term.unwrap()))
          {
            targets.push((entry.clause, entry.literal, entry.term.unwrap()));
          }
        }
      }
    }

    for (clause, literal, term) in targets {
      self.integer_from_literal(ctx, clause, literal, term, derived);
    }
    Ok(())
  }

  // endregion
}

// endregion
