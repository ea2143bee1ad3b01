/*!

Role-specific indices over the shared indexing structures, and the policies that keep them in
sync with the Active container.

Each index specialises a structure (substitution tree, code tree, type tree) to the part of a
clause its rule subscribes to: selected literals for resolution, oriented equation sides for
superposition and demodulation, every subterm for backward demodulation, and so on. The policies
run on the Active container's added/removed events, and removal recomputes exactly the insertion
set: a clause's literal array and selection are frozen while it sits in Active, so the two
passes always agree.

*/

use sable_abs::{HashMap, HashSet};

use crate::core::clause::ClauseId;
use crate::core::context::RunContext;
use crate::core::indexing::code_tree::{CodeCursor, CodeTree};
use crate::core::indexing::substitution_tree::{QueryCursor, RetrievalMode, SubstitutionTree};
use crate::core::literal::LiteralId;
use crate::core::ordering::SimplificationOrdering;
use crate::core::symbol::PredicateIndex;
use crate::core::term::{ArgumentOrder, TermId, TermStore};

// region Concrete index types

/// Whole-term substitution tree index.
#[derive(Default)]
pub struct TermIndex {
  tree: Option<SubstitutionTree>,
}

impl TermIndex {
  pub fn new() -> Self {
    Self::default()
  }

  fn tree_mut(&mut self) -> &mut SubstitutionTree {
    self.tree.get_or_insert_with(|| SubstitutionTree::new(1))
  }

  pub fn insert(
    &mut self,
    store: &mut TermStore,
    term: TermId,
    literal: LiteralId,
    clause: ClauseId,
    extra: Option<TermId>,
  ) {
    self.tree_mut().insert(store, &[term], Some(term), literal, clause, extra);
  }

  pub fn remove(&mut self, store: &mut TermStore, term: TermId, literal: LiteralId, clause: ClauseId) {
    self.tree_mut().remove(store, &[term], Some(term), literal, clause);
  }

  pub fn query(
    &self,
    store: &mut TermStore,
    mode: RetrievalMode,
    query: TermId,
  ) -> Option<QueryCursor<'_>> {
    self.tree.as_ref().map(|tree| tree.query(store, mode, &[query]))
  }

  pub fn is_empty(&self) -> bool {
    self.tree.as_ref().map_or(true, |t| t.is_empty())
  }
}

/// Literal index: one substitution tree per (predicate, polarity) bucket, over argument lists.
#[derive(Default)]
pub struct LiteralIndex {
  trees: HashMap<(PredicateIndex, bool), SubstitutionTree>,
}

impl LiteralIndex {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, store: &mut TermStore, literal: LiteralId, clause: ClauseId) {
    let shared = store.literal(literal);
    let key  = (shared.predicate, shared.polarity);
    let args: Vec<TermId> = shared.args.to_vec();
    self.trees
        .entry(key)
        .or_insert_with(|| SubstitutionTree::new(args.len()))
        .insert(store, &args, None, literal, clause, None);
  }

  pub fn remove(&mut self, store: &mut TermStore, literal: LiteralId, clause: ClauseId) {
    let shared = store.literal(literal);
    let key  = (shared.predicate, shared.polarity);
    let args: Vec<TermId> = shared.args.to_vec();
    match self.trees.get_mut(&key) {
      Some(tree) => tree.remove(store, &args, None, literal, clause),
      None => debug_assert!(false, "removing a literal that was never indexed"),
    }
  }

  /// Retrieval against literals of the given predicate and polarity.
  pub fn query(
    &self,
    store: &mut TermStore,
    predicate: PredicateIndex,
    polarity: bool,
    args: &[TermId],
    mode: RetrievalMode,
  ) -> Option<QueryCursor<'_>> {
    self.trees
        .get(&(predicate, polarity))
        .map(|tree| tree.query(store, mode, args))
  }

  /// Retrieval of complementary literals for the resolution rules.
  pub fn query_complement(
    &self,
    store: &mut TermStore,
    literal: LiteralId,
    mode: RetrievalMode,
  ) -> Option<QueryCursor<'_>> {
    let shared = store.literal(literal);
    let (predicate, polarity) = (shared.predicate, shared.polarity);
    let args: Vec<TermId> = shared.args.to_vec();
    self.query(store, predicate, !polarity, &args, mode)
  }
}

/// Code tree over whole terms; forward demodulation's left-hand-side index.
#[derive(Default)]
pub struct TermCodeIndex {
  code: CodeTree,
}

impl TermCodeIndex {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(
    &mut self,
    store: &mut TermStore,
    term: TermId,
    literal: LiteralId,
    clause: ClauseId,
    rhs: Option<TermId>,
  ) {
    self.code.insert(store, &[term], Some(term), literal, clause, rhs);
  }

  pub fn remove(&mut self, store: &mut TermStore, term: TermId, literal: LiteralId, clause: ClauseId) {
    self.code.remove(store, &[term], Some(term), literal, clause);
  }

  pub fn retrieve_generalizations(&self, store: &TermStore, query: TermId) -> CodeCursor<'_> {
    self.code.retrieve_generalizations(store, &[query])
  }

  pub fn is_empty(&self) -> bool {
    self.code.is_empty()
  }
}

/// Code trees per (predicate, polarity); forward subsumption's candidate generator.
#[derive(Default)]
pub struct LiteralCodeIndex {
  trees: HashMap<(PredicateIndex, bool), CodeTree>,
}

impl LiteralCodeIndex {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, store: &mut TermStore, literal: LiteralId, clause: ClauseId) {
    let shared = store.literal(literal);
    let key  = (shared.predicate, shared.polarity);
    let args: Vec<TermId> = shared.args.to_vec();
    self.trees
        .entry(key)
        .or_insert_with(CodeTree::new)
        .insert(store, &args, None, literal, clause, None);
  }

  pub fn remove(&mut self, store: &mut TermStore, literal: LiteralId, clause: ClauseId) {
    let shared = store.literal(literal);
    let key  = (shared.predicate, shared.polarity);
    let args: Vec<TermId> = shared.args.to_vec();
    match self.trees.get_mut(&key) {
      Some(tree) => tree.remove(store, &args, None, literal, clause),
      None => debug_assert!(false, "removing a literal that was never indexed"),
    }
  }

  /// Stored literals generalising the query literal (same predicate and polarity).
  pub fn retrieve_generalizations(
    &self,
    store: &TermStore,
    literal: LiteralId,
  ) -> Option<CodeCursor<'_>> {
    let shared = store.literal(literal);
    let key  = (shared.predicate, shared.polarity);
    let args: Vec<TermId> = shared.args.to_vec();
    self.trees.get(&key).map(|tree| tree.retrieve_generalizations(store, &args))
  }
}

// endregion

// region Subterm enumeration shared by superposition and the subterm indices

/// The non-variable subterms of a literal that a rewriting step may target. For a positive
/// oriented equality only the larger side is rewritable; everything else exposes all argument
/// subterms.
pub fn rewritable_subterms(
  store: &TermStore,
  ordering: &dyn SimplificationOrdering,
  literal: LiteralId,
) -> Vec<TermId> {
  let shared = store.literal(literal);
  let mut roots: Vec<TermId> = Vec::new();

  if shared.is_equality() && shared.is_positive() {
    match ordering.equality_argument_order(store, literal) {
      ArgumentOrder::Greater => roots.push(shared.args[0]),
      ArgumentOrder::Less    => roots.push(shared.args[1]),
      _ => roots.extend(shared.args.iter().copied()),
    }
  } else {
    roots.extend(shared.args.iter().copied());
  }

  let mut seen = HashSet::new();
  let mut result = Vec::new();
  for root in roots {
    for (subterm, _) in store.subterms(root) {
      if store.term(subterm).is_function() && seen.insert(subterm) {
        result.push(subterm);
      }
    }
  }
  result
}

/// The sides of a positive equality usable as superposition/demodulation left-hand sides,
/// paired with the respective other side.
pub fn equation_lhs_candidates(
  store: &TermStore,
  ordering: &dyn SimplificationOrdering,
  literal: LiteralId,
) -> Vec<(TermId, TermId)> {
  let shared = store.literal(literal);
  debug_assert!(shared.is_equality() && shared.is_positive());
  let (s, t) = (shared.args[0], shared.args[1]);
  match ordering.equality_argument_order(store, literal) {
    ArgumentOrder::Greater => vec![(s, t)],
    ArgumentOrder::Less    => vec![(t, s)],
    ArgumentOrder::Equal   => Vec::new(),
    _ => {
      // Unoriented: either side may become largest after instantiation; a variable side never
      // heads a rewrite.
      let mut sides = Vec::new();
      if store.term(s).is_function() {
        sides.push((s, t));
      }
      if store.term(t).is_function() {
        sides.push((t, s));
      }
      sides
    }
  }
}

// endregion

// region Active-event policies

use crate::core::indexing::index_manager::{AnyIndex, IndexType};

pub fn handle_clause(kind: IndexType, index: &mut AnyIndex, ctx: &RunContext, clause: ClauseId, adding: bool) {
  match kind {
    IndexType::BinaryResolutionSubstTree => {
      let literals = selected_non_equality_literals(ctx, clause);
      let index = index.literals_mut();
      let store = &mut *ctx.terms.borrow_mut();
      for literal in literals {
        if adding {
          index.insert(store, literal, clause);
        } else {
          index.remove(store, literal, clause);
        }
      }
    }
    IndexType::BackwardSubsumptionSubstTree => {
      let literals: Vec<LiteralId> = ctx.clauses.borrow().get(clause).literals.to_vec();
      let index = index.literals_mut();
      let store = &mut *ctx.terms.borrow_mut();
      for literal in literals {
        if adding {
          index.insert(store, literal, clause);
        } else {
          index.remove(store, literal, clause);
        }
      }
    }
    IndexType::SuperpositionSubtermSubstTree => {
      let pairs = {
        let store = &*ctx.terms.borrow();
        let arena = ctx.clauses.borrow();
        let mut pairs = Vec::new();
        for &literal in arena.get(clause).selected_literals() {
          for term in rewritable_subterms(store, ctx.ordering.as_ref(), literal) {
            pairs.push((term, literal));
          }
        }
        pairs
      };
      let index = index.terms_mut();
      let store = &mut *ctx.terms.borrow_mut();
      for (term, literal) in pairs {
        if adding {
          index.insert(store, term, literal, clause, None);
        } else {
          index.remove(store, term, literal, clause);
        }
      }
    }
    IndexType::SuperpositionLhsSubstTree => {
      let sides = positive_equality_lhs_sides(ctx, clause, true);
      let index = index.terms_mut();
      let store = &mut *ctx.terms.borrow_mut();
      for (lhs, rhs, literal) in sides {
        if adding {
          index.insert(store, lhs, literal, clause, Some(rhs));
        } else {
          index.remove(store, lhs, literal, clause);
        }
      }
    }
    IndexType::DemodulationSubtermSubstTree => {
      let pairs = {
        let store = &*ctx.terms.borrow();
        let arena = ctx.clauses.borrow();
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for &literal in arena.get(clause).literals.iter() {
          for &arg in store.literal(literal).args.iter() {
            for (subterm, _) in store.subterms(arg) {
              if store.term(subterm).is_function() && seen.insert((subterm, literal)) {
                pairs.push((subterm, literal));
              }
            }
          }
        }
        pairs
      };
      let index = index.terms_mut();
      let store = &mut *ctx.terms.borrow_mut();
      for (term, literal) in pairs {
        if adding {
          index.insert(store, term, literal, clause, None);
        } else {
          index.remove(store, term, literal, clause);
        }
      }
    }
    IndexType::DemodulationLhsCodeTree => {
      let sides = unit_equation_lhs_sides(ctx, clause);
      let index = index.term_code_mut();
      let store = &mut *ctx.terms.borrow_mut();
      for (lhs, rhs, literal) in sides {
        if adding {
          index.insert(store, lhs, literal, clause, Some(rhs));
        } else {
          index.remove(store, lhs, literal, clause);
        }
      }
    }
    IndexType::FwSubsumptionCodeTree => {
      let literals: Vec<LiteralId> = ctx.clauses.borrow().get(clause).literals.to_vec();
      let index = index.literal_code_mut();
      let store = &mut *ctx.terms.borrow_mut();
      for literal in literals {
        if adding {
          index.insert(store, literal, clause);
        } else {
          index.remove(store, literal, clause);
        }
      }
    }
    IndexType::InductionTermIndex => {
      let pairs = {
        let store = &*ctx.terms.borrow();
        let signature = &*ctx.signature.borrow();
        let arena = ctx.clauses.borrow();
        let cl = arena.get(clause);
        let mut pairs = Vec::new();
        if crate::api::induction::InductionHelper::is_induction_clause(store, signature, ctx.options.as_ref(), cl) {
          for &literal in cl.literals.iter() {
            for term in crate::api::induction::InductionHelper::candidate_terms(
              store, signature, ctx.options.as_ref(), literal,
            ) {
              pairs.push((term, literal));
            }
          }
        }
        pairs
      };
      let index = index.typed_terms_mut();
      let store = &mut *ctx.terms.borrow_mut();
      let signature = &*ctx.signature.borrow();
      for (term, literal) in pairs {
        if adding {
          index.insert(store, signature, term, literal, clause);
        } else {
          index.remove(store, signature, term, literal, clause);
        }
      }
    }
    IndexType::UnitIntComparisonIndex => {
      let literal = {
        let store = &*ctx.terms.borrow();
        let signature = &*ctx.signature.borrow();
        let arena = ctx.clauses.borrow();
        let cl = arena.get(clause);
        if cl.is_unit() {
          let lit = cl.literals[0];
          let shared = store.literal(lit);
          let interpreted_less = signature
              .predicate(shared.predicate)
              .attributes
              .contains(crate::core::symbol::SymbolAttribute::Interpreted);
          interpreted_less.then_some(lit)
        } else {
          None
        }
      };
      if let Some(literal) = literal {
        let index = index.literals_mut();
        let store = &mut *ctx.terms.borrow_mut();
        if adding {
          index.insert(store, literal, clause);
        } else {
          index.remove(store, literal, clause);
        }
      }
    }
  }
}

fn selected_non_equality_literals(ctx: &RunContext, clause: ClauseId) -> Vec<LiteralId> {
  let store = ctx.terms.borrow();
  let arena = ctx.clauses.borrow();
  arena
      .get(clause)
      .selected_literals()
      .iter()
      .copied()
      .filter(|&l| !store.literal(l).is_equality())
      .collect()
}

fn positive_equality_lhs_sides(
  ctx: &RunContext,
  clause: ClauseId,
  selected_only: bool,
) -> Vec<(TermId, TermId, LiteralId)> {
  let store = &*ctx.terms.borrow();
  let arena = ctx.clauses.borrow();
  let cl = arena.get(clause);
  let literals = if selected_only { cl.selected_literals() } else { cl.literals.as_slice() };

  let mut sides = Vec::new();
  for &literal in literals {
    let shared = store.literal(literal);
    if shared.is_equality() && shared.is_positive() {
      for (lhs, rhs) in equation_lhs_candidates(store, ctx.ordering.as_ref(), literal) {
        sides.push((lhs, rhs, literal));
      }
    }
  }
  sides
}

fn unit_equation_lhs_sides(ctx: &RunContext, clause: ClauseId) -> Vec<(TermId, TermId, LiteralId)> {
  let is_unit_equation = {
    let store = ctx.terms.borrow();
    let arena = ctx.clauses.borrow();
    let cl = arena.get(clause);
    cl.is_unit() && {
      let shared = store.literal(cl.literals[0]);
      shared.is_equality() && shared.is_positive()
    }
  };
  if is_unit_equation {
    positive_equality_lhs_sides(ctx, clause, false)
  } else {
    Vec::new()
  }
}

// endregion
