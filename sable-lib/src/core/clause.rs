/*!

Clauses and the clause arena.

A clause owns an ordered array of literal ids (multiset semantics, ordered storage for indexing
stability), its provenance, a store state tracking which container currently holds it, and
counters. Clauses are arena-allocated and survive until the end of the run so that the derivation
DAG can always be reconstructed; `Removed` marks logical deletion.

The optional extras record carries data only a minority of clauses need: the split-set id handed
over by the splitter, induction bookkeeping, and the rewrite-depth bound used by induction
hypothesis rewriting.

*/

use std::fmt::{Display, Formatter};

use sable_abs::{join_iter, NatSet, SmallVec};

use crate::core::inference::Inference;
use crate::core::literal::LiteralId;
use crate::core::symbol::Signature;
use crate::core::term::{TermId, TermStore};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ClauseId(pub(crate) u32);

impl ClauseId {
  #[inline(always)]
  pub fn index(self) -> usize {
    self.0 as usize
  }

  #[inline(always)]
  pub fn number(self) -> u32 {
    self.0
  }
}

impl Display for ClauseId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "C{}", self.0)
  }
}

/// Which container currently holds the clause. The store field and actual membership always
/// agree; transitions fire the container events that keep indices in sync.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ClauseStore {
  Unprocessed,
  Passive,
  Active,
  Removed,
}

/// Induction bookkeeping attached to clauses produced by the induction engines.
#[derive(Clone, Debug, Default)]
pub struct InductionInfo {
  /// The clause is an induction hypothesis (step-case antecedent).
  pub hypothesis: bool,
  /// The term that was inducted on.
  pub induction_term: Option<TermId>,
}

#[derive(Clone, Debug, Default)]
pub struct ClauseExtras {
  /// Identifier of the split branch this clause belongs to, if the splitter produced it.
  pub split_set: Option<u32>,
  pub induction: Option<InductionInfo>,
  /// How many hypothesis-rewriting steps this clause is still allowed to take.
  pub rewrite_bound: u32,
  /// Set when a rewriting step discovered the clause is redundant.
  pub rewriting_redundant: bool,
}

pub struct Clause {
  pub literals : SmallVec<[LiteralId; 4]>,
  pub inference: Inference,
  pub store    : ClauseStore,
  pub age      : u32,
  pub weight   : u32,
  /// The first `selected` literals of `literals` are the selected ones. Zero means selection has
  /// not run yet (all literals participate).
  pub selected : u32,
  pub number   : ClauseId,
  pub extras   : Option<Box<ClauseExtras>>,
}

impl Clause {
  #[inline(always)]
  pub fn len(&self) -> usize {
    self.literals.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.literals.is_empty()
  }

  #[inline(always)]
  pub fn is_unit(&self) -> bool {
    self.literals.len() == 1
  }

  /// The literals inferences may select on: the selected prefix, or everything before selection
  /// has run.
  #[inline(always)]
  pub fn selected_literals(&self) -> &[LiteralId] {
    if self.selected == 0 {
      &self.literals
    } else {
      &self.literals[..self.selected as usize]
    }
  }

  pub fn is_induction_hypothesis(&self) -> bool {
    self.extras
        .as_ref()
        .and_then(|e| e.induction.as_ref())
        .map(|i| i.hypothesis)
        .unwrap_or(false)
  }

  pub fn rewrite_bound(&self) -> u32 {
    self.extras.as_ref().map(|e| e.rewrite_bound).unwrap_or(0)
  }

  pub fn extras_mut(&mut self) -> &mut ClauseExtras {
    self.extras.get_or_insert_with(Default::default)
  }
}

#[derive(Default)]
pub struct ClauseArena {
  clauses: Vec<Clause>,
}

impl ClauseArena {
  pub fn new() -> Self {
    Self::default()
  }

  /// Allocates a clause in the `Unprocessed` store. Weight is the sum of literal weights; a
  /// penalty for the split-set size is added by the passive container when configured.
  pub fn create(
    &mut self,
    store: &TermStore,
    literals: &[LiteralId],
    inference: Inference,
    age: u32,
  ) -> ClauseId {
    let number = ClauseId(self.clauses.len() as u32);
    let weight = literals
        .iter()
        .map(|&l| store.literal(l).weight)
        .fold(0u32, |acc, w| acc.saturating_add(w));
    self.clauses.push(Clause {
      literals: SmallVec::from_slice(literals),
      inference,
      store: ClauseStore::Unprocessed,
      age,
      weight,
      selected: 0,
      number,
      extras: None,
    });
    number
  }

  #[inline(always)]
  pub fn get(&self, id: ClauseId) -> &Clause {
    &self.clauses[id.index()]
  }

  #[inline(always)]
  pub fn get_mut(&mut self, id: ClauseId) -> &mut Clause {
    &mut self.clauses[id.index()]
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.clauses.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.clauses.is_empty()
  }

  /// The set of distinct variables occurring in the clause.
  pub fn variable_set(&self, store: &TermStore, id: ClauseId) -> NatSet {
    let mut set = NatSet::new();
    for &literal in self.get(id).literals.iter() {
      for &arg in store.literal(literal).args.iter() {
        store.collect_variables(arg, &mut set);
      }
    }
    set
  }

  pub fn display<'s>(
    &'s self,
    store: &'s TermStore,
    signature: &'s Signature,
    id: ClauseId,
  ) -> ClauseDisplay<'s> {
    ClauseDisplay { arena: self, store, signature, id }
  }
}

pub struct ClauseDisplay<'s> {
  arena    : &'s ClauseArena,
  store    : &'s TermStore,
  signature: &'s Signature,
  id       : ClauseId,
}

impl Display for ClauseDisplay<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let clause = self.arena.get(self.id);
    if clause.is_empty() {
      return write!(f, "$false");
    }
    let rendered = join_iter(
      clause.literals.iter().map(|&l| self.store.display_literal(self.signature, l)),
      " | ",
    );
    write!(f, "{}", rendered)
  }
}
