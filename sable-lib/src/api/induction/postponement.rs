/*!

Induction postponement.

A structural schema can only make progress if every constructor case has an activating clause:
something for the base and step literals to resolve against. A schema whose cases are not all
present yet is parked here, keyed in a reverse-lookup registry by the literal pattern of the
missing cases; every newly activated clause is checked against the registry and matching
schemata are handed back to the induction engine for another readiness check.

The registry is an auxiliary store on purpose: the main indices never see postponed schemata.

*/

use sable_abs::HashMap;

use crate::core::clause::ClauseId;
use crate::core::literal::LiteralId;
use crate::core::symbol::PredicateIndex;
use crate::core::term::{TermId, TermStore};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SchemeState {
  Unseen,
  Postponed,
  Active,
  Exhausted,
  Vacuous,
}

pub struct PostponedScheme {
  pub premise: ClauseId,
  pub literal: LiteralId,
  pub term   : TermId,
  pub state  : SchemeState,
}

#[derive(Default)]
pub struct InductionPostponement {
  schemes: Vec<PostponedScheme>,
  /// (predicate, polarity) of a missing case literal → schemata waiting for it.
  pending: HashMap<(PredicateIndex, bool), Vec<usize>>,
}

impl InductionPostponement {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.schemes.len()
  }

  pub fn scheme(&self, id: usize) -> &PostponedScheme {
    &self.schemes[id]
  }

  /// Parks a schema until a clause with the given case-literal pattern arrives.
  pub fn postpone(
    &mut self,
    premise: ClauseId,
    literal: LiteralId,
    term: TermId,
    waiting_for: (PredicateIndex, bool),
  ) -> usize {
    let id = self.schemes.len();
    self.schemes.push(PostponedScheme {
      premise,
      literal,
      term,
      state: SchemeState::Postponed,
    });
    self.pending.entry(waiting_for).or_default().push(id);
    id
  }

  /// Schemata whose missing-case pattern matches one of the clause's literals. They stay
  /// registered until the caller settles them.
  pub fn reactivation_candidates(&self, store: &TermStore, literals: &[LiteralId]) -> Vec<usize> {
    let mut result = Vec::new();
    for &literal in literals {
      let shared = store.literal(literal);
      if let Some(waiting) = self.pending.get(&(shared.predicate, shared.polarity)) {
        for &id in waiting {
          if self.schemes[id].state == SchemeState::Postponed && !result.contains(&id) {
            result.push(id);
          }
        }
      }
    }
    result
  }

  pub fn settle(&mut self, id: usize, state: SchemeState) {
    debug_assert!(matches!(state, SchemeState::Active | SchemeState::Exhausted | SchemeState::Vacuous));
    self.schemes[id].state = state;
  }
}
