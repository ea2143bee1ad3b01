/*!

The run context: the shared resources of one saturation run, threaded explicitly through every
component instead of living in process-wide singletons. Tests instantiate a fresh context per
scenario.

All members are reference-counted cells because the core is single-threaded cooperative; clones
of the context are cheap handles onto the same run.

*/

use std::rc::Rc;

use sable_abs::{rc_cell, RcCell};

use crate::core::clause::{ClauseArena, ClauseId};
use crate::core::inference::{Inference, InferenceRule};
use crate::core::literal::LiteralId;
use crate::core::options::{Options, OrderingChoice};
use crate::core::ordering::{KnuthBendixOrdering, LexicographicPathOrdering, SimplificationOrdering};
use crate::core::saturation::limits::{LimitReached, Limits};
use crate::core::statistics::Statistics;
use crate::core::symbol::Signature;
use crate::core::term::TermStore;

#[derive(Clone)]
pub struct RunContext {
  pub terms     : RcCell<TermStore>,
  pub signature : RcCell<Signature>,
  pub clauses   : RcCell<ClauseArena>,
  pub options   : Rc<Options>,
  pub statistics: RcCell<Statistics>,
  pub ordering  : Rc<dyn SimplificationOrdering>,
  pub limits    : Rc<Limits>,
}

impl RunContext {
  pub fn new(signature: Signature, options: Options) -> Self {
    let limits    = Rc::new(Limits::new(&options));
    let signature = rc_cell(signature);
    let ordering: Rc<dyn SimplificationOrdering> = match options.ordering {
      OrderingChoice::Kbo => Rc::new(KnuthBendixOrdering::new(signature.clone())),
      OrderingChoice::Lpo => Rc::new(LexicographicPathOrdering::new(signature.clone())),
    };
    RunContext {
      terms     : rc_cell(TermStore::new()),
      signature,
      clauses   : rc_cell(ClauseArena::new()),
      options   : Rc::new(options),
      statistics: rc_cell(Statistics::default()),
      ordering,
      limits,
    }
  }

  /// Allocates a derived clause; age is one past the oldest parent.
  pub fn derive_clause(
    &self,
    rule: InferenceRule,
    parents: &[ClauseId],
    literals: &[LiteralId],
  ) -> ClauseId {
    let age = {
      let arena = self.clauses.borrow();
      parents
          .iter()
          .map(|&p| arena.get(p).age)
          .max()
          .map(|a| a + 1)
          .unwrap_or(0)
    };
    let id = self.clauses.borrow_mut().create(
      &self.terms.borrow(),
      literals,
      Inference::new(rule, parents),
      age,
    );
    if rule != InferenceRule::Input {
      self.statistics.borrow_mut().generated_clauses += 1;
    }
    id
  }

  /// The cooperative limit checkpoint; see `saturation::limits`.
  pub fn check_limits(&self, unprocessed: usize) -> Result<(), LimitReached> {
    self.limits.check(
      self.terms.borrow().term_count(),
      self.clauses.borrow().len(),
      unprocessed,
    )
  }
}
