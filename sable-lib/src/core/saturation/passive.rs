/*!

The Passive clause container: a composite priority queue.

At minimum two sub-queues are kept, ordered by age and by weight, and `pop_selected` alternates
between them with the configured age/weight ratio; each sub-queue breaks ties by clause number,
which makes it FIFO within its ordering key and the rotation strictly fair. When induction is
enabled a third queue scores clauses by how much useful inductive content they carry and every
other pop is taken from it.

All sub-queues hold every passive clause; removal is lazy (a membership bitmap filters stale heap
entries on pop), so backward simplification never pays for heap surgery.

*/

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use sable_abs::{HashMap, NatSet};

use crate::api::induction::{InductionHelper, VacuousnessChecker};
use crate::core::clause::ClauseId;
use crate::core::context::RunContext;
use crate::core::term::TermId;

// Tuning constants of the induction value heuristic; they shape search, not correctness.
const NON_INDUCTION_CLAUSE_COEFF : f32 = 2.0;
const NON_INDUCTION_LITERAL_COEFF: f32 = 2.0;
const INDUCTION_TERM_DENUMERATOR : f32 = 2.0;

#[derive(Default)]
struct InductionQueue {
  heap  : BinaryHeap<Reverse<(OrderedFloat<f32>, u32, u32)>>,
  values: HashMap<ClauseId, f32>,
}

impl InductionQueue {
  /// How little non-inductive ballast the clause carries; smaller is better. Cached per clause.
  fn calculate_value(&mut self, ctx: &RunContext, id: ClauseId) -> f32 {
    if let Some(&cached) = self.values.get(&id) {
      return cached;
    }

    let store     = ctx.terms.borrow();
    let signature = ctx.signature.borrow();
    let arena     = ctx.clauses.borrow();
    let clause    = arena.get(id);

    let induction_clause =
        InductionHelper::is_induction_clause(&store, &signature, ctx.options.as_ref(), clause);
    let mut non_induction_literals = clause.len() as u32;
    let mut value = 0.0f32;

    for &literal in clause.literals.iter() {
      let shared = store.literal(literal);
      if !induction_clause || !InductionHelper::is_induction_literal(&store, &signature, literal) {
        value += shared.weight as f32;
        continue;
      }
      non_induction_literals -= 1;

      let mut occurrences: HashMap<TermId, u32> = HashMap::new();
      for &arg in shared.args.iter() {
        for (subterm, _) in store.subterms(arg) {
          if !store.term(subterm).is_function() {
            continue;
          }
          let inductable = InductionHelper::is_induction_term(&store, &signature, ctx.options.as_ref(), subterm)
              && !VacuousnessChecker::is_vacuous(&store, &signature, literal, subterm);
          if inductable {
            *occurrences.entry(subterm).or_insert(0) += 1;
          } else {
            value += 1.0;
          }
        }
      }
      for (_, n) in occurrences {
        // Repeated induction-term occurrences accrue a bonus inverse to their count.
        value += INDUCTION_TERM_DENUMERATOR.powi(-(n as i32)) * n as f32;
      }

      if shared.is_equality() {
        let lhs = store.weight(shared.args[0]) as f32;
        let rhs = store.weight(shared.args[1]) as f32;
        let ratio = if lhs > rhs { lhs / rhs } else { rhs / lhs };
        value *= ratio;
      }
    }

    if !induction_clause {
      value *= NON_INDUCTION_CLAUSE_COEFF;
    }
    if non_induction_literals > 0 {
      value *= NON_INDUCTION_LITERAL_COEFF * non_induction_literals as f32;
    }

    self.values.insert(id, value);
    value
  }

  fn insert(&mut self, ctx: &RunContext, id: ClauseId) {
    let value  = self.calculate_value(ctx, id);
    let weight = ctx.clauses.borrow().get(id).weight;
    self.heap.push(Reverse((OrderedFloat(value), weight, id.0)));
  }

  fn pop(&mut self, members: &NatSet) -> Option<ClauseId> {
    while let Some(Reverse((_, _, number))) = self.heap.pop() {
      if members.contains(number as usize) {
        return Some(ClauseId(number));
      }
    }
    None
  }
}

pub struct PassiveClauseContainer {
  age_queue   : BinaryHeap<Reverse<(u32, u32)>>,
  weight_queue: BinaryHeap<Reverse<(u32, u32)>>,
  induction   : Option<InductionQueue>,

  members: NatSet,
  size   : usize,

  ratio          : (u32, u32),
  age_credit     : u32,
  weight_credit  : u32,
  selection_count: u64,
}

impl PassiveClauseContainer {
  pub fn new(ctx: &RunContext) -> Self {
    let ratio = ctx.options.age_weight_ratio;
    let induction = ctx.options.induction.enabled().then(InductionQueue::default);
    PassiveClauseContainer {
      age_queue   : BinaryHeap::new(),
      weight_queue: BinaryHeap::new(),
      induction,
      members: NatSet::new(),
      size   : 0,
      ratio,
      age_credit   : ratio.0,
      weight_credit: ratio.1,
      selection_count: 0,
    }
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.size
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.size == 0
  }

  #[inline(always)]
  pub fn contains(&self, clause: ClauseId) -> bool {
    self.members.contains(clause.index())
  }

  pub fn add(&mut self, ctx: &RunContext, clause: ClauseId) {
    debug_assert!(!self.contains(clause), "clause already Passive");
    let (age, weight) = {
      let arena = ctx.clauses.borrow();
      let cl = arena.get(clause);
      let penalty = cl
          .extras
          .as_ref()
          .and_then(|e| e.split_set)
          .map(|_| ctx.options.split_weight_penalty)
          .unwrap_or(0);
      (cl.age, cl.weight.saturating_add(penalty))
    };
    self.members.insert(clause.index());
    self.size += 1;
    self.age_queue.push(Reverse((age, clause.0)));
    self.weight_queue.push(Reverse((weight, clause.0)));
    if let Some(induction) = self.induction.as_mut() {
      induction.insert(ctx, clause);
    }
  }

  pub fn remove(&mut self, clause: ClauseId) {
    if self.members.remove(clause.index()) {
      self.size -= 1;
    }
  }

  /// The next clause per the fairness policy. The caller moves it to Active and fires the
  /// selection event; the clause is no longer Passive when this returns.
  pub fn pop_selected(&mut self) -> Option<ClauseId> {
    if self.is_empty() {
      return None;
    }
    self.selection_count += 1;

    let from_induction = self.induction.is_some() && self.selection_count % 2 == 1;
    let selected = if from_induction {
      let members = &self.members;
      self.induction.as_mut().and_then(|q| q.pop(members))
    } else {
      self.pop_age_weight()
    };
    let selected = selected.or_else(|| self.pop_age_weight())?;

    self.members.remove(selected.index());
    self.size -= 1;
    Some(selected)
  }

  fn pop_age_weight(&mut self) -> Option<ClauseId> {
    if self.age_credit == 0 && self.weight_credit == 0 {
      self.age_credit    = self.ratio.0;
      self.weight_credit = self.ratio.1;
    }

    let use_age = if self.age_credit > 0 {
      true
    } else {
      self.weight_credit == 0
    };

    let members = &self.members;
    let popped = if use_age {
      let result = pop_live(&mut self.age_queue, members);
      if result.is_some() && self.age_credit > 0 {
        self.age_credit -= 1;
      }
      result.or_else(|| pop_live(&mut self.weight_queue, members))
    } else {
      let result = pop_live(&mut self.weight_queue, members);
      if result.is_some() && self.weight_credit > 0 {
        self.weight_credit -= 1;
      }
      result.or_else(|| pop_live(&mut self.age_queue, members))
    };
    popped
  }
}

fn pop_live(heap: &mut BinaryHeap<Reverse<(u32, u32)>>, members: &NatSet) -> Option<ClauseId> {
  while let Some(Reverse((_, number))) = heap.pop() {
    if members.contains(number as usize) {
      return Some(ClauseId(number));
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::inference::Inference;
  use crate::core::options::Options;
  use crate::core::symbol::Signature;
  use crate::core::term::TermBuilder;
  use sable_abs::IString;

  fn context_with_clauses(count: u32) -> (RunContext, Vec<ClauseId>) {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    let p = signature.add_predicate(IString::from("p"), &[sort]);
    let f = signature.add_function(IString::from("f"), &[sort], sort);
    let a = signature.add_constant(IString::from("a"), sort);
    let ctx = RunContext::new(signature, Options::default());

    let mut ids = Vec::new();
    for i in 0..count {
      let literal = {
        let store = &mut *ctx.terms.borrow_mut();
        // Deeper terms for younger clauses: the age and weight orders disagree.
        let mut term = store.share(&TermBuilder::constant(a));
        for _ in 0..(count - i) {
          term = store.mk_function(f, &[term]);
        }
        store.mk_literal(p, i % 2 == 0, &[term], None)
      };
      let id = ctx.clauses.borrow_mut().create(
        &ctx.terms.borrow(),
        &[literal],
        Inference::input(),
        i,
      );
      ids.push(id);
    }
    (ctx, ids)
  }

  #[test]
  fn every_clause_is_eventually_selected() {
    let (ctx, ids) = context_with_clauses(24);
    let mut passive = PassiveClauseContainer::new(&ctx);
    for &id in &ids {
      passive.add(&ctx, id);
    }

    let mut seen = NatSet::new();
    while let Some(selected) = passive.pop_selected() {
      assert!(seen.insert(selected.index()), "clause selected twice");
    }
    assert_eq!(seen.len(), ids.len());
    assert!(passive.is_empty());
  }

  #[test]
  fn removal_hides_clauses_from_selection() {
    let (ctx, ids) = context_with_clauses(6);
    let mut passive = PassiveClauseContainer::new(&ctx);
    for &id in &ids {
      passive.add(&ctx, id);
    }
    passive.remove(ids[0]);
    passive.remove(ids[3]);

    let mut selected = Vec::new();
    while let Some(s) = passive.pop_selected() {
      selected.push(s);
    }
    assert_eq!(selected.len(), 4);
    assert!(!selected.contains(&ids[0]));
    assert!(!selected.contains(&ids[3]));
  }
}
