/*!

The index manager: a per-run registry mapping an index kind to a reference-counted index.

`request` hands out a shared handle, creating the index on first request; `release` drops the
refcount and destroys the index at zero. Rules acquire their indices on attach and release them
on detach, so a strategy only ever pays for the indices its rules actually subscribe to.

Active-container membership events are fanned out here; an index that is created while clauses
are already Active is back-filled from the container by the saturation algorithm before the
requesting rule sees it.

*/

use sable_abs::{rc_cell, HashMap, RcCell};

use crate::core::clause::ClauseId;
use crate::core::context::RunContext;
use crate::core::saturation::containers::ContainerEvent;
use crate::core::indexing::term_index::{
  handle_clause,
  LiteralCodeIndex,
  LiteralIndex,
  TermCodeIndex,
  TermIndex,
};
use crate::core::indexing::type_substitution_tree::TypeSubstitutionTree;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum IndexType {
  BinaryResolutionSubstTree,
  BackwardSubsumptionSubstTree,
  SuperpositionSubtermSubstTree,
  SuperpositionLhsSubstTree,
  DemodulationSubtermSubstTree,
  DemodulationLhsCodeTree,
  FwSubsumptionCodeTree,
  InductionTermIndex,
  UnitIntComparisonIndex,
}

pub enum AnyIndex {
  Literals(LiteralIndex),
  Terms(TermIndex),
  TermCode(TermCodeIndex),
  LiteralCode(LiteralCodeIndex),
  TypedTerms(TypeSubstitutionTree),
}

impl AnyIndex {
  pub fn literals_mut(&mut self) -> &mut LiteralIndex {
    match self {
      AnyIndex::Literals(index) => index,
      _ => panic!("index kind mismatch: expected a literal tree"),
    }
  }

  pub fn literals(&self) -> &LiteralIndex {
    match self {
      AnyIndex::Literals(index) => index,
      _ => panic!("index kind mismatch: expected a literal tree"),
    }
  }

  pub fn terms_mut(&mut self) -> &mut TermIndex {
    match self {
      AnyIndex::Terms(index) => index,
      _ => panic!("index kind mismatch: expected a term tree"),
    }
  }

  pub fn terms(&self) -> &TermIndex {
    match self {
      AnyIndex::Terms(index) => index,
      _ => panic!("index kind mismatch: expected a term tree"),
    }
  }

  pub fn term_code_mut(&mut self) -> &mut TermCodeIndex {
    match self {
      AnyIndex::TermCode(index) => index,
      _ => panic!("index kind mismatch: expected a term code tree"),
    }
  }

  pub fn term_code(&self) -> &TermCodeIndex {
    match self {
      AnyIndex::TermCode(index) => index,
      _ => panic!("index kind mismatch: expected a term code tree"),
    }
  }

  pub fn literal_code_mut(&mut self) -> &mut LiteralCodeIndex {
    match self {
      AnyIndex::LiteralCode(index) => index,
      _ => panic!("index kind mismatch: expected a literal code tree"),
    }
  }

  pub fn literal_code(&self) -> &LiteralCodeIndex {
    match self {
      AnyIndex::LiteralCode(index) => index,
      _ => panic!("index kind mismatch: expected a literal code tree"),
    }
  }

  pub fn typed_terms_mut(&mut self) -> &mut TypeSubstitutionTree {
    match self {
      AnyIndex::TypedTerms(index) => index,
      _ => panic!("index kind mismatch: expected a type tree"),
    }
  }

  pub fn typed_terms(&self) -> &TypeSubstitutionTree {
    match self {
      AnyIndex::TypedTerms(index) => index,
      _ => panic!("index kind mismatch: expected a type tree"),
    }
  }
}

struct IndexEntry {
  index   : RcCell<AnyIndex>,
  refcount: u32,
}

#[derive(Default)]
pub struct IndexManager {
  entries: HashMap<IndexType, IndexEntry>,
}

impl IndexManager {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contains(&self, kind: IndexType) -> bool {
    self.entries.contains_key(&kind)
  }

  pub fn request(&mut self, kind: IndexType) -> RcCell<AnyIndex> {
    let entry = self.entries.entry(kind).or_insert_with(|| IndexEntry {
      index   : rc_cell(Self::create(kind)),
      refcount: 0,
    });
    entry.refcount += 1;
    entry.index.clone()
  }

  pub fn release(&mut self, kind: IndexType) {
    let remove = match self.entries.get_mut(&kind) {
      Some(entry) => {
        debug_assert!(entry.refcount > 0, "releasing an index that was never requested");
        entry.refcount -= 1;
        entry.refcount == 0
      }
      None => {
        debug_assert!(false, "releasing an unknown index");
        false
      }
    };
    if remove {
      self.entries.remove(&kind);
    }
  }

  fn create(kind: IndexType) -> AnyIndex {
    match kind {
      IndexType::BinaryResolutionSubstTree
      | IndexType::BackwardSubsumptionSubstTree
      | IndexType::UnitIntComparisonIndex => AnyIndex::Literals(LiteralIndex::new()),
      IndexType::SuperpositionSubtermSubstTree
      | IndexType::SuperpositionLhsSubstTree
      | IndexType::DemodulationSubtermSubstTree => AnyIndex::Terms(TermIndex::new()),
      IndexType::DemodulationLhsCodeTree => AnyIndex::TermCode(TermCodeIndex::new()),
      IndexType::FwSubsumptionCodeTree => AnyIndex::LiteralCode(LiteralCodeIndex::new()),
      IndexType::InductionTermIndex => AnyIndex::TypedTerms(TypeSubstitutionTree::new()),
    }
  }

  /// Fans an Active container event out to every live index. Runs synchronously: by the time
  /// the saturation algorithm issues its next query, the update has happened. Selection events
  /// carry no index work; only membership changes do.
  pub fn on_active_event(&mut self, ctx: &RunContext, clause: ClauseId, event: ContainerEvent) {
    let adding = match event {
      ContainerEvent::Added    => true,
      ContainerEvent::Removed  => false,
      ContainerEvent::Selected => return,
    };
    for (&kind, entry) in self.entries.iter() {
      handle_clause(kind, &mut entry.index.borrow_mut(), ctx, clause, adding);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn request_release_refcounting() {
    let mut manager = IndexManager::new();
    assert!(!manager.contains(IndexType::BinaryResolutionSubstTree));

    let first  = manager.request(IndexType::BinaryResolutionSubstTree);
    let second = manager.request(IndexType::BinaryResolutionSubstTree);
    assert!(manager.contains(IndexType::BinaryResolutionSubstTree));
    drop(first);
    drop(second);

    manager.release(IndexType::BinaryResolutionSubstTree);
    assert!(manager.contains(IndexType::BinaryResolutionSubstTree));
    manager.release(IndexType::BinaryResolutionSubstTree);
    assert!(!manager.contains(IndexType::BinaryResolutionSubstTree));
  }
}
