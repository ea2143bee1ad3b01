/*!

A sort-discriminating wrapper over substitution trees.

When the signature is polymorphic the result sorts of two terms must unify before term
unification can be attempted at all; in the monomorphic core this degenerates to sort equality,
so entries are bucketed per result sort and a query only ever descends into its own sort's tree.
Entries whose sort is a variable (the fully polymorphic case) cannot be bucketed; they are kept
in a side skip list that every query consults entry by entry.

*/

use sable_abs::HashMap;

use crate::core::clause::ClauseId;
use crate::core::indexing::skip_list::SkipList;
use crate::core::indexing::substitution_tree::{LeafEntry, QueryCursor, RetrievalMode, SubstitutionTree};
use crate::core::literal::LiteralId;
use crate::core::sort::SortId;
use crate::core::symbol::Signature;
use crate::core::term::{TermId, TermStore};

pub struct TypeSubstitutionTree {
  by_sort   : HashMap<SortId, SubstitutionTree>,
  var_sorted: SkipList<LeafEntry>,
}

impl Default for TypeSubstitutionTree {
  fn default() -> Self {
    TypeSubstitutionTree {
      by_sort   : HashMap::new(),
      var_sorted: SkipList::new(),
    }
  }
}

impl TypeSubstitutionTree {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.var_sorted.is_empty() && self.by_sort.values().all(|t| t.is_empty())
  }

  pub fn insert(
    &mut self,
    store: &mut TermStore,
    signature: &Signature,
    term: TermId,
    literal: LiteralId,
    clause: ClauseId,
  ) {
    match store.sort_of(signature, term) {
      Some(sort) => {
        self.by_sort
            .entry(sort)
            .or_insert_with(|| SubstitutionTree::new(1))
            .insert(store, &[term], Some(term), literal, clause, None);
      }
      None => {
        self.var_sorted.insert(LeafEntry {
          term    : Some(term),
          literal,
          clause,
          extra   : None,
          renaming: Default::default(),
        });
      }
    }
  }

  pub fn remove(
    &mut self,
    store: &mut TermStore,
    signature: &Signature,
    term: TermId,
    literal: LiteralId,
    clause: ClauseId,
  ) {
    match store.sort_of(signature, term) {
      Some(sort) => {
        if let Some(tree) = self.by_sort.get_mut(&sort) {
          tree.remove(store, &[term], Some(term), literal, clause);
        } else {
          debug_assert!(false, "removing from a sort bucket that was never created");
        }
      }
      None => {
        self.var_sorted.remove(&LeafEntry {
          term    : Some(term),
          literal,
          clause,
          extra   : None,
          renaming: Default::default(),
        });
      }
    }
  }

  /// Retrieval within the query's sort bucket. `None` when no entry of that sort exists.
  pub fn query(
    &self,
    store: &mut TermStore,
    signature: &Signature,
    mode: RetrievalMode,
    query: TermId,
  ) -> Option<QueryCursor<'_>> {
    let sort = store.sort_of(signature, query)?;
    let tree = self.by_sort.get(&sort)?;
    Some(tree.query(store, mode, &[query]))
  }

  /// The variable-sorted side entries, matched per entry by the caller since their sorts only
  /// resolve during unification.
  pub fn side_entries(&self) -> impl Iterator<Item = &LeafEntry> {
    self.var_sorted.iter()
  }
}
