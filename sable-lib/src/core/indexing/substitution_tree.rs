/*!

Substitution trees: the primary term indexing structure.

A stored term is normalised (variables renamed to 0, 1, 2, … in first-occurrence order) and then
flattened into a sequence of *special-variable → subterm* bindings: special variable `S0` … is
bound to a one-level term whose arguments are fresh special variables, breadth-first, so the k-th
element of the sequence is the binding of `Sk`. The tree is the trie of these binding sequences
(nodes with the same one-level binding share a representative, which is first-argument
discrimination) and each maximal path ends in a leaf holding a skip list of clause-tagged
entries, ordered by clause number for determinism.

Retrieval walks the trie with a backtracking worker that materialises partial substitutions in a
`RobSubstitution`: the query is loaded into the top specials, and each visited node extends the
substitution by unifying (or matching, depending on retrieval mode) the node's special variable
against its binding. Tree-side terms live in a dedicated bank so that stored and query variables
can never collide; when a leaf is reached, the entry's recorded renaming is *denormalised* into
the substitution so consumers can apply it to the owning clause's original literals.

The result substitution is live: it is valid exactly until the next `next()` call on the cursor.
Consumers must materialise whatever they need before advancing.

*/

use std::cmp::Ordering;
use std::collections::VecDeque;

use sable_abs::SmallVec;

use crate::core::clause::ClauseId;
use crate::core::indexing::skip_list::SkipList;
use crate::core::literal::LiteralId;
use crate::core::substitution::{BankIndex, Renaming, RobSubstitution};
use crate::core::term::{TermData, TermId, TermStore, VariableIndex};

/// The bank in which the tree's normalised variables (and bindings of tree specials) live.
pub const NORM_BANK: BankIndex = BankIndex(2);

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RetrievalMode {
  Unifications,
  Generalizations,
  Instances,
}

/// One indexed occurrence: the indexed term (absent for whole-literal entries), its owning
/// literal, its owning clause, and an extra term slot (the demodulation indices stash the
/// equation's other side there).
#[derive(Clone, Debug)]
pub struct LeafEntry {
  pub term   : Option<TermId>,
  pub literal: LiteralId,
  pub clause : ClauseId,
  pub extra  : Option<TermId>,
  /// original variable → normalised variable, inverted into the substitution at yield time.
  pub(crate) renaming: SmallVec<[(VariableIndex, VariableIndex); 4]>,
}

impl LeafEntry {
  fn key(&self) -> (u32, u32, Option<TermId>) {
    (self.clause.0, self.literal.0, self.term)
  }
}

impl PartialEq for LeafEntry {
  fn eq(&self, other: &Self) -> bool {
    self.key() == other.key()
  }
}

impl Eq for LeafEntry {}

impl PartialOrd for LeafEntry {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for LeafEntry {
  fn cmp(&self, other: &Self) -> Ordering {
    self.key().cmp(&other.key())
  }
}

struct TreeNode {
  /// Which special variable this node binds: its position in the binding sequence.
  special : u32,
  binding : TermId,
  children: Vec<u32>,
  leaf    : Option<SkipList<LeafEntry>>,
}

pub struct SubstitutionTree {
  /// Number of top-level slots: 1 for term indexing, the predicate arity for literal indexing.
  slots: usize,
  nodes: Vec<Option<TreeNode>>,
  free : Vec<u32>,
  roots: Vec<u32>,
  /// Leaf for zero-slot (propositional) entries, whose binding sequence is empty.
  empty_leaf : Option<SkipList<LeafEntry>>,
  entry_count: usize,
}

impl SubstitutionTree {
  pub fn new(slots: usize) -> Self {
    SubstitutionTree {
      slots,
      nodes: Vec::new(),
      free : Vec::new(),
      roots: Vec::new(),
      empty_leaf : None,
      entry_count: 0,
    }
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.entry_count == 0
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.entry_count
  }

  fn node(&self, id: u32) -> &TreeNode {
    self.nodes[id as usize].as_ref().unwrap()
  }

  fn node_mut(&mut self, id: u32) -> &mut TreeNode {
    self.nodes[id as usize].as_mut().unwrap()
  }

  fn alloc(&mut self, node: TreeNode) -> u32 {
    match self.free.pop() {
      Some(id) => {
        self.nodes[id as usize] = Some(node);
        id
      }
      None => {
        self.nodes.push(Some(node));
        (self.nodes.len() - 1) as u32
      }
    }
  }

  /// Flattens normalised top-level arguments into the binding sequence `S0 := …, S1 := …`.
  /// Specials `0..slots` name the argument slots; deeper specials are allocated breadth-first.
  fn flatten(&self, store: &mut TermStore, args: &[TermId]) -> Vec<TermId> {
    debug_assert_eq!(args.len(), self.slots, "arity mismatch on tree access");

    let mut next_special = args.len() as u32;
    let mut queue: VecDeque<TermId> = args.iter().copied().collect();
    let mut sequence = Vec::new();

    while let Some(term) = queue.pop_front() {
      match &store.term(term).data {
        TermData::Variable(_) => sequence.push(term),
        TermData::SpecialVariable(_) => {
          debug_assert!(false, "special variable in an indexed term");
        }
        TermData::Function { symbol, args: term_args } => {
          let (symbol, term_args) = (*symbol, term_args.clone());
          let mut specials: SmallVec<[TermId; 4]> = SmallVec::new();
          for _ in 0..term_args.len() {
            specials.push(store.mk_special_variable(VariableIndex(next_special)));
            next_special += 1;
          }
          sequence.push(store.mk_function(symbol, &specials));
          queue.extend(term_args.iter().copied());
        }
      }
    }
    sequence
  }

  fn normalize(
    &self,
    store: &mut TermStore,
    args: &[TermId],
  ) -> (Vec<TermId>, SmallVec<[(VariableIndex, VariableIndex); 4]>) {
    let mut renaming = Renaming::new();
    let normalized: Vec<TermId> = args.iter().map(|&a| renaming.rename_term(store, a)).collect();
    let pairs: SmallVec<[(VariableIndex, VariableIndex); 4]> =
        renaming.items().map(|(&orig, &norm)| (orig, norm)).collect();
    (normalized, pairs)
  }

  pub fn insert(
    &mut self,
    store: &mut TermStore,
    args: &[TermId],
    term: Option<TermId>,
    literal: LiteralId,
    clause: ClauseId,
    extra: Option<TermId>,
  ) {
    let (normalized, renaming) = self.normalize(store, args);
    let sequence = self.flatten(store, &normalized);
    let entry = LeafEntry { term, literal, clause, extra, renaming };

    self.entry_count += 1;
    if sequence.is_empty() {
      self.empty_leaf.get_or_insert_with(SkipList::new).insert(entry);
      return;
    }

    let mut current: Option<u32> = None;
    for (depth, &binding) in sequence.iter().enumerate() {
      let siblings = match current {
        None => &self.roots,
        Some(parent) => &self.node(parent).children,
      };
      let found = siblings.iter().copied().find(|&c| self.node(c).binding == binding);
      let next = match found {
        Some(child) => child,
        None => {
          let child = self.alloc(TreeNode {
            special : depth as u32,
            binding,
            children: Vec::new(),
            leaf    : None,
          });
          match current {
            None => self.roots.push(child),
            Some(parent) => self.node_mut(parent).children.push(child),
          }
          child
        }
      };
      current = Some(next);
    }

    let last = current.unwrap();
    self.node_mut(last).leaf.get_or_insert_with(SkipList::new).insert(entry);
  }

  /// Removes the entry `(term, literal, clause)`. The entry must have been inserted with exactly
  /// the same arguments; removing anything else is a programmer error.
  pub fn remove(
    &mut self,
    store: &mut TermStore,
    args: &[TermId],
    term: Option<TermId>,
    literal: LiteralId,
    clause: ClauseId,
  ) {
    let (normalized, _) = self.normalize(store, args);
    let sequence = self.flatten(store, &normalized);
    let probe = LeafEntry {
      term,
      literal,
      clause,
      extra: None,
      renaming: SmallVec::new(),
    };

    if sequence.is_empty() {
      if let Some(leaf) = self.empty_leaf.as_mut() {
        if leaf.remove(&probe) {
          self.entry_count -= 1;
        }
        if leaf.is_empty() {
          self.empty_leaf = None;
        }
      } else {
        debug_assert!(false, "removing from an empty tree");
      }
      return;
    }

    // Walk down recording the path, then prune childless nodes bottom-up.
    let mut path: Vec<u32> = Vec::with_capacity(sequence.len());
    let mut current: Option<u32> = None;
    for &binding in sequence.iter() {
      let siblings = match current {
        None => &self.roots,
        Some(parent) => &self.node(parent).children,
      };
      match siblings.iter().copied().find(|&c| self.node(c).binding == binding) {
        Some(child) => {
          path.push(child);
          current = Some(child);
        }
        None => {
          debug_assert!(false, "removing an entry that was never inserted");
          return;
        }
      }
    }

    let last = *path.last().unwrap();
    let (removed, emptied) = {
      let node = self.nodes[last as usize].as_mut().unwrap();
      match node.leaf.as_mut() {
        Some(leaf) => {
          let removed = leaf.remove(&probe);
          (removed, leaf.is_empty())
        }
        None => {
          debug_assert!(false, "removal path ends without a leaf");
          (false, false)
        }
      }
    };
    if removed {
      self.entry_count -= 1;
    }
    if emptied {
      self.node_mut(last).leaf = None;
    }

    for i in (0..path.len()).rev() {
      let id = path[i];
      let node = self.node(id);
      if node.leaf.is_some() || !node.children.is_empty() {
        break;
      }
      self.nodes[id as usize] = None;
      self.free.push(id);
      if i == 0 {
        self.roots.retain(|&r| r != id);
      } else {
        let parent = path[i - 1];
        self.node_mut(parent).children.retain(|&c| c != id);
      }
    }
  }

  /// Starts a retrieval. The query arguments are loaded into the top special variables of a
  /// fresh substitution; the caller drives the cursor with `next`.
  pub fn query(&self, store: &mut TermStore, mode: RetrievalMode, args: &[TermId]) -> QueryCursor<'_> {
    debug_assert_eq!(args.len(), self.slots, "arity mismatch on tree query");

    let mut subst = RobSubstitution::new();
    for (i, &arg) in args.iter().enumerate() {
      let special = store.mk_special_variable(VariableIndex(i as u32));
      let bound = subst.unify(store, special, NORM_BANK, arg, BankIndex::QUERY);
      debug_assert!(bound, "loading the query cannot fail");
    }

    let mut tasks: Vec<Task> = Vec::new();
    for &root in self.roots.iter().rev() {
      tasks.push(Task::Enter(root));
    }

    QueryCursor {
      tree: self,
      mode,
      subst,
      tasks,
      leaf: self.empty_leaf.as_ref().map(|l| l.iter().cloned().collect::<Vec<_>>().into_iter()),
      entry_mark: None,
    }
  }
}

enum Task {
  Enter(u32),
  Backtrack(crate::core::substitution::ScopeMark),
}

pub struct QueryCursor<'t> {
  tree : &'t SubstitutionTree,
  mode : RetrievalMode,
  subst: RobSubstitution,
  tasks: Vec<Task>,
  leaf : Option<std::vec::IntoIter<LeafEntry>>,
  entry_mark: Option<crate::core::substitution::ScopeMark>,
}

impl QueryCursor<'_> {
  /// Advances to the next hit. The substitution accessible through `substitution_mut` afterwards
  /// belongs to the returned entry and dies on the next call.
  pub fn next(&mut self, store: &mut TermStore) -> Option<LeafEntry> {
    loop {
      // Undo the previous entry's denormalisation.
      if let Some(mark) = self.entry_mark.take() {
        self.subst.rollback(mark);
      }

      if let Some(iter) = self.leaf.as_mut() {
        if let Some(entry) = iter.next() {
          let mark = self.subst.mark();
          match self.mode {
            RetrievalMode::Instances => {
              // Backward direction: the entry's clause is the instance side and its variables
              // were never bound, so the normalised tree variables forward to the originals.
              let inverted: Vec<_> =
                  entry.renaming.iter().map(|&(orig, norm)| (norm, orig)).collect();
              self.subst.denormalize_pairs(store, &inverted, BankIndex::RESULT, NORM_BANK);
            }
            _ => {
              self.subst.denormalize_pairs(store, &entry.renaming, NORM_BANK, BankIndex::RESULT);
            }
          }
          self.entry_mark = Some(mark);
          return Some(entry);
        }
        self.leaf = None;
      }

      match self.tasks.pop() {
        None => return None,
        Some(Task::Backtrack(mark)) => self.subst.rollback(mark),
        Some(Task::Enter(id)) => {
          let tree = self.tree;
          let node = tree.node(id);
          let mark = self.subst.mark();
          if self.extend(store, node) {
            self.tasks.push(Task::Backtrack(mark));
            if let Some(leaf) = node.leaf.as_ref() {
              self.leaf = Some(leaf.iter().cloned().collect::<Vec<_>>().into_iter());
            }
            for &child in node.children.iter().rev() {
              self.tasks.push(Task::Enter(child));
            }
          } else {
            self.subst.rollback(mark);
          }
        }
      }
    }
  }

  fn extend(&mut self, store: &mut TermStore, node: &TreeNode) -> bool {
    let special = store.mk_special_variable(VariableIndex(node.special));
    match self.mode {
      RetrievalMode::Unifications => {
        self.subst.unify(store, special, NORM_BANK, node.binding, NORM_BANK)
      }
      RetrievalMode::Generalizations => {
        self.subst.match_terms(store, node.binding, NORM_BANK, special, NORM_BANK)
      }
      RetrievalMode::Instances => {
        self.subst.match_terms(store, special, NORM_BANK, node.binding, NORM_BANK)
      }
    }
  }

  /// The live result substitution of the most recent hit: query variables in `BankIndex::QUERY`,
  /// the matched clause's original variables in `BankIndex::RESULT`.
  #[inline(always)]
  pub fn substitution_mut(&mut self) -> &mut RobSubstitution {
    &mut self.subst
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::symbol::{Signature, SymbolIndex};
  use crate::core::term::TermBuilder;
  use sable_abs::IString;

  fn setup() -> (TermStore, SymbolIndex, SymbolIndex, SymbolIndex, SymbolIndex) {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    let f = signature.add_function(IString::from("f"), &[sort], sort);
    let g = signature.add_function(IString::from("g"), &[sort, sort], sort);
    let a = signature.add_constant(IString::from("a"), sort);
    let b = signature.add_constant(IString::from("b"), sort);
    (TermStore::new(), f, g, a, b)
  }

  fn entry_terms(tree: &SubstitutionTree, store: &mut TermStore, mode: RetrievalMode, q: TermId) -> Vec<TermId> {
    let mut cursor = tree.query(store, mode, &[q]);
    let mut result = Vec::new();
    while let Some(entry) = cursor.next(store) {
      result.push(entry.term.unwrap());
    }
    result.sort();
    result
  }

  #[test]
  fn instance_retrieval_finds_stored_instances() {
    let (mut store, f, _, a, b) = setup();
    let lit = LiteralId(0);

    let ca = store.mk_function(a, &[]);
    let cb = store.mk_function(b, &[]);
    let fa = store.mk_function(f, &[ca]);
    let fb = store.mk_function(f, &[cb]);

    let mut tree = SubstitutionTree::new(1);
    tree.insert(&mut store, &[fa], Some(fa), lit, ClauseId(0), None);
    tree.insert(&mut store, &[fb], Some(fb), lit, ClauseId(1), None);
    tree.insert(&mut store, &[ca], Some(ca), lit, ClauseId(2), None);

    // Instances of f(X9): the two stored f-terms.
    let x = store.share(&TermBuilder::var(9));
    let fx = store.mk_function(f, &[x]);
    assert_eq!(entry_terms(&tree, &mut store, RetrievalMode::Instances, fx), vec![fa, fb]);

    // Generalisations of f(a): just f(a) itself here.
    assert_eq!(entry_terms(&tree, &mut store, RetrievalMode::Generalizations, fa), vec![fa]);
  }

  #[test]
  fn generalization_retrieval_binds_stored_variables() {
    let (mut store, f, _, a, _) = setup();
    let lit = LiteralId(0);

    // Store the non-ground f(X3).
    let x3 = store.share(&TermBuilder::var(3));
    let fx = store.mk_function(f, &[x3]);
    let mut tree = SubstitutionTree::new(1);
    tree.insert(&mut store, &[fx], Some(fx), lit, ClauseId(0), None);

    let ca = store.mk_function(a, &[]);
    let fa = store.mk_function(f, &[ca]);

    let mut cursor = tree.query(&mut store, RetrievalMode::Generalizations, &[fa]);
    let entry = cursor.next(&mut store).expect("f(X3) generalises f(a)");
    assert_eq!(entry.term, Some(fx));

    // Applying the result substitution to the stored term must reproduce the query.
    let image = cursor.substitution_mut().apply_term(&mut store, fx, BankIndex::RESULT);
    assert_eq!(image, fa);
    assert!(cursor.next(&mut store).is_none());
  }

  #[test]
  fn unification_retrieval_is_symmetric() {
    let (mut store, f, g, a, _) = setup();
    let lit = LiteralId(0);

    // Store g(X0, a).
    let x  = store.share(&TermBuilder::var(0));
    let ca = store.mk_function(a, &[]);
    let gxa = store.mk_function(g, &[x, ca]);
    let mut tree = SubstitutionTree::new(1);
    tree.insert(&mut store, &[gxa], Some(gxa), lit, ClauseId(4), None);

    // Query g(f(X1), X2): unifiable with the stored term.
    let x1  = store.share(&TermBuilder::var(1));
    let x2  = store.share(&TermBuilder::var(2));
    let fx1 = store.mk_function(f, &[x1]);
    let q   = store.mk_function(g, &[fx1, x2]);

    let mut cursor = tree.query(&mut store, RetrievalMode::Unifications, &[q]);
    let entry = cursor.next(&mut store).expect("terms unify");
    assert_eq!(entry.clause, ClauseId(4));

    let subst = cursor.substitution_mut();
    let query_image  = subst.apply_term(&mut store, q, BankIndex::QUERY);
    let stored_image = subst.apply_term(&mut store, gxa, BankIndex::RESULT);
    assert_eq!(query_image, stored_image);
  }

  #[test]
  fn insert_remove_round_trip_restores_query_results() {
    let (mut store, f, _, a, b) = setup();
    let lit = LiteralId(0);

    let ca = store.mk_function(a, &[]);
    let cb = store.mk_function(b, &[]);
    let fa = store.mk_function(f, &[ca]);
    let fb = store.mk_function(f, &[cb]);

    let mut tree = SubstitutionTree::new(1);
    tree.insert(&mut store, &[fa], Some(fa), lit, ClauseId(0), None);

    let x  = store.share(&TermBuilder::var(7));
    let fx = store.mk_function(f, &[x]);
    let before = entry_terms(&tree, &mut store, RetrievalMode::Instances, fx);

    tree.insert(&mut store, &[fb], Some(fb), lit, ClauseId(1), None);
    tree.remove(&mut store, &[fb], Some(fb), lit, ClauseId(1));

    let after = entry_terms(&tree, &mut store, RetrievalMode::Instances, fx);
    assert_eq!(before, after);
    assert_eq!(tree.len(), 1);
  }

  #[test]
  fn stored_term_is_its_own_instance_and_generalization() {
    let (mut store, f, g, a, _) = setup();
    let lit = LiteralId(0);

    let ca = store.mk_function(a, &[]);
    let fa = store.mk_function(f, &[ca]);
    let t  = store.mk_function(g, &[fa, ca]);

    let mut tree = SubstitutionTree::new(1);
    tree.insert(&mut store, &[t], Some(t), lit, ClauseId(0), None);

    assert_eq!(entry_terms(&tree, &mut store, RetrievalMode::Instances, t), vec![t]);
    assert_eq!(entry_terms(&tree, &mut store, RetrievalMode::Generalizations, t), vec![t]);
    assert_eq!(entry_terms(&tree, &mut store, RetrievalMode::Unifications, t), vec![t]);
  }
}
