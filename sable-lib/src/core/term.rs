/*!

The term store: hash-consed representation of terms with precomputed metadata.

A term is either a variable (ordinary or *special*) or a functor applied to an ordered sequence
of argument terms. Terms are shared once committed: for any two structurally equal shared terms
exactly one representative exists, so equality of shared terms is equality of their `TermId`s.
Shared terms carry immutable precomputed attributes (weight, ground flag, distinct-variable
count) and a lazily memoised argument-order tag consulted by the simplification ordering.

Non-shared terms are transient `TermBuilder` trees used during construction; handing a builder to
`TermStore::share` interns it bottom-up. Shared terms are immortal until the run ends (the arena
is the term store), so a `TermId` can never dangle.

Special variables belong to the substitution tree; they never appear in terms owned by clauses.

*/

use std::cell::Cell;
use std::fmt::{Display, Formatter};

use enumflags2::{bitflags, BitFlags};
use sable_abs::{HashMap, NatSet, SmallVec};

use crate::core::literal::{LiteralId, LiteralKey, SharedLiteral};
use crate::core::sort::SortId;
use crate::core::symbol::{Signature, SymbolIndex};

/// Distinct-variable counts above this value are clamped; the exact count no longer matters.
pub const DISTINCT_VARS_CAP: u32 = 0xFFFF;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TermId(pub(crate) u32);

impl TermId {
  #[inline(always)]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct VariableIndex(pub u32);

impl VariableIndex {
  #[inline(always)]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

impl Display for VariableIndex {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "X{}", self.0)
  }
}

/// A path of argument positions from the root of a term to a subterm.
pub type Position = SmallVec<[u32; 8]>;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TermData {
  Variable(VariableIndex),
  /// Substitution-tree internal variable; a third namespace besides query and result variables.
  SpecialVariable(VariableIndex),
  Function {
    symbol: SymbolIndex,
    args  : SmallVec<[TermId; 4]>,
  },
}

#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TermAttribute {
  /// The term contains no variables at all.
  Ground,
  /// The term contains a special (substitution-tree) variable somewhere below.
  HasSpecialVariable,
}

pub type TermAttributes = BitFlags<TermAttribute, u8>;

/// The memoised comparison of the two arguments of a commutative term or literal.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum ArgumentOrder {
  #[default]
  Unknown,
  Less,
  Equal,
  Greater,
  Incomparable,
}

pub struct SharedTerm {
  pub data         : TermData,
  pub weight       : u32,
  pub distinct_vars: u32,
  pub attributes   : TermAttributes,
  /// Filled on first demand by the simplification ordering.
  pub(crate) argument_order: Cell<ArgumentOrder>,
}

impl SharedTerm {
  #[inline(always)]
  pub fn is_variable(&self) -> bool {
    matches!(self.data, TermData::Variable(_))
  }

  #[inline(always)]
  pub fn is_special_variable(&self) -> bool {
    matches!(self.data, TermData::SpecialVariable(_))
  }

  #[inline(always)]
  pub fn is_function(&self) -> bool {
    matches!(self.data, TermData::Function { .. })
  }

  #[inline(always)]
  pub fn is_ground(&self) -> bool {
    self.attributes.contains(TermAttribute::Ground)
  }

  #[inline(always)]
  pub fn args(&self) -> &[TermId] {
    match &self.data {
      TermData::Function { args, .. } => args,
      _ => &[],
    }
  }

  #[inline(always)]
  pub fn symbol(&self) -> Option<SymbolIndex> {
    match self.data {
      TermData::Function { symbol, .. } => Some(symbol),
      _ => None,
    }
  }

  #[inline(always)]
  pub fn argument_order(&self) -> ArgumentOrder {
    self.argument_order.get()
  }

  #[inline(always)]
  pub(crate) fn set_argument_order(&self, order: ArgumentOrder) {
    self.argument_order.set(order);
  }
}

/// A transient, unshared term under construction. Builder construction cannot fail; handing the
/// builder to the store cannot fail either.
#[derive(Clone, Debug)]
pub enum TermBuilder {
  Variable(VariableIndex),
  SpecialVariable(VariableIndex),
  Function(SymbolIndex, Vec<TermBuilder>),
}

impl TermBuilder {
  #[inline(always)]
  pub fn var(index: u32) -> TermBuilder {
    TermBuilder::Variable(VariableIndex(index))
  }

  #[inline(always)]
  pub fn constant(symbol: SymbolIndex) -> TermBuilder {
    TermBuilder::Function(symbol, Vec::new())
  }

  #[inline(always)]
  pub fn apply(symbol: SymbolIndex, args: Vec<TermBuilder>) -> TermBuilder {
    TermBuilder::Function(symbol, args)
  }
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum TermKey {
  Variable(u32),
  SpecialVariable(u32),
  Function(SymbolIndex, SmallVec<[TermId; 4]>),
}

/// The process-wide sharing pool for terms and literals. Append-only: entries live until the end
/// of the run.
#[derive(Default)]
pub struct TermStore {
  terms: Vec<SharedTerm>,
  canon: HashMap<TermKey, TermId>,

  pub(crate) literals     : Vec<SharedLiteral>,
  pub(crate) literal_canon: HashMap<LiteralKey, LiteralId>,
}

impl TermStore {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline(always)]
  pub fn term(&self, id: TermId) -> &SharedTerm {
    &self.terms[id.index()]
  }

  #[inline(always)]
  pub fn term_count(&self) -> usize {
    self.terms.len()
  }

  // region Interning

  pub fn mk_variable(&mut self, index: VariableIndex) -> TermId {
    let key = TermKey::Variable(index.0);
    if let Some(&id) = self.canon.get(&key) {
      return id;
    }
    self.commit(key, SharedTerm {
      data          : TermData::Variable(index),
      weight        : 1,
      distinct_vars : 1,
      attributes    : TermAttributes::empty(),
      argument_order: Cell::new(ArgumentOrder::Unknown),
    })
  }

  pub fn mk_special_variable(&mut self, index: VariableIndex) -> TermId {
    let key = TermKey::SpecialVariable(index.0);
    if let Some(&id) = self.canon.get(&key) {
      return id;
    }
    self.commit(key, SharedTerm {
      data          : TermData::SpecialVariable(index),
      weight        : 1,
      distinct_vars : 0,
      attributes    : TermAttribute::HasSpecialVariable.into(),
      argument_order: Cell::new(ArgumentOrder::Unknown),
    })
  }

  pub fn mk_function(&mut self, symbol: SymbolIndex, args: &[TermId]) -> TermId {
    let key = TermKey::Function(symbol, SmallVec::from_slice(args));
    if let Some(&id) = self.canon.get(&key) {
      return id;
    }

    let mut weight     = 1u32;
    let mut ground     = true;
    let mut special    = false;
    for &arg in args {
      let shared = self.term(arg);
      weight  = weight.saturating_add(shared.weight);
      ground  = ground && shared.is_ground();
      special = special || shared.attributes.contains(TermAttribute::HasSpecialVariable);
    }

    let mut attributes = TermAttributes::empty();
    if ground {
      attributes |= TermAttribute::Ground;
    }
    if special {
      attributes |= TermAttribute::HasSpecialVariable;
    }

    let distinct_vars = if ground {
      0
    } else {
      let mut set = NatSet::new();
      for &arg in args {
        self.collect_variables(arg, &mut set);
      }
      (set.iter().count() as u32).min(DISTINCT_VARS_CAP)
    };

    self.commit(key, SharedTerm {
      data: TermData::Function {
        symbol,
        args: SmallVec::from_slice(args),
      },
      weight,
      distinct_vars,
      attributes,
      argument_order: Cell::new(ArgumentOrder::Unknown),
    })
  }

  fn commit(&mut self, key: TermKey, term: SharedTerm) -> TermId {
    let id = TermId(self.terms.len() as u32);
    self.terms.push(term);
    self.canon.insert(key, id);
    id
  }

  /// Interns a builder bottom-up, returning the canonical representative.
  pub fn share(&mut self, builder: &TermBuilder) -> TermId {
    match builder {
      TermBuilder::Variable(index) => self.mk_variable(*index),
      TermBuilder::SpecialVariable(index) => self.mk_special_variable(*index),
      TermBuilder::Function(symbol, args) => {
        let shared_args: SmallVec<[TermId; 4]> = args.iter().map(|a| self.share(a)).collect();
        self.mk_function(*symbol, &shared_args)
      }
    }
  }

  // endregion

  // region Metadata queries

  #[inline(always)]
  pub fn weight(&self, id: TermId) -> u32 {
    self.term(id).weight
  }

  #[inline(always)]
  pub fn is_ground(&self, id: TermId) -> bool {
    self.term(id).is_ground()
  }

  #[inline(always)]
  pub fn distinct_vars(&self, id: TermId) -> u32 {
    self.term(id).distinct_vars
  }

  /// Do the two terms have matching tops (same functor, or the same variable)?
  pub fn compare_top(&self, a: TermId, b: TermId) -> bool {
    if a == b {
      return true;
    }
    match (&self.term(a).data, &self.term(b).data) {
      (TermData::Function { symbol: f, .. }, TermData::Function { symbol: g, .. }) => f == g,
      _ => false,
    }
  }

  /// Result sort of a shared term: the result sort of its top functor. Variables have no
  /// intrinsic sort.
  pub fn sort_of(&self, signature: &Signature, id: TermId) -> Option<SortId> {
    match self.term(id).data {
      TermData::Function { symbol, .. } => Some(signature.function(symbol).result_sort),
      _ => None,
    }
  }

  // endregion

  // region Traversal

  pub fn collect_variables(&self, id: TermId, out: &mut NatSet) {
    match &self.term(id).data {
      TermData::Variable(v) => {
        out.insert(v.index());
      }
      TermData::SpecialVariable(_) => {}
      TermData::Function { args, .. } => {
        for &arg in args.iter() {
          self.collect_variables(arg, out);
        }
      }
    }
  }

  pub fn variable_set(&self, id: TermId) -> NatSet {
    let mut set = NatSet::new();
    self.collect_variables(id, &mut set);
    set
  }

  pub fn occurs(&self, variable: VariableIndex, id: TermId) -> bool {
    match &self.term(id).data {
      TermData::Variable(v) => *v == variable,
      TermData::SpecialVariable(_) => false,
      TermData::Function { args, .. } => args.iter().any(|&arg| self.occurs(variable, arg)),
    }
  }

  /// Preorder traversal of all subterm occurrences, root included, with their positions.
  pub fn subterms(&self, id: TermId) -> SubtermIterator<'_> {
    SubtermIterator {
      store: self,
      stack: vec![(id, Position::new())],
    }
  }

  pub fn contains_subterm(&self, id: TermId, subterm: TermId) -> bool {
    if id == subterm {
      return true;
    }
    self.term(id).args().iter().any(|&arg| self.contains_subterm(arg, subterm))
  }

  pub fn count_occurrences(&self, id: TermId, subterm: TermId) -> u32 {
    if id == subterm {
      return 1;
    }
    let args: SmallVec<[TermId; 4]> = SmallVec::from_slice(self.term(id).args());
    args.iter().map(|&arg| self.count_occurrences(arg, subterm)).sum()
  }

  // endregion

  // region Rewriting

  /// Rebuilds `id` with the subterm at `position` replaced by `replacement`.
  pub fn replace_at(&mut self, id: TermId, position: &[u32], replacement: TermId) -> TermId {
    if position.is_empty() {
      return replacement;
    }
    let (symbol, args) = match &self.term(id).data {
      TermData::Function { symbol, args } => (*symbol, args.clone()),
      _ => {
        debug_assert!(false, "position into a variable");
        return id;
      }
    };
    let slot = position[0] as usize;
    let mut new_args = args;
    new_args[slot] = self.replace_at(new_args[slot], &position[1..], replacement);
    self.mk_function(symbol, &new_args)
  }

  /// Replaces every occurrence of `from` inside `id` by `to`.
  pub fn replace_all(&mut self, id: TermId, from: TermId, to: TermId) -> TermId {
    if id == from {
      return to;
    }
    let (symbol, args) = match &self.term(id).data {
      TermData::Function { symbol, args } => (*symbol, args.clone()),
      _ => return id,
    };
    let new_args: SmallVec<[TermId; 4]> =
        args.iter().map(|&arg| self.replace_all(arg, from, to)).collect();
    self.mk_function(symbol, &new_args)
  }

  /// Replaces the occurrences of `from` whose preorder occurrence numbers are in `selected`.
  /// The running occurrence counter is threaded through `next_occurrence`.
  pub fn replace_selected(
    &mut self,
    id: TermId,
    from: TermId,
    to: TermId,
    selected: &NatSet,
    next_occurrence: &mut usize,
  ) -> TermId {
    if id == from {
      let occurrence = *next_occurrence;
      *next_occurrence += 1;
      return if selected.contains(occurrence) { to } else { id };
    }
    let (symbol, args) = match &self.term(id).data {
      TermData::Function { symbol, args } => (*symbol, args.clone()),
      _ => return id,
    };
    let new_args: SmallVec<[TermId; 4]> = args
        .iter()
        .map(|&arg| self.replace_selected(arg, from, to, selected, next_occurrence))
        .collect();
    self.mk_function(symbol, &new_args)
  }

  /// Substitutes normalised variable `i` by `bindings[i]` throughout. Unbound variables are left
  /// in place. Used by the code tree, whose matches come out as dense binding arrays.
  pub fn instantiate(&mut self, id: TermId, bindings: &[Option<TermId>]) -> TermId {
    match &self.term(id).data {
      TermData::Variable(v) => {
        match bindings.get(v.index()).copied().flatten() {
          Some(image) => image,
          None => id,
        }
      }
      TermData::SpecialVariable(_) => id,
      TermData::Function { symbol, args } => {
        let (symbol, args) = (*symbol, args.clone());
        let new_args: SmallVec<[TermId; 4]> =
            args.iter().map(|&arg| self.instantiate(arg, bindings)).collect();
        self.mk_function(symbol, &new_args)
      }
    }
  }

  // endregion

  #[inline(always)]
  pub fn display_term<'s>(&'s self, signature: &'s Signature, id: TermId) -> TermDisplay<'s> {
    TermDisplay { store: self, signature, id }
  }
}

pub struct SubtermIterator<'s> {
  store: &'s TermStore,
  stack: Vec<(TermId, Position)>,
}

impl<'s> Iterator for SubtermIterator<'s> {
  type Item = (TermId, Position);

  fn next(&mut self) -> Option<Self::Item> {
    let (id, position) = self.stack.pop()?;
    let args = self.store.term(id).args();
    for (slot, &arg) in args.iter().enumerate().rev() {
      let mut child_position = position.clone();
      child_position.push(slot as u32);
      self.stack.push((arg, child_position));
    }
    Some((id, position))
  }
}

pub struct TermDisplay<'s> {
  store    : &'s TermStore,
  signature: &'s Signature,
  id       : TermId,
}

impl Display for TermDisplay<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match &self.store.term(self.id).data {
      TermData::Variable(v) => write!(f, "{}", v),
      TermData::SpecialVariable(v) => write!(f, "S{}", v.0),
      TermData::Function { symbol, args } => {
        write!(f, "{}", self.signature.function(*symbol).name)?;
        if !args.is_empty() {
          write!(f, "(")?;
          for (i, &arg) in args.iter().enumerate() {
            if i > 0 {
              write!(f, ",")?;
            }
            write!(f, "{}", self.store.display_term(self.signature, arg))?;
          }
          write!(f, ")")?;
        }
        Ok(())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use sable_abs::IString;

  fn setup() -> (Signature, TermStore) {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    signature.add_function(IString::from("f"), &[sort], sort);
    signature.add_function(IString::from("g"), &[sort, sort], sort);
    signature.add_constant(IString::from("a"), sort);
    (signature, TermStore::new())
  }

  #[test]
  fn sharing_is_canonical() {
    let (_, mut store) = setup();
    let f = SymbolIndex(0);
    let a = SymbolIndex(2);

    let t1 = {
      let inner = store.share(&TermBuilder::constant(a));
      store.mk_function(f, &[inner])
    };
    let t2 = store.share(&TermBuilder::apply(f, vec![TermBuilder::constant(a)]));
    assert_eq!(t1, t2);
  }

  #[test]
  fn metadata_matches_walker() {
    let (_, mut store) = setup();
    let g = SymbolIndex(1);
    let a = SymbolIndex(2);

    // g(X0, g(a, X0))
    let t = store.share(&TermBuilder::apply(g, vec![
      TermBuilder::var(0),
      TermBuilder::apply(g, vec![TermBuilder::constant(a), TermBuilder::var(0)]),
    ]));

    assert_eq!(store.weight(t), 5);
    assert!(!store.is_ground(t));
    assert_eq!(store.distinct_vars(t), 1);

    let ground = store.share(&TermBuilder::apply(g, vec![
      TermBuilder::constant(a),
      TermBuilder::constant(a),
    ]));
    assert!(store.is_ground(ground));
    assert_eq!(store.distinct_vars(ground), 0);
  }

  #[test]
  fn replace_at_rebuilds_path() {
    let (_, mut store) = setup();
    let g = SymbolIndex(1);
    let a = SymbolIndex(2);

    let x = store.mk_variable(VariableIndex(0));
    let ca = store.mk_function(a, &[]);
    let t = store.mk_function(g, &[x, ca]);

    let replaced = store.replace_at(t, &[0], ca);
    let expected = store.mk_function(g, &[ca, ca]);
    assert_eq!(replaced, expected);
  }

  #[test]
  fn subterm_iterator_is_preorder() {
    let (_, mut store) = setup();
    let f = SymbolIndex(0);
    let a = SymbolIndex(2);

    let ca = store.mk_function(a, &[]);
    let fa = store.mk_function(f, &[ca]);
    let positions: Vec<(TermId, Vec<u32>)> = store
        .subterms(fa)
        .map(|(id, p)| (id, p.to_vec()))
        .collect();
    assert_eq!(positions, vec![(fa, vec![]), (ca, vec![0])]);
  }
}
