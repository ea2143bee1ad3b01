/*!

The signature: function symbols, predicate symbols, and sorts of a single run. Symbols are
addressed by dense indices (`SymbolIndex` for functions, `PredicateIndex` for predicates);
predicate 0 is reserved for equality. The signature grows monotonically during a run (induction
introduces fresh Skolem symbols) and is never garbage collected before the run ends.

*/

use std::fmt::{Display, Formatter};

use enumflags2::{bitflags, BitFlags};
use sable_abs::{
  numeric::IntegerConstant,
  HashMap,
  IString,
  SmallVec,
};

use crate::core::sort::{Sort, SortId, SortKind};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct SymbolIndex(pub(crate) u32);

impl SymbolIndex {
  #[inline(always)]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

impl Display for SymbolIndex {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "fn{}", self.0)
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct PredicateIndex(pub(crate) u32);

impl PredicateIndex {
  #[inline(always)]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

impl Display for PredicateIndex {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "pr{}", self.0)
  }
}

/// Predicate 0 is reserved for equality.
pub const EQUALITY: PredicateIndex = PredicateIndex(0);

#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SymbolAttribute {
  /// Introduced by Skolemisation (input) or by induction (step-case constants).
  Skolem,
  /// A constructor of an inductive term-algebra sort.
  Constructor,
  /// An interpreted numeral constant. All numerals share one ordering weight slot.
  InterpretedNumeral,
  /// Any other interpreted symbol (integer sum, integer less-than).
  Interpreted,
  /// The symbol's two arguments are unordered; the ordering memoises their comparison.
  Commutative,
}

pub type SymbolAttributes = BitFlags<SymbolAttribute, u8>;

pub struct FunctionSymbol {
  pub name       : IString,
  pub arg_sorts  : SmallVec<[SortId; 4]>,
  pub result_sort: SortId,
  pub attributes : SymbolAttributes,
  /// Only present on `InterpretedNumeral` symbols.
  pub numeral    : Option<IntegerConstant>,
  pub kbo_weight : u32,
}

impl FunctionSymbol {
  #[inline(always)]
  pub fn arity(&self) -> usize {
    self.arg_sorts.len()
  }

  #[inline(always)]
  pub fn is_skolem(&self) -> bool {
    self.attributes.contains(SymbolAttribute::Skolem)
  }

  #[inline(always)]
  pub fn is_constructor(&self) -> bool {
    self.attributes.contains(SymbolAttribute::Constructor)
  }

  #[inline(always)]
  pub fn is_numeral(&self) -> bool {
    self.attributes.contains(SymbolAttribute::InterpretedNumeral)
  }
}

pub struct PredicateSymbol {
  pub name      : IString,
  pub arg_sorts : SmallVec<[SortId; 4]>,
  /// Per-predicate level used by the literal ordering.
  pub level     : u32,
  pub attributes: SymbolAttributes,
}

impl PredicateSymbol {
  #[inline(always)]
  pub fn arity(&self) -> usize {
    self.arg_sorts.len()
  }
}

pub struct Signature {
  sorts     : Vec<Sort>,
  functions : Vec<FunctionSymbol>,
  predicates: Vec<PredicateSymbol>,

  function_lookup : HashMap<(IString, usize), SymbolIndex>,
  predicate_lookup: HashMap<(IString, usize), PredicateIndex>,
  numeral_lookup  : HashMap<IntegerConstant, SymbolIndex>,

  integer_sort  : Option<SortId>,
  skolem_counter: u32,

  /// The shared ordering weight of all numeral constants.
  pub numeral_weight: u32,
}

impl Default for Signature {
  fn default() -> Self {
    Self::new()
  }
}

impl Signature {
  pub fn new() -> Self {
    let mut signature = Signature {
      sorts           : Vec::new(),
      functions       : Vec::new(),
      predicates      : Vec::new(),
      function_lookup : HashMap::new(),
      predicate_lookup: HashMap::new(),
      numeral_lookup  : HashMap::new(),
      integer_sort    : None,
      skolem_counter  : 0,
      numeral_weight  : 1,
    };
    signature.add_sort(IString::from("$i"), SortKind::Uninterpreted);
    // Predicate 0: equality.
    signature.predicates.push(PredicateSymbol {
      name      : IString::from("="),
      arg_sorts : SmallVec::from_slice(&[SortId(0), SortId(0)]),
      level     : 0,
      attributes: SymbolAttribute::Commutative.into(),
    });
    signature
  }

  // region Sorts

  pub fn add_sort(&mut self, name: IString, kind: SortKind) -> SortId {
    let id = SortId(self.sorts.len() as u32);
    self.sorts.push(Sort::new(name, kind));
    id
  }

  #[inline(always)]
  pub fn default_sort(&self) -> SortId {
    SortId(0)
  }

  /// The interpreted integer sort, created on first demand.
  pub fn integer_sort(&mut self) -> SortId {
    if let Some(id) = self.integer_sort {
      return id;
    }
    let id = self.add_sort(IString::from("$int"), SortKind::Integer);
    self.integer_sort = Some(id);
    id
  }

  #[inline(always)]
  pub fn sort(&self, id: SortId) -> &Sort {
    &self.sorts[id.index()]
  }

  #[inline(always)]
  pub fn sort_count(&self) -> usize {
    self.sorts.len()
  }

  // endregion

  // region Functions

  pub fn add_function(&mut self, name: IString, arg_sorts: &[SortId], result_sort: SortId) -> SymbolIndex {
    if let Some(&existing) = self.function_lookup.get(&(name.clone(), arg_sorts.len())) {
      return existing;
    }
    let index = SymbolIndex(self.functions.len() as u32);
    self.functions.push(FunctionSymbol {
      name       : name.clone(),
      arg_sorts  : SmallVec::from_slice(arg_sorts),
      result_sort,
      attributes : SymbolAttributes::empty(),
      numeral    : None,
      kbo_weight : 1,
    });
    self.function_lookup.insert((name, arg_sorts.len()), index);
    index
  }

  #[inline(always)]
  pub fn add_constant(&mut self, name: IString, sort: SortId) -> SymbolIndex {
    self.add_function(name, &[], sort)
  }

  /// Registers a constructor of an inductive sort. The sort's kind is upgraded to `Inductive`.
  pub fn add_constructor(&mut self, name: IString, arg_sorts: &[SortId], sort: SortId) -> SymbolIndex {
    let index = self.add_function(name, arg_sorts, sort);
    self.functions[index.index()].attributes |= SymbolAttribute::Constructor;
    let sort_entry = &mut self.sorts[sort.index()];
    sort_entry.kind = SortKind::Inductive;
    if !sort_entry.constructors.contains(&index) {
      sort_entry.constructors.push(index);
    }
    index
  }

  /// A fresh Skolem function, named apart from everything else in the signature.
  pub fn fresh_skolem_function(&mut self, arg_sorts: &[SortId], result_sort: SortId) -> SymbolIndex {
    loop {
      self.skolem_counter += 1;
      let name = IString::from(format!("sK{}", self.skolem_counter).as_str());
      if self.function_lookup.contains_key(&(name.clone(), arg_sorts.len())) {
        continue;
      }
      let index = self.add_function(name, arg_sorts, result_sort);
      self.functions[index.index()].attributes |= SymbolAttribute::Skolem;
      return index;
    }
  }

  /// The shared constant symbol for an integer numeral.
  pub fn numeral(&mut self, value: IntegerConstant) -> SymbolIndex {
    if let Some(&existing) = self.numeral_lookup.get(&value) {
      return existing;
    }
    let sort  = self.integer_sort();
    let name  = IString::from(value.to_string().as_str());
    let index = SymbolIndex(self.functions.len() as u32);
    self.functions.push(FunctionSymbol {
      name,
      arg_sorts  : SmallVec::new(),
      result_sort: sort,
      attributes : SymbolAttribute::InterpretedNumeral.into(),
      numeral    : Some(value.clone()),
      kbo_weight : 1,
    });
    self.numeral_lookup.insert(value, index);
    index
  }

  /// Interpreted integer sum, created on first demand.
  pub fn integer_sum(&mut self) -> SymbolIndex {
    let int = self.integer_sort();
    let index = self.add_function(IString::from("$sum"), &[int, int], int);
    self.functions[index.index()].attributes |= SymbolAttribute::Interpreted;
    index
  }

  #[inline(always)]
  pub fn function(&self, index: SymbolIndex) -> &FunctionSymbol {
    &self.functions[index.index()]
  }

  #[inline(always)]
  pub fn function_mut(&mut self, index: SymbolIndex) -> &mut FunctionSymbol {
    &mut self.functions[index.index()]
  }

  #[inline(always)]
  pub fn function_count(&self) -> usize {
    self.functions.len()
  }

  // endregion

  // region Predicates

  pub fn add_predicate(&mut self, name: IString, arg_sorts: &[SortId]) -> PredicateIndex {
    if let Some(&existing) = self.predicate_lookup.get(&(name.clone(), arg_sorts.len())) {
      return existing;
    }
    let index = PredicateIndex(self.predicates.len() as u32);
    self.predicates.push(PredicateSymbol {
      name      : name.clone(),
      arg_sorts : SmallVec::from_slice(arg_sorts),
      level     : index.0,
      attributes: SymbolAttributes::empty(),
    });
    self.predicate_lookup.insert((name, arg_sorts.len()), index);
    index
  }

  /// Interpreted integer less-than, created on first demand.
  pub fn integer_less(&mut self) -> PredicateIndex {
    let int = self.integer_sort();
    let index = self.add_predicate(IString::from("$less"), &[int, int]);
    self.predicates[index.index()].attributes |= SymbolAttribute::Interpreted;
    index
  }

  #[inline(always)]
  pub fn predicate(&self, index: PredicateIndex) -> &PredicateSymbol {
    &self.predicates[index.index()]
  }

  #[inline(always)]
  pub fn predicate_mut(&mut self, index: PredicateIndex) -> &mut PredicateSymbol {
    &mut self.predicates[index.index()]
  }

  #[inline(always)]
  pub fn predicate_count(&self) -> usize {
    self.predicates.len()
  }

  // endregion
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn equality_is_predicate_zero() {
    let signature = Signature::new();
    assert_eq!(&*signature.predicate(EQUALITY).name, "=");
    assert_eq!(signature.predicate(EQUALITY).arity(), 2);
  }

  #[test]
  fn numerals_are_interned() {
    let mut signature = Signature::new();
    let one_a = signature.numeral(sable_abs::numeric::int_one());
    let one_b = signature.numeral(sable_abs::numeric::int_one());
    assert_eq!(one_a, one_b);
    assert!(signature.function(one_a).is_numeral());
  }

  #[test]
  fn skolems_are_fresh() {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    let a = signature.fresh_skolem_function(&[], sort);
    let b = signature.fresh_skolem_function(&[], sort);
    assert_ne!(a, b);
    assert!(signature.function(a).is_skolem());
  }
}
