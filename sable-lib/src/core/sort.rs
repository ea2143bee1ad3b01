/*!

Sorts. The core is essentially monomorphic: every function symbol has a result sort, every
variable takes its sort from context, and equality literals between two variables record their
sort explicitly. Inductive sorts additionally carry the list of their constructors; the integer
sort is distinguished so that interpreted literals and integer induction can recognise it.

*/

use std::fmt::{Display, Formatter};

use sable_abs::IString;

use crate::core::symbol::SymbolIndex;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct SortId(pub(crate) u32);

impl SortId {
  #[inline(always)]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

impl Display for SortId {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "srt{}", self.0)
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum SortKind {
  #[default]
  Uninterpreted,
  /// An inductive term-algebra sort with registered constructors.
  Inductive,
  /// The interpreted integer sort.
  Integer,
}

pub struct Sort {
  pub name: IString,
  pub kind: SortKind,
  /// Constructors of an inductive sort, in registration order.
  pub constructors: Vec<SymbolIndex>,
}

impl Sort {
  pub fn new(name: IString, kind: SortKind) -> Self {
    Sort {
      name,
      kind,
      constructors: Vec::new(),
    }
  }

  #[inline(always)]
  pub fn is_inductive(&self) -> bool {
    self.kind == SortKind::Inductive && !self.constructors.is_empty()
  }

  #[inline(always)]
  pub fn is_integer(&self) -> bool {
    self.kind == SortKind::Integer
  }
}
