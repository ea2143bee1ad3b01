/*!

Backtrackable substitutions over variable banks.

A binding maps a `(variable, bank)` pair to a term tagged with its own bank. Banks keep query
variables (bank 0) apart from result variables (bank 1) without renaming, so the same variable
number on the two sides of an index query never collides. Two meta-banks are reserved:

- `SPECIAL`: substitution-tree internal variables, a third namespace. A special variable is
  addressed in the `SPECIAL` bank no matter which bank its enclosing term sits in;
- `UNBOUND`: names produced by `deref` for unbound variables during application, so that unbound
  occurrences come out named apart and application is idempotent on its own output.

Mutations append to an undo journal. A caller opens a scope by taking a `ScopeMark`; dropping the
mark commits (the records merge into the enclosing scope), `rollback` reverses every binding made
since. Unification opens a local scope internally: on failure the substitution is left exactly as
it was.

Unification is the polynomial variant of Robinson's algorithm: an explicit work list, an
encountered-pair set to avoid re-unifying shared subterms, and an occurs check that walks bound
variables with path compression. When a mismatch handler is attached, a top-functor clash may
instead record a unification constraint between the two offending subterms and continue.

*/

use sable_abs::{HashMap, HashSet};

use crate::core::literal::LiteralId;
use crate::core::symbol::Signature;
use crate::core::term::{TermData, TermId, TermStore, VariableIndex};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct BankIndex(pub i32);

impl BankIndex {
  pub const QUERY  : BankIndex = BankIndex(0);
  pub const RESULT : BankIndex = BankIndex(1);
  /// Reserved for substitution-tree special variables.
  pub const SPECIAL: BankIndex = BankIndex(-2);
  /// Sentinel bank of freshly named, still unbound variables produced by `deref`.
  pub const UNBOUND: BankIndex = BankIndex(-1);
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct VarSpec {
  pub var : VariableIndex,
  pub bank: BankIndex,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TermSpec {
  pub term: TermId,
  pub bank: BankIndex,
}

impl TermSpec {
  #[inline(always)]
  pub fn new(term: TermId, bank: BankIndex) -> Self {
    TermSpec { term, bank }
  }
}

/// A constraint recorded by a mismatch handler in place of a failed unification step.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct UnificationConstraint {
  pub first : TermSpec,
  pub second: TermSpec,
}

/// Unification-with-abstraction hook: given two subterms whose tops clash, either decline
/// (ordinary failure) or record a constraint and let unification proceed.
pub trait MismatchHandler {
  fn try_abstract(
    &self,
    store: &TermStore,
    first: TermSpec,
    second: TermSpec,
    constraints: &mut Vec<UnificationConstraint>,
  ) -> bool;
}

/// Abstracts mismatches whose top functor is interpreted (numerals, integer sum); the standard
/// handler for arithmetic-aware unification.
pub struct InterpretedMismatchHandler<'s> {
  pub signature: &'s Signature,
}

impl MismatchHandler for InterpretedMismatchHandler<'_> {
  fn try_abstract(
    &self,
    store: &TermStore,
    first: TermSpec,
    second: TermSpec,
    constraints: &mut Vec<UnificationConstraint>,
  ) -> bool {
    let interpreted = |id: TermId| {
      store.term(id).symbol().map_or(false, |symbol| {
        let function = self.signature.function(symbol);
        function.is_numeral() || function.attributes.contains(crate::core::symbol::SymbolAttribute::Interpreted)
      })
    };
    if interpreted(first.term) || interpreted(second.term) {
      constraints.push(UnificationConstraint { first, second });
      true
    } else {
      false
    }
  }
}

#[derive(Copy, Clone, Debug)]
pub struct ScopeMark(usize);

enum Deref {
  Bound(TermSpec),
  Unbound(VarSpec),
}

#[derive(Default)]
pub struct RobSubstitution {
  bank        : HashMap<VarSpec, TermSpec>,
  journal     : Vec<VarSpec>,
  next_unbound: u32,
}

impl RobSubstitution {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn clear(&mut self) {
    self.bank.clear();
    self.journal.clear();
    self.next_unbound = 0;
  }

  #[inline(always)]
  pub fn binding_count(&self) -> usize {
    self.bank.len()
  }

  // region Scopes

  /// Opens a recording scope. Every binding added before the matching `rollback` is undone by
  /// it; calling `commit` (or simply dropping the mark) merges the records into the enclosing
  /// scope instead.
  #[inline(always)]
  pub fn mark(&self) -> ScopeMark {
    ScopeMark(self.journal.len())
  }

  pub fn rollback(&mut self, mark: ScopeMark) {
    while self.journal.len() > mark.0 {
      let v = self.journal.pop().unwrap();
      self.bank.remove(&v);
    }
  }

  #[inline(always)]
  pub fn commit(&mut self, _mark: ScopeMark) {
    // Records stay in the journal and now belong to the enclosing scope.
  }

  // endregion

  // region Dereferencing

  /// The variable-and-bank address of a variable term. Special variables always live in the
  /// `SPECIAL` bank, whatever bank the term came from.
  pub fn var_spec(&self, store: &TermStore, ts: TermSpec) -> VarSpec {
    match store.term(ts.term).data {
      TermData::Variable(v) => VarSpec { var: v, bank: ts.bank },
      TermData::SpecialVariable(v) => VarSpec { var: v, bank: BankIndex::SPECIAL },
      _ => {
        debug_assert!(false, "var_spec of a non-variable");
        VarSpec { var: VariableIndex(0), bank: ts.bank }
      }
    }
  }

  fn deref_bound(&self, store: &TermStore, ts: TermSpec) -> Deref {
    if store.term(ts.term).is_function() {
      return Deref::Bound(ts);
    }
    let mut v = self.var_spec(store, ts);
    loop {
      match self.bank.get(&v) {
        None => return Deref::Unbound(v),
        Some(&binding) if binding.bank == BankIndex::UNBOUND => return Deref::Unbound(v),
        Some(&binding) if store.term(binding.term).is_function() => return Deref::Bound(binding),
        Some(&binding) => v = self.var_spec(store, binding),
      }
    }
  }

  fn root(&self, store: &TermStore, mut v: VarSpec) -> VarSpec {
    loop {
      match self.bank.get(&v) {
        None => return v,
        Some(&binding) if binding.bank == BankIndex::UNBOUND => return v,
        Some(&binding) if store.term(binding.term).is_function() => return v,
        Some(&binding) => v = self.var_spec(store, binding),
      }
    }
  }

  pub fn is_unbound(&self, store: &TermStore, v: VarSpec) -> bool {
    matches!(self.deref_var(store, v), None)
  }

  fn deref_var(&self, store: &TermStore, mut v: VarSpec) -> Option<TermSpec> {
    loop {
      match self.bank.get(&v) {
        None => return None,
        Some(&binding) if binding.bank == BankIndex::UNBOUND => return None,
        Some(&binding) if store.term(binding.term).is_function() => return Some(binding),
        Some(&binding) => v = self.var_spec(store, binding),
      }
    }
  }

  // endregion

  // region Binding

  fn bind(&mut self, v: VarSpec, value: TermSpec) {
    debug_assert!(v.bank != BankIndex::UNBOUND, "binding in the UNBOUND bank");
    debug_assert!(!self.bank.contains_key(&v), "rebinding a bound variable");
    self.bank.insert(v, value);
    self.journal.push(v);
  }

  /// Binds variables of `denorm_bank` to their normalised counterparts in `normal_bank`,
  /// inverting the renaming produced upstream.
  pub fn denormalize(
    &mut self,
    store: &mut TermStore,
    renaming: &Renaming,
    normal_bank: BankIndex,
    denorm_bank: BankIndex,
  ) {
    for (&original, &normalized) in renaming.items() {
      self.denormalize_one(store, original, normalized, normal_bank, denorm_bank);
    }
  }

  /// `denormalize` over a plain pair list, for callers that store renamings flattened.
  pub fn denormalize_pairs(
    &mut self,
    store: &mut TermStore,
    pairs: &[(VariableIndex, VariableIndex)],
    normal_bank: BankIndex,
    denorm_bank: BankIndex,
  ) {
    for &(original, normalized) in pairs {
      self.denormalize_one(store, original, normalized, normal_bank, denorm_bank);
    }
  }

  fn denormalize_one(
    &mut self,
    store: &mut TermStore,
    original: VariableIndex,
    normalized: VariableIndex,
    normal_bank: BankIndex,
    denorm_bank: BankIndex,
  ) {
    let v = VarSpec { var: original, bank: denorm_bank };
    debug_assert!(!self.bank.contains_key(&v), "denormalizing a bound variable");
    let term = store.mk_variable(normalized);
    self.bind(v, TermSpec::new(term, normal_bank));
  }

  // endregion

  // region Occurs check

  fn occurs(&self, store: &TermStore, v: VarSpec, ts: TermSpec) -> bool {
    let v = self.root(store, v);
    let start = match self.deref_bound(store, ts) {
      Deref::Unbound(_) => return false,
      Deref::Bound(bound) => bound,
    };

    let mut encountered: HashSet<VarSpec> = HashSet::new();
    let mut to_do = vec![start];
    while let Some(current) = to_do.pop() {
      let mut found = false;
      visit_variables(store, current.term, current.bank, &mut |spec| {
        if found {
          return;
        }
        let root = self.root(store, spec);
        if root == v {
          found = true;
          return;
        }
        if encountered.insert(root) {
          if let Some(binding) = self.deref_var(store, root) {
            to_do.push(binding);
          }
        }
      });
      if found {
        return true;
      }
    }
    false
  }

  // endregion

  // region Unification

  pub fn unify(
    &mut self,
    store: &TermStore,
    t1: TermId,
    b1: BankIndex,
    t2: TermId,
    b2: BankIndex,
  ) -> bool {
    self.unify_spec(store, TermSpec::new(t1, b1), TermSpec::new(t2, b2), None, &mut Vec::new())
  }

  pub fn unify_with_abstraction(
    &mut self,
    store: &TermStore,
    t1: TermId,
    b1: BankIndex,
    t2: TermId,
    b2: BankIndex,
    handler: &dyn MismatchHandler,
    constraints: &mut Vec<UnificationConstraint>,
  ) -> bool {
    self.unify_spec(store, TermSpec::new(t1, b1), TermSpec::new(t2, b2), Some(handler), constraints)
  }

  fn unify_spec(
    &mut self,
    store: &TermStore,
    s: TermSpec,
    t: TermSpec,
    handler: Option<&dyn MismatchHandler>,
    constraints: &mut Vec<UnificationConstraint>,
  ) -> bool {
    if same_content(store, s, t) {
      return true;
    }

    let mark = self.mark();
    let mut to_do: Vec<(TermSpec, TermSpec)> = vec![(s, t)];
    let mut encountered: HashSet<(TermSpec, TermSpec)> = HashSet::new();
    let mut mismatch = false;

    while let Some((x, y)) = to_do.pop() {
      let dx = self.deref_bound(store, x);
      let dy = self.deref_bound(store, y);

      match (dx, dy) {
        (Deref::Unbound(v1), Deref::Unbound(v2)) => {
          if v1 != v2 {
            // Chain the first root onto the second.
            self.bind(v1, y);
          }
        }
        (Deref::Unbound(v1), Deref::Bound(bound)) => {
          if self.occurs(store, v1, bound) {
            mismatch = true;
          } else {
            self.bind(v1, bound);
          }
        }
        (Deref::Bound(bound), Deref::Unbound(v2)) => {
          if self.occurs(store, v2, bound) {
            mismatch = true;
          } else {
            self.bind(v2, bound);
          }
        }
        (Deref::Bound(dt1), Deref::Bound(dt2)) => {
          if same_content(store, dt1, dt2) {
            continue;
          }
          if store.compare_top(dt1.term, dt2.term) {
            let args1 = store.term(dt1.term).args().to_vec();
            let args2 = store.term(dt2.term).args().to_vec();
            for (&a1, &a2) in args1.iter().zip(args2.iter()).rev() {
              let pair = (TermSpec::new(a1, dt1.bank), TermSpec::new(a2, dt2.bank));
              // Each non-variable subterm pair is unified at most once; this is what keeps
              // unification polynomial on terms with heavy sharing.
              let both_vars = !store.term(a1).is_function() && !store.term(a2).is_function();
              if both_vars || encountered.insert(pair) {
                to_do.push(pair);
              }
            }
          } else if let Some(handler) = handler {
            if !handler.try_abstract(store, dt1, dt2, constraints) {
              mismatch = true;
            }
          } else {
            mismatch = true;
          }
        }
      }

      if mismatch {
        break;
      }
    }

    if mismatch {
      self.rollback(mark);
      false
    } else {
      self.commit(mark);
      true
    }
  }

  /// Unifies the argument lists of two literals with the same predicate. For the commutative
  /// equality predicate the swapped orientation is attempted when the direct one fails.
  pub fn unify_literal_arguments(
    &mut self,
    store: &TermStore,
    l1: LiteralId,
    b1: BankIndex,
    l2: LiteralId,
    b2: BankIndex,
  ) -> bool {
    let lit1 = store.literal(l1);
    let lit2 = store.literal(l2);
    debug_assert_eq!(lit1.predicate, lit2.predicate, "unifying differing predicates");

    let args1: Vec<TermId> = lit1.args.to_vec();
    let args2: Vec<TermId> = lit2.args.to_vec();
    let commutative = lit1.is_commutative();

    if self.unify_argument_lists(store, &args1, b1, &args2, b2) {
      return true;
    }
    if commutative {
      let swapped: Vec<TermId> = args2.iter().rev().copied().collect();
      return self.unify_argument_lists(store, &args1, b1, &swapped, b2);
    }
    false
  }

  fn unify_argument_lists(
    &mut self,
    store: &TermStore,
    args1: &[TermId],
    b1: BankIndex,
    args2: &[TermId],
    b2: BankIndex,
  ) -> bool {
    let mark = self.mark();
    for (&a1, &a2) in args1.iter().zip(args2.iter()) {
      if !self.unify(store, a1, b1, a2, b2) {
        self.rollback(mark);
        return false;
      }
    }
    true
  }

  // endregion

  // region Matching

  /// Matches `instance` onto `base`: ordinary variables bind only on the base side, but special
  /// variables bind on either side. (Special variables appear only in internal terms of
  /// substitution trees; this behaviour is what makes instance retrieval work.)
  pub fn match_terms(
    &mut self,
    store: &TermStore,
    base: TermId,
    base_bank: BankIndex,
    instance: TermId,
    instance_bank: BankIndex,
  ) -> bool {
    let mark = self.mark();
    if self.match_spec(
      store,
      TermSpec::new(base, base_bank),
      TermSpec::new(instance, instance_bank),
    ) {
      true
    } else {
      self.rollback(mark);
      false
    }
  }

  fn match_spec(&mut self, store: &TermStore, base: TermSpec, instance: TermSpec) -> bool {
    if same_content(store, base, instance) {
      return true;
    }

    let base_data     = &store.term(base.term).data;
    let instance_data = &store.term(instance.term).data;

    match (base_data, instance_data) {
      (
        TermData::Function { symbol: f, args: base_args },
        TermData::Function { symbol: g, args: instance_args },
      ) => {
        if f != g {
          return false;
        }
        let base_args: Vec<TermId>     = base_args.to_vec();
        let instance_args: Vec<TermId> = instance_args.to_vec();
        for (&b, &i) in base_args.iter().zip(instance_args.iter()) {
          if !self.match_spec(store, TermSpec::new(b, base.bank), TermSpec::new(i, instance.bank)) {
            return false;
          }
        }
        true
      }
      (TermData::SpecialVariable(_), _) => {
        let v = self.var_spec(store, base);
        match self.bank.get(&v).copied() {
          Some(binding) => self.match_spec(store, binding, instance),
          None => {
            self.bind(v, instance);
            true
          }
        }
      }
      (_, TermData::SpecialVariable(_)) => {
        let v = self.var_spec(store, instance);
        match self.bank.get(&v).copied() {
          Some(binding) => self.match_spec(store, base, binding),
          None => {
            self.bind(v, base);
            true
          }
        }
      }
      (TermData::Variable(_), _) => {
        let v = self.var_spec(store, base);
        match self.bank.get(&v).copied() {
          Some(binding) => same_content(store, binding, instance),
          None => {
            self.bind(v, instance);
            true
          }
        }
      }
      _ => false,
    }
  }

  /// Matches the argument lists of two same-predicate literals; tries the swapped orientation
  /// for equality.
  pub fn match_literal_arguments(
    &mut self,
    store: &TermStore,
    base: LiteralId,
    base_bank: BankIndex,
    instance: LiteralId,
    instance_bank: BankIndex,
  ) -> bool {
    let base_lit     = store.literal(base);
    let instance_lit = store.literal(instance);
    debug_assert_eq!(base_lit.predicate, instance_lit.predicate);

    let base_args: Vec<TermId>     = base_lit.args.to_vec();
    let instance_args: Vec<TermId> = instance_lit.args.to_vec();
    let commutative = base_lit.is_commutative();

    if self.match_argument_lists(store, &base_args, base_bank, &instance_args, instance_bank) {
      return true;
    }
    if commutative {
      let swapped: Vec<TermId> = instance_args.iter().rev().copied().collect();
      return self.match_argument_lists(store, &base_args, base_bank, &swapped, instance_bank);
    }
    false
  }

  fn match_argument_lists(
    &mut self,
    store: &TermStore,
    base_args: &[TermId],
    base_bank: BankIndex,
    instance_args: &[TermId],
    instance_bank: BankIndex,
  ) -> bool {
    let mark = self.mark();
    for (&b, &i) in base_args.iter().zip(instance_args.iter()) {
      if !self.match_spec(store, TermSpec::new(b, base_bank), TermSpec::new(i, instance_bank)) {
        self.rollback(mark);
        return false;
      }
    }
    true
  }

  // endregion

  // region Application

  /// Fully dereferences bindings, allocating fresh sharing for the result. Unbound variables are
  /// named apart through the `UNBOUND` bank; applying again in the `UNBOUND` bank is the
  /// identity.
  pub fn apply_term(&mut self, store: &mut TermStore, t: TermId, bank: BankIndex) -> TermId {
    match &store.term(t).data {
      TermData::Function { symbol, args } => {
        let (symbol, args) = (*symbol, args.clone());
        let new_args: Vec<TermId> = args
            .iter()
            .map(|&arg| self.apply_term(store, arg, bank))
            .collect();
        store.mk_function(symbol, &new_args)
      }
      TermData::Variable(v) => {
        let spec = VarSpec { var: *v, bank };
        self.apply_var(store, spec)
      }
      TermData::SpecialVariable(v) => {
        let spec = VarSpec { var: *v, bank: BankIndex::SPECIAL };
        self.apply_var(store, spec)
      }
    }
  }

  fn apply_var(&mut self, store: &mut TermStore, v: VarSpec) -> TermId {
    if v.bank == BankIndex::UNBOUND {
      return store.mk_variable(v.var);
    }
    match self.bank.get(&v).copied() {
      None => {
        // Name the unbound variable apart; the binding caches the name so every occurrence of
        // this variable comes out the same within and across calls.
        let fresh = VariableIndex(self.next_unbound);
        self.next_unbound += 1;
        let term = store.mk_variable(fresh);
        self.bind(v, TermSpec::new(term, BankIndex::UNBOUND));
        term
      }
      Some(binding) if binding.bank == BankIndex::UNBOUND => binding.term,
      Some(binding) => self.apply_term(store, binding.term, binding.bank),
    }
  }

  /// Like `apply_term`, but unbound variables stay themselves instead of being named apart.
  /// Used when the result must splice into an existing clause whose variables the substitution
  /// never bound (backward rewriting).
  pub fn apply_term_identity(&mut self, store: &mut TermStore, t: TermId, bank: BankIndex) -> TermId {
    match &store.term(t).data {
      TermData::Function { symbol, args } => {
        let (symbol, args) = (*symbol, args.clone());
        let new_args: Vec<TermId> = args
            .iter()
            .map(|&arg| self.apply_term_identity(store, arg, bank))
            .collect();
        store.mk_function(symbol, &new_args)
      }
      TermData::Variable(v) => {
        let spec = VarSpec { var: *v, bank };
        match self.deref_var(store, spec) {
          Some(binding) => self.apply_term_identity(store, binding.term, binding.bank),
          None => store.mk_variable(self.root(store, spec).var),
        }
      }
      TermData::SpecialVariable(v) => {
        let spec = VarSpec { var: *v, bank: BankIndex::SPECIAL };
        match self.deref_var(store, spec) {
          Some(binding) => self.apply_term_identity(store, binding.term, binding.bank),
          None => store.mk_variable(self.root(store, spec).var),
        }
      }
    }
  }

  pub fn apply_literal(&mut self, store: &mut TermStore, literal: LiteralId, bank: BankIndex) -> LiteralId {
    let shared = store.literal(literal);
    let (predicate, polarity, eq_sort) = (shared.predicate, shared.polarity, shared.eq_sort);
    let args: Vec<TermId> = shared.args.to_vec();

    let new_args: Vec<TermId> = args
        .iter()
        .map(|&arg| self.apply_term(store, arg, bank))
        .collect();
    // The equality sort survives only while both sides are still variables.
    let eq_sort = if new_args.iter().all(|&a| store.term(a).is_variable()) {
      eq_sort
    } else {
      None
    };
    store.mk_literal(predicate, polarity, &new_args, eq_sort)
  }

  // endregion
}

/// Best-effort content equality of two term specs: identical shared terms in the same bank, or
/// identical ground terms in any banks.
#[inline(always)]
fn same_content(store: &TermStore, a: TermSpec, b: TermSpec) -> bool {
  a.term == b.term && (a.bank == b.bank || store.term(a.term).is_ground())
}

fn visit_variables<F: FnMut(VarSpec)>(store: &TermStore, t: TermId, bank: BankIndex, visit: &mut F) {
  match &store.term(t).data {
    TermData::Variable(v) => visit(VarSpec { var: *v, bank }),
    TermData::SpecialVariable(v) => visit(VarSpec { var: *v, bank: BankIndex::SPECIAL }),
    TermData::Function { args, .. } => {
      for &arg in args.iter() {
        visit_variables(store, arg, bank, visit);
      }
    }
  }
}

/// A normalising renaming: variables are mapped to 0, 1, 2, … in order of first encounter.
#[derive(Default)]
pub struct Renaming {
  map : HashMap<VariableIndex, VariableIndex>,
  next: u32,
}

impl Renaming {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn normalize_variable(&mut self, v: VariableIndex) -> VariableIndex {
    if let Some(&image) = self.map.get(&v) {
      return image;
    }
    let image = VariableIndex(self.next);
    self.next += 1;
    self.map.insert(v, image);
    image
  }

  pub fn rename_term(&mut self, store: &mut TermStore, t: TermId) -> TermId {
    match &store.term(t).data {
      TermData::Variable(v) => {
        let image = self.normalize_variable(*v);
        store.mk_variable(image)
      }
      TermData::SpecialVariable(_) => t,
      TermData::Function { symbol, args } => {
        let (symbol, args) = (*symbol, args.clone());
        let new_args: Vec<TermId> = args.iter().map(|&arg| self.rename_term(store, arg)).collect();
        store.mk_function(symbol, &new_args)
      }
    }
  }

  pub fn rename_literal(&mut self, store: &mut TermStore, literal: LiteralId) -> LiteralId {
    let shared = store.literal(literal);
    let (predicate, polarity, eq_sort) = (shared.predicate, shared.polarity, shared.eq_sort);
    let args: Vec<TermId> = shared.args.to_vec();
    let new_args: Vec<TermId> = args.iter().map(|&arg| self.rename_term(store, arg)).collect();
    store.mk_literal(predicate, polarity, &new_args, eq_sort)
  }

  #[inline(always)]
  pub fn items(&self) -> impl Iterator<Item = (&VariableIndex, &VariableIndex)> {
    self.map.iter()
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.map.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::symbol::{Signature, SymbolIndex};
  use crate::core::term::TermBuilder;
  use sable_abs::IString;

  fn setup() -> (TermStore, SymbolIndex, SymbolIndex, SymbolIndex) {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    let f = signature.add_function(IString::from("f"), &[sort], sort);
    let g = signature.add_function(IString::from("g"), &[sort, sort], sort);
    let a = signature.add_constant(IString::from("a"), sort);
    (TermStore::new(), f, g, a)
  }

  #[test]
  fn unification_soundness() {
    // g(X0, f(X1)) and g(a, X0) unify; applying both sides gives identical terms.
    let (mut store, f, g, a) = setup();
    let x0 = store.share(&TermBuilder::var(0));
    let x1 = store.share(&TermBuilder::var(1));
    let ca = store.mk_function(a, &[]);
    let fx1 = store.mk_function(f, &[x1]);
    let s = store.mk_function(g, &[x0, fx1]);
    let t = store.mk_function(g, &[ca, x0]);

    let mut subst = RobSubstitution::new();
    assert!(subst.unify(&store, s, BankIndex::QUERY, t, BankIndex::RESULT));
    let s_image = subst.apply_term(&mut store, s, BankIndex::QUERY);
    let t_image = subst.apply_term(&mut store, t, BankIndex::RESULT);
    assert_eq!(s_image, t_image);
  }

  #[test]
  fn occurs_check_rejects_cycles() {
    let (mut store, f, _, _) = setup();
    let x  = store.share(&TermBuilder::var(0));
    let fx = store.mk_function(f, &[x]);

    let mut subst = RobSubstitution::new();
    assert!(!subst.unify(&store, x, BankIndex::QUERY, fx, BankIndex::QUERY));
    // Failure leaves the substitution untouched.
    assert_eq!(subst.binding_count(), 0);
  }

  #[test]
  fn banks_keep_same_variable_apart() {
    // X0 (query) unifies with f(X0) (result): different banks, no capture.
    let (mut store, f, _, _) = setup();
    let x  = store.share(&TermBuilder::var(0));
    let fx = store.mk_function(f, &[x]);

    let mut subst = RobSubstitution::new();
    assert!(subst.unify(&store, x, BankIndex::QUERY, fx, BankIndex::RESULT));
  }

  #[test]
  fn matching_binds_base_only() {
    let (mut store, f, _, a) = setup();
    let x   = store.share(&TermBuilder::var(0));
    let fx  = store.mk_function(f, &[x]);
    let ca  = store.mk_function(a, &[]);
    let fa  = store.mk_function(f, &[ca]);

    let mut subst = RobSubstitution::new();
    assert!(subst.match_terms(&store, fx, BankIndex::RESULT, fa, BankIndex::QUERY));
    let image = subst.apply_term(&mut store, fx, BankIndex::RESULT);
    assert_eq!(image, fa);

    // The reverse direction must fail: an instance cannot be matched onto by a ground base.
    let mut reverse = RobSubstitution::new();
    assert!(!reverse.match_terms(&store, fa, BankIndex::RESULT, fx, BankIndex::QUERY));
  }

  #[test]
  fn rollback_undoes_bindings() {
    let (mut store, _, _, a) = setup();
    let x  = store.share(&TermBuilder::var(0));
    let ca = store.mk_function(a, &[]);

    let mut subst = RobSubstitution::new();
    let mark = subst.mark();
    assert!(subst.unify(&store, x, BankIndex::QUERY, ca, BankIndex::RESULT));
    assert_eq!(subst.binding_count(), 1);
    subst.rollback(mark);
    assert_eq!(subst.binding_count(), 0);
  }

  #[test]
  fn apply_is_idempotent_through_unbound_bank() {
    let (mut store, f, _, _) = setup();
    let x  = store.share(&TermBuilder::var(5));
    let fx = store.mk_function(f, &[x]);

    let mut subst = RobSubstitution::new();
    let once  = subst.apply_term(&mut store, fx, BankIndex::QUERY);
    let twice = subst.apply_term(&mut store, once, BankIndex::UNBOUND);
    assert_eq!(once, twice);
  }

  #[test]
  fn abstraction_records_constraint() {
    let mut signature = Signature::new();
    let sort = signature.default_sort();
    let p_arg = signature.add_function(IString::from("c"), &[], sort);
    let mut store = TermStore::new();
    let one = signature.numeral(sable_abs::numeric::int_one());
    let sum = signature.integer_sum();

    let c    = store.mk_function(p_arg, &[]);
    let n1   = store.mk_function(one, &[]);
    let plus = store.mk_function(sum, &[n1, n1]);

    let mut subst = RobSubstitution::new();
    let handler = InterpretedMismatchHandler { signature: &signature };
    let mut constraints = Vec::new();
    let ok = subst.unify_with_abstraction(
      &store, plus, BankIndex::QUERY, c, BankIndex::RESULT, &handler, &mut constraints,
    );
    assert!(ok);
    assert_eq!(constraints.len(), 1);
  }
}
