/*!

Code trees: stored terms compiled into a flattened instruction stream for fast one-way matching.

Insertion normalises the term's variables and compiles a preorder walk into a straight-line
program over three opcodes (check-functor, bind-register at the first occurrence of a variable,
check-register at repeated occurrences) terminated by a success node holding the clause-tagged
entries. Programs sharing a prefix share instructions; divergence hangs the remainder off a
failure-jump (`alternative`) chain, so the whole index is one instruction soup interpreted with
an explicit choice stack.

Retrieval matches a query *instance* against the stored *general* terms: the query is flattened
once into a preorder array with subterm-skip offsets, and the interpreter runs the soup over it.
Registers end up holding the images of the stored term's normalised variables; consumers
instantiate whatever they stashed in the entry (forward demodulation keeps the equation's other
side there) directly from the register file.

*/

use crate::core::clause::ClauseId;
use crate::core::literal::LiteralId;
use crate::core::substitution::Renaming;
use crate::core::term::{TermData, TermId, TermStore};
use crate::core::symbol::SymbolIndex;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CodeEntry {
  pub clause : ClauseId,
  pub literal: LiteralId,
  pub term   : Option<TermId>,
  /// Normalised under the same renaming as the indexed term; for demodulation, the equation's
  /// other side.
  pub extra  : Option<TermId>,
}

enum Instruction {
  CheckFunction {
    symbol     : SymbolIndex,
    next       : u32,
    alternative: Option<u32>,
  },
  BindVariable {
    register   : u32,
    next       : u32,
    alternative: Option<u32>,
  },
  CheckVariable {
    register   : u32,
    next       : u32,
    alternative: Option<u32>,
  },
  Success {
    entries: Vec<CodeEntry>,
  },
}

impl Instruction {
  fn alternative(&self) -> Option<u32> {
    match self {
      Instruction::CheckFunction { alternative, .. }
      | Instruction::BindVariable { alternative, .. }
      | Instruction::CheckVariable { alternative, .. } => *alternative,
      Instruction::Success { .. } => None,
    }
  }

  fn set_alternative(&mut self, alt: u32) {
    match self {
      Instruction::CheckFunction { alternative, .. }
      | Instruction::BindVariable { alternative, .. }
      | Instruction::CheckVariable { alternative, .. } => *alternative = Some(alt),
      Instruction::Success { .. } => {
        debug_assert!(false, "success nodes take no alternative");
      }
    }
  }
}

/// A straight-line opcode before placement into the soup.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Op {
  Function(SymbolIndex),
  Bind(u32),
  Check(u32),
}

pub struct CodeTree {
  instructions: Vec<Instruction>,
  root        : Option<u32>,
  entry_count : usize,
}

impl Default for CodeTree {
  fn default() -> Self {
    CodeTree {
      instructions: Vec::new(),
      root        : None,
      entry_count : 0,
    }
  }
}

impl CodeTree {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.entry_count == 0
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.entry_count
  }

  /// Compiles the normalised argument list into opcodes. Registers are numbered by first
  /// occurrence, which is exactly the normalisation order.
  fn compile(store: &TermStore, args: &[TermId]) -> Vec<Op> {
    let mut ops  = Vec::new();
    let mut seen = 0u32;
    for &arg in args {
      compile_term(store, arg, &mut ops, &mut seen);
    }
    ops
  }

  /// Inserts an indexed occurrence. `args` are the top-level argument slots (one slot for plain
  /// term indexing); `extra` is normalised together with them.
  pub fn insert(
    &mut self,
    store: &mut TermStore,
    args: &[TermId],
    term: Option<TermId>,
    literal: LiteralId,
    clause: ClauseId,
    extra: Option<TermId>,
  ) {
    let mut renaming = Renaming::new();
    let normalized: Vec<TermId> = args.iter().map(|&a| renaming.rename_term(store, a)).collect();
    let extra = extra.map(|e| renaming.rename_term(store, e));
    let ops = Self::compile(store, &normalized);
    let entry = CodeEntry { clause, literal, term, extra };

    self.entry_count += 1;

    let Some(mut current) = self.root else {
      self.root = Some(self.emit_chain(&ops, entry));
      return;
    };

    let mut remaining: &[Op] = &ops;
    loop {
      if remaining.is_empty() {
        match &mut self.instructions[current as usize] {
          Instruction::Success { entries } => {
            entries.push(entry);
            return;
          }
          _ => {
            debug_assert!(false, "op sequences of one tree have equal shape");
            return;
          }
        }
      }
      let op = remaining[0];
      if self.matches(current, op) {
        remaining = &remaining[1..];
        current = self.next_of(current);
        continue;
      }
      match self.instructions[current as usize].alternative() {
        Some(alt) => current = alt,
        None => {
          let chain = self.emit_chain(remaining, entry);
          self.instructions[current as usize].set_alternative(chain);
          return;
        }
      }
    }
  }

  /// Removes an occurrence inserted with exactly the same arguments. Dead instructions are left
  /// in the soup; empty success nodes simply never fire.
  pub fn remove(
    &mut self,
    store: &mut TermStore,
    args: &[TermId],
    term: Option<TermId>,
    literal: LiteralId,
    clause: ClauseId,
  ) {
    let mut renaming = Renaming::new();
    let normalized: Vec<TermId> = args.iter().map(|&a| renaming.rename_term(store, a)).collect();
    let ops = Self::compile(store, &normalized);

    let Some(mut current) = self.root else {
      debug_assert!(false, "removing from an empty code tree");
      return;
    };
    let mut remaining: &[Op] = &ops;
    loop {
      if remaining.is_empty() {
        if let Instruction::Success { entries } = &mut self.instructions[current as usize] {
          let before = entries.len();
          entries.retain(|e| !(e.clause == clause && e.literal == literal && e.term == term));
          debug_assert!(entries.len() < before, "removing an entry that was never inserted");
          self.entry_count -= before - entries.len();
        }
        return;
      }
      let op = remaining[0];
      if self.matches(current, op) {
        remaining = &remaining[1..];
        current = self.next_of(current);
      } else {
        match self.instructions[current as usize].alternative() {
          Some(alt) => current = alt,
          None => {
            debug_assert!(false, "removing an entry that was never inserted");
            return;
          }
        }
      }
    }
  }

  fn matches(&self, at: u32, op: Op) -> bool {
    match (&self.instructions[at as usize], op) {
      (Instruction::CheckFunction { symbol, .. }, Op::Function(f)) => *symbol == f,
      (Instruction::BindVariable { register, .. }, Op::Bind(r)) => *register == r,
      (Instruction::CheckVariable { register, .. }, Op::Check(r)) => *register == r,
      _ => false,
    }
  }

  fn next_of(&self, at: u32) -> u32 {
    match &self.instructions[at as usize] {
      Instruction::CheckFunction { next, .. }
      | Instruction::BindVariable { next, .. }
      | Instruction::CheckVariable { next, .. } => *next,
      Instruction::Success { .. } => at,
    }
  }

  /// Appends `ops` followed by a success node holding `entry`; returns the chain head.
  fn emit_chain(&mut self, ops: &[Op], entry: CodeEntry) -> u32 {
    let base = self.instructions.len() as u32;
    for (i, &op) in ops.iter().enumerate() {
      let next = base + i as u32 + 1;
      let instruction = match op {
        Op::Function(symbol) => Instruction::CheckFunction { symbol, next, alternative: None },
        Op::Bind(register)   => Instruction::BindVariable { register, next, alternative: None },
        Op::Check(register)  => Instruction::CheckVariable { register, next, alternative: None },
      };
      self.instructions.push(instruction);
    }
    self.instructions.push(Instruction::Success { entries: vec![entry] });
    base
  }

  /// Matches the stored general terms against the query instance `args`.
  pub fn retrieve_generalizations(&self, store: &TermStore, args: &[TermId]) -> CodeCursor<'_> {
    let mut flat = Vec::new();
    for &arg in args {
      flatten_query(store, arg, &mut flat);
    }
    CodeCursor {
      tree     : self,
      flat,
      registers: Vec::new(),
      trail    : Vec::new(),
      choices  : Vec::new(),
      pc       : self.root,
      pos      : 0,
      pending  : None,
    }
  }
}

fn compile_term(store: &TermStore, term: TermId, ops: &mut Vec<Op>, seen: &mut u32) {
  match &store.term(term).data {
    TermData::Variable(v) => {
      let index = v.0;
      if index < *seen {
        ops.push(Op::Check(index));
      } else {
        debug_assert_eq!(index, *seen, "terms must be normalised before compilation");
        ops.push(Op::Bind(index));
        *seen += 1;
      }
    }
    TermData::SpecialVariable(_) => {
      debug_assert!(false, "special variable in a code tree term");
    }
    TermData::Function { symbol, args } => {
      ops.push(Op::Function(*symbol));
      for &arg in args.iter() {
        compile_term(store, arg, ops, seen);
      }
    }
  }
}

#[derive(Copy, Clone)]
struct FlatCell {
  term: TermId,
  /// Index one past this subterm's cells: where a variable match resumes.
  end: usize,
}

fn flatten_query(store: &TermStore, term: TermId, out: &mut Vec<FlatCell>) {
  let at = out.len();
  out.push(FlatCell { term, end: 0 });
  for &arg in store.term(term).args().to_vec().iter() {
    flatten_query(store, arg, out);
  }
  out[at].end = out.len();
}

struct Choice {
  pc       : u32,
  pos      : usize,
  trail_len: usize,
}

pub struct CodeCursor<'t> {
  tree     : &'t CodeTree,
  flat     : Vec<FlatCell>,
  registers: Vec<Option<TermId>>,
  trail    : Vec<u32>,
  choices  : Vec<Choice>,
  pc       : Option<u32>,
  pos      : usize,
  pending  : Option<(Vec<CodeEntry>, usize)>,
}

impl CodeCursor<'_> {
  /// The register file of the most recent hit: image of stored variable `i` at index `i`. Live
  /// until the next `next()` call.
  #[inline(always)]
  pub fn bindings(&self) -> &[Option<TermId>] {
    &self.registers
  }

  pub fn next(&mut self, store: &TermStore) -> Option<CodeEntry> {
    loop {
      if let Some((entries, index)) = self.pending.as_mut() {
        if *index < entries.len() {
          let entry = entries[*index].clone();
          *index += 1;
          return Some(entry);
        }
        self.pending = None;
        if !self.backtrack() {
          return None;
        }
      }

      let Some(pc) = self.pc else {
        return None;
      };

      let tree = self.tree;
      match &tree.instructions[pc as usize] {
        Instruction::CheckFunction { symbol, next, alternative } => {
          if let Some(alt) = alternative {
            self.choices.push(Choice { pc: *alt, pos: self.pos, trail_len: self.trail.len() });
          }
          let cell = self.flat[self.pos];
          let matched = matches!(
            &store.term(cell.term).data,
            TermData::Function { symbol: f, .. } if f == symbol
          );
          if matched {
            self.pos += 1;
            self.pc = Some(*next);
          } else if !self.backtrack() {
            return None;
          }
        }
        Instruction::BindVariable { register, next, alternative } => {
          if let Some(alt) = alternative {
            self.choices.push(Choice { pc: *alt, pos: self.pos, trail_len: self.trail.len() });
          }
          let register = *register;
          let cell = self.flat[self.pos];
          if self.registers.len() <= register as usize {
            self.registers.resize(register as usize + 1, None);
          }
          self.registers[register as usize] = Some(cell.term);
          self.trail.push(register);
          self.pos = cell.end;
          self.pc = Some(*next);
        }
        Instruction::CheckVariable { register, next, alternative } => {
          if let Some(alt) = alternative {
            self.choices.push(Choice { pc: *alt, pos: self.pos, trail_len: self.trail.len() });
          }
          let cell = self.flat[self.pos];
          let bound = self.registers.get(*register as usize).copied().flatten();
          if bound == Some(cell.term) {
            self.pos = cell.end;
            self.pc = Some(*next);
          } else if !self.backtrack() {
            return None;
          }
        }
        Instruction::Success { entries } => {
          debug_assert_eq!(self.pos, self.flat.len(), "query not fully consumed at success");
          self.pending = Some((entries.clone(), 0));
        }
      }
    }
  }

  fn backtrack(&mut self) -> bool {
    match self.choices.pop() {
      None => {
        self.pc = None;
        false
      }
      Some(choice) => {
        while self.trail.len() > choice.trail_len {
          let register = self.trail.pop().unwrap();
          self.registers[register as usize] = None;
        }
        self.pc = Some(choice.pc);
        self.pos = choice.pos;
        true
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::symbol::Signature;
  use crate::core::term::{TermBuilder, VariableIndex};
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

  #[test]
  fn generalization_with_bindings() {
    let (mut store, f, g, a, b) = setup();
    let lit = LiteralId(0);

    // Store g(X0, f(X0)) with rhs-extra f(X0).
    let x   = store.mk_variable(VariableIndex(17));
    let fx  = store.mk_function(f, &[x]);
    let gx  = store.mk_function(g, &[x, fx]);
    let mut tree = CodeTree::new();
    tree.insert(&mut store, &[gx], Some(gx), lit, ClauseId(0), Some(fx));

    // Query g(a, f(a)).
    let ca  = store.mk_function(a, &[]);
    let fa  = store.mk_function(f, &[ca]);
    let gaa = store.mk_function(g, &[ca, fa]);

    let mut cursor = tree.retrieve_generalizations(&store, &[gaa]);
    let entry = cursor.next(&store).expect("stored term generalises the query");
    assert_eq!(entry.clause, ClauseId(0));

    // Register 0 holds the image of the stored variable; instantiating the stashed extra yields
    // the query's image of f(X0).
    let bindings = cursor.bindings().to_vec();
    let extra = entry.extra.unwrap();
    let image = store.instantiate(extra, &bindings);
    assert_eq!(image, fa);

    // Mismatching query: g(a, f(b)) requires both occurrences of X0 to agree.
    let cb  = store.mk_function(b, &[]);
    let fb  = store.mk_function(f, &[cb]);
    let gab = store.mk_function(g, &[ca, fb]);
    let mut cursor = tree.retrieve_generalizations(&store, &[gab]);
    assert!(cursor.next(&store).is_none());
  }

  #[test]
  fn alternative_branches_are_all_tried() {
    let (mut store, f, _, a, b) = setup();
    let lit = LiteralId(0);

    // Store f(a), f(X0), and X0: all three generalise the query f(a).
    let ca = store.mk_function(a, &[]);
    let fa = store.mk_function(f, &[ca]);
    let x  = store.mk_variable(VariableIndex(0));
    let fx = store.mk_function(f, &[x]);

    let mut tree = CodeTree::new();
    tree.insert(&mut store, &[fa], Some(fa), lit, ClauseId(0), None);
    tree.insert(&mut store, &[fx], Some(fx), lit, ClauseId(1), None);
    tree.insert(&mut store, &[x], Some(x), lit, ClauseId(2), None);

    let mut cursor = tree.retrieve_generalizations(&store, &[fa]);
    let mut clauses = Vec::new();
    while let Some(entry) = cursor.next(&store) {
      clauses.push(entry.clause);
    }
    clauses.sort();
    assert_eq!(clauses, vec![ClauseId(0), ClauseId(1), ClauseId(2)]);

    // f(b) is only matched by f(X0) and X0.
    let cb = store.mk_function(b, &[]);
    let fb = store.mk_function(f, &[cb]);
    let mut cursor = tree.retrieve_generalizations(&store, &[fb]);
    let mut clauses = Vec::new();
    while let Some(entry) = cursor.next(&store) {
      clauses.push(entry.clause);
    }
    clauses.sort();
    assert_eq!(clauses, vec![ClauseId(1), ClauseId(2)]);
  }

  #[test]
  fn removal_silences_the_entry() {
    let (mut store, f, _, a, _) = setup();
    let lit = LiteralId(0);

    let ca = store.mk_function(a, &[]);
    let fa = store.mk_function(f, &[ca]);
    let mut tree = CodeTree::new();
    tree.insert(&mut store, &[fa], Some(fa), lit, ClauseId(0), None);
    tree.remove(&mut store, &[fa], Some(fa), lit, ClauseId(0));
    assert!(tree.is_empty());

    let mut cursor = tree.retrieve_generalizations(&store, &[fa]);
    assert!(cursor.next(&store).is_none());
  }
}
