/*!

Clause provenance. Every clause records the rule that derived it and its parent clauses; input
clauses use the distinguished `Input` rule with no parents. The derivation accessor walks these
records backwards from the empty clause to assemble the refutation DAG.

*/

use std::fmt::{Display, Formatter};

use sable_abs::{HashSet, SmallVec};

use crate::core::clause::{ClauseArena, ClauseId};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum InferenceRule {
  Input,
  BinaryResolution,
  Factoring,
  Superposition,
  EqualityResolution,
  EqualityFactoring,
  ForwardDemodulation,
  BackwardDemodulation,
  SubsumptionResolution,
  DuplicateLiteralRemoval,
  TrivialInequalityRemoval,
  EquationalTautologyRemoval,
  StructuralInduction,
  IntegerInduction,
  InductionHypothesisRewriting,
}

impl Display for InferenceRule {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      InferenceRule::Input                      => "input",
      InferenceRule::BinaryResolution           => "binary resolution",
      InferenceRule::Factoring                  => "factoring",
      InferenceRule::Superposition              => "superposition",
      InferenceRule::EqualityResolution         => "equality resolution",
      InferenceRule::EqualityFactoring          => "equality factoring",
      InferenceRule::ForwardDemodulation        => "forward demodulation",
      InferenceRule::BackwardDemodulation       => "backward demodulation",
      InferenceRule::SubsumptionResolution      => "subsumption resolution",
      InferenceRule::DuplicateLiteralRemoval    => "duplicate literal removal",
      InferenceRule::TrivialInequalityRemoval   => "trivial inequality removal",
      InferenceRule::EquationalTautologyRemoval => "equational tautology removal",
      InferenceRule::StructuralInduction        => "structural induction",
      InferenceRule::IntegerInduction           => "integer induction",
      InferenceRule::InductionHypothesisRewriting => "induction hypothesis rewriting",
    };
    write!(f, "{}", name)
  }
}

#[derive(Clone, Debug)]
pub struct Inference {
  pub rule   : InferenceRule,
  pub parents: SmallVec<[ClauseId; 2]>,
}

impl Inference {
  #[inline(always)]
  pub fn input() -> Self {
    Inference {
      rule   : InferenceRule::Input,
      parents: SmallVec::new(),
    }
  }

  #[inline(always)]
  pub fn new(rule: InferenceRule, parents: &[ClauseId]) -> Self {
    Inference {
      rule,
      parents: SmallVec::from_slice(parents),
    }
  }
}

/// The derivation DAG of a clause: `(clause, inference)` nodes listed parents-first.
pub struct Derivation {
  pub root : ClauseId,
  pub nodes: Vec<(ClauseId, Inference)>,
}

impl Derivation {
  /// Collects the sub-DAG reachable from `root`, parents before children.
  pub fn of(arena: &ClauseArena, root: ClauseId) -> Derivation {
    let mut nodes   = Vec::new();
    let mut visited = HashSet::new();
    collect(arena, root, &mut visited, &mut nodes);
    Derivation { root, nodes }
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn contains_rule(&self, rule: InferenceRule) -> bool {
    self.nodes.iter().any(|(_, inference)| inference.rule == rule)
  }
}

fn collect(
  arena: &ClauseArena,
  clause: ClauseId,
  visited: &mut HashSet<ClauseId>,
  nodes: &mut Vec<(ClauseId, Inference)>,
) {
  if !visited.insert(clause) {
    return;
  }
  let inference = arena.get(clause).inference.clone();
  for &parent in inference.parents.iter() {
    collect(arena, parent, visited, nodes);
  }
  nodes.push((clause, inference));
}
