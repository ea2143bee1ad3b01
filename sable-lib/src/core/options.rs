/*!

Behavioural options recognised by the core. The (out of scope) shell parses the command line into
this struct; tests construct it directly. Every option here changes observable behaviour of the
saturation run; purely cosmetic options live with the shell.

*/

use std::time::Duration;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum OrderingChoice {
  #[default]
  Kbo,
  Lpo,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum DemodulationMode {
  Off,
  /// Only equations already oriented by the ordering may rewrite.
  Preordered,
  #[default]
  All,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum SubsumptionMode {
  Off,
  UnitOnly,
  #[default]
  On,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum InductionMode {
  #[default]
  None,
  Struct,
  Int,
  Both,
}

impl InductionMode {
  #[inline(always)]
  pub fn structural(self) -> bool {
    matches!(self, InductionMode::Struct | InductionMode::Both)
  }

  #[inline(always)]
  pub fn integer(self) -> bool {
    matches!(self, InductionMode::Int | InductionMode::Both)
  }

  #[inline(always)]
  pub fn enabled(self) -> bool {
    self != InductionMode::None
  }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum IntInductionInterval {
  #[default]
  Infinite,
  Finite,
  Both,
}

/// When an equality literal may seed integer induction.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum IntInductionStrictnessEq {
  /// Equalities may seed induction.
  #[default]
  None,
  /// Equalities never seed induction.
  Always,
}

/// When a comparison literal may seed integer induction.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum IntInductionStrictnessComp {
  /// Comparisons may seed induction.
  #[default]
  None,
  /// Only when the induction term occurs at the top level of one side and not inside the other.
  ToplevelNotInOther,
  /// Comparisons never seed induction.
  Always,
}

/// Which terms are excluded from seeding integer induction.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum IntInductionStrictnessTerm {
  /// Interpreted numerals are excluded (there is nothing to learn about them).
  #[default]
  InterpretedConstant,
  /// Everything without a Skolem inside is excluded as well.
  NoSkolems,
}

#[derive(Clone, Debug)]
pub struct Options {
  pub ordering                      : OrderingChoice,
  /// Passive rotation: `a` age-picks for every `w` weight-picks.
  pub age_weight_ratio              : (u32, u32),
  /// Literal selection function id applied when a clause enters Active.
  pub selection                     : u32,
  pub binary_resolution             : bool,
  pub superposition                 : bool,
  pub forward_demodulation          : DemodulationMode,
  pub backward_demodulation         : DemodulationMode,
  pub forward_subsumption           : bool,
  /// Requires `forward_subsumption`.
  pub forward_subsumption_resolution: bool,
  pub backward_subsumption          : SubsumptionMode,
  /// Hook to the AVATAR-style splitter (out of scope); carried through to clause extras.
  pub split_at                      : Option<u32>,
  pub equational_tautology_removal  : bool,

  pub induction                       : InductionMode,
  pub induction_strengthen_hypothesis : bool,
  pub induction_gen                   : bool,
  pub induction_on_complex_terms      : bool,
  pub non_unit_induction              : bool,
  pub int_induction_interval          : IntInductionInterval,
  pub int_induction_strictness_eq     : IntInductionStrictnessEq,
  pub int_induction_strictness_comp   : IntInductionStrictnessComp,
  pub int_induction_strictness_term   : IntInductionStrictnessTerm,

  pub time_limit       : Option<Duration>,
  /// Approximate bound on arena bytes.
  pub memory_limit     : Option<usize>,
  /// Bound on clauses sitting in Unprocessed at once.
  pub unprocessed_limit: Option<u32>,

  /// Weight penalty per split-set member, when the splitter is attached.
  pub split_weight_penalty: u32,
}

impl Default for Options {
  fn default() -> Self {
    Options {
      ordering                      : OrderingChoice::default(),
      age_weight_ratio              : (1, 4),
      selection                     : 1,
      binary_resolution             : true,
      superposition                 : true,
      forward_demodulation          : DemodulationMode::All,
      backward_demodulation         : DemodulationMode::All,
      forward_subsumption           : true,
      forward_subsumption_resolution: true,
      backward_subsumption          : SubsumptionMode::Off,
      split_at                      : None,
      equational_tautology_removal  : true,

      induction                      : InductionMode::None,
      induction_strengthen_hypothesis: false,
      induction_gen                  : false,
      induction_on_complex_terms     : false,
      non_unit_induction             : false,
      int_induction_interval         : IntInductionInterval::default(),
      int_induction_strictness_eq    : IntInductionStrictnessEq::default(),
      int_induction_strictness_comp  : IntInductionStrictnessComp::default(),
      int_induction_strictness_term  : IntInductionStrictnessTerm::default(),

      time_limit       : None,
      memory_limit     : None,
      unprocessed_limit: None,

      split_weight_penalty: 0,
    }
  }
}
