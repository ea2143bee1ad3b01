/*!

Run statistics counters. Bumped throughout the core, reported once at the end of the run.

*/

use std::fmt::{Display, Formatter};

#[derive(Default, Clone, Debug)]
pub struct Statistics {
  pub input_clauses    : u64,
  pub generated_clauses: u64,
  pub activations      : u64,

  pub duplicate_literals   : u64,
  pub trivial_inequalities : u64,
  pub tautologies_deleted  : u64,

  pub forward_subsumed        : u64,
  pub subsumption_resolutions : u64,
  pub backward_subsumed       : u64,
  pub forward_demodulations   : u64,
  pub backward_demodulations  : u64,

  pub resolutions          : u64,
  pub factorings           : u64,
  pub superpositions       : u64,
  pub equality_resolutions : u64,
  pub equality_factorings  : u64,

  pub structural_induction_applications: u64,
  pub integer_induction_applications   : u64,
  pub postponed_schemata               : u64,
  pub reactivated_schemata             : u64,
  pub vacuous_schemata                 : u64,
  pub hypothesis_rewritings            : u64,
}

impl Display for Statistics {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    writeln!(f, "input clauses:          {}", self.input_clauses)?;
    writeln!(f, "generated clauses:      {}", self.generated_clauses)?;
    writeln!(f, "activations:            {}", self.activations)?;
    writeln!(f, "forward subsumed:       {}", self.forward_subsumed)?;
    writeln!(f, "subsumption resolutions:{}", self.subsumption_resolutions)?;
    writeln!(f, "backward subsumed:      {}", self.backward_subsumed)?;
    writeln!(f, "forward demodulations:  {}", self.forward_demodulations)?;
    writeln!(f, "backward demodulations: {}", self.backward_demodulations)?;
    writeln!(f, "resolutions:            {}", self.resolutions)?;
    writeln!(f, "factorings:             {}", self.factorings)?;
    writeln!(f, "superpositions:         {}", self.superpositions)?;
    writeln!(f, "equality resolutions:   {}", self.equality_resolutions)?;
    writeln!(f, "equality factorings:    {}", self.equality_factorings)?;
    writeln!(f, "structural inductions:  {}", self.structural_induction_applications)?;
    writeln!(f, "integer inductions:     {}", self.integer_induction_applications)?;
    write!(f,   "hypothesis rewritings:  {}", self.hypothesis_rewritings)
  }
}
