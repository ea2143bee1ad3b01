/*!

Shared machinery of the saturation core: the hash-consed term store and clause arena, the
signature, backtrackable substitutions, simplification orderings, term indexing, clause
containers, and the saturation driver itself.

*/

pub mod clause;
pub mod context;
pub mod indexing;
pub mod inference;
pub mod literal;
pub mod options;
pub mod ordering;
pub mod problem;
pub mod sat;
pub mod saturation;
pub mod selection;
pub mod sort;
pub mod statistics;
pub mod substitution;
pub mod symbol;
pub mod term;

pub use clause::{Clause, ClauseArena, ClauseExtras, ClauseId, ClauseStore};
pub use context::RunContext;
pub use inference::{Derivation, Inference, InferenceRule};
pub use literal::LiteralId;
pub use options::Options;
pub use sort::{Sort, SortId};
pub use statistics::Statistics;
pub use symbol::{Signature, SymbolIndex};
pub use term::{TermBuilder, TermId, TermStore, VariableIndex};
