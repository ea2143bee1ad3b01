/*!

Term indexing: fast retrieval of generalisations, instances, and unifiers of query terms and
literals over the Active clause set.

The substitution tree is the primary structure; code trees serve the one-way matching of forward
demodulation and forward subsumption; the type tree gates retrieval by result sort. Role-specific
indices subscribe to Active container events through the index manager, which reference-counts
them per requesting rule.

Queries never raise: an empty cursor signals "no matches". Result substitutions are live until
the next cursor advance; consumers copy out what they need.

*/

pub mod code_tree;
pub mod index_manager;
pub mod skip_list;
pub mod substitution_tree;
pub mod term_index;
pub mod type_substitution_tree;

pub use index_manager::{AnyIndex, IndexManager, IndexType};
pub use substitution_tree::{LeafEntry, QueryCursor, RetrievalMode, SubstitutionTree};
