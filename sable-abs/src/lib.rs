/*!

Types/type aliases that abstract over the implementing backing type.

A motivating example is the `IString` type, an interned string type. A number of external crates
could provide this functionality. This module redirects to whatever chosen implementation we want.
To use the [`string_cache` crate](https://crates.io/crates/string_cache), we just define `IString`
as an alias for `string_cache::DefaultAtom`:

```ignore
pub use string_cache::DefaultAtom as IString;
```

For types or infrastructure with very different backing implementations, we define an abstraction
layer over the implementation. For example, the `log` module could use any of a number of logging
frameworks for its implementation, but its (crate) public interface consists only of
`set_global_logging_threshold()`/`get_global_logging_threshold()` and the macros `critical!`,
`error!`, `warning!`, `info!`, `debug!`, and `trace!`.

*/

mod nat_set;
mod rccell;
mod string_util;

pub mod numeric;

// region Hashing data structures
pub use std::collections::HashMap;
pub use std::collections::HashSet;
// endregion

// For vectors that are expected to have few or zero elements.
pub use smallvec::{smallvec, SmallVec};

// Logging
pub use tracing;
pub mod log;

// Interned string. `DefaultAtom` is a global cache that can be used across threads.
pub use string_cache::DefaultAtom as IString;

// A set of (small) natural numbers
pub use nat_set::NatSet;

// Reference counted pointers with mutable stable, and complementary weak pointers.
pub use rccell::{rc_cell, RcCell, WeakCell};

// Join sequences with a separator
pub use string_util::{join_iter, join_string};
