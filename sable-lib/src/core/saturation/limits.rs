/*!

Cooperative resource limits.

The core is single-threaded: there is no interrupt that could stop a runaway generation loop, so
the loop and the engines poll the limiter at fixed suspension points: the top of each saturation
iteration, between materialisations of generation iterators, and before every forward
simplification attempt. A limit violation is an ordinary error value that unwinds with `?` to the
loop top, where it becomes the termination reason; partial recording scopes are rolled back by
their owners on the way out.

Memory accounting is an estimate over the arena sizes; exact allocator bookkeeping is not worth
its cost here.

*/

use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

use crate::core::options::Options;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LimitReached {
  Time,
  Memory,
  Unprocessed,
}

impl Display for LimitReached {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      LimitReached::Time        => write!(f, "time limit reached"),
      LimitReached::Memory      => write!(f, "memory limit reached"),
      LimitReached::Unprocessed => write!(f, "unprocessed clause limit reached"),
    }
  }
}

impl std::error::Error for LimitReached {}

/// Estimated bytes for one shared term / one clause. Coarse, but stable across platforms.
const TERM_BYTES  : usize = 64;
const CLAUSE_BYTES: usize = 96;

pub struct Limits {
  started          : Instant,
  time_limit       : Option<Duration>,
  memory_limit     : Option<usize>,
  unprocessed_limit: Option<u32>,
}

impl Limits {
  pub fn new(options: &Options) -> Self {
    Limits {
      started          : Instant::now(),
      time_limit       : options.time_limit,
      memory_limit     : options.memory_limit,
      unprocessed_limit: options.unprocessed_limit,
    }
  }

  #[inline(always)]
  pub fn elapsed(&self) -> Duration {
    self.started.elapsed()
  }

  /// The cooperative checkpoint. `term_count`/`clause_count` size the memory estimate;
  /// `unprocessed` is the current length of the Unprocessed container.
  pub fn check(
    &self,
    term_count: usize,
    clause_count: usize,
    unprocessed: usize,
  ) -> Result<(), LimitReached> {
    if let Some(limit) = self.time_limit {
      if self.started.elapsed() >= limit {
        return Err(LimitReached::Time);
      }
    }
    if let Some(limit) = self.memory_limit {
      let estimate = term_count * TERM_BYTES + clause_count * CLAUSE_BYTES;
      if estimate >= limit {
        return Err(LimitReached::Memory);
      }
    }
    if let Some(limit) = self.unprocessed_limit {
      if unprocessed as u32 >= limit {
        return Err(LimitReached::Unprocessed);
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_limit_trips_on_estimate() {
    let options = Options {
      memory_limit: Some(1024),
      ..Options::default()
    };
    let limits = Limits::new(&options);
    assert!(limits.check(4, 2, 0).is_ok());
    assert_eq!(limits.check(1000, 0, 0), Err(LimitReached::Memory));
  }

  #[test]
  fn unprocessed_limit_trips() {
    let options = Options {
      unprocessed_limit: Some(8),
      ..Options::default()
    };
    let limits = Limits::new(&options);
    assert!(limits.check(0, 0, 7).is_ok());
    assert_eq!(limits.check(0, 0, 8), Err(LimitReached::Unprocessed));
  }
}
