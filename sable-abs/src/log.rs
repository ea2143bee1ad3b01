/*!

Logging facade. The (crate) public interface consists only of `set_global_logging_threshold()`,
`get_global_logging_threshold()`, and the macros `critical!`, `error!`, `warning!`, `info!`,
`debug!`, and `trace!`. The (private) backing implementation is the `tracing` crate.

*/

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Once;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum LogLevel {
  Critical = 0,
  Error    = 1,
  Warning  = 2,
  Info     = 3,
  Debug    = 4,
  Trace    = 5,
}

static THRESHOLD: AtomicU8 = AtomicU8::new(LogLevel::Warning as u8);
static INIT: Once = Once::new();

/// Sets the global logging threshold, installing the subscriber on first use.
pub fn set_global_logging_threshold(level: LogLevel) {
  THRESHOLD.store(level as u8, Ordering::Relaxed);
  INIT.call_once(|| {
    let max = match level {
      LogLevel::Critical | LogLevel::Error => tracing::Level::ERROR,
      LogLevel::Warning => tracing::Level::WARN,
      LogLevel::Info    => tracing::Level::INFO,
      LogLevel::Debug   => tracing::Level::DEBUG,
      LogLevel::Trace   => tracing::Level::TRACE,
    };
    // A second subscriber registration is harmless in tests, so failures are ignored.
    let _ = tracing_subscriber::fmt().with_max_level(max).without_time().try_init();
  });
}

pub fn get_global_logging_threshold() -> LogLevel {
  match THRESHOLD.load(Ordering::Relaxed) {
    0 => LogLevel::Critical,
    1 => LogLevel::Error,
    2 => LogLevel::Warning,
    3 => LogLevel::Info,
    4 => LogLevel::Debug,
    _ => LogLevel::Trace,
  }
}

#[macro_export]
macro_rules! critical {
  ($($arg:tt)*) => { $crate::tracing::error!($($arg)*) };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => { $crate::tracing::error!($($arg)*) };
}

#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => { $crate::tracing::warn!($($arg)*) };
}

#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => { $crate::tracing::info!($($arg)*) };
}

#[macro_export]
macro_rules! debug {
  ($($arg:tt)*) => { $crate::tracing::debug!($($arg)*) };
}

#[macro_export]
macro_rules! trace {
  ($($arg:tt)*) => { $crate::tracing::trace!($($arg)*) };
}

pub use crate::{critical, debug, error, info, trace, warning};
