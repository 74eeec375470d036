use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::config::LoggerConfig;
use crate::severity::Severity;

/// Receives each finished record, as one contiguous byte slice.
pub type OutputHook = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Called before a fatal record aborts the process.
pub type FlushHook = Arc<dyn Fn() + Send + Sync>;

/// Where finished records go, and which records are built at all.
///
/// A `Dispatch` bundles the severity threshold with the output and flush
/// hooks. The process has one global instance, created with the defaults
/// (threshold INFO, hooks writing to stdout) before any record can reach
/// it. Code that wants isolated routing, tests in particular, can create its
/// own instance and pass it to [`Record::with_dispatch`].
///
/// All accessors are thread safe: the threshold is an atomic and each hook is
/// swapped under its own lock. A record always sees either the old or the new
/// hook, never a torn state.
///
/// [`Record::with_dispatch`]: crate::Record::with_dispatch
pub struct Dispatch {
    min_severity: AtomicU8,
    output: RwLock<OutputHook>,
    flush: RwLock<FlushHook>,
}

lazy_static! {
    static ref GLOBAL_DISPATCH: Dispatch = Dispatch::new();
}

fn stdout_output() -> OutputHook {
    Arc::new(|bytes: &[u8]| {
        let _ = io::stdout().lock().write_all(bytes);
    })
}

fn stdout_flush() -> FlushHook {
    Arc::new(|| {
        let _ = io::stdout().lock().flush();
    })
}

impl Dispatch {
    /// A dispatch with the default threshold and stdout hooks.
    pub fn new() -> Self {
        Self {
            min_severity: AtomicU8::new(Severity::Info as u8),
            output: RwLock::new(stdout_output()),
            flush: RwLock::new(stdout_flush()),
        }
    }

    /// The process-wide instance used by the macros and [`Record::new`].
    ///
    /// [`Record::new`]: crate::Record::new
    pub fn global() -> &'static Dispatch {
        &GLOBAL_DISPATCH
    }

    #[inline]
    pub fn min_severity(&self) -> Severity {
        Severity::from_u8(self.min_severity.load(Ordering::Relaxed))
    }

    pub fn set_min_severity(&self, level: Severity) {
        self.min_severity.store(level as u8, Ordering::Relaxed);
    }

    /// The cheap guard checked before any formatting work starts.
    #[inline]
    pub fn enabled(&self, level: Severity) -> bool {
        level >= self.min_severity()
    }

    pub fn set_output_hook<F>(&self, hook: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        *self.output.write() = Arc::new(hook);
    }

    pub fn set_flush_hook<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.flush.write() = Arc::new(hook);
    }

    /// Restores the stdout hooks.
    pub fn reset_hooks(&self) {
        *self.output.write() = stdout_output();
        *self.flush.write() = stdout_flush();
    }

    pub fn apply_config(&self, config: &LoggerConfig) {
        self.set_min_severity(config.min_severity);
    }

    /// Hands one finished record to the output hook.
    #[inline]
    pub fn output(&self, record: &[u8]) {
        // The hook runs outside the lock so it may itself swap hooks.
        let hook = Arc::clone(&self.output.read());
        hook(record);
    }

    pub fn flush(&self) {
        let hook = Arc::clone(&self.flush.read());
        hook();
    }
}

impl Default for Dispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("min_severity", &self.min_severity())
            .finish_non_exhaustive()
    }
}

/// Sets the global threshold.
pub fn set_min_severity(level: Severity) {
    Dispatch::global().set_min_severity(level);
}

/// Reads the global threshold.
pub fn min_severity() -> Severity {
    Dispatch::global().min_severity()
}

/// Replaces the global output hook.
pub fn set_output_hook<F>(hook: F)
where
    F: Fn(&[u8]) + Send + Sync + 'static,
{
    Dispatch::global().set_output_hook(hook);
}

/// Replaces the global flush hook.
pub fn set_flush_hook<F>(hook: F)
where
    F: Fn() + Send + Sync + 'static,
{
    Dispatch::global().set_flush_hook(hook);
}
