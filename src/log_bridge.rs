//! Adapter that lets code written against the `log` crate feed this pipeline.

use log::{Log, Metadata, SetLoggerError};

use crate::dispatch::Dispatch;
use crate::record::Record;
use crate::severity::Severity;

/// A [`log::Log`] implementation that turns each `log` record into a
/// [`Record`] on the given dispatch. The `log` target becomes the record's
/// function tag.
pub struct LogBridge {
    dispatch: &'static Dispatch,
}

impl LogBridge {
    pub fn new(dispatch: &'static Dispatch) -> Self {
        Self { dispatch }
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.dispatch.enabled(Severity::from(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        let severity = Severity::from(record.level());
        if !self.dispatch.enabled(severity) {
            return;
        }
        let mut out = Record::with_dispatch(
            self.dispatch,
            record.file().unwrap_or("<unknown>"),
            record.line().unwrap_or(0),
            severity,
            Some(record.target()),
        );
        out.append(record.args());
        out.finish();
    }

    // Records are handed over as they are logged; the flush hook is reserved
    // for the fatal path.
    fn flush(&self) {}
}

/// Installs a [`LogBridge`] as the `log` crate's global logger and aligns
/// `log`'s max level with the dispatch threshold.
pub fn init_log_bridge(dispatch: &'static Dispatch) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(dispatch)))?;
    log::set_max_level(dispatch.min_severity().to_level_filter());
    Ok(())
}
