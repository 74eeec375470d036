//! Call-site macros. Each one checks the threshold first, so a disabled level
//! costs one atomic load and formats nothing.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_record {
    ($dispatch:expr, $level:expr, $func:expr $(, $arg:expr)*) => {{
        let dispatch: &$crate::Dispatch = $dispatch;
        let level: $crate::Severity = $level;
        if dispatch.enabled(level) {
            let mut record =
                $crate::Record::with_dispatch(dispatch, file!(), line!(), level, $func);
            $( record.append(&$arg); )*
            record.finish();
        }
    }};
}

/// Logs the arguments, in order, at `level` through the global dispatch.
///
/// Arguments are anything [`Loggable`](crate::Loggable); use
/// `format_args!` for other `Display` types.
///
/// ```
/// # use async_logger::{log_at, Severity};
/// let port = 8080;
/// log_at!(Severity::Info, "listening on port ", port);
/// ```
#[macro_export]
macro_rules! log_at {
    ($level:expr $(, $arg:expr)* $(,)?) => {
        $crate::__log_record!($crate::Dispatch::global(), $level, None $(, $arg)*)
    };
}

/// Like [`log_at!`] but routed through an explicit [`Dispatch`](crate::Dispatch).
#[macro_export]
macro_rules! log_to {
    ($dispatch:expr, $level:expr $(, $arg:expr)* $(,)?) => {
        $crate::__log_record!($dispatch, $level, None $(, $arg)*)
    };
}

/// Trace-level record tagged with the calling module.
#[macro_export]
macro_rules! log_trace {
    ($($arg:expr),* $(,)?) => {
        $crate::__log_record!(
            $crate::Dispatch::global(),
            $crate::Severity::Trace,
            Some(module_path!())
            $(, $arg)*
        )
    };
}

/// Debug-level record tagged with the calling module.
#[macro_export]
macro_rules! log_debug {
    ($($arg:expr),* $(,)?) => {
        $crate::__log_record!(
            $crate::Dispatch::global(),
            $crate::Severity::Debug,
            Some(module_path!())
            $(, $arg)*
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:expr),* $(,)?) => {
        $crate::log_at!($crate::Severity::Info $(, $arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:expr),* $(,)?) => {
        $crate::log_at!($crate::Severity::Warn $(, $arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:expr),* $(,)?) => {
        $crate::log_at!($crate::Severity::Error $(, $arg)*)
    };
}

/// Logs, flushes the global dispatch and aborts the process.
#[macro_export]
macro_rules! log_fatal {
    ($($arg:expr),* $(,)?) => {
        $crate::log_at!($crate::Severity::Fatal $(, $arg)*)
    };
}
