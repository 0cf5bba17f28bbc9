// SPDX-License-Identifier: Apache-2.0 OR MIT
// Logging macros: capture file/line and tag every argument at the call site

/// Log a record at an explicit severity
///
/// Each argument is converted into a tagged [`LogArg`](crate::logging::LogArg)
/// through `From`; pass a `LogArg` variant directly to pick the tag yourself.
/// Evaluates to `true` if the record was enqueued (or filtered), `false` if
/// the ring was full and the record was dropped.
///
/// # Examples
/// ```ignore
/// log_at!(logger, Severity::Info, Facility::Service, "Loaded {}", name);
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $severity:expr, $facility:expr, $template:literal $(, $arg:expr)* $(,)?) => {
        $logger.emit(
            $crate::logging::LogRecord::new($severity, $facility, $template)
                .at(file!(), line!())
                $(.arg($arg))*
        )
    };
}

/// Log a message with fatal severity
///
/// # Examples
/// ```ignore
/// log_fatal!(logger, Facility::Main, "Cannot continue: {}", reason);
/// ```
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $facility:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Fatal, $facility, $($rest)+)
    };
}

/// Log a message with error severity
///
/// # Examples
/// ```ignore
/// log_error!(logger, Facility::Service, "Already loaded {}", name);
/// ```
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $facility:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Error, $facility, $($rest)+)
    };
}

/// Log a message with warn severity
///
/// # Examples
/// ```ignore
/// log_warn!(logger, Facility::Service, "{} reported code {} during load", name, code);
/// ```
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $facility:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Warn, $facility, $($rest)+)
    };
}

/// Log a message with info severity
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $facility:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Info, $facility, $($rest)+)
    };
}

/// Log a message with debug severity
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $facility:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Debug, $facility, $($rest)+)
    };
}

/// Log a message with trace severity
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $facility:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::logging::Severity::Trace, $facility, $($rest)+)
    };
}
