//! crates/logging/src/macros.rs
//! Logging macros that capture the call site.
//!
//! Every macro records `file!()`, `module_path!()` and `line!()` of its
//! expansion site and formats its trailing arguments with `format_args!`, so
//! nothing is allocated before the dispatcher reserves its message buffer.
//!
//! An error can be attached by placing `error = <expr>,` right after the
//! component; the expression must be a reference to a type implementing
//! [`std::error::Error`].

/// Expands to the [`Location`](crate::Location) of the macro call.
#[macro_export]
macro_rules! location {
    () => {
        $crate::Location::new(::core::file!(), ::core::module_path!(), ::core::line!())
    };
}

/// Logs through the default context at an explicit level.
///
/// ```
/// use logging::{Level, log_at};
///
/// let err = std::io::Error::other("disk full");
/// log_at!(Level::Component, "store", "flushed {} pages", 12);
/// log_at!(Level::Critical, "store", error = &err, "flush failed");
/// ```
#[macro_export]
macro_rules! log_at {
    ($level:expr, $component:expr, error = $error:expr, $($arg:tt)+) => {
        $crate::global::log(
            $level,
            $component,
            $crate::location!(),
            ::core::option::Option::Some($error as &dyn ::std::error::Error),
            ::core::format_args!($($arg)+),
        )
    };
    ($level:expr, $component:expr, $($arg:tt)+) => {
        $crate::global::log(
            $level,
            $component,
            $crate::location!(),
            ::core::option::Option::None,
            ::core::format_args!($($arg)+),
        )
    };
}

/// Logs through an explicit [`LogContext`](crate::LogContext).
#[macro_export]
macro_rules! log_to {
    ($context:expr, $level:expr, $component:expr, error = $error:expr, $($arg:tt)+) => {
        $context.log(
            $level,
            $component,
            $crate::location!(),
            ::core::option::Option::Some($error as &dyn ::std::error::Error),
            ::core::format_args!($($arg)+),
        )
    };
    ($context:expr, $level:expr, $component:expr, $($arg:tt)+) => {
        $context.log(
            $level,
            $component,
            $crate::location!(),
            ::core::option::Option::None,
            ::core::format_args!($($arg)+),
        )
    };
}

/// Logs at [`Level::Verbose`](crate::Level::Verbose).
#[macro_export]
macro_rules! log_verbose {
    ($($arg:tt)+) => {
        $crate::log_at!($crate::Level::Verbose, $($arg)+)
    };
}

/// Logs at [`Level::Logic`](crate::Level::Logic).
#[macro_export]
macro_rules! log_logic {
    ($($arg:tt)+) => {
        $crate::log_at!($crate::Level::Logic, $($arg)+)
    };
}

/// Logs at [`Level::Component`](crate::Level::Component).
#[macro_export]
macro_rules! log_component {
    ($($arg:tt)+) => {
        $crate::log_at!($crate::Level::Component, $($arg)+)
    };
}

/// Logs at [`Level::Critical`](crate::Level::Critical).
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => {
        $crate::log_at!($crate::Level::Critical, $($arg)+)
    };
}

/// Logs at [`Level::Output`](crate::Level::Output).
#[macro_export]
macro_rules! log_output {
    ($($arg:tt)+) => {
        $crate::log_at!($crate::Level::Output, $($arg)+)
    };
}
