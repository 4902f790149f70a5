//! crates/logging/src/record.rs
//! The transient record handed to every channel during one dispatch.

use std::error::Error;
use std::fmt;

use crate::level::Level;

/// Source location of a log call.
///
/// Rust has no macro that expands to the enclosing function name, so the
/// logging macros store the module path in [`function`](Self::function).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Location {
    file: &'static str,
    function: &'static str,
    line: u32,
}

impl Location {
    /// Creates a location from its parts.
    #[must_use]
    pub const fn new(file: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
        }
    }

    /// Source file of the call.
    #[must_use]
    pub const fn file(&self) -> &'static str {
        self.file
    }

    /// Function (or module path) of the call.
    #[must_use]
    pub const fn function(&self) -> &'static str {
        self.function
    }

    /// Line of the call.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.function, self.line)
    }
}

/// One message as seen by a channel.
///
/// A record borrows everything it carries and only lives for a single
/// dispatch; channels that need to keep data must copy it.
#[derive(Copy, Clone)]
pub struct Record<'a> {
    level: Level,
    component: &'a str,
    location: Location,
    error: Option<&'a dyn Error>,
    message: &'a str,
}

impl<'a> Record<'a> {
    /// Assembles a record from its parts.
    #[must_use]
    pub const fn new(
        level: Level,
        component: &'a str,
        location: Location,
        error: Option<&'a dyn Error>,
        message: &'a str,
    ) -> Self {
        Self {
            level,
            component,
            location,
            error,
            message,
        }
    }

    /// Level of the message.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Component that emitted the message.
    #[must_use]
    pub const fn component(&self) -> &'a str {
        self.component
    }

    /// Source location of the log call.
    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    /// Error attached to the message, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&'a dyn Error> {
        self.error
    }

    /// Rendered error message, if an error is attached.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.map(ToString::to_string)
    }

    /// The rendered message text shared by every channel.
    #[must_use]
    pub const fn message(&self) -> &'a str {
        self.message
    }
}

impl fmt::Debug for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("level", &self.level)
            .field("component", &self.component)
            .field("location", &self.location)
            .field("error", &self.error_message())
            .field("message", &self.message)
            .finish()
    }
}
