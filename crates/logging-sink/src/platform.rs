//! crates/logging-sink/src/platform.rs
//! The platform log channel.
//!
//! [`PlatformChannel`] forwards records to the operating system's log
//! through a [`PlatformBackend`]. Each record becomes one backend write
//! tagged with the record's component:
//!
//! - non-critical levels write the message as is;
//! - [`Level::Critical`] writes `file:function:line: message`;
//! - an attached error is written as a second entry at the same priority.
//!
//! The channel has no finalize step; backends that hold a connection close
//! it when dropped.

use std::fmt;

use logging::{Channel, Level, Record};

/// Severity understood by platform backends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlatformPriority {
    /// Most detailed tracing.
    Verbose,
    /// Debugging detail.
    Debug,
    /// Informational.
    Info,
    /// Errors.
    Error,
}

impl PlatformPriority {
    /// Maps a message level onto a platform priority.
    ///
    /// ```
    /// use logging::Level;
    /// use logging_sink::PlatformPriority;
    ///
    /// assert_eq!(PlatformPriority::from_level(Level::Output), PlatformPriority::Info);
    /// assert_eq!(PlatformPriority::from_level(Level::Critical), PlatformPriority::Error);
    /// ```
    #[must_use]
    pub const fn from_level(level: Level) -> Self {
        match level {
            Level::Verbose => Self::Verbose,
            Level::Logic => Self::Debug,
            Level::Component | Level::Output => Self::Info,
            Level::Critical => Self::Error,
        }
    }
}

/// Destination of platform channel writes.
///
/// Backends are `Send` so a [`PlatformChannel`] can live in the process-wide
/// default context.
pub trait PlatformBackend: Send {
    /// Writes one entry. Failures are the backend's to swallow.
    fn write(&mut self, priority: PlatformPriority, tag: &str, text: &str);
}

impl<B: PlatformBackend + ?Sized> PlatformBackend for Box<B> {
    fn write(&mut self, priority: PlatformPriority, tag: &str, text: &str) {
        (**self).write(priority, tag, text);
    }
}

/// Channel that forwards every record to a [`PlatformBackend`].
pub struct PlatformChannel<B> {
    backend: B,
}

impl<B: PlatformBackend> PlatformChannel<B> {
    /// Wraps a backend.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Borrows the backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Consumes the channel and returns its backend.
    pub fn into_backend(self) -> B {
        self.backend
    }
}

impl<B: PlatformBackend> Channel for PlatformChannel<B> {
    fn log(&mut self, record: &Record<'_>) {
        let priority = PlatformPriority::from_level(record.level());
        let tag = record.component();

        if record.level() == Level::Critical {
            let location = record.location();
            let text = format!(
                "{}:{}:{}: {}",
                location.file(),
                location.function(),
                location.line(),
                record.message()
            );
            self.backend.write(priority, tag, &text);
        } else {
            self.backend.write(priority, tag, record.message());
        }

        if let Some(error) = record.error_message() {
            self.backend.write(priority, tag, &error);
        }
    }
}

impl<B: fmt::Debug> fmt::Debug for PlatformChannel<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformChannel")
            .field("backend", &self.backend)
            .finish()
    }
}

#[cfg(unix)]
pub use self::unix::SyslogBackend;

#[cfg(unix)]
mod unix {
    use super::{PlatformBackend, PlatformPriority};
    use crate::syslog::{SyslogConfig, SyslogGuard, SyslogPriority, syslog_message};

    /// Backend writing to syslog(3) as `"<tag>: <text>"`.
    ///
    /// Priorities map verbose and debug to `LOG_DEBUG`, info to `LOG_INFO`
    /// and error to `LOG_ERR`. The connection closes when the backend is
    /// dropped.
    #[derive(Debug)]
    pub struct SyslogBackend {
        _guard: SyslogGuard,
    }

    impl SyslogBackend {
        /// Opens a syslog connection with the given facility and ident.
        #[must_use]
        pub fn open(config: &SyslogConfig) -> Self {
            Self {
                _guard: config.open(),
            }
        }

        /// Syslog severity used for a platform priority.
        #[must_use]
        pub const fn priority(priority: PlatformPriority) -> SyslogPriority {
            match priority {
                PlatformPriority::Verbose | PlatformPriority::Debug => SyslogPriority::Debug,
                PlatformPriority::Info => SyslogPriority::Info,
                PlatformPriority::Error => SyslogPriority::Error,
            }
        }
    }

    impl PlatformBackend for SyslogBackend {
        fn write(&mut self, priority: PlatformPriority, tag: &str, text: &str) {
            syslog_message(Self::priority(priority), &format!("{tag}: {text}"));
        }
    }
}
