// Syslog backend for the platform channel.
//
// Calls libc `openlog`/`syslog`/`closelog` directly. Every message is passed
// through a `"%s"` format so `%` in user text is never interpreted.

use std::ffi::{CStr, CString};
use std::fmt;
use std::str::FromStr;

use logging::LogError;

/// Syslog facility codes matching the POSIX syslog(3) constants.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(i32)]
pub enum SyslogFacility {
    /// Kernel messages (LOG_KERN).
    Kern = libc::LOG_KERN,
    /// User-level messages (LOG_USER), the default for applications.
    #[default]
    User = libc::LOG_USER,
    /// Mail system (LOG_MAIL).
    Mail = libc::LOG_MAIL,
    /// System daemons (LOG_DAEMON).
    Daemon = libc::LOG_DAEMON,
    /// Security/authorization messages (LOG_AUTH).
    Auth = libc::LOG_AUTH,
    /// Messages generated internally by syslogd (LOG_SYSLOG).
    Syslog = libc::LOG_SYSLOG,
    /// Line printer subsystem (LOG_LPR).
    Lpr = libc::LOG_LPR,
    /// Network news subsystem (LOG_NEWS).
    News = libc::LOG_NEWS,
    /// UUCP subsystem (LOG_UUCP).
    Uucp = libc::LOG_UUCP,
    /// Clock daemon (LOG_CRON).
    Cron = libc::LOG_CRON,
    /// Reserved for local use (LOG_LOCAL0).
    Local0 = libc::LOG_LOCAL0,
    /// Reserved for local use (LOG_LOCAL1).
    Local1 = libc::LOG_LOCAL1,
    /// Reserved for local use (LOG_LOCAL2).
    Local2 = libc::LOG_LOCAL2,
    /// Reserved for local use (LOG_LOCAL3).
    Local3 = libc::LOG_LOCAL3,
    /// Reserved for local use (LOG_LOCAL4).
    Local4 = libc::LOG_LOCAL4,
    /// Reserved for local use (LOG_LOCAL5).
    Local5 = libc::LOG_LOCAL5,
    /// Reserved for local use (LOG_LOCAL6).
    Local6 = libc::LOG_LOCAL6,
    /// Reserved for local use (LOG_LOCAL7).
    Local7 = libc::LOG_LOCAL7,
}

impl SyslogFacility {
    /// Every facility, in `<syslog.h>` order.
    pub const ALL: [Self; 18] = [
        Self::Kern,
        Self::User,
        Self::Mail,
        Self::Daemon,
        Self::Auth,
        Self::Syslog,
        Self::Lpr,
        Self::News,
        Self::Uucp,
        Self::Cron,
        Self::Local0,
        Self::Local1,
        Self::Local2,
        Self::Local3,
        Self::Local4,
        Self::Local5,
        Self::Local6,
        Self::Local7,
    ];

    /// Parses a facility name, case-insensitively.
    ///
    /// ```
    /// # #[cfg(unix)]
    /// # {
    /// use logging_sink::syslog::SyslogFacility;
    ///
    /// assert_eq!(SyslogFacility::from_name("LOCAL3"), Some(SyslogFacility::Local3));
    /// assert_eq!(SyslogFacility::from_name("printer"), None);
    /// # }
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|facility| facility.as_str().eq_ignore_ascii_case(name))
    }

    /// Returns the conventional facility name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kern => "kern",
            Self::User => "user",
            Self::Mail => "mail",
            Self::Daemon => "daemon",
            Self::Auth => "auth",
            Self::Syslog => "syslog",
            Self::Lpr => "lpr",
            Self::News => "news",
            Self::Uucp => "uucp",
            Self::Cron => "cron",
            Self::Local0 => "local0",
            Self::Local1 => "local1",
            Self::Local2 => "local2",
            Self::Local3 => "local3",
            Self::Local4 => "local4",
            Self::Local5 => "local5",
            Self::Local6 => "local6",
            Self::Local7 => "local7",
        }
    }
}

impl fmt::Display for SyslogFacility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyslogFacility {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| LogError::InvalidConfig {
            key: "syslog facility",
            value: s.to_owned(),
        })
    }
}

/// Default syslog ident.
pub const DEFAULT_SYSLOG_IDENT: &str = "chanlog";

const DEFAULT_IDENT: &CStr = c"chanlog";

/// Facility and ident passed to [`openlog(3)`](libc::openlog).
///
/// Constructing a configuration does not touch syslog; call
/// [`open`](SyslogConfig::open) to begin routing messages.
///
/// ```
/// # #[cfg(unix)]
/// # {
/// use logging_sink::syslog::{SyslogConfig, SyslogFacility};
///
/// let config = SyslogConfig::new(SyslogFacility::Local5, "indexer");
/// assert_eq!(config.facility(), SyslogFacility::Local5);
/// assert_eq!(config.ident(), "indexer");
/// # }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyslogConfig {
    facility: SyslogFacility,
    ident: String,
}

impl SyslogConfig {
    /// Creates a configuration with the given facility and ident.
    pub fn new(facility: SyslogFacility, ident: impl Into<String>) -> Self {
        Self {
            facility,
            ident: ident.into(),
        }
    }

    /// Configured facility.
    pub const fn facility(&self) -> SyslogFacility {
        self.facility
    }

    /// Configured ident.
    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// Opens the syslog connection.
    ///
    /// An ident containing a NUL byte is replaced by
    /// [`DEFAULT_SYSLOG_IDENT`]. The returned guard keeps the ident alive
    /// and calls `closelog(3)` when dropped. syslog(3) keeps a single
    /// process-wide connection, so only one guard should be alive at a time.
    pub fn open(&self) -> SyslogGuard {
        let ident = CString::new(self.ident.as_str()).unwrap_or_else(|_| DEFAULT_IDENT.to_owned());

        // SAFETY: `ident` is a valid C string owned by the guard, which
        // outlives the connection because `closelog` runs in its `Drop`.
        unsafe {
            libc::openlog(ident.as_ptr(), libc::LOG_PID, self.facility as libc::c_int);
        }

        SyslogGuard { ident }
    }
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self::new(SyslogFacility::default(), DEFAULT_SYSLOG_IDENT)
    }
}

/// Syslog severities matching the POSIX syslog(3) constants.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(i32)]
pub enum SyslogPriority {
    /// System is unusable (LOG_EMERG).
    Emergency = libc::LOG_EMERG,
    /// Action must be taken immediately (LOG_ALERT).
    Alert = libc::LOG_ALERT,
    /// Critical conditions (LOG_CRIT).
    Critical = libc::LOG_CRIT,
    /// Error conditions (LOG_ERR).
    Error = libc::LOG_ERR,
    /// Warning conditions (LOG_WARNING).
    Warning = libc::LOG_WARNING,
    /// Normal but significant condition (LOG_NOTICE).
    Notice = libc::LOG_NOTICE,
    /// Informational messages (LOG_INFO).
    Info = libc::LOG_INFO,
    /// Debug-level messages (LOG_DEBUG).
    Debug = libc::LOG_DEBUG,
}

/// Sends one message to syslog(3).
///
/// Messages containing a NUL byte are dropped. Calling this without an open
/// connection makes syslog(3) open one with default settings.
pub fn syslog_message(priority: SyslogPriority, message: &str) {
    let Ok(message) = CString::new(message) else {
        return;
    };

    // SAFETY: the format and the message are valid NUL-terminated strings
    // that outlive the call.
    unsafe {
        libc::syslog(priority as libc::c_int, c"%s".as_ptr(), message.as_ptr());
    }
}

/// Open syslog connection; dropping it calls `closelog(3)`.
///
/// ```no_run
/// # #[cfg(unix)]
/// # {
/// use logging_sink::syslog::{SyslogConfig, SyslogPriority, syslog_message};
///
/// let _guard = SyslogConfig::default().open();
/// syslog_message(SyslogPriority::Info, "indexer started");
/// # }
/// ```
#[derive(Debug)]
pub struct SyslogGuard {
    ident: CString,
}

impl SyslogGuard {
    /// Ident the connection was opened with.
    pub fn ident(&self) -> &CStr {
        &self.ident
    }
}

impl Drop for SyslogGuard {
    fn drop(&mut self) {
        // SAFETY: closelog has no preconditions; after it returns syslog no
        // longer references the ident owned by this guard.
        unsafe {
            libc::closelog();
        }
    }
}
